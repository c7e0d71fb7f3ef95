//! Delivery schedule computations.
//!
//! Overdue and due-today are derived display state, computed date-only
//! against the current calendar day, never persisted.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::models::{Order, OrderStatus};

/// Whether an order is overdue.
///
/// True iff the order still sits in the initial ("in production") status and
/// its delivery date's calendar day is strictly before `today`. Orders in
/// any other status are never overdue, regardless of date.
pub fn is_overdue(order: &Order, current_status: &OrderStatus, today: NaiveDate) -> bool {
    current_status.is_initial && order.delivery_date.date_naive() < today
}

/// Whether an order is due on `today` while still in the initial status.
pub fn is_due_today(order: &Order, current_status: &OrderStatus, today: NaiveDate) -> bool {
    current_status.is_initial && order.delivery_date.date_naive() == today
}

/// Half-open UTC window `[start of month, start of next month)`.
///
/// Returns `None` for an invalid month number.
pub fn month_window(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let start = Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0)?);
    let end = Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?);
    Some((start, end))
}

/// Parses a `YYYY-MM` month parameter.
pub fn parse_month_param(raw: &str) -> Option<(i32, u32)> {
    let (year, month) = raw.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    if (1..=12).contains(&month) {
        Some((year, month))
    } else {
        None
    }
}

/// Calendar day of a UTC instant. Convenience for call sites holding `now`.
pub fn day_of(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn status(is_initial: bool) -> OrderStatus {
        OrderStatus {
            id: Uuid::new_v4(),
            name: if is_initial { "Em produção" } else { "Finalizado" }.to_string(),
            color: "#f59e0b".to_string(),
            order_index: 0,
            is_initial,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn order(delivery_date: DateTime<Utc>, status_id: Uuid) -> Order {
        Order {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            service: "Banner".to_string(),
            description: None,
            status_id,
            delivery_date,
            employee_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_overdue_requires_initial_status_and_past_date() {
        let initial = status(true);
        let today = day_of(Utc::now());
        let yesterday = Utc::now() - Duration::days(1);

        let o = order(yesterday, initial.id);
        assert!(is_overdue(&o, &initial, today));
    }

    #[test]
    fn test_terminal_status_is_never_overdue() {
        let done = status(false);
        let today = day_of(Utc::now());
        let long_past = Utc::now() - Duration::days(90);

        let o = order(long_past, done.id);
        assert!(!is_overdue(&o, &done, today));
    }

    #[test]
    fn test_due_today_is_not_overdue() {
        let initial = status(true);
        let today = day_of(Utc::now());

        let o = order(Utc::now(), initial.id);
        assert!(!is_overdue(&o, &initial, today));
        assert!(is_due_today(&o, &initial, today));
    }

    #[test]
    fn test_overdue_compares_date_only() {
        let initial = status(true);
        // Delivery late last night, checked early today: one calendar day apart.
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let late_yesterday = Utc.with_ymd_and_hms(2024, 3, 14, 23, 59, 0).unwrap();

        let o = order(late_yesterday, initial.id);
        assert!(is_overdue(&o, &initial, today));
    }

    #[test]
    fn test_future_delivery_not_overdue() {
        let initial = status(true);
        let today = day_of(Utc::now());

        let o = order(Utc::now() + Duration::days(3), initial.id);
        assert!(!is_overdue(&o, &initial, today));
        assert!(!is_due_today(&o, &initial, today));
    }

    #[test]
    fn test_month_window_spans_whole_month() {
        let (start, end) = month_window(2024, 2).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());

        let last_of_feb = Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap();
        assert!(last_of_feb >= start && last_of_feb < end);
    }

    #[test]
    fn test_month_window_december_rolls_year() {
        let (start, end) = month_window(2024, 12).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_month_window_rejects_invalid_month() {
        assert!(month_window(2024, 0).is_none());
        assert!(month_window(2024, 13).is_none());
    }

    #[test]
    fn test_parse_month_param() {
        assert_eq!(parse_month_param("2024-05"), Some((2024, 5)));
        assert_eq!(parse_month_param("2024-12"), Some((2024, 12)));
        assert_eq!(parse_month_param("2024-13"), None);
        assert_eq!(parse_month_param("2024-00"), None);
        assert_eq!(parse_month_param("24-05"), None);
        assert_eq!(parse_month_param("2024-5"), None);
        assert_eq!(parse_month_param("maio"), None);
        assert_eq!(parse_month_param(""), None);
    }
}

//! Dashboard aggregation.
//!
//! Pure fold over already-loaded orders and statuses; no I/O.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{Order, OrderStatus};
use crate::services::schedule;

/// Per-status slice of the dashboard.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status_id: Uuid,
    /// Status name at aggregation time.
    pub name: String,
    pub color: String,
    pub count: i64,
}

/// Aggregated order counts for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_orders: i64,
    /// One entry per status, board order, including zero-count statuses.
    pub by_status: Vec<StatusCount>,
    pub overdue: i64,
    pub due_today: i64,
}

/// Folds orders into dashboard numbers.
///
/// Statuses appear in board order (`order_index`); orders referencing a
/// retired status that was excluded from `statuses` only count toward the
/// total. Overdue and due-today follow the schedule rules for `today`.
pub fn compute_dashboard_stats(
    orders: &[Order],
    statuses: &[OrderStatus],
    today: NaiveDate,
) -> DashboardStats {
    let by_id: HashMap<Uuid, &OrderStatus> = statuses.iter().map(|s| (s.id, s)).collect();

    let mut counts: HashMap<Uuid, i64> = HashMap::new();
    let mut overdue = 0;
    let mut due_today = 0;

    for order in orders {
        if let Some(status) = by_id.get(&order.status_id) {
            *counts.entry(status.id).or_insert(0) += 1;
            if schedule::is_overdue(order, status, today) {
                overdue += 1;
            }
            if schedule::is_due_today(order, status, today) {
                due_today += 1;
            }
        }
    }

    let mut ordered: Vec<&OrderStatus> = statuses.iter().collect();
    ordered.sort_by_key(|s| s.order_index);

    let by_status = ordered
        .into_iter()
        .map(|s| StatusCount {
            status_id: s.id,
            name: s.name.clone(),
            color: s.color.clone(),
            count: counts.get(&s.id).copied().unwrap_or(0),
        })
        .collect();

    DashboardStats {
        total_orders: orders.len() as i64,
        by_status,
        overdue,
        due_today,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn status(name: &str, order_index: i32, is_initial: bool) -> OrderStatus {
        OrderStatus {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color: "#607d8b".to_string(),
            order_index,
            is_initial,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn order(status_id: Uuid, delivery_offset_days: i64) -> Order {
        Order {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            service: "Cartão de visita".to_string(),
            description: None,
            status_id,
            delivery_date: Utc::now() + Duration::days(delivery_offset_days),
            employee_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_counts_group_by_status_in_board_order() {
        let producing = status("Em produção", 0, true);
        let done = status("Finalizado", 1, false);
        let statuses = vec![done.clone(), producing.clone()];

        let orders = vec![
            order(producing.id, 5),
            order(producing.id, 6),
            order(done.id, -3),
        ];

        let today = schedule::day_of(Utc::now());
        let stats = compute_dashboard_stats(&orders, &statuses, today);

        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.by_status.len(), 2);
        // Board order, not input order.
        assert_eq!(stats.by_status[0].name, "Em produção");
        assert_eq!(stats.by_status[0].count, 2);
        assert_eq!(stats.by_status[1].name, "Finalizado");
        assert_eq!(stats.by_status[1].count, 1);
    }

    #[test]
    fn test_zero_count_statuses_still_listed() {
        let producing = status("Em produção", 0, true);
        let cancelled = status("Cancelado", 2, false);
        let statuses = vec![producing.clone(), cancelled];

        let stats = compute_dashboard_stats(
            &[order(producing.id, 1)],
            &statuses,
            schedule::day_of(Utc::now()),
        );

        assert_eq!(stats.by_status[1].name, "Cancelado");
        assert_eq!(stats.by_status[1].count, 0);
    }

    #[test]
    fn test_overdue_and_due_today_counted() {
        let producing = status("Em produção", 0, true);
        let done = status("Finalizado", 1, false);
        let statuses = vec![producing.clone(), done.clone()];

        let orders = vec![
            order(producing.id, -2), // overdue
            order(producing.id, 0),  // due today
            order(producing.id, 4),  // upcoming
            order(done.id, -10),     // finished late, not overdue
        ];

        let stats = compute_dashboard_stats(&orders, &statuses, schedule::day_of(Utc::now()));
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.due_today, 1);
    }

    #[test]
    fn test_orders_on_unknown_status_count_toward_total_only() {
        let producing = status("Em produção", 0, true);
        let stats = compute_dashboard_stats(
            &[order(Uuid::new_v4(), 1)],
            &[producing],
            schedule::day_of(Utc::now()),
        );

        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.by_status[0].count, 0);
    }

    #[test]
    fn test_empty_inputs() {
        let stats = compute_dashboard_stats(&[], &[], schedule::day_of(Utc::now()));
        assert_eq!(stats.total_orders, 0);
        assert!(stats.by_status.is_empty());
        assert_eq!(stats.overdue, 0);
        assert_eq!(stats.due_today, 0);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let producing = status("Em produção", 0, true);
        let stats = compute_dashboard_stats(
            &[order(producing.id, 1)],
            &[producing],
            schedule::day_of(Utc::now()),
        );
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("totalOrders"));
        assert!(json.contains("byStatus"));
        assert!(json.contains("dueToday"));
        assert!(json.contains("statusId"));
    }
}

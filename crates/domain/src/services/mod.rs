//! Pure domain services.
//!
//! Everything here operates on domain models without touching I/O, so the
//! workflow layer and its tests can exercise the logic directly.

pub mod chat_projection;
pub mod dashboard;
pub mod mentions;
pub mod schedule;

pub use chat_projection::ChatProjection;
pub use dashboard::{compute_dashboard_stats, DashboardStats, StatusCount};
pub use mentions::{extract_mentions, render_with_mentions, MessageSegment};
pub use schedule::{is_due_today, is_overdue, month_window, parse_month_param};

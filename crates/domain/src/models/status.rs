//! Configurable order status domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the configurable status board.
///
/// Statuses form an ordered set via `order_index`; new statuses append at
/// `max(order_index) + 1` and the board offers no reordering. Exactly one
/// active status carries `is_initial`, marking the "in production" state the
/// overdue rule keys on. Soft-deleted via `is_active`, never removed, since
/// orders may still reference a retired status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatus {
    pub id: Uuid,
    pub name: String,
    /// Display color as a `#rrggbb` hex string.
    pub color: String,
    pub order_index: i32,
    pub is_initial: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a status. The board position is assigned server-side.
#[derive(Debug, Clone)]
pub struct CreateStatusInput {
    pub name: String,
    pub color: String,
}

/// Partial update of a status.
#[derive(Debug, Clone, Default)]
pub struct UpdateStatusInput {
    pub name: Option<String>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

//! Order and status-change audit domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A service order placed by a client.
///
/// `status_id` must reference an active status at creation time; a status
/// retired later keeps its historical orders (deactivation does not
/// cascade). Concurrent edits follow last-write-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    /// Free-text description of the contracted service.
    pub service: String,
    pub description: Option<String>,
    pub status_id: Uuid,
    pub delivery_date: DateTime<Utc>,
    pub employee_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit entry appended on every effective status transition.
///
/// `old_value`/`new_value` freeze the human-readable status names as of the
/// transition, so later renames never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub id: Uuid,
    pub order_id: Uuid,
    pub changed_by: Uuid,
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
    pub created_at: DateTime<Utc>,
}

/// Field name recorded on status transitions.
pub const STATUS_FIELD: &str = "status";

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub client_id: Uuid,
    pub service: String,
    pub description: Option<String>,
    pub status_id: Uuid,
    pub delivery_date: DateTime<Utc>,
}

/// Partial update of an order. Status is transitioned separately so the
/// audit trail stays complete.
#[derive(Debug, Clone, Default)]
pub struct UpdateOrderInput {
    pub client_id: Option<Uuid>,
    pub service: Option<String>,
    pub description: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
}

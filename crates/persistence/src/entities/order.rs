//! Order and status change entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{Order, StatusChange};

/// Database row mapping for the orders table.
#[derive(Debug, Clone, FromRow)]
pub struct OrderEntity {
    pub id: Uuid,
    pub client_id: Uuid,
    pub service: String,
    pub description: Option<String>,
    pub status_id: Uuid,
    pub delivery_date: DateTime<Utc>,
    pub employee_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> Order {
        Order {
            id: self.id,
            client_id: self.client_id,
            service: self.service,
            description: self.description,
            status_id: self.status_id,
            delivery_date: self.delivery_date,
            employee_id: self.employee_id,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<OrderEntity> for Order {
    fn from(entity: OrderEntity) -> Self {
        entity.into_domain()
    }
}

/// Database row mapping for the status_changes audit table.
///
/// Values are frozen display strings captured at change time so history
/// stays readable after statuses are renamed or removed.
#[derive(Debug, Clone, FromRow)]
pub struct StatusChangeEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub changed_by: Uuid,
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
    pub created_at: DateTime<Utc>,
}

impl StatusChangeEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> StatusChange {
        StatusChange {
            id: self.id,
            order_id: self.order_id,
            changed_by: self.changed_by,
            field_name: self.field_name,
            old_value: self.old_value,
            new_value: self.new_value,
            created_at: self.created_at,
        }
    }
}

impl From<StatusChangeEntity> for StatusChange {
    fn from(entity: StatusChangeEntity) -> Self {
        entity.into_domain()
    }
}

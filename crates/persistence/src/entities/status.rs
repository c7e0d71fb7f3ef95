//! Order status entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::OrderStatus;

/// Database row mapping for the order_statuses table.
#[derive(Debug, Clone, FromRow)]
pub struct StatusEntity {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub order_index: i32,
    pub is_initial: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl StatusEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> OrderStatus {
        OrderStatus {
            id: self.id,
            name: self.name,
            color: self.color,
            order_index: self.order_index,
            is_initial: self.is_initial,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

impl From<StatusEntity> for OrderStatus {
    fn from(entity: StatusEntity) -> Self {
        entity.into_domain()
    }
}

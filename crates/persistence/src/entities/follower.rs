//! Order follower entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::OrderFollower;

/// Database row mapping for the order_followers table.
#[derive(Debug, Clone, FromRow)]
pub struct FollowerEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Uuid,
    pub notifications_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl FollowerEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> OrderFollower {
        OrderFollower {
            id: self.id,
            user_id: self.user_id,
            order_id: self.order_id,
            notifications_enabled: self.notifications_enabled,
            created_at: self.created_at,
        }
    }
}

impl From<FollowerEntity> for OrderFollower {
    fn from(entity: FollowerEntity) -> Self {
        entity.into_domain()
    }
}

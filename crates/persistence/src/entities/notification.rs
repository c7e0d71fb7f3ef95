//! Notification entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{Notification, NotificationKind};

/// Database row mapping for the notifications table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Uuid,
    pub message_id: Uuid,
    pub kind: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> Notification {
        let kind = self
            .kind
            .parse::<NotificationKind>()
            .unwrap_or(NotificationKind::NewMessage);

        Notification {
            id: self.id,
            user_id: self.user_id,
            order_id: self.order_id,
            message_id: self.message_id,
            kind,
            is_read: self.is_read,
            created_at: self.created_at,
        }
    }
}

impl From<NotificationEntity> for Notification {
    fn from(entity: NotificationEntity) -> Self {
        entity.into_domain()
    }
}

//! Notification repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::error::DomainError;
use domain::events::{ChangeEvent, ChangeKind};
use domain::models::{Notification, NotificationKind};

use crate::entities::NotificationEntity;
use crate::events::ChangeHub;
use crate::metrics::QueryTimer;
use crate::repositories::map_db_err;

/// Repository for user notifications.
///
/// Ownership checks (a user may only touch their own notifications) live in
/// the workflow layer; this repository is scope-agnostic.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        message_id: Uuid,
        kind: NotificationKind,
    ) -> Result<Notification, DomainError>;

    async fn find(&self, id: Uuid) -> Result<Option<Notification>, DomainError>;

    /// A user's notifications, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, DomainError>;

    async fn mark_read(&self, id: Uuid) -> Result<Notification, DomainError>;

    /// Marks every unread notification of a user read, returning how many
    /// rows changed.
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DomainError>;

    async fn delete(&self, id: Uuid) -> Result<Notification, DomainError>;
}

/// Postgres-backed notification repository.
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
    hub: Arc<ChangeHub>,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool, hub: Arc<ChangeHub>) -> Self {
        Self { pool, hub }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        message_id: Uuid,
        kind: NotificationKind,
    ) -> Result<Notification, DomainError> {
        let timer = QueryTimer::new("notification_insert");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (id, user_id, order_id, message_id, kind)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, order_id, message_id, kind, is_read, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(order_id)
        .bind(message_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await;
        timer.record();

        let notification = result
            .map(NotificationEntity::into_domain)
            .map_err(map_db_err)?;
        self.hub.publish(ChangeEvent::Notifications {
            kind: ChangeKind::Insert,
            record: notification.clone(),
        });
        Ok(notification)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Notification>, DomainError> {
        let timer = QueryTimer::new("notification_find");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT id, user_id, order_id, message_id, kind, is_read, created_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map(|row| row.map(NotificationEntity::into_domain))
            .map_err(map_db_err)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, DomainError> {
        let timer = QueryTimer::new("notification_list_for_user");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT id, user_id, order_id, message_id, kind, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(|rows| {
                rows.into_iter()
                    .map(NotificationEntity::into_domain)
                    .collect()
            })
            .map_err(map_db_err)
    }

    async fn mark_read(&self, id: Uuid) -> Result<Notification, DomainError> {
        let timer = QueryTimer::new("notification_mark_read");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1
            RETURNING id, user_id, order_id, message_id, kind, is_read, created_at
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        let notification = result
            .map(NotificationEntity::into_domain)
            .map_err(map_db_err)?;
        self.hub.publish(ChangeEvent::Notifications {
            kind: ChangeKind::Update,
            record: notification.clone(),
        });
        Ok(notification)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DomainError> {
        let timer = QueryTimer::new("notification_mark_all_read");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE user_id = $1 AND NOT is_read
            RETURNING id, user_id, order_id, message_id, kind, is_read, created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        let rows = result.map_err(map_db_err)?;
        let count = rows.len() as u64;
        for row in rows {
            self.hub.publish(ChangeEvent::Notifications {
                kind: ChangeKind::Update,
                record: row.into_domain(),
            });
        }
        Ok(count)
    }

    async fn delete(&self, id: Uuid) -> Result<Notification, DomainError> {
        let timer = QueryTimer::new("notification_delete");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            DELETE FROM notifications
            WHERE id = $1
            RETURNING id, user_id, order_id, message_id, kind, is_read, created_at
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        let notification = result
            .map(NotificationEntity::into_domain)
            .map_err(map_db_err)?;
        self.hub.publish(ChangeEvent::Notifications {
            kind: ChangeKind::Delete,
            record: notification.clone(),
        });
        Ok(notification)
    }
}

/// In-memory notification repository for tests.
pub struct MemNotificationRepository {
    notifications: RwLock<HashMap<Uuid, Notification>>,
    hub: Arc<ChangeHub>,
}

impl MemNotificationRepository {
    pub fn new(hub: Arc<ChangeHub>) -> Self {
        Self {
            notifications: RwLock::new(HashMap::new()),
            hub,
        }
    }
}

#[async_trait]
impl NotificationRepository for MemNotificationRepository {
    async fn insert(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        message_id: Uuid,
        kind: NotificationKind,
    ) -> Result<Notification, DomainError> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            order_id,
            message_id,
            kind,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications
            .write()
            .await
            .insert(notification.id, notification.clone());
        self.hub.publish(ChangeEvent::Notifications {
            kind: ChangeKind::Insert,
            record: notification.clone(),
        });
        Ok(notification)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Notification>, DomainError> {
        Ok(self.notifications.read().await.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, DomainError> {
        let notifications = self.notifications.read().await;
        let mut result: Vec<Notification> = notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn mark_read(&self, id: Uuid) -> Result<Notification, DomainError> {
        let mut notifications = self.notifications.write().await;
        let notification = notifications
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Notification {}", id)))?;
        notification.is_read = true;

        let notification = notification.clone();
        drop(notifications);
        self.hub.publish(ChangeEvent::Notifications {
            kind: ChangeKind::Update,
            record: notification.clone(),
        });
        Ok(notification)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DomainError> {
        let mut notifications = self.notifications.write().await;
        let mut changed = Vec::new();
        for notification in notifications.values_mut() {
            if notification.user_id == user_id && !notification.is_read {
                notification.is_read = true;
                changed.push(notification.clone());
            }
        }
        drop(notifications);

        let count = changed.len() as u64;
        for notification in changed {
            self.hub.publish(ChangeEvent::Notifications {
                kind: ChangeKind::Update,
                record: notification,
            });
        }
        Ok(count)
    }

    async fn delete(&self, id: Uuid) -> Result<Notification, DomainError> {
        let removed = self
            .notifications
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| DomainError::not_found(format!("Notification {}", id)))?;
        self.hub.publish(ChangeEvent::Notifications {
            kind: ChangeKind::Delete,
            record: removed.clone(),
        });
        Ok(removed)
    }
}

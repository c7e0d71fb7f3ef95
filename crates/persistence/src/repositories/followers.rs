//! Order follower repository.
//!
//! One row per (user, order) pair, enforced by a unique constraint so
//! concurrent double-follows collapse to a single row.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::error::DomainError;
use domain::events::{ChangeEvent, ChangeKind};
use domain::models::OrderFollower;

use crate::entities::FollowerEntity;
use crate::events::ChangeHub;
use crate::metrics::QueryTimer;
use crate::repositories::map_db_err;

/// Repository for order followers.
#[async_trait]
pub trait FollowerRepository: Send + Sync {
    /// Creates a follower row if absent, with notifications enabled.
    /// Idempotent; following twice returns the existing row.
    async fn follow(&self, order_id: Uuid, user_id: Uuid) -> Result<OrderFollower, DomainError>;

    /// Removes the follower row if present. Returns whether a row existed.
    async fn unfollow(&self, order_id: Uuid, user_id: Uuid) -> Result<bool, DomainError>;

    async fn find(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrderFollower>, DomainError>;

    /// Flips `notifications_enabled`, returning the updated row. Fails with
    /// NotFound when the user does not follow the order.
    async fn toggle_notifications(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<OrderFollower, DomainError>;

    /// Followers of an order, oldest first.
    async fn list_for_order(&self, order_id: Uuid) -> Result<Vec<OrderFollower>, DomainError>;
}

/// Postgres-backed follower repository.
#[derive(Clone)]
pub struct PgFollowerRepository {
    pool: PgPool,
    hub: Arc<ChangeHub>,
}

impl PgFollowerRepository {
    pub fn new(pool: PgPool, hub: Arc<ChangeHub>) -> Self {
        Self { pool, hub }
    }
}

#[async_trait]
impl FollowerRepository for PgFollowerRepository {
    async fn follow(&self, order_id: Uuid, user_id: Uuid) -> Result<OrderFollower, DomainError> {
        let timer = QueryTimer::new("follower_insert");
        // ON CONFLICT DO NOTHING returns no row when the pair already
        // exists, so a lost race falls through to the select below.
        let inserted = sqlx::query_as::<_, FollowerEntity>(
            r#"
            INSERT INTO order_followers (id, user_id, order_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, order_id) DO NOTHING
            RETURNING id, user_id, order_id, notifications_enabled, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        if let Some(row) = inserted.map_err(map_db_err)? {
            let follower = row.into_domain();
            self.hub.publish(ChangeEvent::OrderFollowers {
                kind: ChangeKind::Insert,
                record: follower.clone(),
            });
            return Ok(follower);
        }

        self.find(order_id, user_id)
            .await?
            .ok_or_else(|| DomainError::external("Follower row vanished during upsert"))
    }

    async fn unfollow(&self, order_id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        let timer = QueryTimer::new("follower_delete");
        let result = sqlx::query_as::<_, FollowerEntity>(
            r#"
            DELETE FROM order_followers
            WHERE order_id = $1 AND user_id = $2
            RETURNING id, user_id, order_id, notifications_enabled, created_at
            "#,
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match result.map_err(map_db_err)? {
            Some(row) => {
                self.hub.publish(ChangeEvent::OrderFollowers {
                    kind: ChangeKind::Delete,
                    record: row.into_domain(),
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrderFollower>, DomainError> {
        let timer = QueryTimer::new("follower_find");
        let result = sqlx::query_as::<_, FollowerEntity>(
            r#"
            SELECT id, user_id, order_id, notifications_enabled, created_at
            FROM order_followers
            WHERE order_id = $1 AND user_id = $2
            "#,
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map(|row| row.map(FollowerEntity::into_domain))
            .map_err(map_db_err)
    }

    async fn toggle_notifications(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<OrderFollower, DomainError> {
        let timer = QueryTimer::new("follower_toggle_notifications");
        let result = sqlx::query_as::<_, FollowerEntity>(
            r#"
            UPDATE order_followers
            SET notifications_enabled = NOT notifications_enabled
            WHERE order_id = $1 AND user_id = $2
            RETURNING id, user_id, order_id, notifications_enabled, created_at
            "#,
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        let follower = result
            .map_err(map_db_err)?
            .map(FollowerEntity::into_domain)
            .ok_or_else(|| {
                DomainError::not_found(format!("User {} does not follow order {}", user_id, order_id))
            })?;
        self.hub.publish(ChangeEvent::OrderFollowers {
            kind: ChangeKind::Update,
            record: follower.clone(),
        });
        Ok(follower)
    }

    async fn list_for_order(&self, order_id: Uuid) -> Result<Vec<OrderFollower>, DomainError> {
        let timer = QueryTimer::new("follower_list_for_order");
        let result = sqlx::query_as::<_, FollowerEntity>(
            r#"
            SELECT id, user_id, order_id, notifications_enabled, created_at
            FROM order_followers
            WHERE order_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(|rows| rows.into_iter().map(FollowerEntity::into_domain).collect())
            .map_err(map_db_err)
    }
}

/// In-memory follower repository for tests.
pub struct MemFollowerRepository {
    followers: RwLock<HashMap<(Uuid, Uuid), OrderFollower>>,
    hub: Arc<ChangeHub>,
}

impl MemFollowerRepository {
    pub fn new(hub: Arc<ChangeHub>) -> Self {
        Self {
            followers: RwLock::new(HashMap::new()),
            hub,
        }
    }
}

#[async_trait]
impl FollowerRepository for MemFollowerRepository {
    async fn follow(&self, order_id: Uuid, user_id: Uuid) -> Result<OrderFollower, DomainError> {
        let mut followers = self.followers.write().await;
        if let Some(existing) = followers.get(&(order_id, user_id)) {
            return Ok(existing.clone());
        }

        let follower = OrderFollower {
            id: Uuid::new_v4(),
            user_id,
            order_id,
            notifications_enabled: true,
            created_at: Utc::now(),
        };
        followers.insert((order_id, user_id), follower.clone());
        drop(followers);

        self.hub.publish(ChangeEvent::OrderFollowers {
            kind: ChangeKind::Insert,
            record: follower.clone(),
        });
        Ok(follower)
    }

    async fn unfollow(&self, order_id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        let removed = self.followers.write().await.remove(&(order_id, user_id));
        match removed {
            Some(follower) => {
                self.hub.publish(ChangeEvent::OrderFollowers {
                    kind: ChangeKind::Delete,
                    record: follower,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrderFollower>, DomainError> {
        Ok(self
            .followers
            .read()
            .await
            .get(&(order_id, user_id))
            .cloned())
    }

    async fn toggle_notifications(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<OrderFollower, DomainError> {
        let mut followers = self.followers.write().await;
        let follower = followers.get_mut(&(order_id, user_id)).ok_or_else(|| {
            DomainError::not_found(format!("User {} does not follow order {}", user_id, order_id))
        })?;
        follower.notifications_enabled = !follower.notifications_enabled;

        let follower = follower.clone();
        drop(followers);
        self.hub.publish(ChangeEvent::OrderFollowers {
            kind: ChangeKind::Update,
            record: follower.clone(),
        });
        Ok(follower)
    }

    async fn list_for_order(&self, order_id: Uuid) -> Result<Vec<OrderFollower>, DomainError> {
        let followers = self.followers.read().await;
        let mut result: Vec<OrderFollower> = followers
            .values()
            .filter(|f| f.order_id == order_id)
            .cloned()
            .collect();
        result.sort_by_key(|f| f.created_at);
        Ok(result)
    }
}

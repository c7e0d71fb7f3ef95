//! Order status repository.
//!
//! Statuses form the configurable board. Three rows are seeded at migration
//! time so pre-existing orders keep a valid reference; their ids are fixed
//! and mirrored here for the in-memory store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::status::{CreateStatusInput, UpdateStatusInput};
use domain::models::OrderStatus;

use crate::entities::StatusEntity;
use crate::metrics::QueryTimer;
use crate::repositories::map_db_err;

/// Seeded "Em produção" status id (initial/open state). Matches the
/// 0002_seed_order_statuses migration.
pub const SEEDED_IN_PRODUCTION: Uuid = Uuid::from_u128(0x1a7c8e52_93df_4b2a_9d1e_04c5f2a6b8d1);
/// Seeded "Finalizado" status id.
pub const SEEDED_FINISHED: Uuid = Uuid::from_u128(0x2b8d9f63_a4e0_4c3b_8e2f_15d6a3b7c9e2);
/// Seeded "Cancelado" status id.
pub const SEEDED_CANCELLED: Uuid = Uuid::from_u128(0x3c9eaf74_b5f1_4d4c_9f30_26e7b4c8daf3);

/// Repository for the configurable status board.
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Creates a status appended at the end of the board
    /// (`order_index = max + 1`). Duplicate names conflict.
    async fn insert(&self, input: &CreateStatusInput) -> Result<OrderStatus, DomainError>;

    /// Applies a partial update. Board position is never changed here.
    async fn update(&self, id: Uuid, input: &UpdateStatusInput) -> Result<OrderStatus, DomainError>;

    /// Soft-deletes the status. Orders referencing it are left untouched.
    async fn deactivate(&self, id: Uuid) -> Result<OrderStatus, DomainError>;

    async fn find(&self, id: Uuid) -> Result<Option<OrderStatus>, DomainError>;

    /// The active status flagged as the initial/open state.
    async fn find_initial(&self) -> Result<Option<OrderStatus>, DomainError>;

    /// Lists statuses in board order.
    async fn list(&self, include_inactive: bool) -> Result<Vec<OrderStatus>, DomainError>;
}

/// Postgres-backed status repository.
#[derive(Clone)]
pub struct PgStatusRepository {
    pool: PgPool,
}

impl PgStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusRepository for PgStatusRepository {
    async fn insert(&self, input: &CreateStatusInput) -> Result<OrderStatus, DomainError> {
        let timer = QueryTimer::new("status_insert");
        // The subselect assigns the next board position atomically.
        let result = sqlx::query_as::<_, StatusEntity>(
            r#"
            INSERT INTO order_statuses (id, name, color, order_index)
            VALUES ($1, $2, $3,
                    (SELECT COALESCE(MAX(order_index) + 1, 0) FROM order_statuses))
            RETURNING id, name, color, order_index, is_initial, is_active, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.color)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(StatusEntity::into_domain).map_err(map_db_err)
    }

    async fn update(
        &self,
        id: Uuid,
        input: &UpdateStatusInput,
    ) -> Result<OrderStatus, DomainError> {
        let timer = QueryTimer::new("status_update");
        let result = sqlx::query_as::<_, StatusEntity>(
            r#"
            UPDATE order_statuses
            SET name = COALESCE($2, name),
                color = COALESCE($3, color),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            RETURNING id, name, color, order_index, is_initial, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.color)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(StatusEntity::into_domain).map_err(map_db_err)
    }

    async fn deactivate(&self, id: Uuid) -> Result<OrderStatus, DomainError> {
        let timer = QueryTimer::new("status_deactivate");
        let result = sqlx::query_as::<_, StatusEntity>(
            r#"
            UPDATE order_statuses
            SET is_active = FALSE
            WHERE id = $1
            RETURNING id, name, color, order_index, is_initial, is_active, created_at
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(StatusEntity::into_domain).map_err(map_db_err)
    }

    async fn find(&self, id: Uuid) -> Result<Option<OrderStatus>, DomainError> {
        let timer = QueryTimer::new("status_find");
        let result = sqlx::query_as::<_, StatusEntity>(
            r#"
            SELECT id, name, color, order_index, is_initial, is_active, created_at
            FROM order_statuses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map(|row| row.map(StatusEntity::into_domain))
            .map_err(map_db_err)
    }

    async fn find_initial(&self) -> Result<Option<OrderStatus>, DomainError> {
        let timer = QueryTimer::new("status_find_initial");
        let result = sqlx::query_as::<_, StatusEntity>(
            r#"
            SELECT id, name, color, order_index, is_initial, is_active, created_at
            FROM order_statuses
            WHERE is_initial AND is_active
            ORDER BY order_index
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map(|row| row.map(StatusEntity::into_domain))
            .map_err(map_db_err)
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<OrderStatus>, DomainError> {
        let timer = QueryTimer::new("status_list");
        let result = if include_inactive {
            sqlx::query_as::<_, StatusEntity>(
                r#"
                SELECT id, name, color, order_index, is_initial, is_active, created_at
                FROM order_statuses
                ORDER BY order_index
                "#,
            )
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, StatusEntity>(
                r#"
                SELECT id, name, color, order_index, is_initial, is_active, created_at
                FROM order_statuses
                WHERE is_active
                ORDER BY order_index
                "#,
            )
            .fetch_all(&self.pool)
            .await
        };
        timer.record();

        result
            .map(|rows| rows.into_iter().map(StatusEntity::into_domain).collect())
            .map_err(map_db_err)
    }
}

/// In-memory status repository for tests.
#[derive(Default)]
pub struct MemStatusRepository {
    statuses: RwLock<HashMap<Uuid, OrderStatus>>,
}

impl MemStatusRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository pre-populated with the same three rows the seed
    /// migration installs.
    pub fn seeded() -> Self {
        let seeds = [
            (SEEDED_IN_PRODUCTION, "Em produção", "#f59e0b", 0, true),
            (SEEDED_FINISHED, "Finalizado", "#22c55e", 1, false),
            (SEEDED_CANCELLED, "Cancelado", "#ef4444", 2, false),
        ];
        let mut statuses = HashMap::new();
        for (id, name, color, order_index, is_initial) in seeds {
            statuses.insert(
                id,
                OrderStatus {
                    id,
                    name: name.to_string(),
                    color: color.to_string(),
                    order_index,
                    is_initial,
                    is_active: true,
                    created_at: Utc::now(),
                },
            );
        }
        Self {
            statuses: RwLock::new(statuses),
        }
    }
}

#[async_trait]
impl StatusRepository for MemStatusRepository {
    async fn insert(&self, input: &CreateStatusInput) -> Result<OrderStatus, DomainError> {
        let mut statuses = self.statuses.write().await;
        if statuses.values().any(|s| s.name == input.name) {
            return Err(DomainError::conflict(format!(
                "Status named {} already exists",
                input.name
            )));
        }

        let next_index = statuses
            .values()
            .map(|s| s.order_index)
            .max()
            .map_or(0, |max| max + 1);
        let status = OrderStatus {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            color: input.color.clone(),
            order_index: next_index,
            is_initial: false,
            is_active: true,
            created_at: Utc::now(),
        };
        statuses.insert(status.id, status.clone());
        Ok(status)
    }

    async fn update(
        &self,
        id: Uuid,
        input: &UpdateStatusInput,
    ) -> Result<OrderStatus, DomainError> {
        let mut statuses = self.statuses.write().await;
        let status = statuses
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Status {}", id)))?;

        if let Some(name) = &input.name {
            status.name = name.clone();
        }
        if let Some(color) = &input.color {
            status.color = color.clone();
        }
        if let Some(is_active) = input.is_active {
            status.is_active = is_active;
        }
        Ok(status.clone())
    }

    async fn deactivate(&self, id: Uuid) -> Result<OrderStatus, DomainError> {
        let mut statuses = self.statuses.write().await;
        let status = statuses
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Status {}", id)))?;
        status.is_active = false;
        Ok(status.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<OrderStatus>, DomainError> {
        Ok(self.statuses.read().await.get(&id).cloned())
    }

    async fn find_initial(&self) -> Result<Option<OrderStatus>, DomainError> {
        let statuses = self.statuses.read().await;
        let mut initial: Vec<&OrderStatus> = statuses
            .values()
            .filter(|s| s.is_initial && s.is_active)
            .collect();
        initial.sort_by_key(|s| s.order_index);
        Ok(initial.first().map(|s| (*s).clone()))
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<OrderStatus>, DomainError> {
        let statuses = self.statuses.read().await;
        let mut result: Vec<OrderStatus> = statuses
            .values()
            .filter(|s| include_inactive || s.is_active)
            .cloned()
            .collect();
        result.sort_by_key(|s| s.order_index);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_board_matches_migration() {
        let repo = MemStatusRepository::seeded();
        let board = repo.list(false).await.unwrap();

        let names: Vec<&str> = board.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Em produção", "Finalizado", "Cancelado"]);

        let initial = repo.find_initial().await.unwrap().unwrap();
        assert_eq!(initial.id, SEEDED_IN_PRODUCTION);
    }

    #[tokio::test]
    async fn test_insert_appends_at_end_of_board() {
        let repo = MemStatusRepository::seeded();
        let created = repo
            .insert(&CreateStatusInput {
                name: "Aguardando arte".to_string(),
                color: "#8b5cf6".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(created.order_index, 3);
        assert!(!created.is_initial);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let repo = MemStatusRepository::seeded();
        let result = repo
            .insert(&CreateStatusInput {
                name: "Finalizado".to_string(),
                color: "#000000".to_string(),
            })
            .await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_deactivate_keeps_row_retrievable() {
        let repo = MemStatusRepository::seeded();
        repo.deactivate(SEEDED_CANCELLED).await.unwrap();

        let found = repo.find(SEEDED_CANCELLED).await.unwrap().unwrap();
        assert!(!found.is_active);
        assert_eq!(repo.list(false).await.unwrap().len(), 2);
        assert_eq!(repo.list(true).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_deactivating_initial_status_hides_it_from_find_initial() {
        let repo = MemStatusRepository::seeded();
        repo.deactivate(SEEDED_IN_PRODUCTION).await.unwrap();
        assert!(repo.find_initial().await.unwrap().is_none());
    }
}

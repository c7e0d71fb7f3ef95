//! Order file metadata repository.
//!
//! Rows here describe blobs held by the blob store. Deleting a file is a
//! two-step operation owned by the workflow layer: blob first, then this
//! row, so a failed blob delete never leaves a dangling metadata row.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{FileCategory, OrderFile};

use crate::entities::OrderFileEntity;
use crate::metrics::QueryTimer;
use crate::repositories::map_db_err;

/// Repository for order file metadata.
#[async_trait]
pub trait OrderFileRepository: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn insert(
        &self,
        order_id: Option<Uuid>,
        file_name: &str,
        file_path: &str,
        file_size: i64,
        file_type: &str,
        category: FileCategory,
        uploaded_by: Uuid,
    ) -> Result<OrderFile, DomainError>;

    async fn find(&self, id: Uuid) -> Result<Option<OrderFile>, DomainError>;

    /// Files of one order, newest first.
    async fn list_for_order(&self, order_id: Uuid) -> Result<Vec<OrderFile>, DomainError>;

    /// Files in the general pool (no owning order), newest first.
    async fn list_general(&self) -> Result<Vec<OrderFile>, DomainError>;

    /// Removes the metadata row, returning it. The blob must already be gone.
    async fn delete(&self, id: Uuid) -> Result<OrderFile, DomainError>;
}

/// Postgres-backed order file repository.
#[derive(Clone)]
pub struct PgOrderFileRepository {
    pool: PgPool,
}

impl PgOrderFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderFileRepository for PgOrderFileRepository {
    async fn insert(
        &self,
        order_id: Option<Uuid>,
        file_name: &str,
        file_path: &str,
        file_size: i64,
        file_type: &str,
        category: FileCategory,
        uploaded_by: Uuid,
    ) -> Result<OrderFile, DomainError> {
        let timer = QueryTimer::new("order_file_insert");
        let result = sqlx::query_as::<_, OrderFileEntity>(
            r#"
            INSERT INTO order_files (id, order_id, file_name, file_path, file_size,
                                     file_type, category, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, order_id, file_name, file_path, file_size, file_type,
                      category, uploaded_by, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(file_name)
        .bind(file_path)
        .bind(file_size)
        .bind(file_type)
        .bind(category.as_str())
        .bind(uploaded_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(OrderFileEntity::into_domain).map_err(map_db_err)
    }

    async fn find(&self, id: Uuid) -> Result<Option<OrderFile>, DomainError> {
        let timer = QueryTimer::new("order_file_find");
        let result = sqlx::query_as::<_, OrderFileEntity>(
            r#"
            SELECT id, order_id, file_name, file_path, file_size, file_type,
                   category, uploaded_by, created_at
            FROM order_files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map(|row| row.map(OrderFileEntity::into_domain))
            .map_err(map_db_err)
    }

    async fn list_for_order(&self, order_id: Uuid) -> Result<Vec<OrderFile>, DomainError> {
        let timer = QueryTimer::new("order_file_list_for_order");
        let result = sqlx::query_as::<_, OrderFileEntity>(
            r#"
            SELECT id, order_id, file_name, file_path, file_size, file_type,
                   category, uploaded_by, created_at
            FROM order_files
            WHERE order_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(|rows| rows.into_iter().map(OrderFileEntity::into_domain).collect())
            .map_err(map_db_err)
    }

    async fn list_general(&self) -> Result<Vec<OrderFile>, DomainError> {
        let timer = QueryTimer::new("order_file_list_general");
        let result = sqlx::query_as::<_, OrderFileEntity>(
            r#"
            SELECT id, order_id, file_name, file_path, file_size, file_type,
                   category, uploaded_by, created_at
            FROM order_files
            WHERE order_id IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(|rows| rows.into_iter().map(OrderFileEntity::into_domain).collect())
            .map_err(map_db_err)
    }

    async fn delete(&self, id: Uuid) -> Result<OrderFile, DomainError> {
        let timer = QueryTimer::new("order_file_delete");
        let result = sqlx::query_as::<_, OrderFileEntity>(
            r#"
            DELETE FROM order_files
            WHERE id = $1
            RETURNING id, order_id, file_name, file_path, file_size, file_type,
                      category, uploaded_by, created_at
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(OrderFileEntity::into_domain).map_err(map_db_err)
    }
}

/// In-memory order file repository for tests.
#[derive(Default)]
pub struct MemOrderFileRepository {
    files: RwLock<HashMap<Uuid, OrderFile>>,
}

impl MemOrderFileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderFileRepository for MemOrderFileRepository {
    async fn insert(
        &self,
        order_id: Option<Uuid>,
        file_name: &str,
        file_path: &str,
        file_size: i64,
        file_type: &str,
        category: FileCategory,
        uploaded_by: Uuid,
    ) -> Result<OrderFile, DomainError> {
        let file = OrderFile {
            id: Uuid::new_v4(),
            order_id,
            file_name: file_name.to_string(),
            file_path: file_path.to_string(),
            file_size,
            file_type: file_type.to_string(),
            category,
            uploaded_by,
            created_at: Utc::now(),
        };
        self.files.write().await.insert(file.id, file.clone());
        Ok(file)
    }

    async fn find(&self, id: Uuid) -> Result<Option<OrderFile>, DomainError> {
        Ok(self.files.read().await.get(&id).cloned())
    }

    async fn list_for_order(&self, order_id: Uuid) -> Result<Vec<OrderFile>, DomainError> {
        let files = self.files.read().await;
        let mut result: Vec<OrderFile> = files
            .values()
            .filter(|f| f.order_id == Some(order_id))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn list_general(&self) -> Result<Vec<OrderFile>, DomainError> {
        let files = self.files.read().await;
        let mut result: Vec<OrderFile> = files
            .values()
            .filter(|f| f.order_id.is_none())
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn delete(&self, id: Uuid) -> Result<OrderFile, DomainError> {
        self.files
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| DomainError::not_found(format!("File {}", id)))
    }
}

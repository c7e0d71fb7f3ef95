//! Client repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::client::{CreateClientInput, UpdateClientInput};
use domain::models::Client;

use crate::entities::ClientEntity;
use crate::metrics::QueryTimer;
use crate::repositories::map_db_err;

/// Repository for client records.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Registers a client owned by the acting staff member.
    async fn insert(
        &self,
        input: &CreateClientInput,
        created_by: Uuid,
    ) -> Result<Client, DomainError>;

    /// Applies a partial update. `None` fields are left untouched.
    async fn update(&self, id: Uuid, input: &UpdateClientInput) -> Result<Client, DomainError>;

    /// Soft-deletes the client. The row stays retrievable by id.
    async fn deactivate(&self, id: Uuid) -> Result<Client, DomainError>;

    async fn find(&self, id: Uuid) -> Result<Option<Client>, DomainError>;

    /// Lists clients ordered by name.
    async fn list(&self, include_inactive: bool) -> Result<Vec<Client>, DomainError>;
}

/// Postgres-backed client repository.
#[derive(Clone)]
pub struct PgClientRepository {
    pool: PgPool,
}

impl PgClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRepository for PgClientRepository {
    async fn insert(
        &self,
        input: &CreateClientInput,
        created_by: Uuid,
    ) -> Result<Client, DomainError> {
        let timer = QueryTimer::new("client_insert");
        let result = sqlx::query_as::<_, ClientEntity>(
            r#"
            INSERT INTO clients (id, name, email, phone, address, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, email, phone, address, notes, is_active, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.notes)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(ClientEntity::into_domain).map_err(map_db_err)
    }

    async fn update(&self, id: Uuid, input: &UpdateClientInput) -> Result<Client, DomainError> {
        let timer = QueryTimer::new("client_update");
        let result = sqlx::query_as::<_, ClientEntity>(
            r#"
            UPDATE clients
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                notes = COALESCE($6, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, phone, address, notes, is_active, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(ClientEntity::into_domain).map_err(map_db_err)
    }

    async fn deactivate(&self, id: Uuid) -> Result<Client, DomainError> {
        let timer = QueryTimer::new("client_deactivate");
        let result = sqlx::query_as::<_, ClientEntity>(
            r#"
            UPDATE clients
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, phone, address, notes, is_active, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(ClientEntity::into_domain).map_err(map_db_err)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Client>, DomainError> {
        let timer = QueryTimer::new("client_find");
        let result = sqlx::query_as::<_, ClientEntity>(
            r#"
            SELECT id, name, email, phone, address, notes, is_active, created_by,
                   created_at, updated_at
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map(|row| row.map(ClientEntity::into_domain))
            .map_err(map_db_err)
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Client>, DomainError> {
        let timer = QueryTimer::new("client_list");
        let result = if include_inactive {
            sqlx::query_as::<_, ClientEntity>(
                r#"
                SELECT id, name, email, phone, address, notes, is_active, created_by,
                       created_at, updated_at
                FROM clients
                ORDER BY name
                "#,
            )
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, ClientEntity>(
                r#"
                SELECT id, name, email, phone, address, notes, is_active, created_by,
                       created_at, updated_at
                FROM clients
                WHERE is_active
                ORDER BY name
                "#,
            )
            .fetch_all(&self.pool)
            .await
        };
        timer.record();

        result
            .map(|rows| rows.into_iter().map(ClientEntity::into_domain).collect())
            .map_err(map_db_err)
    }
}

/// In-memory client repository for tests.
#[derive(Default)]
pub struct MemClientRepository {
    clients: RwLock<HashMap<Uuid, Client>>,
}

impl MemClientRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientRepository for MemClientRepository {
    async fn insert(
        &self,
        input: &CreateClientInput,
        created_by: Uuid,
    ) -> Result<Client, DomainError> {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            address: input.address.clone(),
            notes: input.notes.clone(),
            is_active: true,
            created_by,
            created_at: now,
            updated_at: now,
        };
        self.clients.write().await.insert(client.id, client.clone());
        Ok(client)
    }

    async fn update(&self, id: Uuid, input: &UpdateClientInput) -> Result<Client, DomainError> {
        let mut clients = self.clients.write().await;
        let client = clients
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Client {}", id)))?;

        if let Some(name) = &input.name {
            client.name = name.clone();
        }
        if let Some(email) = &input.email {
            client.email = Some(email.clone());
        }
        if let Some(phone) = &input.phone {
            client.phone = Some(phone.clone());
        }
        if let Some(address) = &input.address {
            client.address = Some(address.clone());
        }
        if let Some(notes) = &input.notes {
            client.notes = Some(notes.clone());
        }
        client.updated_at = Utc::now();
        Ok(client.clone())
    }

    async fn deactivate(&self, id: Uuid) -> Result<Client, DomainError> {
        let mut clients = self.clients.write().await;
        let client = clients
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Client {}", id)))?;
        client.is_active = false;
        client.updated_at = Utc::now();
        Ok(client.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Client>, DomainError> {
        Ok(self.clients.read().await.get(&id).cloned())
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Client>, DomainError> {
        let clients = self.clients.read().await;
        let mut result: Vec<Client> = clients
            .values()
            .filter(|c| include_inactive || c.is_active)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }
}

//! Staff account repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::account::UpdateAccountInput;
use domain::models::{Role, UserAccount};

use crate::entities::AccountEntity;
use crate::metrics::QueryTimer;
use crate::repositories::map_db_err;

/// Repository for staff accounts.
///
/// Credentials never pass through here; they live with the auth provider.
/// An account row references its principal by id only.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persists an account for an already-provisioned principal.
    /// Duplicate usernames or emails conflict.
    async fn insert(
        &self,
        principal_id: Uuid,
        username: &str,
        full_name: &str,
        email: &str,
        role: Role,
    ) -> Result<UserAccount, DomainError>;

    /// Applies a partial update. Username and email are immutable.
    async fn update(&self, id: Uuid, input: &UpdateAccountInput)
        -> Result<UserAccount, DomainError>;

    async fn find(&self, id: Uuid) -> Result<Option<UserAccount>, DomainError>;

    /// Looks an account up by username or email, case-insensitively.
    /// Login accepts either.
    async fn find_by_identifier(&self, identifier: &str)
        -> Result<Option<UserAccount>, DomainError>;

    /// All accounts, ordered by username.
    async fn list(&self) -> Result<Vec<UserAccount>, DomainError>;

    /// Active accounts only. This is the mention roster.
    async fn list_active(&self) -> Result<Vec<UserAccount>, DomainError>;
}

/// Postgres-backed account repository.
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn insert(
        &self,
        principal_id: Uuid,
        username: &str,
        full_name: &str,
        email: &str,
        role: Role,
    ) -> Result<UserAccount, DomainError> {
        let timer = QueryTimer::new("account_insert");
        let result = sqlx::query_as::<_, AccountEntity>(
            r#"
            INSERT INTO user_accounts (id, principal_id, username, full_name, email, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, principal_id, username, full_name, email, role, is_active, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(principal_id)
        .bind(username)
        .bind(full_name)
        .bind(email)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(AccountEntity::into_domain).map_err(map_db_err)
    }

    async fn update(
        &self,
        id: Uuid,
        input: &UpdateAccountInput,
    ) -> Result<UserAccount, DomainError> {
        let timer = QueryTimer::new("account_update");
        let result = sqlx::query_as::<_, AccountEntity>(
            r#"
            UPDATE user_accounts
            SET full_name = COALESCE($2, full_name),
                role = COALESCE($3, role),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            RETURNING id, principal_id, username, full_name, email, role, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(&input.full_name)
        .bind(input.role.map(|r| r.as_str()))
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(AccountEntity::into_domain).map_err(map_db_err)
    }

    async fn find(&self, id: Uuid) -> Result<Option<UserAccount>, DomainError> {
        let timer = QueryTimer::new("account_find");
        let result = sqlx::query_as::<_, AccountEntity>(
            r#"
            SELECT id, principal_id, username, full_name, email, role, is_active, created_at
            FROM user_accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map(|row| row.map(AccountEntity::into_domain))
            .map_err(map_db_err)
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserAccount>, DomainError> {
        let timer = QueryTimer::new("account_find_by_identifier");
        let result = sqlx::query_as::<_, AccountEntity>(
            r#"
            SELECT id, principal_id, username, full_name, email, role, is_active, created_at
            FROM user_accounts
            WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map(|row| row.map(AccountEntity::into_domain))
            .map_err(map_db_err)
    }

    async fn list(&self) -> Result<Vec<UserAccount>, DomainError> {
        let timer = QueryTimer::new("account_list");
        let result = sqlx::query_as::<_, AccountEntity>(
            r#"
            SELECT id, principal_id, username, full_name, email, role, is_active, created_at
            FROM user_accounts
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(|rows| rows.into_iter().map(AccountEntity::into_domain).collect())
            .map_err(map_db_err)
    }

    async fn list_active(&self) -> Result<Vec<UserAccount>, DomainError> {
        let timer = QueryTimer::new("account_list_active");
        let result = sqlx::query_as::<_, AccountEntity>(
            r#"
            SELECT id, principal_id, username, full_name, email, role, is_active, created_at
            FROM user_accounts
            WHERE is_active
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(|rows| rows.into_iter().map(AccountEntity::into_domain).collect())
            .map_err(map_db_err)
    }
}

/// In-memory account repository for tests.
#[derive(Default)]
pub struct MemAccountRepository {
    accounts: RwLock<HashMap<Uuid, UserAccount>>,
}

impl MemAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemAccountRepository {
    async fn insert(
        &self,
        principal_id: Uuid,
        username: &str,
        full_name: &str,
        email: &str,
        role: Role,
    ) -> Result<UserAccount, DomainError> {
        let mut accounts = self.accounts.write().await;
        if accounts
            .values()
            .any(|a| a.username.eq_ignore_ascii_case(username))
        {
            return Err(DomainError::conflict(format!(
                "Username {} already taken",
                username
            )));
        }
        if accounts
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(email))
        {
            return Err(DomainError::conflict(format!(
                "Email {} already registered",
                email
            )));
        }

        let account = UserAccount {
            id: Uuid::new_v4(),
            principal_id,
            username: username.to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update(
        &self,
        id: Uuid,
        input: &UpdateAccountInput,
    ) -> Result<UserAccount, DomainError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Account {}", id)))?;

        if let Some(full_name) = &input.full_name {
            account.full_name = full_name.clone();
        }
        if let Some(role) = input.role {
            account.role = role;
        }
        if let Some(is_active) = input.is_active {
            account.is_active = is_active;
        }
        Ok(account.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<UserAccount>, DomainError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserAccount>, DomainError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| {
                a.username.eq_ignore_ascii_case(identifier)
                    || a.email.eq_ignore_ascii_case(identifier)
            })
            .cloned())
    }

    async fn list(&self) -> Result<Vec<UserAccount>, DomainError> {
        let accounts = self.accounts.read().await;
        let mut result: Vec<UserAccount> = accounts.values().cloned().collect();
        result.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(result)
    }

    async fn list_active(&self) -> Result<Vec<UserAccount>, DomainError> {
        let accounts = self.accounts.read().await;
        let mut result: Vec<UserAccount> = accounts
            .values()
            .filter(|a| a.is_active)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(result)
    }
}

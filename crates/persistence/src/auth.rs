//! Auth provider collaborator.
//!
//! Holds principal credentials separately from staff account rows. Account
//! provisioning talks to this provider first and compensates by deleting
//! the principal when the account row cannot be persisted. Password
//! rotation is a privileged call reachable only through admin-gated
//! workflow operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::error::DomainError;
use shared::password::{hash_password, verify_password};

use crate::metrics::QueryTimer;
use crate::repositories::map_db_err;

/// External authentication collaborator.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Checks a password against the principal's stored credential.
    async fn verify_password(&self, principal_id: Uuid, password: &str)
        -> Result<bool, DomainError>;

    /// Provisions a principal; duplicate emails conflict.
    async fn create_principal(&self, email: &str, password: &str) -> Result<Uuid, DomainError>;

    /// Replaces a principal's credential. Privileged.
    async fn rotate_password(
        &self,
        principal_id: Uuid,
        new_password: &str,
    ) -> Result<(), DomainError>;

    /// Removes a principal. Idempotent, used as a compensating action.
    async fn delete_principal(&self, principal_id: Uuid) -> Result<(), DomainError>;
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PrincipalRow {
    #[allow(dead_code)]
    pub id: Uuid,
    pub password_hash: String,
    #[allow(dead_code)]
    pub created_at: DateTime<Utc>,
}

/// Principal credentials stored in Postgres.
#[derive(Clone)]
pub struct PgAuthProvider {
    pool: PgPool,
}

impl PgAuthProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthProvider for PgAuthProvider {
    async fn verify_password(
        &self,
        principal_id: Uuid,
        password: &str,
    ) -> Result<bool, DomainError> {
        let timer = QueryTimer::new("principal_find");
        let row = sqlx::query_as::<_, PrincipalRow>(
            "SELECT id, password_hash, created_at FROM auth_principals WHERE id = $1",
        )
        .bind(principal_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match row.map_err(map_db_err)? {
            Some(principal) => verify_password(password, &principal.password_hash)
                .map_err(|e| DomainError::external(format!("Password verification failed: {}", e))),
            None => Ok(false),
        }
    }

    async fn create_principal(&self, email: &str, password: &str) -> Result<Uuid, DomainError> {
        let hash = hash_password(password)
            .map_err(|e| DomainError::external(format!("Password hashing failed: {}", e)))?;

        let timer = QueryTimer::new("principal_create");
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO auth_principals (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(&hash)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        id.map_err(map_db_err)
    }

    async fn rotate_password(
        &self,
        principal_id: Uuid,
        new_password: &str,
    ) -> Result<(), DomainError> {
        let hash = hash_password(new_password)
            .map_err(|e| DomainError::external(format!("Password hashing failed: {}", e)))?;

        let timer = QueryTimer::new("principal_rotate_password");
        let result = sqlx::query("UPDATE auth_principals SET password_hash = $2 WHERE id = $1")
            .bind(principal_id)
            .bind(&hash)
            .execute(&self.pool)
            .await;
        timer.record();

        let result = result.map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Auth principal {}",
                principal_id
            )));
        }
        Ok(())
    }

    async fn delete_principal(&self, principal_id: Uuid) -> Result<(), DomainError> {
        let timer = QueryTimer::new("principal_delete");
        let result = sqlx::query("DELETE FROM auth_principals WHERE id = $1")
            .bind(principal_id)
            .execute(&self.pool)
            .await;
        timer.record();

        result.map_err(map_db_err).map(|_| ())
    }
}

#[derive(Clone)]
struct MemPrincipal {
    email: String,
    password_hash: String,
}

/// In-memory auth provider for tests, with injectable provisioning failure.
#[derive(Default)]
pub struct MemoryAuthProvider {
    principals: RwLock<HashMap<Uuid, MemPrincipal>>,
    fail_create: AtomicBool,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `create_principal` call fail.
    pub fn fail_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub async fn principal_count(&self) -> usize {
        self.principals.read().await.len()
    }

    pub async fn has_principal(&self, principal_id: Uuid) -> bool {
        self.principals.read().await.contains_key(&principal_id)
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn verify_password(
        &self,
        principal_id: Uuid,
        password: &str,
    ) -> Result<bool, DomainError> {
        let principals = self.principals.read().await;
        match principals.get(&principal_id) {
            Some(principal) => verify_password(password, &principal.password_hash)
                .map_err(|e| DomainError::external(format!("Password verification failed: {}", e))),
            None => Ok(false),
        }
    }

    async fn create_principal(&self, email: &str, password: &str) -> Result<Uuid, DomainError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(DomainError::external("Auth provider unavailable"));
        }

        let mut principals = self.principals.write().await;
        if principals.values().any(|p| p.email == email) {
            return Err(DomainError::conflict(format!(
                "Principal with email {} already exists",
                email
            )));
        }

        let hash = hash_password(password)
            .map_err(|e| DomainError::external(format!("Password hashing failed: {}", e)))?;
        let id = Uuid::new_v4();
        principals.insert(
            id,
            MemPrincipal {
                email: email.to_string(),
                password_hash: hash,
            },
        );
        Ok(id)
    }

    async fn rotate_password(
        &self,
        principal_id: Uuid,
        new_password: &str,
    ) -> Result<(), DomainError> {
        let mut principals = self.principals.write().await;
        let principal = principals.get_mut(&principal_id).ok_or_else(|| {
            DomainError::not_found(format!("Auth principal {}", principal_id))
        })?;
        principal.password_hash = hash_password(new_password)
            .map_err(|e| DomainError::external(format!("Password hashing failed: {}", e)))?;
        Ok(())
    }

    async fn delete_principal(&self, principal_id: Uuid) -> Result<(), DomainError> {
        self.principals.write().await.remove(&principal_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_verify_principal() {
        let provider = MemoryAuthProvider::new();
        let id = provider
            .create_principal("maria@ideiaprint.com.br", "senha-forte")
            .await
            .unwrap();

        assert!(provider.verify_password(id, "senha-forte").await.unwrap());
        assert!(!provider.verify_password(id, "senha-errada").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_principal_never_verifies() {
        let provider = MemoryAuthProvider::new();
        assert!(!provider
            .verify_password(Uuid::new_v4(), "qualquer")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let provider = MemoryAuthProvider::new();
        provider
            .create_principal("joao@ideiaprint.com.br", "abc12345")
            .await
            .unwrap();

        let result = provider
            .create_principal("joao@ideiaprint.com.br", "outra123")
            .await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_rotate_password_replaces_credential() {
        let provider = MemoryAuthProvider::new();
        let id = provider
            .create_principal("ana@ideiaprint.com.br", "antiga-123")
            .await
            .unwrap();

        provider.rotate_password(id, "nova-456").await.unwrap();

        assert!(!provider.verify_password(id, "antiga-123").await.unwrap());
        assert!(provider.verify_password(id, "nova-456").await.unwrap());
    }

    #[tokio::test]
    async fn test_rotate_password_for_unknown_principal_is_not_found() {
        let provider = MemoryAuthProvider::new();
        let result = provider.rotate_password(Uuid::new_v4(), "x").await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_principal_is_idempotent() {
        let provider = MemoryAuthProvider::new();
        let id = provider
            .create_principal("tmp@ideiaprint.com.br", "12345678")
            .await
            .unwrap();

        provider.delete_principal(id).await.unwrap();
        provider.delete_principal(id).await.unwrap();
        assert_eq!(provider.principal_count().await, 0);
    }

    #[tokio::test]
    async fn test_failure_injection_blocks_provisioning() {
        let provider = MemoryAuthProvider::new();
        provider.fail_creates(true);

        let result = provider
            .create_principal("x@ideiaprint.com.br", "12345678")
            .await;
        assert!(matches!(result, Err(DomainError::ExternalService(_))));
        assert_eq!(provider.principal_count().await, 0);
    }
}

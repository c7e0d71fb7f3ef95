//! Staff account entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{Role, UserAccount};

/// Database row mapping for the user_accounts table.
#[derive(Debug, Clone, FromRow)]
pub struct AccountEntity {
    pub id: Uuid,
    pub principal_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AccountEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> UserAccount {
        let role = self.role.parse::<Role>().unwrap_or(Role::Employee);

        UserAccount {
            id: self.id,
            principal_id: self.principal_id,
            username: self.username,
            full_name: self.full_name,
            email: self.email,
            role,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

impl From<AccountEntity> for UserAccount {
    fn from(entity: AccountEntity) -> Self {
        entity.into_domain()
    }
}

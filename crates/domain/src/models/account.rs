//! Staff account domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Staff role. Settings mutations require `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Employee => "EMPLOYEE",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "EMPLOYEE" => Ok(Role::Employee),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A staff member of the print shop.
///
/// Every account is backed by an external auth principal (`principal_id`).
/// The account row itself carries the profile and role; credentials live
/// with the auth collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: Uuid,
    /// External auth principal backing this account.
    pub principal_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Display name used when freezing authorship onto chat messages.
    ///
    /// Prefers the full name, falls back to the username, then to the local
    /// part of the email address.
    pub fn display_name(&self) -> String {
        let full = self.full_name.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        let username = self.username.trim();
        if !username.is_empty() {
            return username.to_string();
        }
        self.email
            .split('@')
            .next()
            .unwrap_or(self.email.as_str())
            .to_string()
    }
}

/// Input for provisioning a staff account (with its auth principal).
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Partial update of a staff account.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(full_name: &str, username: &str, email: &str) -> UserAccount {
        UserAccount {
            id: Uuid::new_v4(),
            principal_id: Uuid::new_v4(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            role: Role::Employee,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("Employee").unwrap(), Role::Employee);
        assert!(Role::from_str("gerente").is_err());

        assert_eq!(Role::Admin.to_string(), "ADMIN");
        assert_eq!(Role::Employee.to_string(), "EMPLOYEE");
    }

    #[test]
    fn test_role_serializes_screaming() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(
            serde_json::to_string(&Role::Employee).unwrap(),
            "\"EMPLOYEE\""
        );
    }

    #[test]
    fn test_is_admin() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Employee.is_admin());
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let acc = account("Maria Souza", "maria", "maria@ideiaprint.com.br");
        assert_eq!(acc.display_name(), "Maria Souza");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let acc = account("   ", "maria", "maria@ideiaprint.com.br");
        assert_eq!(acc.display_name(), "maria");
    }

    #[test]
    fn test_display_name_falls_back_to_email_local_part() {
        let acc = account("", "  ", "maria.souza@ideiaprint.com.br");
        assert_eq!(acc.display_name(), "maria.souza");
    }

    #[test]
    fn test_account_serializes_camel_case() {
        let acc = account("Maria Souza", "maria", "maria@ideiaprint.com.br");
        let json = serde_json::to_string(&acc).unwrap();
        assert!(json.contains("principalId"));
        assert!(json.contains("fullName"));
        assert!(json.contains("isActive"));
        assert!(json.contains("createdAt"));
    }
}

//! Row-store collaborators, one trait per collection.
//!
//! Each trait has a Postgres implementation (`Pg*`, backed by sqlx and the
//! shared pool) and an in-memory implementation (`Mem*`, backed by
//! `tokio::sync::RwLock`) used by the workflow tests. Both publish committed
//! mutations of watched collections to the change feed.

pub mod accounts;
pub mod chat;
pub mod clients;
pub mod followers;
pub mod notifications;
pub mod order_files;
pub mod orders;
pub mod statuses;

pub use accounts::{AccountRepository, MemAccountRepository, PgAccountRepository};
pub use chat::{ChatRepository, MemChatRepository, PgChatRepository};
pub use clients::{ClientRepository, MemClientRepository, PgClientRepository};
pub use followers::{FollowerRepository, MemFollowerRepository, PgFollowerRepository};
pub use notifications::{
    MemNotificationRepository, NotificationRepository, PgNotificationRepository,
};
pub use order_files::{MemOrderFileRepository, OrderFileRepository, PgOrderFileRepository};
pub use orders::{MemOrderRepository, OrderRepository, PgOrderRepository};
pub use statuses::{MemStatusRepository, PgStatusRepository, StatusRepository};

use domain::error::DomainError;

/// Maps a sqlx failure onto the domain taxonomy.
///
/// Unique violations (23505) surface as conflicts, foreign-key violations
/// (23503) as missing referents; everything else is an external-service
/// failure.
pub(crate) fn map_db_err(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::RowNotFound => DomainError::not_found("Row not found"),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("23505") => DomainError::conflict(db.message().to_string()),
            Some("23503") => DomainError::not_found(db.message().to_string()),
            _ => DomainError::external(err.to_string()),
        },
        _ => DomainError::external(err.to_string()),
    }
}

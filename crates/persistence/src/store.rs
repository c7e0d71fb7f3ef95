//! Aggregate handle over every persistence collaborator.
//!
//! Handlers and workflow services receive one `Store` and reach collections
//! through its fields. Fields are trait objects so tests can swap any single
//! collaborator (a failing blob store, for instance) before wiring the app.

use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::{AuthProvider, MemoryAuthProvider, PgAuthProvider};
use crate::blob::{BlobStore, FsBlobStore, MemoryBlobStore};
use crate::events::ChangeHub;
use crate::repositories::{
    AccountRepository, ChatRepository, ClientRepository, FollowerRepository,
    MemAccountRepository, MemChatRepository, MemClientRepository, MemFollowerRepository,
    MemNotificationRepository, MemOrderFileRepository, MemOrderRepository, MemStatusRepository,
    NotificationRepository, OrderFileRepository, OrderRepository, PgAccountRepository,
    PgChatRepository, PgClientRepository, PgFollowerRepository, PgNotificationRepository,
    PgOrderFileRepository, PgOrderRepository, PgStatusRepository, StatusRepository,
};

/// All persistence collaborators behind one handle.
#[derive(Clone)]
pub struct Store {
    pub accounts: Arc<dyn AccountRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub statuses: Arc<dyn StatusRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub order_files: Arc<dyn OrderFileRepository>,
    pub chat: Arc<dyn ChatRepository>,
    pub followers: Arc<dyn FollowerRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub auth: Arc<dyn AuthProvider>,
    pub blobs: Arc<dyn BlobStore>,
    pub hub: Arc<ChangeHub>,
}

impl Store {
    /// Production wiring over a Postgres pool and a filesystem blob root.
    pub fn postgres(pool: PgPool, blob_root: impl Into<PathBuf>) -> Self {
        let hub = Arc::new(ChangeHub::new());
        Self {
            accounts: Arc::new(PgAccountRepository::new(pool.clone())),
            clients: Arc::new(PgClientRepository::new(pool.clone())),
            statuses: Arc::new(PgStatusRepository::new(pool.clone())),
            orders: Arc::new(PgOrderRepository::new(pool.clone(), hub.clone())),
            order_files: Arc::new(PgOrderFileRepository::new(pool.clone())),
            chat: Arc::new(PgChatRepository::new(pool.clone(), hub.clone())),
            followers: Arc::new(PgFollowerRepository::new(pool.clone(), hub.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool.clone(), hub.clone())),
            auth: Arc::new(PgAuthProvider::new(pool)),
            blobs: Arc::new(FsBlobStore::new(blob_root)),
            hub,
        }
    }

    /// Fully in-memory wiring with the seeded status board. Used by tests
    /// and local development without a database.
    pub fn in_memory() -> Self {
        let hub = Arc::new(ChangeHub::new());
        Self {
            accounts: Arc::new(MemAccountRepository::new()),
            clients: Arc::new(MemClientRepository::new()),
            statuses: Arc::new(MemStatusRepository::seeded()),
            orders: Arc::new(MemOrderRepository::new(hub.clone())),
            order_files: Arc::new(MemOrderFileRepository::new()),
            chat: Arc::new(MemChatRepository::new(hub.clone())),
            followers: Arc::new(MemFollowerRepository::new(hub.clone())),
            notifications: Arc::new(MemNotificationRepository::new(hub.clone())),
            auth: Arc::new(MemoryAuthProvider::new()),
            blobs: Arc::new(MemoryBlobStore::new()),
            hub,
        }
    }
}

//! Workflow services sitting between the HTTP routes and the store.

pub mod auth;
pub mod bootstrap;
pub mod chat;
pub mod files;
pub mod followers;
pub mod notifications;
pub mod orders;
pub mod settings;

pub use auth::{AuthError, AuthService};
pub use chat::ChatService;
pub use files::FileService;
pub use followers::FollowerService;
pub use notifications::NotificationService;
pub use orders::OrderService;
pub use settings::SettingsService;

//! Database entity types (row mappings).
//!
//! Entities mirror table rows and convert into domain models via
//! `into_domain`. Enum columns are stored as text and parsed leniently so
//! unknown values degrade to a default instead of failing the whole query.

pub mod account;
pub mod chat;
pub mod client;
pub mod follower;
pub mod notification;
pub mod order;
pub mod order_file;
pub mod status;

pub use account::AccountEntity;
pub use chat::{ChatMessageEntity, MessageAttachmentEntity};
pub use client::ClientEntity;
pub use follower::FollowerEntity;
pub use notification::NotificationEntity;
pub use order::{OrderEntity, StatusChangeEntity};
pub use order_file::OrderFileEntity;
pub use status::StatusEntity;

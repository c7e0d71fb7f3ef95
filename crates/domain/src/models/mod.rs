//! Domain models for the Ideia Print back-office.

pub mod account;
pub mod chat;
pub mod client;
pub mod follower;
pub mod notification;
pub mod order;
pub mod order_file;
pub mod status;

pub use account::{CreateAccountInput, Role, UpdateAccountInput, UserAccount};
pub use chat::{AttachmentOutcome, AttachmentUpload, ChatMessage, MessageAttachment};
pub use client::{Client, CreateClientInput, UpdateClientInput};
pub use follower::OrderFollower;
pub use notification::{Notification, NotificationKind};
pub use order::{CreateOrderInput, Order, StatusChange, UpdateOrderInput, STATUS_FIELD};
pub use order_file::{FileCategory, OrderFile};
pub use status::{CreateStatusInput, OrderStatus, UpdateStatusInput};

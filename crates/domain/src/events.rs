//! Tagged change-feed events.
//!
//! Every committed mutation of a watched collection is published as one of
//! these variants. Each variant pairs a change kind with the full record of
//! its collection, so subscribers always receive a schema-checked shape
//! instead of an untyped payload. Delete events carry the record as it was
//! before removal.

use serde::Serialize;
use uuid::Uuid;

use crate::models::{ChatMessage, MessageAttachment, Notification, Order, OrderFollower};

/// Kind of change applied to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A committed change to one record of a watched collection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "collection", rename_all = "snake_case")]
pub enum ChangeEvent {
    Orders {
        kind: ChangeKind,
        record: Order,
    },
    ChatMessages {
        kind: ChangeKind,
        record: ChatMessage,
    },
    MessageAttachments {
        kind: ChangeKind,
        record: MessageAttachment,
    },
    OrderFollowers {
        kind: ChangeKind,
        record: OrderFollower,
    },
    Notifications {
        kind: ChangeKind,
        record: Notification,
    },
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Orders { kind, .. }
            | ChangeEvent::ChatMessages { kind, .. }
            | ChangeEvent::MessageAttachments { kind, .. }
            | ChangeEvent::OrderFollowers { kind, .. }
            | ChangeEvent::Notifications { kind, .. } => *kind,
        }
    }

    /// Order the event belongs to, when the collection is order-scoped.
    ///
    /// Attachment events carry no order id of their own; subscribers filter
    /// those by `message_id` against messages they already hold.
    pub fn order_id(&self) -> Option<Uuid> {
        match self {
            ChangeEvent::Orders { record, .. } => Some(record.id),
            ChangeEvent::ChatMessages { record, .. } => Some(record.order_id),
            ChangeEvent::OrderFollowers { record, .. } => Some(record.order_id),
            ChangeEvent::Notifications { record, .. } => Some(record.order_id),
            ChangeEvent::MessageAttachments { .. } => None,
        }
    }

    /// User the event targets, for user-scoped collections.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            ChangeEvent::Notifications { record, .. } => Some(record.user_id),
            ChangeEvent::OrderFollowers { record, .. } => Some(record.user_id),
            _ => None,
        }
    }
}

//! Chat message and attachment entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{ChatMessage, MessageAttachment};

/// Database row mapping for the chat_messages table.
///
/// Sender name and email are denormalized at insert time so transcripts
/// keep their original byline after accounts change.
#[derive(Debug, Clone, FromRow)]
pub struct ChatMessageEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_edited: bool,
}

impl ChatMessageEntity {
    /// Convert to domain model, attaching the message's files.
    pub fn into_domain(self, attachments: Vec<MessageAttachment>) -> ChatMessage {
        ChatMessage {
            id: self.id,
            order_id: self.order_id,
            user_id: self.user_id,
            user_name: self.user_name,
            user_email: self.user_email,
            message: self.message,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_edited: self.is_edited,
            attachments,
        }
    }
}

/// Database row mapping for the message_attachments table.
#[derive(Debug, Clone, FromRow)]
pub struct MessageAttachmentEntity {
    pub id: Uuid,
    pub message_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
}

impl MessageAttachmentEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> MessageAttachment {
        MessageAttachment {
            id: self.id,
            message_id: self.message_id,
            file_name: self.file_name,
            file_path: self.file_path,
            file_size: self.file_size,
            file_type: self.file_type,
            created_at: self.created_at,
        }
    }
}

impl From<MessageAttachmentEntity> for MessageAttachment {
    fn from(entity: MessageAttachmentEntity) -> Self {
        entity.into_domain()
    }
}

//! Per-order chat domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry of an order's append-only message stream.
///
/// `user_name` and `user_email` are frozen at send time so later profile
/// changes never rewrite history. Messages are displayed ascending by
/// `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_edited: bool,
    pub attachments: Vec<MessageAttachment>,
}

/// A blob attached to a chat message.
///
/// Owned exclusively by its message; removed when the message is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAttachment {
    pub id: Uuid,
    pub message_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
}

/// A file handed to `post_message` for upload.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Per-file result of a multi-attachment upload.
///
/// A failed file never blocks or rolls back its siblings or the message;
/// callers receive one outcome per submitted file.
#[derive(Debug, Clone)]
pub enum AttachmentOutcome {
    Uploaded(MessageAttachment),
    Failed { file_name: String, reason: String },
}

impl AttachmentOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, AttachmentOutcome::Uploaded(_))
    }

    pub fn file_name(&self) -> &str {
        match self {
            AttachmentOutcome::Uploaded(a) => &a.file_name,
            AttachmentOutcome::Failed { file_name, .. } => file_name,
        }
    }
}

//! Chat message repository.
//!
//! Messages are an append-only stream per order. Attachment rows are owned
//! exclusively by their message; deleting a message removes its attachments
//! in the same transaction and returns the removed rows so the workflow
//! layer can clean up blobs.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::error::DomainError;
use domain::events::{ChangeEvent, ChangeKind};
use domain::models::{ChatMessage, MessageAttachment};

use crate::entities::{ChatMessageEntity, MessageAttachmentEntity};
use crate::events::ChangeHub;
use crate::metrics::QueryTimer;
use crate::repositories::map_db_err;

/// Repository for per-order chat messages and their attachments.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Appends a message. Sender display fields are frozen as given.
    async fn insert_message(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        user_name: &str,
        user_email: &str,
        message: &str,
    ) -> Result<ChatMessage, DomainError>;

    /// Rewrites a message's text and marks it edited.
    async fn update_message(&self, id: Uuid, message: &str) -> Result<ChatMessage, DomainError>;

    /// Records an attachment under an existing message.
    async fn insert_attachment(
        &self,
        message_id: Uuid,
        file_name: &str,
        file_path: &str,
        file_size: i64,
        file_type: &str,
    ) -> Result<MessageAttachment, DomainError>;

    async fn find_message(&self, id: Uuid) -> Result<Option<ChatMessage>, DomainError>;

    /// Transcript of an order, oldest first, attachments included.
    async fn list_for_order(&self, order_id: Uuid) -> Result<Vec<ChatMessage>, DomainError>;

    /// Deletes a message and its attachment rows, returning the removed
    /// attachments for blob cleanup.
    async fn delete_message(&self, id: Uuid) -> Result<Vec<MessageAttachment>, DomainError>;
}

/// Postgres-backed chat repository.
#[derive(Clone)]
pub struct PgChatRepository {
    pool: PgPool,
    hub: Arc<ChangeHub>,
}

impl PgChatRepository {
    pub fn new(pool: PgPool, hub: Arc<ChangeHub>) -> Self {
        Self { pool, hub }
    }

    async fn attachments_of(&self, message_id: Uuid) -> Result<Vec<MessageAttachment>, DomainError> {
        let result = sqlx::query_as::<_, MessageAttachmentEntity>(
            r#"
            SELECT id, message_id, file_name, file_path, file_size, file_type, created_at
            FROM message_attachments
            WHERE message_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await;

        result
            .map(|rows| {
                rows.into_iter()
                    .map(MessageAttachmentEntity::into_domain)
                    .collect()
            })
            .map_err(map_db_err)
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn insert_message(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        user_name: &str,
        user_email: &str,
        message: &str,
    ) -> Result<ChatMessage, DomainError> {
        let timer = QueryTimer::new("chat_message_insert");
        let result = sqlx::query_as::<_, ChatMessageEntity>(
            r#"
            INSERT INTO chat_messages (id, order_id, user_id, user_name, user_email, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, order_id, user_id, user_name, user_email, message,
                      created_at, updated_at, is_edited
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(user_id)
        .bind(user_name)
        .bind(user_email)
        .bind(message)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        let message = result
            .map(|row| row.into_domain(Vec::new()))
            .map_err(map_db_err)?;
        self.hub.publish(ChangeEvent::ChatMessages {
            kind: ChangeKind::Insert,
            record: message.clone(),
        });
        Ok(message)
    }

    async fn update_message(&self, id: Uuid, message: &str) -> Result<ChatMessage, DomainError> {
        let timer = QueryTimer::new("chat_message_update");
        let result = sqlx::query_as::<_, ChatMessageEntity>(
            r#"
            UPDATE chat_messages
            SET message = $2, is_edited = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING id, order_id, user_id, user_name, user_email, message,
                      created_at, updated_at, is_edited
            "#,
        )
        .bind(id)
        .bind(message)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        let row = result.map_err(map_db_err)?;
        let attachments = self.attachments_of(row.id).await?;
        let message = row.into_domain(attachments);
        self.hub.publish(ChangeEvent::ChatMessages {
            kind: ChangeKind::Update,
            record: message.clone(),
        });
        Ok(message)
    }

    async fn insert_attachment(
        &self,
        message_id: Uuid,
        file_name: &str,
        file_path: &str,
        file_size: i64,
        file_type: &str,
    ) -> Result<MessageAttachment, DomainError> {
        let timer = QueryTimer::new("message_attachment_insert");
        let result = sqlx::query_as::<_, MessageAttachmentEntity>(
            r#"
            INSERT INTO message_attachments (id, message_id, file_name, file_path,
                                             file_size, file_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, message_id, file_name, file_path, file_size, file_type, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message_id)
        .bind(file_name)
        .bind(file_path)
        .bind(file_size)
        .bind(file_type)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        let attachment = result
            .map(MessageAttachmentEntity::into_domain)
            .map_err(map_db_err)?;
        self.hub.publish(ChangeEvent::MessageAttachments {
            kind: ChangeKind::Insert,
            record: attachment.clone(),
        });
        Ok(attachment)
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<ChatMessage>, DomainError> {
        let timer = QueryTimer::new("chat_message_find");
        let result = sqlx::query_as::<_, ChatMessageEntity>(
            r#"
            SELECT id, order_id, user_id, user_name, user_email, message,
                   created_at, updated_at, is_edited
            FROM chat_messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match result.map_err(map_db_err)? {
            Some(row) => {
                let attachments = self.attachments_of(row.id).await?;
                Ok(Some(row.into_domain(attachments)))
            }
            None => Ok(None),
        }
    }

    async fn list_for_order(&self, order_id: Uuid) -> Result<Vec<ChatMessage>, DomainError> {
        let timer = QueryTimer::new("chat_message_list_for_order");
        let messages = sqlx::query_as::<_, ChatMessageEntity>(
            r#"
            SELECT id, order_id, user_id, user_name, user_email, message,
                   created_at, updated_at, is_edited
            FROM chat_messages
            WHERE order_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await;

        let attachments = sqlx::query_as::<_, MessageAttachmentEntity>(
            r#"
            SELECT ma.id, ma.message_id, ma.file_name, ma.file_path, ma.file_size,
                   ma.file_type, ma.created_at
            FROM message_attachments ma
            JOIN chat_messages cm ON cm.id = ma.message_id
            WHERE cm.order_id = $1
            ORDER BY ma.created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        let messages = messages.map_err(map_db_err)?;
        let attachments = attachments.map_err(map_db_err)?;

        let mut grouped: HashMap<Uuid, Vec<MessageAttachment>> = HashMap::new();
        for attachment in attachments {
            grouped
                .entry(attachment.message_id)
                .or_default()
                .push(attachment.into_domain());
        }

        Ok(messages
            .into_iter()
            .map(|row| {
                let attached = grouped.remove(&row.id).unwrap_or_default();
                row.into_domain(attached)
            })
            .collect())
    }

    async fn delete_message(&self, id: Uuid) -> Result<Vec<MessageAttachment>, DomainError> {
        let timer = QueryTimer::new("chat_message_delete");
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let message = sqlx::query_as::<_, ChatMessageEntity>(
            r#"
            SELECT id, order_id, user_id, user_name, user_email, message,
                   created_at, updated_at, is_edited
            FROM chat_messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| DomainError::not_found(format!("Message {}", id)))?;

        let removed = sqlx::query_as::<_, MessageAttachmentEntity>(
            r#"
            DELETE FROM message_attachments
            WHERE message_id = $1
            RETURNING id, message_id, file_name, file_path, file_size, file_type, created_at
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_db_err)?;

        sqlx::query("DELETE FROM chat_messages WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        timer.record();

        let removed: Vec<MessageAttachment> = removed
            .into_iter()
            .map(MessageAttachmentEntity::into_domain)
            .collect();

        for attachment in &removed {
            self.hub.publish(ChangeEvent::MessageAttachments {
                kind: ChangeKind::Delete,
                record: attachment.clone(),
            });
        }
        self.hub.publish(ChangeEvent::ChatMessages {
            kind: ChangeKind::Delete,
            record: message.into_domain(removed.clone()),
        });
        Ok(removed)
    }
}

/// In-memory chat repository for tests, with injectable attachment failure.
pub struct MemChatRepository {
    messages: RwLock<HashMap<Uuid, ChatMessage>>,
    fail_attachment_insert: AtomicBool,
    hub: Arc<ChangeHub>,
}

impl MemChatRepository {
    pub fn new(hub: Arc<ChangeHub>) -> Self {
        Self {
            messages: RwLock::new(HashMap::new()),
            fail_attachment_insert: AtomicBool::new(false),
            hub,
        }
    }

    /// Makes every subsequent `insert_attachment` call fail.
    pub fn fail_attachment_inserts(&self, fail: bool) {
        self.fail_attachment_insert.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatRepository for MemChatRepository {
    async fn insert_message(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        user_name: &str,
        user_email: &str,
        message: &str,
    ) -> Result<ChatMessage, DomainError> {
        let now = Utc::now();
        let message = ChatMessage {
            id: Uuid::new_v4(),
            order_id,
            user_id,
            user_name: user_name.to_string(),
            user_email: user_email.to_string(),
            message: message.to_string(),
            created_at: now,
            updated_at: now,
            is_edited: false,
            attachments: Vec::new(),
        };
        self.messages
            .write()
            .await
            .insert(message.id, message.clone());
        self.hub.publish(ChangeEvent::ChatMessages {
            kind: ChangeKind::Insert,
            record: message.clone(),
        });
        Ok(message)
    }

    async fn update_message(&self, id: Uuid, text: &str) -> Result<ChatMessage, DomainError> {
        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Message {}", id)))?;
        message.message = text.to_string();
        message.is_edited = true;
        message.updated_at = Utc::now();

        let message = message.clone();
        drop(messages);
        self.hub.publish(ChangeEvent::ChatMessages {
            kind: ChangeKind::Update,
            record: message.clone(),
        });
        Ok(message)
    }

    async fn insert_attachment(
        &self,
        message_id: Uuid,
        file_name: &str,
        file_path: &str,
        file_size: i64,
        file_type: &str,
    ) -> Result<MessageAttachment, DomainError> {
        if self.fail_attachment_insert.load(Ordering::SeqCst) {
            return Err(DomainError::external("Attachment insert unavailable"));
        }

        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(&message_id)
            .ok_or_else(|| DomainError::not_found(format!("Message {}", message_id)))?;

        let attachment = MessageAttachment {
            id: Uuid::new_v4(),
            message_id,
            file_name: file_name.to_string(),
            file_path: file_path.to_string(),
            file_size,
            file_type: file_type.to_string(),
            created_at: Utc::now(),
        };
        message.attachments.push(attachment.clone());
        drop(messages);

        self.hub.publish(ChangeEvent::MessageAttachments {
            kind: ChangeKind::Insert,
            record: attachment.clone(),
        });
        Ok(attachment)
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<ChatMessage>, DomainError> {
        Ok(self.messages.read().await.get(&id).cloned())
    }

    async fn list_for_order(&self, order_id: Uuid) -> Result<Vec<ChatMessage>, DomainError> {
        let messages = self.messages.read().await;
        let mut result: Vec<ChatMessage> = messages
            .values()
            .filter(|m| m.order_id == order_id)
            .cloned()
            .collect();
        result.sort_by_key(|m| m.created_at);
        Ok(result)
    }

    async fn delete_message(&self, id: Uuid) -> Result<Vec<MessageAttachment>, DomainError> {
        let message = self
            .messages
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| DomainError::not_found(format!("Message {}", id)))?;

        for attachment in &message.attachments {
            self.hub.publish(ChangeEvent::MessageAttachments {
                kind: ChangeKind::Delete,
                record: attachment.clone(),
            });
        }
        let removed = message.attachments.clone();
        self.hub.publish(ChangeEvent::ChatMessages {
            kind: ChangeKind::Delete,
            record: message,
        });
        Ok(removed)
    }
}

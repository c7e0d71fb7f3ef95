use std::collections::HashSet;
use std::sync::Arc;

use persistence::blob::{attachment_path, BlobStore};
use persistence::repositories::ChatRepository;
use persistence::store::Store;
use tokio::task::JoinSet;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{
    AttachmentOutcome, AttachmentUpload, ChatMessage, NotificationKind, UserAccount,
};
use domain::services::mentions::extract_mentions;

use crate::middleware::metrics::{
    record_attachment_outcome, record_message_posted, record_notifications_fanned_out,
};

/// Result of posting a message: the stored message plus the per-file
/// upload outcomes. A failed file never fails the message.
#[derive(Debug)]
pub struct PostedMessage {
    pub message: ChatMessage,
    pub outcomes: Vec<AttachmentOutcome>,
}

/// Per-order chat: posting with attachments, edits, deletion, and the
/// mention and follower notification fan-out.
pub struct ChatService {
    store: Store,
}

impl ChatService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn post_message(
        &self,
        order_id: Uuid,
        actor: &UserAccount,
        text: &str,
        files: Vec<AttachmentUpload>,
    ) -> Result<PostedMessage, DomainError> {
        if text.trim().is_empty() && files.is_empty() {
            return Err(DomainError::validation(
                "Message text or at least one file is required",
            ));
        }
        if self.store.orders.find(order_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Order {order_id} not found")));
        }

        let mut message = self
            .store
            .chat
            .insert_message(order_id, actor.id, &actor.display_name(), &actor.email, text)
            .await?;

        let outcomes = self.upload_attachments(order_id, message.id, files).await;
        for outcome in &outcomes {
            record_attachment_outcome(outcome.is_uploaded());
            if let AttachmentOutcome::Uploaded(attachment) = outcome {
                message.attachments.push(attachment.clone());
            }
        }

        self.fan_out(order_id, message.id, actor, text).await;
        record_message_posted();
        Ok(PostedMessage { message, outcomes })
    }

    /// Stores each file concurrently. Outcomes come back in the order
    /// the files were submitted.
    async fn upload_attachments(
        &self,
        order_id: Uuid,
        message_id: Uuid,
        files: Vec<AttachmentUpload>,
    ) -> Vec<AttachmentOutcome> {
        let mut tasks = JoinSet::new();
        for (index, upload) in files.into_iter().enumerate() {
            let blobs = Arc::clone(&self.store.blobs);
            let chat = Arc::clone(&self.store.chat);
            tasks.spawn(async move {
                let outcome =
                    store_one_attachment(blobs, chat, order_id, message_id, upload).await;
                (index, outcome)
            });
        }

        let mut indexed = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(pair) => indexed.push(pair),
                Err(e) => tracing::error!(error = %e, "Attachment upload task panicked"),
            }
        }
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }

    /// Creates notifications for the posted message. Mentioned active
    /// users get a mention notification whether or not they follow the
    /// order; remaining followers with notifications enabled get a
    /// new-message one. The author is never notified, and nobody gets
    /// both kinds for a single message.
    async fn fan_out(&self, order_id: Uuid, message_id: Uuid, actor: &UserAccount, text: &str) {
        let mentions = extract_mentions(text);
        let mut mentioned_ids: HashSet<Uuid> = HashSet::new();

        if !mentions.is_empty() {
            match self.store.accounts.list_active().await {
                Ok(roster) => {
                    for account in roster {
                        if account.id != actor.id
                            && mentions.iter().any(|m| m == &account.username)
                        {
                            mentioned_ids.insert(account.id);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Mention roster unavailable, skipping mention fan-out")
                }
            }
        }

        let mut mention_count = 0u64;
        for user_id in &mentioned_ids {
            match self
                .store
                .notifications
                .insert(*user_id, order_id, message_id, NotificationKind::Mention)
                .await
            {
                Ok(_) => mention_count += 1,
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Mention notification failed")
                }
            }
        }

        let mut follower_count = 0u64;
        match self.store.followers.list_for_order(order_id).await {
            Ok(followers) => {
                for follower in followers {
                    if !follower.notifications_enabled
                        || follower.user_id == actor.id
                        || mentioned_ids.contains(&follower.user_id)
                    {
                        continue;
                    }
                    match self
                        .store
                        .notifications
                        .insert(
                            follower.user_id,
                            order_id,
                            message_id,
                            NotificationKind::NewMessage,
                        )
                        .await
                    {
                        Ok(_) => follower_count += 1,
                        Err(e) => {
                            tracing::warn!(user_id = %follower.user_id, error = %e, "Follower notification failed")
                        }
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "Follower list unavailable, skipping fan-out"),
        }

        record_notifications_fanned_out("mention", mention_count);
        record_notifications_fanned_out("new_message", follower_count);
    }

    pub async fn update_message(
        &self,
        message_id: Uuid,
        actor: &UserAccount,
        text: &str,
    ) -> Result<ChatMessage, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("Message text is required"));
        }
        let message = self
            .store
            .chat
            .find_message(message_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Message {message_id} not found")))?;
        if message.user_id != actor.id {
            return Err(DomainError::forbidden("Only the author can edit a message"));
        }
        self.store.chat.update_message(message_id, text).await
    }

    /// Deletes a message with its attachment rows, then removes the
    /// blobs. A blob that refuses to go is logged and left behind; the
    /// metadata is already gone.
    pub async fn delete_message(
        &self,
        message_id: Uuid,
        actor: &UserAccount,
    ) -> Result<(), DomainError> {
        let message = self
            .store
            .chat
            .find_message(message_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Message {message_id} not found")))?;
        if message.user_id != actor.id {
            return Err(DomainError::forbidden(
                "Only the author can delete a message",
            ));
        }

        let removed = self.store.chat.delete_message(message_id).await?;
        for attachment in removed {
            if let Err(e) = self.store.blobs.delete(&attachment.file_path).await {
                tracing::warn!(
                    path = %attachment.file_path,
                    error = %e,
                    "Attachment blob not removed after message deletion"
                );
            }
        }
        Ok(())
    }

    pub async fn transcript(&self, order_id: Uuid) -> Result<Vec<ChatMessage>, DomainError> {
        if self.store.orders.find(order_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Order {order_id} not found")));
        }
        self.store.chat.list_for_order(order_id).await
    }
}

async fn store_one_attachment(
    blobs: Arc<dyn BlobStore>,
    chat: Arc<dyn ChatRepository>,
    order_id: Uuid,
    message_id: Uuid,
    upload: AttachmentUpload,
) -> AttachmentOutcome {
    let path = attachment_path(order_id, message_id, &upload.file_name);
    let size = upload.bytes.len() as i64;

    if let Err(e) = blobs.store(&path, &upload.bytes).await {
        return AttachmentOutcome::Failed {
            file_name: upload.file_name,
            reason: e.to_string(),
        };
    }

    let file_type = upload.content_type.clone().unwrap_or_else(|| {
        mime_guess::from_path(&upload.file_name)
            .first_or_octet_stream()
            .to_string()
    });

    match chat
        .insert_attachment(message_id, &upload.file_name, &path, size, &file_type)
        .await
    {
        Ok(attachment) => AttachmentOutcome::Uploaded(attachment),
        Err(e) => {
            // Metadata failed, so the stored blob must not leak.
            if let Err(cleanup) = blobs.delete(&path).await {
                tracing::warn!(path = %path, error = %cleanup, "Orphan blob left after metadata failure");
            }
            AttachmentOutcome::Failed {
                file_name: upload.file_name,
                reason: e.to_string(),
            }
        }
    }
}

//! Local projection of one order's chat, reconciled from the change feed.
//!
//! The projection is a read-through cache, never the source of truth. It
//! merges tagged change events into an ordered message list and handles the
//! feed's ordering caveat: a message insert and its attachment inserts
//! arrive as independent events, in either order. Attachments are always
//! upserted by id, so replayed or duplicated events collapse instead of
//! appending twice.

use std::collections::HashMap;
use std::collections::HashSet;
use uuid::Uuid;

use crate::events::{ChangeEvent, ChangeKind};
use crate::models::{ChatMessage, MessageAttachment};

/// Reconciled view of one order's message stream.
#[derive(Debug)]
pub struct ChatProjection {
    order_id: Uuid,
    /// Ascending by `created_at`.
    messages: Vec<ChatMessage>,
    /// Ids of locally appended messages not yet confirmed by the feed.
    optimistic: HashSet<Uuid>,
    /// Attachments whose message has not arrived yet, keyed by message id.
    early_attachments: HashMap<Uuid, Vec<MessageAttachment>>,
}

impl ChatProjection {
    pub fn new(order_id: Uuid) -> Self {
        Self {
            order_id,
            messages: Vec::new(),
            optimistic: HashSet::new(),
            early_attachments: HashMap::new(),
        }
    }

    /// Replaces the projection contents with an initial load.
    pub fn hydrate(&mut self, mut messages: Vec<ChatMessage>) {
        messages.retain(|m| m.order_id == self.order_id);
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        self.messages = messages;
        self.optimistic.clear();
        self.early_attachments.clear();
    }

    /// Appends a just-sent message before its insert is confirmed.
    ///
    /// If the insert later fails, `rollback` removes the copy; if the feed
    /// confirms it, the server record replaces the local one by id.
    pub fn optimistic_append(&mut self, message: ChatMessage) {
        if message.order_id != self.order_id || self.position_of(message.id).is_some() {
            return;
        }
        self.optimistic.insert(message.id);
        self.insert_sorted(message);
    }

    /// Removes a still-unconfirmed optimistic append after a failed insert.
    pub fn rollback(&mut self, message_id: Uuid) {
        if self.optimistic.remove(&message_id) {
            self.messages.retain(|m| m.id != message_id);
            self.early_attachments.remove(&message_id);
        }
    }

    /// Merges one change event into the projection.
    pub fn apply(&mut self, event: &ChangeEvent) {
        match event {
            ChangeEvent::ChatMessages { kind, record } => {
                if record.order_id != self.order_id {
                    return;
                }
                match kind {
                    ChangeKind::Insert | ChangeKind::Update => self.upsert_message(record.clone()),
                    ChangeKind::Delete => self.remove_message(record.id),
                }
            }
            ChangeEvent::MessageAttachments { kind, record } => match kind {
                ChangeKind::Insert | ChangeKind::Update => self.upsert_attachment(record.clone()),
                ChangeKind::Delete => self.remove_attachment(record),
            },
            // Other collections do not shape the chat view.
            _ => {}
        }
    }

    /// Messages in display order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of attachments waiting for their message to arrive.
    pub fn early_attachment_count(&self) -> usize {
        self.early_attachments.values().map(Vec::len).sum()
    }

    fn position_of(&self, message_id: Uuid) -> Option<usize> {
        self.messages.iter().position(|m| m.id == message_id)
    }

    fn insert_sorted(&mut self, message: ChatMessage) {
        let at = self
            .messages
            .partition_point(|m| m.created_at <= message.created_at);
        self.messages.insert(at, message);
    }

    fn upsert_message(&mut self, mut incoming: ChatMessage) {
        // Attachments that raced ahead of the message.
        if let Some(early) = self.early_attachments.remove(&incoming.id) {
            for attachment in early {
                upsert_by_id(&mut incoming.attachments, attachment);
            }
        }

        match self.position_of(incoming.id) {
            Some(at) => {
                // Reconcile by id: the server record wins, but attachments
                // already merged locally are kept rather than dropped.
                let existing = self.messages.remove(at);
                for attachment in existing.attachments {
                    if !incoming.attachments.iter().any(|a| a.id == attachment.id) {
                        incoming.attachments.push(attachment);
                    }
                }
                self.optimistic.remove(&incoming.id);
                self.insert_sorted(incoming);
            }
            None => self.insert_sorted(incoming),
        }
    }

    fn remove_message(&mut self, message_id: Uuid) {
        self.messages.retain(|m| m.id != message_id);
        self.optimistic.remove(&message_id);
        self.early_attachments.remove(&message_id);
    }

    fn upsert_attachment(&mut self, attachment: MessageAttachment) {
        match self.position_of(attachment.message_id) {
            Some(at) => upsert_by_id(&mut self.messages[at].attachments, attachment),
            None => {
                let early = self
                    .early_attachments
                    .entry(attachment.message_id)
                    .or_default();
                upsert_by_id(early, attachment);
            }
        }
    }

    fn remove_attachment(&mut self, attachment: &MessageAttachment) {
        if let Some(at) = self.position_of(attachment.message_id) {
            self.messages[at].attachments.retain(|a| a.id != attachment.id);
        }
        if let Some(early) = self.early_attachments.get_mut(&attachment.message_id) {
            early.retain(|a| a.id != attachment.id);
        }
    }
}

fn upsert_by_id(attachments: &mut Vec<MessageAttachment>, attachment: MessageAttachment) {
    match attachments.iter_mut().find(|a| a.id == attachment.id) {
        Some(existing) => *existing = attachment,
        None => attachments.push(attachment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn message(order_id: Uuid, offset_secs: i64) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            order_id,
            user_id: Uuid::new_v4(),
            user_name: "Maria".to_string(),
            user_email: "maria@ideiaprint.com.br".to_string(),
            message: "ok".to_string(),
            created_at: Utc::now() + Duration::seconds(offset_secs),
            updated_at: Utc::now() + Duration::seconds(offset_secs),
            is_edited: false,
            attachments: vec![],
        }
    }

    fn attachment(message_id: Uuid, name: &str) -> MessageAttachment {
        MessageAttachment {
            id: Uuid::new_v4(),
            message_id,
            file_name: name.to_string(),
            file_path: format!("chat/{}/{}", message_id, name),
            file_size: 2048,
            file_type: "application/pdf".to_string(),
            created_at: Utc::now(),
        }
    }

    fn insert(m: &ChatMessage) -> ChangeEvent {
        ChangeEvent::ChatMessages {
            kind: ChangeKind::Insert,
            record: m.clone(),
        }
    }

    fn attach_insert(a: &MessageAttachment) -> ChangeEvent {
        ChangeEvent::MessageAttachments {
            kind: ChangeKind::Insert,
            record: a.clone(),
        }
    }

    #[test]
    fn test_messages_stay_ordered_by_created_at() {
        let order_id = Uuid::new_v4();
        let mut projection = ChatProjection::new(order_id);

        let late = message(order_id, 10);
        let early = message(order_id, -10);
        projection.apply(&insert(&late));
        projection.apply(&insert(&early));

        assert_eq!(projection.messages()[0].id, early.id);
        assert_eq!(projection.messages()[1].id, late.id);
    }

    #[test]
    fn test_message_before_attachment() {
        let order_id = Uuid::new_v4();
        let mut projection = ChatProjection::new(order_id);

        let m = message(order_id, 0);
        let a = attachment(m.id, "arte.pdf");
        projection.apply(&insert(&m));
        projection.apply(&attach_insert(&a));

        assert_eq!(projection.messages()[0].attachments, vec![a]);
        assert_eq!(projection.early_attachment_count(), 0);
    }

    #[test]
    fn test_attachment_before_message() {
        let order_id = Uuid::new_v4();
        let mut projection = ChatProjection::new(order_id);

        let m = message(order_id, 0);
        let a = attachment(m.id, "arte.pdf");
        projection.apply(&attach_insert(&a));
        assert!(projection.is_empty());
        assert_eq!(projection.early_attachment_count(), 1);

        projection.apply(&insert(&m));
        assert_eq!(projection.messages()[0].attachments, vec![a]);
        assert_eq!(projection.early_attachment_count(), 0);
    }

    #[test]
    fn test_duplicate_attachment_events_collapse_by_id() {
        let order_id = Uuid::new_v4();
        let mut projection = ChatProjection::new(order_id);

        let m = message(order_id, 0);
        let a = attachment(m.id, "frente.png");
        projection.apply(&insert(&m));
        projection.apply(&attach_insert(&a));
        projection.apply(&attach_insert(&a));

        assert_eq!(projection.messages()[0].attachments.len(), 1);
    }

    #[test]
    fn test_optimistic_append_reconciles_by_id_without_duplicate() {
        let order_id = Uuid::new_v4();
        let mut projection = ChatProjection::new(order_id);

        let local = message(order_id, 0);
        projection.optimistic_append(local.clone());
        assert_eq!(projection.len(), 1);

        // Feed echoes the same message back to the sender.
        let mut confirmed = local.clone();
        confirmed.user_name = "Maria Souza".to_string();
        projection.apply(&insert(&confirmed));

        assert_eq!(projection.len(), 1);
        assert_eq!(projection.messages()[0].user_name, "Maria Souza");
    }

    #[test]
    fn test_rollback_removes_failed_optimistic_append() {
        let order_id = Uuid::new_v4();
        let mut projection = ChatProjection::new(order_id);

        let local = message(order_id, 0);
        projection.optimistic_append(local.clone());
        projection.rollback(local.id);

        assert!(projection.is_empty());
    }

    #[test]
    fn test_rollback_after_confirmation_is_a_no_op() {
        let order_id = Uuid::new_v4();
        let mut projection = ChatProjection::new(order_id);

        let local = message(order_id, 0);
        projection.optimistic_append(local.clone());
        projection.apply(&insert(&local));
        projection.rollback(local.id);

        assert_eq!(projection.len(), 1);
    }

    #[test]
    fn test_delete_event_removes_message_and_buffers() {
        let order_id = Uuid::new_v4();
        let mut projection = ChatProjection::new(order_id);

        let m = message(order_id, 0);
        let a = attachment(m.id, "layout.ai");
        projection.apply(&insert(&m));
        projection.apply(&attach_insert(&a));

        projection.apply(&ChangeEvent::ChatMessages {
            kind: ChangeKind::Delete,
            record: m.clone(),
        });

        assert!(projection.is_empty());
        assert_eq!(projection.early_attachment_count(), 0);
    }

    #[test]
    fn test_attachment_delete_leaves_siblings() {
        let order_id = Uuid::new_v4();
        let mut projection = ChatProjection::new(order_id);

        let m = message(order_id, 0);
        let a = attachment(m.id, "frente.png");
        let b = attachment(m.id, "verso.png");
        projection.apply(&insert(&m));
        projection.apply(&attach_insert(&a));
        projection.apply(&attach_insert(&b));

        projection.apply(&ChangeEvent::MessageAttachments {
            kind: ChangeKind::Delete,
            record: a.clone(),
        });

        assert_eq!(projection.messages()[0].attachments, vec![b]);
    }

    #[test]
    fn test_events_for_other_orders_are_ignored() {
        let order_id = Uuid::new_v4();
        let mut projection = ChatProjection::new(order_id);

        let foreign = message(Uuid::new_v4(), 0);
        projection.apply(&insert(&foreign));

        assert!(projection.is_empty());
    }

    #[test]
    fn test_update_event_replaces_message_in_place() {
        let order_id = Uuid::new_v4();
        let mut projection = ChatProjection::new(order_id);

        let m = message(order_id, 0);
        projection.apply(&insert(&m));

        let mut edited = m.clone();
        edited.message = "corrigido".to_string();
        edited.is_edited = true;
        projection.apply(&ChangeEvent::ChatMessages {
            kind: ChangeKind::Update,
            record: edited,
        });

        assert_eq!(projection.len(), 1);
        assert!(projection.messages()[0].is_edited);
        assert_eq!(projection.messages()[0].message, "corrigido");
    }

    #[test]
    fn test_hydrate_sorts_and_filters() {
        let order_id = Uuid::new_v4();
        let mut projection = ChatProjection::new(order_id);

        let a = message(order_id, 5);
        let b = message(order_id, -5);
        let foreign = message(Uuid::new_v4(), 0);
        projection.hydrate(vec![a.clone(), foreign, b.clone()]);

        assert_eq!(projection.len(), 2);
        assert_eq!(projection.messages()[0].id, b.id);
        assert_eq!(projection.messages()[1].id, a.id);
    }
}

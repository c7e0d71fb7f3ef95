//! In-process change feed.
//!
//! Every committed mutation of a watched collection is published here as a
//! tagged [`ChangeEvent`]. Subscribers receive events for the lifetime of
//! their [`Subscription`]; dropping it unsubscribes. The feed makes no
//! cross-collection ordering promise: a message insert and its attachment
//! inserts are independent events and may be observed in either order.

use domain::events::ChangeEvent;
use tokio::sync::broadcast;
use uuid::Uuid;

const FEED_CAPACITY: usize = 256;

/// Broadcast hub the data-access layer publishes committed changes to.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Publishes one committed change. A feed with no subscribers drops the
    /// event silently.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribes to every collection.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            order_filter: None,
        }
    }

    /// Subscribes filtered to one order.
    ///
    /// Attachment events carry no order id and always pass the filter;
    /// projections match them by `message_id`.
    pub fn subscribe_order(&self, order_id: Uuid) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            order_filter: Some(order_id),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of the feed. Dropping it unsubscribes.
pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
    order_filter: Option<Uuid>,
}

impl Subscription {
    /// Receives the next matching event, or `None` once the hub is gone.
    ///
    /// A subscriber that falls behind the feed capacity loses the oldest
    /// events; that is logged and reception continues, since projections
    /// reconcile against the datastore rather than replaying history.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Change feed subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking drain of everything currently buffered.
    pub fn drain(&mut self) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        events.push(event);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Change feed subscriber lagged");
                }
                Err(_) => break,
            }
        }
        events
    }

    fn matches(&self, event: &ChangeEvent) -> bool {
        match (self.order_filter, event.order_id()) {
            (Some(filter), Some(order_id)) => filter == order_id,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::events::ChangeKind;
    use domain::models::{ChatMessage, OrderFollower};

    fn message_event(order_id: Uuid) -> ChangeEvent {
        ChangeEvent::ChatMessages {
            kind: ChangeKind::Insert,
            record: ChatMessage {
                id: Uuid::new_v4(),
                order_id,
                user_id: Uuid::new_v4(),
                user_name: "Maria".to_string(),
                user_email: "maria@ideiaprint.com.br".to_string(),
                message: "ok".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
                is_edited: false,
                attachments: vec![],
            },
        }
    }

    fn follower_event(order_id: Uuid) -> ChangeEvent {
        ChangeEvent::OrderFollowers {
            kind: ChangeKind::Insert,
            record: OrderFollower {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                order_id,
                notifications_enabled: true,
                created_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_events() {
        let hub = ChangeHub::new();
        let mut sub = hub.subscribe();

        hub.publish(message_event(Uuid::new_v4()));

        let event = sub.recv().await.unwrap();
        assert_eq!(event.kind(), ChangeKind::Insert);
    }

    #[tokio::test]
    async fn test_order_filter_drops_foreign_events() {
        let hub = ChangeHub::new();
        let mine = Uuid::new_v4();
        let mut sub = hub.subscribe_order(mine);

        hub.publish(follower_event(Uuid::new_v4()));
        hub.publish(message_event(mine));

        let event = sub.recv().await.unwrap();
        assert_eq!(event.order_id(), Some(mine));
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_each_event() {
        let hub = ChangeHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        hub.publish(message_event(Uuid::new_v4()));

        assert!(a.recv().await.is_some());
        assert!(b.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_drain_collects_buffered_events() {
        let hub = ChangeHub::new();
        let order_id = Uuid::new_v4();
        let mut sub = hub.subscribe_order(order_id);

        hub.publish(message_event(order_id));
        hub.publish(follower_event(order_id));
        hub.publish(message_event(Uuid::new_v4()));

        let events = sub.drain();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let hub = ChangeHub::new();
        hub.publish(message_event(Uuid::new_v4()));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let hub = ChangeHub::new();
        let sub = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
    }
}

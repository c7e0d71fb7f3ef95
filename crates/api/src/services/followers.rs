use persistence::store::Store;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::OrderFollower;

/// Follow state per order and user. Following is idempotent and
/// unfollowing an order you never followed is not an error.
pub struct FollowerService {
    store: Store,
}

impl FollowerService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn follow(&self, order_id: Uuid, user_id: Uuid) -> Result<OrderFollower, DomainError> {
        if self.store.orders.find(order_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Order {order_id} not found")));
        }
        self.store.followers.follow(order_id, user_id).await
    }

    pub async fn unfollow(&self, order_id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.store.followers.unfollow(order_id, user_id).await?;
        Ok(())
    }

    /// Flips the notification flag of an existing follow.
    pub async fn toggle_notifications(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<OrderFollower, DomainError> {
        self.store
            .followers
            .toggle_notifications(order_id, user_id)
            .await
    }

    pub async fn status_for(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrderFollower>, DomainError> {
        self.store.followers.find(order_id, user_id).await
    }

    pub async fn list(&self, order_id: Uuid) -> Result<Vec<OrderFollower>, DomainError> {
        if self.store.orders.find(order_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Order {order_id} not found")));
        }
        self.store.followers.list_for_order(order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use domain::models::{CreateClientInput, CreateOrderInput};

    async fn store_with_order() -> (Store, Uuid) {
        let store = Store::in_memory();
        let actor = Uuid::new_v4();
        let client = store
            .clients
            .insert(
                &CreateClientInput {
                    name: "Cliente Teste".to_string(),
                    email: None,
                    phone: None,
                    address: None,
                    notes: None,
                },
                actor,
            )
            .await
            .unwrap();
        let initial = store.statuses.find_initial().await.unwrap().unwrap();
        let order = store
            .orders
            .insert(
                &CreateOrderInput {
                    client_id: client.id,
                    service: "Autocolantes".to_string(),
                    description: None,
                    status_id: initial.id,
                    delivery_date: Utc::now() + Duration::days(1),
                },
                actor,
            )
            .await
            .unwrap();
        (store, order.id)
    }

    #[tokio::test]
    async fn follow_is_idempotent() {
        let (store, order_id) = store_with_order().await;
        let service = FollowerService::new(store);
        let user = Uuid::new_v4();

        let first = service.follow(order_id, user).await.unwrap();
        let second = service.follow(order_id, user).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(second.notifications_enabled);

        let followers = service.list(order_id).await.unwrap();
        assert_eq!(followers.len(), 1);
    }

    #[tokio::test]
    async fn unfollow_without_follow_is_quiet() {
        let (store, order_id) = store_with_order().await;
        let service = FollowerService::new(store);
        service.unfollow(order_id, Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn toggle_flips_the_flag() {
        let (store, order_id) = store_with_order().await;
        let service = FollowerService::new(store);
        let user = Uuid::new_v4();
        service.follow(order_id, user).await.unwrap();

        let muted = service.toggle_notifications(order_id, user).await.unwrap();
        assert!(!muted.notifications_enabled);
        let loud = service.toggle_notifications(order_id, user).await.unwrap();
        assert!(loud.notifications_enabled);
    }

    #[tokio::test]
    async fn toggle_without_follow_is_not_found() {
        let (store, order_id) = store_with_order().await;
        let service = FollowerService::new(store);
        let err = service
            .toggle_notifications(order_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn follow_missing_order_is_not_found() {
        let (store, _) = store_with_order().await;
        let service = FollowerService::new(store);
        let err = service
            .follow(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}

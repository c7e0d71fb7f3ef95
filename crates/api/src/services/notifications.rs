use persistence::store::Store;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::Notification;

/// A user's notification inbox. Every mutation checks that the
/// notification belongs to the acting user.
pub struct NotificationService {
    store: Store,
}

impl NotificationService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Notification>, DomainError> {
        self.store.notifications.list_for_user(user_id).await
    }

    pub async fn mark_read(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Notification, DomainError> {
        self.owned(id, user_id).await?;
        self.store.notifications.mark_read(id).await
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DomainError> {
        self.store.notifications.mark_all_read(user_id).await
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.owned(id, user_id).await?;
        self.store.notifications.delete(id).await?;
        Ok(())
    }

    async fn owned(&self, id: Uuid, user_id: Uuid) -> Result<Notification, DomainError> {
        let notification = self
            .store
            .notifications
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Notification {id} not found")))?;
        if notification.user_id != user_id {
            return Err(DomainError::forbidden(
                "Notification belongs to another user",
            ));
        }
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::NotificationKind;

    #[tokio::test]
    async fn mark_read_rejects_other_users() {
        let store = Store::in_memory();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let notification = store
            .notifications
            .insert(owner, Uuid::new_v4(), Uuid::new_v4(), NotificationKind::Mention)
            .await
            .unwrap();

        let service = NotificationService::new(store);
        let err = service
            .mark_read(notification.id, stranger)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let read = service.mark_read(notification.id, owner).await.unwrap();
        assert!(read.is_read);
    }

    #[tokio::test]
    async fn mark_all_read_counts_only_unread() {
        let store = Store::in_memory();
        let owner = Uuid::new_v4();
        for _ in 0..3 {
            store
                .notifications
                .insert(
                    owner,
                    Uuid::new_v4(),
                    Uuid::new_v4(),
                    NotificationKind::NewMessage,
                )
                .await
                .unwrap();
        }
        let service = NotificationService::new(store);

        assert_eq!(service.mark_all_read(owner).await.unwrap(), 3);
        assert_eq!(service.mark_all_read(owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_rejects_other_users() {
        let store = Store::in_memory();
        let owner = Uuid::new_v4();
        let notification = store
            .notifications
            .insert(owner, Uuid::new_v4(), Uuid::new_v4(), NotificationKind::Mention)
            .await
            .unwrap();

        let service = NotificationService::new(store);
        let err = service
            .delete(notification.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        service.delete(notification.id, owner).await.unwrap();
        assert!(service.list(owner).await.unwrap().is_empty());
    }
}

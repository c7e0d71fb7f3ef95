use persistence::store::Store;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{
    Client, CreateAccountInput, CreateClientInput, CreateStatusInput, OrderStatus,
    UpdateAccountInput, UpdateClientInput, UpdateStatusInput, UserAccount,
};
use shared::validation::{validate_hex_color, validate_username};

const MIN_PASSWORD_LEN: usize = 8;

/// Back-office administration: the client directory, the status board
/// and staff accounts. Role enforcement happens at the route layer;
/// this service assumes the caller is allowed.
pub struct SettingsService {
    store: Store,
}

impl SettingsService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    // Clients

    pub async fn create_client(
        &self,
        input: CreateClientInput,
        created_by: Uuid,
    ) -> Result<Client, DomainError> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("Client name is required"));
        }
        self.store.clients.insert(&input, created_by).await
    }

    pub async fn update_client(
        &self,
        id: Uuid,
        input: UpdateClientInput,
    ) -> Result<Client, DomainError> {
        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("Client name is required"));
            }
        }
        self.store.clients.update(id, &input).await
    }

    /// Soft delete. The client disappears from pickers but stays on
    /// historical orders.
    pub async fn deactivate_client(&self, id: Uuid) -> Result<Client, DomainError> {
        self.store.clients.deactivate(id).await
    }

    pub async fn list_clients(&self, include_inactive: bool) -> Result<Vec<Client>, DomainError> {
        self.store.clients.list(include_inactive).await
    }

    // Status board

    pub async fn create_status(
        &self,
        input: CreateStatusInput,
    ) -> Result<OrderStatus, DomainError> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("Status name is required"));
        }
        validate_hex_color(&input.color)
            .map_err(|_| DomainError::validation("Color must be a hex value like #ff8800"))?;
        self.store.statuses.insert(&input).await
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        input: UpdateStatusInput,
    ) -> Result<OrderStatus, DomainError> {
        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("Status name is required"));
            }
        }
        if let Some(color) = &input.color {
            validate_hex_color(color)
                .map_err(|_| DomainError::validation("Color must be a hex value like #ff8800"))?;
        }
        self.store.statuses.update(id, &input).await
    }

    /// Retires a status. Orders already sitting in it keep it; it just
    /// stops being offered for new work.
    pub async fn deactivate_status(&self, id: Uuid) -> Result<OrderStatus, DomainError> {
        self.store.statuses.deactivate(id).await
    }

    pub async fn list_statuses(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<OrderStatus>, DomainError> {
        self.store.statuses.list(include_inactive).await
    }

    // Staff accounts

    /// Provisions a login principal and then the account row. If the
    /// account insert fails the principal is deleted again so no
    /// orphan credentials survive.
    pub async fn create_user(&self, input: CreateAccountInput) -> Result<UserAccount, DomainError> {
        validate_username(&input.username).map_err(|_| {
            DomainError::validation("Username must be 3-30 characters of letters, digits or underscores")
        })?;
        validate_password(&input.password)?;

        let principal_id = self
            .store
            .auth
            .create_principal(&input.email, &input.password)
            .await?;

        let inserted = self
            .store
            .accounts
            .insert(
                principal_id,
                &input.username,
                &input.full_name,
                &input.email,
                input.role,
            )
            .await;

        match inserted {
            Ok(account) => {
                tracing::info!(account_id = %account.id, username = %account.username, "Staff account created");
                Ok(account)
            }
            Err(e) => {
                if let Err(cleanup) = self.store.auth.delete_principal(principal_id).await {
                    tracing::warn!(
                        principal_id = %principal_id,
                        error = %cleanup,
                        "Orphan principal left after account insert failure"
                    );
                }
                Err(e)
            }
        }
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        input: UpdateAccountInput,
    ) -> Result<UserAccount, DomainError> {
        self.store.accounts.update(id, &input).await
    }

    pub async fn rotate_password(&self, id: Uuid, new_password: &str) -> Result<(), DomainError> {
        validate_password(new_password)?;
        let account = self
            .store
            .accounts
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Account {id} not found")))?;
        self.store
            .auth
            .rotate_password(account.principal_id, new_password)
            .await
    }

    pub async fn list_users(&self) -> Result<Vec<UserAccount>, DomainError> {
        self.store.accounts.list().await
    }
}

fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::Role;
    use persistence::auth::MemoryAuthProvider;
    use persistence::blob::MemoryBlobStore;
    use persistence::events::ChangeHub;
    use persistence::repositories::{
        MemAccountRepository, MemChatRepository, MemClientRepository, MemFollowerRepository,
        MemNotificationRepository, MemOrderFileRepository, MemOrderRepository,
        MemStatusRepository,
    };
    use std::sync::Arc;

    fn store_with_auth() -> (Store, Arc<MemoryAuthProvider>) {
        let hub = Arc::new(ChangeHub::new());
        let auth = Arc::new(MemoryAuthProvider::new());
        let store = Store {
            accounts: Arc::new(MemAccountRepository::new()),
            clients: Arc::new(MemClientRepository::new()),
            statuses: Arc::new(MemStatusRepository::seeded()),
            orders: Arc::new(MemOrderRepository::new(hub.clone())),
            order_files: Arc::new(MemOrderFileRepository::new()),
            chat: Arc::new(MemChatRepository::new(hub.clone())),
            followers: Arc::new(MemFollowerRepository::new(hub.clone())),
            notifications: Arc::new(MemNotificationRepository::new(hub.clone())),
            auth: auth.clone(),
            blobs: Arc::new(MemoryBlobStore::new()),
            hub,
        };
        (store, auth)
    }

    fn user_input(username: &str, email: &str) -> CreateAccountInput {
        CreateAccountInput {
            username: username.to_string(),
            full_name: format!("{username} completo"),
            email: email.to_string(),
            password: "Segredo123".to_string(),
            role: Role::Employee,
        }
    }

    #[tokio::test]
    async fn create_status_appends_to_board_end() {
        let (store, _) = store_with_auth();
        let service = SettingsService::new(store);
        let board = service.list_statuses(false).await.unwrap();
        let last_index = board.last().unwrap().order_index;

        let created = service
            .create_status(CreateStatusInput {
                name: "Aguardando aprovacao".to_string(),
                color: "#ffaa00".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.order_index, last_index + 1);
        assert!(!created.is_initial);
    }

    #[tokio::test]
    async fn duplicate_status_name_conflicts() {
        let (store, _) = store_with_auth();
        let service = SettingsService::new(store);
        let existing = &service.list_statuses(false).await.unwrap()[0];
        let err = service
            .create_status(CreateStatusInput {
                name: existing.name.clone(),
                color: "#123456".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn bad_color_is_rejected() {
        let (store, _) = store_with_auth();
        let service = SettingsService::new(store);
        let err = service
            .create_status(CreateStatusInput {
                name: "Cor errada".to_string(),
                color: "orange".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn deactivated_client_survives_with_flag() {
        let (store, _) = store_with_auth();
        let service = SettingsService::new(store);
        let client = service
            .create_client(
                CreateClientInput {
                    name: "Cafe Esquina".to_string(),
                    email: Some("geral@esquina.example".to_string()),
                    phone: None,
                    address: None,
                    notes: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        let gone = service.deactivate_client(client.id).await.unwrap();
        assert!(!gone.is_active);

        assert!(service.list_clients(false).await.unwrap().is_empty());
        assert_eq!(service.list_clients(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_user_provisions_principal() {
        let (store, auth) = store_with_auth();
        let service = SettingsService::new(store);
        let account = service
            .create_user(user_input("rita", "rita@ideiaprint.example"))
            .await
            .unwrap();
        assert_eq!(account.username, "rita");
        assert_eq!(auth.principal_count().await, 1);
        assert!(auth.has_principal(account.principal_id).await);
    }

    #[tokio::test]
    async fn duplicate_username_rolls_back_principal() {
        let (store, auth) = store_with_auth();
        let service = SettingsService::new(store);
        service
            .create_user(user_input("rita", "rita@ideiaprint.example"))
            .await
            .unwrap();

        let err = service
            .create_user(user_input("rita", "outra@ideiaprint.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(auth.principal_count().await, 1);
    }

    #[tokio::test]
    async fn short_password_is_rejected_before_provisioning() {
        let (store, auth) = store_with_auth();
        let service = SettingsService::new(store);
        let mut input = user_input("rita", "rita@ideiaprint.example");
        input.password = "curta".to_string();
        let err = service.create_user(input).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(auth.principal_count().await, 0);
    }

    #[tokio::test]
    async fn rotate_password_requires_existing_account() {
        let (store, _) = store_with_auth();
        let service = SettingsService::new(store);
        let err = service
            .rotate_password(Uuid::new_v4(), "NovaSenha123")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn deactivating_user_flips_flag() {
        let (store, _) = store_with_auth();
        let service = SettingsService::new(store);
        let account = service
            .create_user(user_input("tiago", "tiago@ideiaprint.example"))
            .await
            .unwrap();

        let updated = service
            .update_user(
                account.id,
                UpdateAccountInput {
                    full_name: None,
                    role: None,
                    is_active: Some(false),
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_active);
    }
}

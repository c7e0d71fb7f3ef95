use persistence::store::Store;

use domain::error::DomainError;
use domain::models::{CreateAccountInput, Role};

use crate::config::BootstrapConfig;
use crate::services::settings::SettingsService;

/// Seeds the first administrator account at startup when configured.
/// Runs only against an empty account table, so restarting with the
/// same configuration is harmless.
pub async fn bootstrap_admin(store: &Store, config: &BootstrapConfig) -> Result<(), DomainError> {
    if config.admin_username.is_empty()
        && config.admin_email.is_empty()
        && config.admin_password.is_empty()
    {
        tracing::debug!("Admin bootstrap not configured, skipping");
        return Ok(());
    }
    if config.admin_username.is_empty()
        || config.admin_email.is_empty()
        || config.admin_password.is_empty()
    {
        tracing::warn!("Admin bootstrap partially configured, skipping (set username, email and password)");
        return Ok(());
    }

    if !store.accounts.list().await?.is_empty() {
        tracing::debug!("Accounts already exist, skipping admin bootstrap");
        return Ok(());
    }

    let settings = SettingsService::new(store.clone());
    let account = settings
        .create_user(CreateAccountInput {
            username: config.admin_username.clone(),
            full_name: config.admin_full_name.clone(),
            email: config.admin_email.clone(),
            password: config.admin_password.clone(),
            role: Role::Admin,
        })
        .await?;

    tracing::info!(
        account_id = %account.id,
        username = %account.username,
        "Bootstrap administrator created"
    );
    tracing::warn!("Remove the bootstrap credentials from configuration after first login");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(username: &str, email: &str, password: &str) -> BootstrapConfig {
        BootstrapConfig {
            admin_username: username.to_string(),
            admin_email: email.to_string(),
            admin_password: password.to_string(),
            admin_full_name: "Administrador".to_string(),
        }
    }

    #[tokio::test]
    async fn unconfigured_bootstrap_is_a_no_op() {
        let store = Store::in_memory();
        bootstrap_admin(&store, &BootstrapConfig::default())
            .await
            .unwrap();
        assert!(store.accounts.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_creates_single_admin() {
        let store = Store::in_memory();
        let cfg = config("admin", "admin@ideiaprint.example", "SenhaForte1");

        bootstrap_admin(&store, &cfg).await.unwrap();
        bootstrap_admin(&store, &cfg).await.unwrap();

        let accounts = store.accounts.list().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].role, Role::Admin);
        assert_eq!(accounts[0].username, "admin");
    }

    #[tokio::test]
    async fn partial_configuration_is_skipped() {
        let store = Store::in_memory();
        bootstrap_admin(&store, &config("admin", "", "SenhaForte1"))
            .await
            .unwrap();
        assert!(store.accounts.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn existing_accounts_block_bootstrap() {
        let store = Store::in_memory();
        let settings = SettingsService::new(store.clone());
        settings
            .create_user(CreateAccountInput {
                username: "primeira".to_string(),
                full_name: "Primeira Conta".to_string(),
                email: "primeira@ideiaprint.example".to_string(),
                password: "SenhaForte1".to_string(),
                role: Role::Employee,
            })
            .await
            .unwrap();

        bootstrap_admin(&store, &config("admin", "admin@ideiaprint.example", "SenhaForte1"))
            .await
            .unwrap();
        assert_eq!(store.accounts.list().await.unwrap().len(), 1);
    }
}

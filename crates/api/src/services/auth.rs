use persistence::store::Store;
use thiserror::Error;

use domain::error::DomainError;
use domain::models::UserAccount;
use shared::jwt::{account_id_from_claims, JwtConfig, JwtError};

use crate::config::JwtAuthConfig;
use crate::middleware::metrics::record_login;
use crate::middleware::user_auth::build_jwt_config;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account is disabled")]
    AccountDisabled,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("token error: {0}")]
    Token(#[from] JwtError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Credential checks and token issuance. Tokens are stateless RS256
/// JWTs; refresh simply re-validates the account and rotates the pair.
pub struct AuthService {
    store: Store,
    jwt: JwtConfig,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct SignIn {
    pub account: UserAccount,
    pub tokens: TokenPair,
}

impl AuthService {
    pub fn new(store: Store, jwt_config: &JwtAuthConfig) -> Result<Self, AuthError> {
        let jwt = build_jwt_config(jwt_config)?;
        Ok(Self { store, jwt })
    }

    /// Signs a user in by username or email. Failures are deliberately
    /// indistinguishable between unknown identifier and bad password.
    pub async fn sign_in(&self, identifier: &str, password: &str) -> Result<SignIn, AuthError> {
        let account = match self.store.accounts.find_by_identifier(identifier).await? {
            Some(account) => account,
            None => {
                record_login(false);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !account.is_active {
            record_login(false);
            return Err(AuthError::AccountDisabled);
        }

        let verified = self
            .store
            .auth
            .verify_password(account.principal_id, password)
            .await?;
        if !verified {
            record_login(false);
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_tokens(&account)?;
        record_login(true);
        tracing::info!(account_id = %account.id, username = %account.username, "User signed in");
        Ok(SignIn { account, tokens })
    }

    /// Rotates a token pair. The account behind the refresh token must
    /// still exist and be active.
    pub async fn refresh(&self, refresh_token: &str) -> Result<SignIn, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        let account_id =
            account_id_from_claims(&claims).map_err(|_| AuthError::InvalidRefreshToken)?;

        let account = self
            .store
            .accounts
            .find(account_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        if !account.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let tokens = self.issue_tokens(&account)?;
        Ok(SignIn { account, tokens })
    }

    fn issue_tokens(&self, account: &UserAccount) -> Result<TokenPair, AuthError> {
        let (access_token, _) = self.jwt.generate_access_token(account.id)?;
        let (refresh_token, _) = self.jwt.generate_refresh_token(account.id)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.jwt.access_token_expiry_secs,
        })
    }
}

impl From<AuthError> for crate::error::ApiError {
    fn from(err: AuthError) -> Self {
        use crate::error::ApiError;
        match err {
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::AccountDisabled => ApiError::Forbidden("Account is disabled".to_string()),
            AuthError::InvalidRefreshToken => {
                ApiError::Unauthorized("Invalid refresh token".to_string())
            }
            AuthError::Token(e) => ApiError::Internal(e.to_string()),
            AuthError::Domain(e) => e.into(),
        }
    }
}

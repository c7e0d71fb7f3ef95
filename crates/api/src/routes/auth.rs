use axum::extract::State;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain::models::{Role, UserAccount};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::CurrentUser;
use crate::services::auth::{AuthService, TokenPair};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email.
    #[validate(length(min = 1, message = "Identifier is required"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Account shape returned to clients. The login principal id stays
/// internal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserAccount> for UserResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id,
            username: account.username,
            full_name: account.full_name,
            email: account.email,
            role: account.role,
            is_active: account.is_active,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: pair.expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub tokens: TokenResponse,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;
    let auth = AuthService::new(state.store.clone(), &state.config.jwt)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let signed = auth.sign_in(&request.identifier, &request.password).await?;
    Ok(Json(LoginResponse {
        user: signed.account.into(),
        tokens: signed.tokens.into(),
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;
    let auth = AuthService::new(state.store.clone(), &state.config.jwt)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let signed = auth.refresh(&request.refresh_token).await?;
    Ok(Json(LoginResponse {
        user: signed.account.into(),
        tokens: signed.tokens.into(),
    }))
}

pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(current.0.into())
}

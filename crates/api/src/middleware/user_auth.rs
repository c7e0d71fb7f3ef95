use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use domain::models::UserAccount;
use shared::jwt::{account_id_from_claims, JwtConfig};

use crate::app::AppState;
use crate::config::JwtAuthConfig;

/// The authenticated account, inserted into request extensions by
/// [`require_staff`] and read by handlers and [`require_admin`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserAccount);

/// Builds the token verifier from configured PEM strings. Environment
/// variables deliver keys with literal `\n` sequences, so those are
/// normalized back into newlines first.
pub fn build_jwt_config(config: &JwtAuthConfig) -> Result<JwtConfig, shared::jwt::JwtError> {
    JwtConfig::with_leeway(
        &normalize_pem_key(&config.private_key),
        &normalize_pem_key(&config.public_key),
        config.access_token_expiry_secs,
        config.refresh_token_expiry_secs,
        config.leeway_secs,
    )
}

pub fn normalize_pem_key(raw: &str) -> String {
    raw.trim().trim_matches('"').replace("\\n", "\n")
}

/// Authentication gate for every staff route. Validates the bearer
/// token, loads the account it names, and rejects unknown or disabled
/// accounts before the handler runs.
pub async fn require_staff(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match extract_bearer_token(&req) {
        Some(token) => token,
        None => return unauthorized_response("Missing or invalid Authorization header"),
    };

    let jwt = match build_jwt_config(&state.config.jwt) {
        Ok(jwt) => jwt,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build JWT config");
            return internal_error_response("Authentication service unavailable");
        }
    };

    let claims = match jwt.validate_access_token(&token) {
        Ok(claims) => claims,
        Err(_) => return unauthorized_response("Invalid or expired token"),
    };

    let account_id = match account_id_from_claims(&claims) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid token subject"),
    };

    let account = match state.store.accounts.find(account_id).await {
        Ok(Some(account)) => account,
        Ok(None) => return unauthorized_response("Unknown account"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load account during authentication");
            return internal_error_response("Authentication service unavailable");
        }
    };

    if !account.is_active {
        return forbidden_response("Account is disabled");
    }

    req.extensions_mut().insert(CurrentUser(account));
    next.run(req).await
}

/// Role gate layered inside [`require_staff`]. Rejects any request
/// whose authenticated account is not an administrator.
pub async fn require_admin(req: Request, next: Next) -> Response {
    let current = match req.extensions().get::<CurrentUser>() {
        Some(current) => current.clone(),
        None => {
            tracing::warn!("Admin gate reached without an authenticated account");
            return unauthorized_response("Authentication required");
        }
    };

    if !current.0.role.is_admin() {
        return forbidden_response("Administrator role required");
    }

    next.run(req).await
}

fn extract_bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "unauthorized", "message": message })),
    )
        .into_response()
}

fn forbidden_response(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "forbidden", "message": message })),
    )
        .into_response()
}

fn internal_error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal_error", "message": message })),
    )
        .into_response()
}

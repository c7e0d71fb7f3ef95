use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use domain::models::{CreateAccountInput, Role, UpdateAccountInput};

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::auth::UserResponse;
use crate::services::settings::SettingsService;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 200, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 200, message = "Full name is required"))]
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RotatePasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = SettingsService::new(state.store.clone()).list_users().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    request.validate()?;
    let account = SettingsService::new(state.store.clone())
        .create_user(CreateAccountInput {
            username: request.username,
            full_name: request.full_name,
            email: request.email,
            password: request.password,
            role: request.role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    request.validate()?;
    let account = SettingsService::new(state.store.clone())
        .update_user(
            user_id,
            UpdateAccountInput {
                full_name: request.full_name,
                role: request.role,
                is_active: request.is_active,
            },
        )
        .await?;
    Ok(Json(account.into()))
}

pub async fn rotate_password(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<RotatePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;
    SettingsService::new(state.store.clone())
        .rotate_password(user_id, &request.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_request_parses_role() {
        let request: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "username": "carla",
            "fullName": "Carla Dias",
            "email": "carla@ideiaprint.example",
            "password": "SenhaForte1",
            "role": "EMPLOYEE",
        }))
        .unwrap();
        assert_eq!(request.role, Role::Employee);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn short_password_fails_validation() {
        let request = RotatePasswordRequest {
            password: "curta".to_string(),
        };
        assert!(request.validate().is_err());
    }
}

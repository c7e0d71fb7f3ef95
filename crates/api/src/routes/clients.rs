use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use domain::models::{Client, CreateClientInput, UpdateClientInput};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::CurrentUser;
use crate::services::settings::SettingsService;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientListQuery>,
) -> Result<Json<Vec<Client>>, ApiError> {
    let clients = SettingsService::new(state.store.clone())
        .list_clients(query.include_inactive)
        .await?;
    Ok(Json(clients))
}

pub async fn create_client(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    request.validate()?;
    let client = SettingsService::new(state.store.clone())
        .create_client(
            CreateClientInput {
                name: request.name,
                email: request.email,
                phone: request.phone,
                address: request.address,
                notes: request.notes,
            },
            current.0.id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<Client>, ApiError> {
    request.validate()?;
    let client = SettingsService::new(state.store.clone())
        .update_client(
            client_id,
            UpdateClientInput {
                name: request.name,
                email: request.email,
                phone: request.phone,
                address: request.address,
                notes: request.notes,
            },
        )
        .await?;
    Ok(Json(client))
}

/// Soft delete: the client is flagged inactive and returned.
pub async fn deactivate_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Client>, ApiError> {
    let client = SettingsService::new(state.store.clone())
        .deactivate_client(client_id)
        .await?;
    Ok(Json(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_validates_email_when_present() {
        let bad = CreateClientRequest {
            name: "Loja".to_string(),
            email: Some("not-an-email".to_string()),
            phone: None,
            address: None,
            notes: None,
        };
        assert!(bad.validate().is_err());

        let ok = CreateClientRequest {
            name: "Loja".to_string(),
            email: None,
            phone: None,
            address: None,
            notes: None,
        };
        assert!(ok.validate().is_ok());
    }
}

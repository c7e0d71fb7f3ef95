use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use domain::models::{CreateStatusInput, OrderStatus, UpdateStatusInput};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::settings::SettingsService;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStatusRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 4, max = 9, message = "Color must be a hex value like #ff8800"))]
    pub color: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 4, max = 9, message = "Color must be a hex value like #ff8800"))]
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// The status board in display order.
pub async fn list_statuses(
    State(state): State<AppState>,
    Query(query): Query<StatusListQuery>,
) -> Result<Json<Vec<OrderStatus>>, ApiError> {
    let statuses = SettingsService::new(state.store.clone())
        .list_statuses(query.include_inactive)
        .await?;
    Ok(Json(statuses))
}

pub async fn create_status(
    State(state): State<AppState>,
    Json(request): Json<CreateStatusRequest>,
) -> Result<(StatusCode, Json<OrderStatus>), ApiError> {
    request.validate()?;
    let status = SettingsService::new(state.store.clone())
        .create_status(CreateStatusInput {
            name: request.name,
            color: request.color,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(status)))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(status_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<OrderStatus>, ApiError> {
    request.validate()?;
    let status = SettingsService::new(state.store.clone())
        .update_status(
            status_id,
            UpdateStatusInput {
                name: request.name,
                color: request.color,
                is_active: request.is_active,
            },
        )
        .await?;
    Ok(Json(status))
}

/// Retires a status. Orders already in it are untouched.
pub async fn deactivate_status(
    State(state): State<AppState>,
    Path(status_id): Path<Uuid>,
) -> Result<Json<OrderStatus>, ApiError> {
    let status = SettingsService::new(state.store.clone())
        .deactivate_status(status_id)
        .await?;
    Ok(Json(status))
}

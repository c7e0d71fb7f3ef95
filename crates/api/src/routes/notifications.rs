use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use domain::models::Notification;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::CurrentUser;
use crate::services::notifications::NotificationService;

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = NotificationService::new(state.store.clone())
        .list(current.0.id)
        .await?;
    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Notification>, ApiError> {
    let notification = NotificationService::new(state.store.clone())
        .mark_read(notification_id, current.0.id)
        .await?;
    Ok(Json(notification))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated = NotificationService::new(state.store.clone())
        .mark_all_read(current.0.id)
        .await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StatusCode, ApiError> {
    NotificationService::new(state.store.clone())
        .delete(notification_id, current.0.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

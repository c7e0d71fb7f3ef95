use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;

use domain::models::OrderFollower;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::CurrentUser;
use crate::services::followers::FollowerService;

pub async fn follow_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<OrderFollower>, ApiError> {
    let follower = FollowerService::new(state.store.clone())
        .follow(order_id, current.0.id)
        .await?;
    Ok(Json(follower))
}

pub async fn unfollow_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StatusCode, ApiError> {
    FollowerService::new(state.store.clone())
        .unfollow(order_id, current.0.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_notifications(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<OrderFollower>, ApiError> {
    let follower = FollowerService::new(state.store.clone())
        .toggle_notifications(order_id, current.0.id)
        .await?;
    Ok(Json(follower))
}

pub async fn list_followers(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<OrderFollower>>, ApiError> {
    let followers = FollowerService::new(state.store.clone())
        .list(order_id)
        .await?;
    Ok(Json(followers))
}

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use domain::models::{CreateOrderInput, Order, StatusChange, UpdateOrderInput};
use domain::services::schedule::parse_month_param;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::CurrentUser;
use crate::services::orders::OrderService;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub client_id: Uuid,
    #[validate(length(min = 1, max = 500, message = "Service must be 1-500 characters"))]
    pub service: String,
    #[validate(length(max = 5000, message = "Description is limited to 5000 characters"))]
    pub description: Option<String>,
    pub status_id: Uuid,
    pub delivery_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 500, message = "Service must be 1-500 characters"))]
    pub service: Option<String>,
    #[validate(length(max = 5000, message = "Description is limited to 5000 characters"))]
    pub description: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub status_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    /// Calendar filter in `YYYY-MM` form.
    pub month: Option<String>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let service = OrderService::new(state.store.clone());
    let orders = match query.month.as_deref() {
        Some(raw) => {
            let (year, month) = parse_month_param(raw)
                .ok_or_else(|| ApiError::Validation("month must look like 2025-03".to_string()))?;
            service.list_for_month(year, month).await?
        }
        None => service.list().await?,
    };
    Ok(Json(orders))
}

pub async fn create_order(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    request.validate()?;
    let service = OrderService::new(state.store.clone());
    let order = service
        .create(
            CreateOrderInput {
                client_id: request.client_id,
                service: request.service,
                description: request.description,
                status_id: request.status_id,
                delivery_date: request.delivery_date,
            },
            current.0.id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = OrderService::new(state.store.clone()).get(order_id).await?;
    Ok(Json(order))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<Order>, ApiError> {
    request.validate()?;
    let service = OrderService::new(state.store.clone());
    let order = service
        .update(
            order_id,
            UpdateOrderInput {
                client_id: request.client_id,
                service: request.service,
                description: request.description,
                delivery_date: request.delivery_date,
            },
        )
        .await?;
    Ok(Json(order))
}

pub async fn change_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<StatusCode, ApiError> {
    OrderService::new(state.store.clone())
        .change_status(order_id, request.status_id, current.0.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn order_history(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<StatusChange>>, ApiError> {
    let history = OrderService::new(state.store.clone())
        .history(order_id)
        .await?;
    Ok(Json(history))
}

use axum::extract::State;
use axum::Json;

use domain::services::dashboard::DashboardStats;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::orders::OrderService;

/// Order counts by status, plus overdue and due-today totals.
pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, ApiError> {
    let stats = OrderService::new(state.store.clone()).dashboard().await?;
    Ok(Json(stats))
}

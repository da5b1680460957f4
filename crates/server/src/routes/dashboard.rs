use axum::{extract::State, routing::get, Json, Router};

use common::types::DataResponse;
use service::dashboard::{self, DashboardStats};

use crate::errors::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(stats))
        .route("/dashboard/stats", get(stats))
}

#[utoipa::path(
    get, path = "/api/dashboard/stats", tag = "dashboard",
    responses(
        (status = 200, description = "Customer, lead, opportunity and activity summary", body = crate::openapi::DashboardStatsDoc)
    )
)]
pub async fn stats(State(state): State<AppState>) -> Result<Json<DataResponse<DashboardStats>>, ApiError> {
    Ok(Json(DataResponse::new(dashboard::get_stats(&state.db).await?)))
}

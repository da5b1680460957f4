use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use common::types::DataResponse;
use models::lead::{self, LeadPatch, NewLead};
use service::conversion::{self, ConversionOutcome};
use service::lead_service::{self, LeadDetail, LeadFilter};
use service::pagination::{Paginated, Pagination};

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeadListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list).post(create))
        .route("/leads/:id", get(get_one).put(update).patch(update).delete(remove))
        .route("/leads/:id/convert", axum::routing::put(convert).post(convert))
}

#[utoipa::path(
    get, path = "/api/leads", tag = "leads",
    params(LeadListQuery),
    responses((status = 200, description = "Paginated leads"), (status = 400, description = "Invalid filter"))
)]
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<LeadListQuery>,
) -> Result<Json<Paginated<lead::Model>>, ApiError> {
    let filter = LeadFilter { search: q.search, status: q.status, source: q.source };
    Ok(Json(lead_service::list_leads(&state.db, filter, Pagination::new(q.page, q.limit)).await?))
}

#[utoipa::path(
    get, path = "/api/leads/{id}", tag = "leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    responses((status = 200, description = "Lead with opportunities and activities"), (status = 404, description = "Not Found"))
)]
pub async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<DataResponse<LeadDetail>>, ApiError> {
    Ok(Json(DataResponse::new(lead_service::get_lead(&state.db, id).await?)))
}

#[utoipa::path(
    post, path = "/api/leads", tag = "leads",
    request_body = crate::openapi::LeadInputDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"))
)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewLead>,
) -> Result<(StatusCode, Json<DataResponse<lead::Model>>), ApiError> {
    let created = lead_service::create_lead(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

#[utoipa::path(
    put, path = "/api/leads/{id}", tag = "leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    request_body = crate::openapi::LeadInputDoc,
    responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found"))
)]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<LeadPatch>,
) -> Result<Json<DataResponse<lead::Model>>, ApiError> {
    Ok(Json(DataResponse::new(lead_service::update_lead(&state.db, id, patch).await?)))
}

#[utoipa::path(
    delete, path = "/api/leads/{id}", tag = "leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn remove(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    lead_service::delete_lead(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put, path = "/api/leads/{id}/convert", tag = "leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    responses(
        (status = 200, description = "Lead converted", body = crate::openapi::ConversionOutcomeDoc),
        (status = 404, description = "Not Found")
    )
)]
pub async fn convert(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ConversionOutcome>, ApiError> {
    Ok(Json(conversion::convert_lead(&state.db, id).await?))
}

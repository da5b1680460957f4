use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use common::types::DataResponse;
use models::opportunity::{self, NewOpportunity, OpportunityPatch};
use service::opportunity_service::{self, OpportunityDetail, OpportunityFilter, OpportunityRow};
use service::pagination::{Paginated, Pagination};

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OpportunityListQuery {
    pub stage: Option<String>,
    pub customer_id: Option<String>,
    pub lead_id: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/opportunities", get(list).post(create))
        .route("/opportunities/:id", get(get_one).put(update).patch(update).delete(remove))
}

#[utoipa::path(
    get, path = "/api/opportunities", tag = "opportunities",
    params(OpportunityListQuery),
    responses((status = 200, description = "Paginated opportunities with owner summaries"), (status = 400, description = "Invalid filter"))
)]
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<OpportunityListQuery>,
) -> Result<Json<Paginated<OpportunityRow>>, ApiError> {
    let filter = OpportunityFilter { stage: q.stage, customer_id: q.customer_id, lead_id: q.lead_id };
    let page = opportunity_service::list_opportunities(&state.db, filter, Pagination::new(q.page, q.limit)).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get, path = "/api/opportunities/{id}", tag = "opportunities",
    params(("id" = Uuid, Path, description = "Opportunity ID")),
    responses((status = 200, description = "Opportunity with owner and activities"), (status = 404, description = "Not Found"))
)]
pub async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<DataResponse<OpportunityDetail>>, ApiError> {
    Ok(Json(DataResponse::new(opportunity_service::get_opportunity(&state.db, id).await?)))
}

#[utoipa::path(
    post, path = "/api/opportunities", tag = "opportunities",
    request_body = crate::openapi::OpportunityInputDoc,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Referenced customer or lead not found")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewOpportunity>,
) -> Result<(StatusCode, Json<DataResponse<opportunity::Model>>), ApiError> {
    let created = opportunity_service::create_opportunity(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

#[utoipa::path(
    put, path = "/api/opportunities/{id}", tag = "opportunities",
    params(("id" = Uuid, Path, description = "Opportunity ID")),
    request_body = crate::openapi::OpportunityInputDoc,
    responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found"))
)]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<OpportunityPatch>,
) -> Result<Json<DataResponse<opportunity::Model>>, ApiError> {
    let updated = opportunity_service::update_opportunity(&state.db, id, patch).await?;
    Ok(Json(DataResponse::new(updated)))
}

#[utoipa::path(
    delete, path = "/api/opportunities/{id}", tag = "opportunities",
    params(("id" = Uuid, Path, description = "Opportunity ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn remove(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    opportunity_service::delete_opportunity(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

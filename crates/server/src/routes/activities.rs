use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use common::types::DataResponse;
use models::activity::{self, ActivityPatch, NewActivity};
use service::activity_service::{self, ActivityDetail, ActivityFilter, ActivityRow};
use service::pagination::{Paginated, Pagination};

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ActivityListQuery {
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub customer_id: Option<String>,
    pub lead_id: Option<String>,
    pub opportunity_id: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activities", get(list).post(create))
        .route("/activities/:id", get(get_one).put(update).patch(update).delete(remove))
}

#[utoipa::path(
    get, path = "/api/activities", tag = "activities",
    params(ActivityListQuery),
    responses((status = 200, description = "Paginated activities, newest activity date first"), (status = 400, description = "Invalid filter"))
)]
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<ActivityListQuery>,
) -> Result<Json<Paginated<ActivityRow>>, ApiError> {
    let filter = ActivityFilter {
        activity_type: q.activity_type,
        customer_id: q.customer_id,
        lead_id: q.lead_id,
        opportunity_id: q.opportunity_id,
    };
    let page = activity_service::list_activities(&state.db, filter, Pagination::new(q.page, q.limit)).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get, path = "/api/activities/{id}", tag = "activities",
    params(("id" = Uuid, Path, description = "Activity ID")),
    responses((status = 200, description = "Activity with linked records"), (status = 404, description = "Not Found"))
)]
pub async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<DataResponse<ActivityDetail>>, ApiError> {
    Ok(Json(DataResponse::new(activity_service::get_activity(&state.db, id).await?)))
}

#[utoipa::path(
    post, path = "/api/activities", tag = "activities",
    request_body = crate::openapi::ActivityInputDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"), (status = 404, description = "Linked record not found"))
)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewActivity>,
) -> Result<(StatusCode, Json<DataResponse<activity::Model>>), ApiError> {
    let created = activity_service::create_activity(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

#[utoipa::path(
    put, path = "/api/activities/{id}", tag = "activities",
    params(("id" = Uuid, Path, description = "Activity ID")),
    request_body = crate::openapi::ActivityInputDoc,
    responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found"))
)]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ActivityPatch>,
) -> Result<Json<DataResponse<activity::Model>>, ApiError> {
    Ok(Json(DataResponse::new(activity_service::update_activity(&state.db, id, patch).await?)))
}

#[utoipa::path(
    delete, path = "/api/activities/{id}", tag = "activities",
    params(("id" = Uuid, Path, description = "Activity ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn remove(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    activity_service::delete_activity(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

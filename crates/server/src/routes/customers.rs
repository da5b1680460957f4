use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use common::types::DataResponse;
use models::customer::{self, CustomerPatch, NewCustomer};
use service::customer_service::{self, CustomerDetail, CustomerFilter};
use service::pagination::{Paginated, Pagination};

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerListQuery {
    /// Substring of name, company or email.
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list).post(create))
        .route("/customers/:id", get(get_one).put(update).patch(update).delete(remove))
}

#[utoipa::path(
    get, path = "/api/customers", tag = "customers",
    params(CustomerListQuery),
    responses(
        (status = 200, description = "Paginated customers"),
        (status = 400, description = "Invalid filter")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<CustomerListQuery>,
) -> Result<Json<Paginated<customer::Model>>, ApiError> {
    let filter = CustomerFilter { search: q.search, status: q.status };
    let page = customer_service::list_customers(&state.db, filter, Pagination::new(q.page, q.limit)).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get, path = "/api/customers/{id}", tag = "customers",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer with opportunities and activities"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<DataResponse<CustomerDetail>>, ApiError> {
    let detail = customer_service::get_customer(&state.db, id).await?;
    Ok(Json(DataResponse::new(detail)))
}

#[utoipa::path(
    post, path = "/api/customers", tag = "customers",
    request_body = crate::openapi::CustomerInputDoc,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Validation Error")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewCustomer>,
) -> Result<(StatusCode, Json<DataResponse<customer::Model>>), ApiError> {
    let created = customer_service::create_customer(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

#[utoipa::path(
    put, path = "/api/customers/{id}", tag = "customers",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = crate::openapi::CustomerInputDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<CustomerPatch>,
) -> Result<Json<DataResponse<customer::Model>>, ApiError> {
    let updated = customer_service::update_customer(&state.db, id, patch).await?;
    Ok(Json(DataResponse::new(updated)))
}

#[utoipa::path(
    delete, path = "/api/customers/{id}", tag = "customers",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn remove(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    customer_service::delete_customer(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

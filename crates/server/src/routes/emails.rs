use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use utoipa::IntoParams;
use uuid::Uuid;

use common::types::DataResponse;
use service::email::{self, BulkEmail, BulkOutcome, EmailLogRow, EmailTemplate, SendEmail};
use service::pagination::{Paginated, Pagination};

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendManyRequest {
    #[serde(default)]
    pub customer_ids: Vec<String>,
    #[serde(flatten)]
    pub message: BulkEmail,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub success: bool,
    pub message_id: Option<String>,
    pub log_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SendManyResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: BulkOutcome,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/emails/send", post(send))
        .route("/emails/send-many", post(send_many))
        .route("/emails/templates", get(templates))
        .route("/emails/templates/:id", get(template))
        .route("/emails/logs", get(logs))
}

#[utoipa::path(
    post, path = "/api/emails/send", tag = "emails",
    request_body = crate::openapi::SendEmailDoc,
    responses(
        (status = 200, description = "Delivered (or simulated)"),
        (status = 400, description = "Validation Error"),
        (status = 500, description = "Delivery failed; recorded in the send log")
    )
)]
pub async fn send(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SendEmail>,
) -> Result<Json<SendResponse>, ApiError> {
    let report = state.email.send_email(&state.db, req).await?;
    if !report.success {
        error!(log_id = %report.log_id, error = ?report.error, "email send failed");
        return Err(ApiError::internal("failed to send email").with_details(json!({ "logId": report.log_id })));
    }
    Ok(Json(SendResponse { success: true, message_id: report.message_id, log_id: report.log_id }))
}

#[utoipa::path(
    post, path = "/api/emails/send-many", tag = "emails",
    request_body = crate::openapi::SendManyDoc,
    responses(
        (status = 200, description = "Per-recipient results"),
        (status = 400, description = "No ids given or no customer with an email")
    )
)]
pub async fn send_many(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SendManyRequest>,
) -> Result<Json<SendManyResponse>, ApiError> {
    let ids = req
        .customer_ids
        .iter()
        .map(|s| Uuid::parse_str(s.trim()).map_err(|_| ApiError::validation(format!("invalid customer id '{s}'"))))
        .collect::<Result<Vec<_>, _>>()?;
    let outcome = state.email.send_to_customers(&state.db, &ids, &req.message).await?;
    Ok(Json(SendManyResponse { success: true, outcome }))
}

#[utoipa::path(
    get, path = "/api/emails/templates", tag = "emails",
    responses((status = 200, description = "Template catalog"))
)]
pub async fn templates(State(state): State<AppState>) -> Json<DataResponse<Vec<EmailTemplate>>> {
    Json(DataResponse::new(state.email.templates().to_vec()))
}

#[utoipa::path(
    get, path = "/api/emails/templates/{id}", tag = "emails",
    params(("id" = String, Path, description = "Template ID")),
    responses((status = 200, description = "Template"), (status = 404, description = "Not Found"))
)]
pub async fn template(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<DataResponse<EmailTemplate>>, ApiError> {
    state
        .email
        .template(&id)
        .cloned()
        .map(|t| Json(DataResponse::new(t)))
        .ok_or_else(|| ApiError::not_found(format!("template '{id}' not found")))
}

#[utoipa::path(
    get, path = "/api/emails/logs", tag = "emails",
    params(LogQuery),
    responses((status = 200, description = "Send log, newest first"))
)]
pub async fn logs(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<LogQuery>,
) -> Result<Json<Paginated<EmailLogRow>>, ApiError> {
    Ok(Json(email::list_email_logs(&state.db, Pagination::new(q.page, q.limit)).await?))
}

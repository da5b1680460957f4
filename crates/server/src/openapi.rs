use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse { pub status: String, pub timestamp: String }

#[derive(Serialize, ToSchema)]
pub struct CustomerInputDoc {
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// active | inactive
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeadInputDoc {
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// website | referral | event | cold_call | other
    pub source: Option<String>,
    /// new | contacted | qualified | converted | lost
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityInputDoc {
    pub title: String,
    pub customer_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    /// prospecting | qualification | proposal | negotiation | closed_won | closed_lost
    pub stage: Option<String>,
    pub value: Option<f64>,
    pub probability: Option<i32>,
    /// RFC 3339 timestamp or YYYY-MM-DD
    pub expected_close_date: String,
    pub actual_close_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInputDoc {
    /// email | call | meeting | note | other
    #[serde(rename = "type")]
    pub activity_type: String,
    pub title: String,
    pub customer_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub opportunity_id: Option<Uuid>,
    pub description: Option<String>,
    pub activity_date: String,
    /// Minutes
    pub duration: Option<i32>,
    pub outcome: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutcomeDoc {
    pub customer_id: Uuid,
    pub lead_id: Uuid,
    pub opportunities_moved: u64,
    pub activities_moved: u64,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsDoc {
    pub customers: serde_json::Value,
    pub leads: serde_json::Value,
    pub opportunities: serde_json::Value,
    pub activities: serde_json::Value,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailDoc {
    pub to: Vec<String>,
    pub cc: Option<Vec<String>>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub template: Option<String>,
    pub template_data: Option<serde_json::Value>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendManyDoc {
    pub customer_ids: Vec<Uuid>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub template: Option<String>,
    pub template_data: Option<serde_json::Value>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::customers::list,
        crate::routes::customers::get_one,
        crate::routes::customers::create,
        crate::routes::customers::update,
        crate::routes::customers::remove,
        crate::routes::leads::list,
        crate::routes::leads::get_one,
        crate::routes::leads::create,
        crate::routes::leads::update,
        crate::routes::leads::remove,
        crate::routes::leads::convert,
        crate::routes::opportunities::list,
        crate::routes::opportunities::get_one,
        crate::routes::opportunities::create,
        crate::routes::opportunities::update,
        crate::routes::opportunities::remove,
        crate::routes::activities::list,
        crate::routes::activities::get_one,
        crate::routes::activities::create,
        crate::routes::activities::update,
        crate::routes::activities::remove,
        crate::routes::dashboard::stats,
        crate::routes::emails::send,
        crate::routes::emails::send_many,
        crate::routes::emails::templates,
        crate::routes::emails::template,
        crate::routes::emails::logs,
    ),
    components(
        schemas(
            HealthResponse,
            CustomerInputDoc,
            LeadInputDoc,
            OpportunityInputDoc,
            ActivityInputDoc,
            ConversionOutcomeDoc,
            DashboardStatsDoc,
            SendEmailDoc,
            SendManyDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "customers"),
        (name = "leads"),
        (name = "opportunities"),
        (name = "activities"),
        (name = "dashboard"),
        (name = "emails")
    )
)]
pub struct ApiDoc;

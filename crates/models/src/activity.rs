use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::fields::{self, Patch};
use crate::{customer, lead, opportunity};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "call")]
    Call,
    #[sea_orm(string_value = "meeting")]
    Meeting,
    #[sea_orm(string_value = "note")]
    Note,
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    pub customer_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub opportunity_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub activity_date: DateTimeWithTimeZone,
    /// Minutes.
    pub duration: Option<i32>,
    pub outcome: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Customer,
    Lead,
    Opportunity,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Customer => Entity::belongs_to(customer::Entity)
                .from(Column::CustomerId)
                .to(customer::Column::Id)
                .into(),
            Relation::Lead => Entity::belongs_to(lead::Entity)
                .from(Column::LeadId)
                .to(lead::Column::Id)
                .into(),
            Relation::Opportunity => Entity::belongs_to(opportunity::Entity)
                .from(Column::OpportunityId)
                .to(opportunity::Column::Id)
                .into(),
        }
    }
}

impl Related<customer::Entity> for Entity {
    fn to() -> RelationDef { Relation::Customer.def() }
}

impl Related<lead::Entity> for Entity {
    fn to() -> RelationDef { Relation::Lead.def() }
}

impl Related<opportunity::Entity> for Entity {
    fn to() -> RelationDef { Relation::Opportunity.def() }
}

impl ActiveModelBehavior for ActiveModel {}

fn validate_duration(d: i32) -> Result<i32, ModelError> {
    if d < 0 {
        return Err(ModelError::validation("duration must be >= 0 minutes"));
    }
    Ok(d)
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub title: String,
    pub customer_id: Option<String>,
    pub lead_id: Option<String>,
    pub opportunity_id: Option<String>,
    pub description: Option<String>,
    pub activity_date: Option<String>,
    pub duration: Option<i32>,
    pub outcome: Option<String>,
}

impl NewActivity {
    pub fn into_active_model(self) -> Result<ActiveModel, ModelError> {
        let activity_type = fields::optional_text(self.activity_type.as_deref())
            .ok_or_else(|| ModelError::validation("type is required"))?;
        let activity_type = fields::parse_enum("type", &activity_type)?;
        let title = fields::required_text("title", &self.title)?;
        let date = fields::optional_text(self.activity_date.as_deref())
            .ok_or_else(|| ModelError::validation("activityDate is required"))?;
        let activity_date = fields::parse_timestamp("activityDate", &date)?;
        let duration = self.duration.map(validate_duration).transpose()?;
        let now = fields::now();
        Ok(ActiveModel {
            id: Set(Uuid::new_v4()),
            activity_type: Set(activity_type),
            title: Set(title),
            customer_id: Set(fields::optional_uuid("customerId", self.customer_id.as_deref())?),
            lead_id: Set(fields::optional_uuid("leadId", self.lead_id.as_deref())?),
            opportunity_id: Set(fields::optional_uuid("opportunityId", self.opportunity_id.as_deref())?),
            description: Set(fields::optional_text(self.description.as_deref())),
            activity_date: Set(activity_date),
            duration: Set(duration),
            outcome: Set(fields::optional_text(self.outcome.as_deref())),
            created_at: Set(now),
            updated_at: Set(now),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityPatch {
    #[serde(rename = "type")]
    pub activity_type: Patch<String>,
    pub title: Patch<String>,
    pub customer_id: Patch<String>,
    pub lead_id: Patch<String>,
    pub opportunity_id: Patch<String>,
    pub description: Patch<String>,
    pub activity_date: Patch<String>,
    pub duration: Patch<i32>,
    pub outcome: Patch<String>,
}

impl ActivityPatch {
    pub fn apply(self, current: Model) -> Result<ActiveModel, ModelError> {
        let mut am: ActiveModel = current.into();
        if let Some(v) = fields::patch_enum("type", self.activity_type)? { am.activity_type = Set(v); }
        if let Some(v) = fields::patch_required_text("title", self.title)? { am.title = Set(v); }
        if let Some(v) = fields::patch_optional_uuid("customerId", self.customer_id)? { am.customer_id = Set(v); }
        if let Some(v) = fields::patch_optional_uuid("leadId", self.lead_id)? { am.lead_id = Set(v); }
        if let Some(v) = fields::patch_optional_uuid("opportunityId", self.opportunity_id)? {
            am.opportunity_id = Set(v);
        }
        if let Some(v) = fields::patch_optional_text(self.description) { am.description = Set(v); }
        if let Some(v) = fields::patch_required_timestamp("activityDate", self.activity_date)? {
            am.activity_date = Set(v);
        }
        match self.duration {
            Patch::Absent => {}
            Patch::Null => am.duration = Set(None),
            Patch::Value(d) => am.duration = Set(Some(validate_duration(d)?)),
        }
        if let Some(v) = fields::patch_optional_text(self.outcome) { am.outcome = Set(v); }
        am.updated_at = Set(fields::now());
        Ok(am)
    }
}

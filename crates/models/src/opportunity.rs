use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::fields::{self, Patch};
use crate::{activity, customer, lead};

pub const DEFAULT_PROBABILITY: i32 = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStage {
    #[sea_orm(string_value = "prospecting")]
    Prospecting,
    #[sea_orm(string_value = "qualification")]
    Qualification,
    #[sea_orm(string_value = "proposal")]
    Proposal,
    #[sea_orm(string_value = "negotiation")]
    Negotiation,
    #[sea_orm(string_value = "closed_won")]
    ClosedWon,
    #[sea_orm(string_value = "closed_lost")]
    ClosedLost,
}

impl OpportunityStage {
    /// Stages excluded from pipeline value.
    pub const CLOSED: [OpportunityStage; 2] = [OpportunityStage::ClosedWon, OpportunityStage::ClosedLost];
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "opportunity")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub customer_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub stage: OpportunityStage,
    #[sea_orm(column_type = "Double")]
    pub value: f64,
    pub probability: i32,
    pub expected_close_date: DateTimeWithTimeZone,
    pub actual_close_date: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Customer,
    Lead,
    Activity,
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
            Relation::Activity => Entity::has_many(activity::Entity).into(),
        }
    }
}

impl Related<customer::Entity> for Entity {
    fn to() -> RelationDef { Relation::Customer.def() }
}

impl Related<lead::Entity> for Entity {
    fn to() -> RelationDef { Relation::Lead.def() }
}

impl Related<activity::Entity> for Entity {
    fn to() -> RelationDef { Relation::Activity.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_value(v: f64) -> Result<f64, ModelError> {
    if !v.is_finite() || v < 0.0 {
        return Err(ModelError::validation("value must be a non-negative number"));
    }
    Ok(v)
}

pub fn validate_probability(p: i32) -> Result<i32, ModelError> {
    if !(0..=100).contains(&p) {
        return Err(ModelError::validation("probability must be between 0 and 100"));
    }
    Ok(p)
}

/// An opportunity is owned by exactly one of a customer or a lead.
pub fn validate_parent(customer_id: Option<Uuid>, lead_id: Option<Uuid>) -> Result<(), ModelError> {
    match (customer_id, lead_id) {
        (None, None) => Err(ModelError::validation("either customerId or leadId is required")),
        (Some(_), Some(_)) => Err(ModelError::validation("customerId and leadId are mutually exclusive")),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOpportunity {
    #[serde(default)]
    pub title: String,
    pub customer_id: Option<String>,
    pub lead_id: Option<String>,
    pub stage: Option<String>,
    pub value: Option<f64>,
    pub probability: Option<i32>,
    pub expected_close_date: Option<String>,
    pub actual_close_date: Option<String>,
    pub notes: Option<String>,
}

impl NewOpportunity {
    pub fn into_active_model(self) -> Result<ActiveModel, ModelError> {
        let title = fields::required_text("title", &self.title)?;
        let customer_id = fields::optional_uuid("customerId", self.customer_id.as_deref())?;
        let lead_id = fields::optional_uuid("leadId", self.lead_id.as_deref())?;
        validate_parent(customer_id, lead_id)?;
        let expected = fields::optional_text(self.expected_close_date.as_deref())
            .ok_or_else(|| ModelError::validation("expectedCloseDate is required"))?;
        let expected_close_date = fields::parse_timestamp("expectedCloseDate", &expected)?;
        let actual_close_date = match fields::optional_text(self.actual_close_date.as_deref()) {
            Some(s) => Some(fields::parse_timestamp("actualCloseDate", &s)?),
            None => None,
        };
        let stage = match fields::optional_text(self.stage.as_deref()) {
            Some(s) => fields::parse_enum("stage", &s)?,
            None => OpportunityStage::Prospecting,
        };
        let value = validate_value(self.value.unwrap_or(0.0))?;
        let probability = validate_probability(self.probability.unwrap_or(DEFAULT_PROBABILITY))?;
        let now = fields::now();
        Ok(ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title),
            customer_id: Set(customer_id),
            lead_id: Set(lead_id),
            stage: Set(stage),
            value: Set(value),
            probability: Set(probability),
            expected_close_date: Set(expected_close_date),
            actual_close_date: Set(actual_close_date),
            notes: Set(fields::optional_text(self.notes.as_deref())),
            created_at: Set(now),
            updated_at: Set(now),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpportunityPatch {
    pub title: Patch<String>,
    pub customer_id: Patch<String>,
    pub lead_id: Patch<String>,
    pub stage: Patch<String>,
    pub value: Patch<f64>,
    pub probability: Patch<i32>,
    pub expected_close_date: Patch<String>,
    pub actual_close_date: Patch<String>,
    pub notes: Patch<String>,
}

impl OpportunityPatch {
    pub fn apply(self, current: Model) -> Result<ActiveModel, ModelError> {
        let customer_id = fields::patch_optional_uuid("customerId", self.customer_id)?;
        let lead_id = fields::patch_optional_uuid("leadId", self.lead_id)?;
        validate_parent(
            customer_id.unwrap_or(current.customer_id),
            lead_id.unwrap_or(current.lead_id),
        )?;

        let mut am: ActiveModel = current.into();
        if let Some(v) = fields::patch_required_text("title", self.title)? { am.title = Set(v); }
        if let Some(v) = customer_id { am.customer_id = Set(v); }
        if let Some(v) = lead_id { am.lead_id = Set(v); }
        if let Some(v) = fields::patch_enum("stage", self.stage)? { am.stage = Set(v); }
        match self.value {
            Patch::Absent => {}
            Patch::Null => return Err(ModelError::validation("value cannot be cleared")),
            Patch::Value(v) => am.value = Set(validate_value(v)?),
        }
        match self.probability {
            Patch::Absent => {}
            Patch::Null => return Err(ModelError::validation("probability cannot be cleared")),
            Patch::Value(p) => am.probability = Set(validate_probability(p)?),
        }
        if let Some(v) = fields::patch_required_timestamp("expectedCloseDate", self.expected_close_date)? {
            am.expected_close_date = Set(v);
        }
        if let Some(v) = fields::patch_optional_timestamp("actualCloseDate", self.actual_close_date)? {
            am.actual_close_date = Set(v);
        }
        if let Some(v) = fields::patch_optional_text(self.notes) { am.notes = Set(v); }
        am.updated_at = Set(fields::now());
        Ok(am)
    }
}

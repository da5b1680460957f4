use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::fields::{self, Patch};
use crate::{activity, opportunity};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    #[sea_orm(string_value = "website")]
    Website,
    #[sea_orm(string_value = "referral")]
    Referral,
    #[sea_orm(string_value = "event")]
    Event,
    #[sea_orm(string_value = "cold_call")]
    ColdCall,
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "contacted")]
    Contacted,
    #[sea_orm(string_value = "qualified")]
    Qualified,
    #[sea_orm(string_value = "converted")]
    Converted,
    #[sea_orm(string_value = "lost")]
    Lost,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lead")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Opportunity,
    Activity,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Opportunity => Entity::has_many(opportunity::Entity).into(),
            Relation::Activity => Entity::has_many(activity::Entity).into(),
        }
    }
}

impl Related<opportunity::Entity> for Entity {
    fn to() -> RelationDef { Relation::Opportunity.def() }
}

impl Related<activity::Entity> for Entity {
    fn to() -> RelationDef { Relation::Activity.def() }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    #[serde(default)]
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
}

impl NewLead {
    pub fn into_active_model(self) -> Result<ActiveModel, ModelError> {
        let source = match fields::optional_text(self.source.as_deref()) {
            Some(s) => fields::parse_enum("source", &s)?,
            None => LeadSource::Other,
        };
        let status = match fields::optional_text(self.status.as_deref()) {
            Some(s) => fields::parse_enum("status", &s)?,
            None => LeadStatus::New,
        };
        let now = fields::now();
        Ok(ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(fields::required_text("name", &self.name)?),
            company: Set(fields::optional_text(self.company.as_deref())),
            email: Set(fields::optional_text(self.email.as_deref())),
            phone: Set(fields::optional_text(self.phone.as_deref())),
            source: Set(source),
            status: Set(status),
            created_at: Set(now),
            updated_at: Set(now),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadPatch {
    pub name: Patch<String>,
    pub company: Patch<String>,
    pub email: Patch<String>,
    pub phone: Patch<String>,
    pub source: Patch<String>,
    pub status: Patch<String>,
}

impl LeadPatch {
    pub fn apply(self, current: Model) -> Result<ActiveModel, ModelError> {
        let mut am: ActiveModel = current.into();
        if let Some(v) = fields::patch_required_text("name", self.name)? { am.name = Set(v); }
        if let Some(v) = fields::patch_optional_text(self.company) { am.company = Set(v); }
        if let Some(v) = fields::patch_optional_text(self.email) { am.email = Set(v); }
        if let Some(v) = fields::patch_optional_text(self.phone) { am.phone = Set(v); }
        if let Some(v) = fields::patch_enum("source", self.source)? { am.source = Set(v); }
        if let Some(v) = fields::patch_enum("status", self.status)? { am.status = Set(v); }
        am.updated_at = Set(fields::now());
        Ok(am)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults_source_and_status() {
        let am = NewLead { name: "Grace".into(), ..Default::default() }.into_active_model().unwrap();
        assert_eq!(am.source.as_ref(), &LeadSource::Other);
        assert_eq!(am.status.as_ref(), &LeadStatus::New);
    }

    #[test]
    fn cold_call_uses_snake_case_wire_name() {
        let am = NewLead { name: "Grace".into(), source: Some("cold_call".into()), ..Default::default() }
            .into_active_model()
            .unwrap();
        assert_eq!(am.source.as_ref(), &LeadSource::ColdCall);
        assert_eq!(serde_json::to_value(LeadSource::ColdCall).unwrap(), "cold_call");
    }

    #[test]
    fn create_requires_name() {
        assert!(NewLead::default().into_active_model().is_err());
    }
}

use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::fields::{self, Patch};
use crate::{activity, email_log, opportunity};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: CustomerStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Opportunity,
    Activity,
    EmailLog,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Opportunity => Entity::has_many(opportunity::Entity).into(),
            Relation::Activity => Entity::has_many(activity::Entity).into(),
            Relation::EmailLog => Entity::has_many(email_log::Entity).into(),
        }
    }
}

impl Related<opportunity::Entity> for Entity {
    fn to() -> RelationDef { Relation::Opportunity.def() }
}

impl Related<activity::Entity> for Entity {
    fn to() -> RelationDef { Relation::Activity.def() }
}

impl Related<email_log::Entity> for Entity {
    fn to() -> RelationDef { Relation::EmailLog.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Create input. `name` defaults to empty so a missing key is reported as a validation error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    #[serde(default)]
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
}

impl NewCustomer {
    pub fn into_active_model(self) -> Result<ActiveModel, ModelError> {
        let status = match fields::optional_text(self.status.as_deref()) {
            Some(s) => fields::parse_enum("status", &s)?,
            None => CustomerStatus::Active,
        };
        let now = fields::now();
        Ok(ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(fields::required_text("name", &self.name)?),
            company: Set(fields::optional_text(self.company.as_deref())),
            email: Set(fields::optional_text(self.email.as_deref())),
            phone: Set(fields::optional_text(self.phone.as_deref())),
            status: Set(status),
            created_at: Set(now),
            updated_at: Set(now),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerPatch {
    pub name: Patch<String>,
    pub company: Patch<String>,
    pub email: Patch<String>,
    pub phone: Patch<String>,
    pub status: Patch<String>,
}

impl CustomerPatch {
    pub fn apply(self, current: Model) -> Result<ActiveModel, ModelError> {
        let mut am: ActiveModel = current.into();
        if let Some(v) = fields::patch_required_text("name", self.name)? { am.name = Set(v); }
        if let Some(v) = fields::patch_optional_text(self.company) { am.company = Set(v); }
        if let Some(v) = fields::patch_optional_text(self.email) { am.email = Set(v); }
        if let Some(v) = fields::patch_optional_text(self.phone) { am.phone = Set(v); }
        if let Some(v) = fields::patch_enum("status", self.status)? { am.status = Set(v); }
        am.updated_at = Set(fields::now());
        Ok(am)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Model {
        let now = fields::now();
        Model {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            company: Some("Engines".into()),
            email: Some("ada@example.com".into()),
            phone: None,
            status: CustomerStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn create_applies_defaults_and_trims() {
        let am = NewCustomer { name: "  Ada ".into(), company: Some(" ".into()), ..Default::default() }
            .into_active_model()
            .unwrap();
        assert_eq!(am.name.as_ref(), "Ada");
        assert_eq!(am.company.as_ref(), &None);
        assert_eq!(am.status.as_ref(), &CustomerStatus::Active);
    }

    #[test]
    fn create_rejects_unknown_status() {
        let err = NewCustomer { name: "Ada".into(), status: Some("vip".into()), ..Default::default() }
            .into_active_model()
            .unwrap_err();
        assert!(err.to_string().contains("active, inactive"));
    }

    #[test]
    fn patch_touches_only_supplied_fields() {
        let current = sample();
        let patch: CustomerPatch = serde_json::from_str(r#"{"email": ""}"#).unwrap();
        let am = patch.apply(current.clone()).unwrap();
        assert!(am.email.is_set());
        assert_eq!(am.email.as_ref(), &None);
        assert!(!am.name.is_set());
        assert!(!am.company.is_set());
        assert_eq!(am.company.as_ref(), &current.company);
    }
}

use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::customer;
use crate::fields;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    #[sea_orm(string_value = "sending")]
    Sending,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "email_log")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Comma separated recipient list.
    #[sea_orm(column_type = "Text")]
    pub to: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub cc: Option<String>,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub status: EmailStatus,
    pub message_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,
    pub customer_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Customer }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Customer => Entity::belongs_to(customer::Entity)
                .from(Column::CustomerId)
                .to(customer::Column::Id)
                .into(),
        }
    }
}

impl Related<customer::Entity> for Entity {
    fn to() -> RelationDef { Relation::Customer.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Row written before a delivery attempt.
pub fn sending(
    to: &[String],
    cc: &[String],
    subject: &str,
    body: &str,
    customer_id: Option<Uuid>,
) -> ActiveModel {
    let now = fields::now();
    ActiveModel {
        id: Set(Uuid::new_v4()),
        to: Set(to.join(",")),
        cc: Set(if cc.is_empty() { None } else { Some(cc.join(",")) }),
        subject: Set(subject.to_string()),
        body: Set(body.to_string()),
        status: Set(EmailStatus::Sending),
        message_id: Set(None),
        error: Set(None),
        customer_id: Set(customer_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

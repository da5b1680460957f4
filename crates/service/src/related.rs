//! Batched lookups used to embed small summaries of related rows in list
//! responses, plus existence checks for incoming foreign keys.

use std::collections::{HashMap, HashSet};

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PrimaryKeyTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use models::{customer, lead, opportunity};

use crate::errors::ServiceError;

/// Customer or lead as embedded in opportunity rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartySummary {
    pub id: Uuid,
    pub name: String,
    pub company: Option<String>,
}

/// Customer or lead as embedded in activity rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityRef {
    pub id: Uuid,
    pub title: String,
}

impl From<&customer::Model> for PartySummary {
    fn from(m: &customer::Model) -> Self { Self { id: m.id, name: m.name.clone(), company: m.company.clone() } }
}

impl From<&lead::Model> for PartySummary {
    fn from(m: &lead::Model) -> Self { Self { id: m.id, name: m.name.clone(), company: m.company.clone() } }
}

impl From<&customer::Model> for PartyRef {
    fn from(m: &customer::Model) -> Self { Self { id: m.id, name: m.name.clone() } }
}

impl From<&lead::Model> for PartyRef {
    fn from(m: &lead::Model) -> Self { Self { id: m.id, name: m.name.clone() } }
}

impl From<&opportunity::Model> for OpportunityRef {
    fn from(m: &opportunity::Model) -> Self { Self { id: m.id, title: m.title.clone() } }
}

fn distinct(ids: impl IntoIterator<Item = Option<Uuid>>) -> Vec<Uuid> {
    let set: HashSet<Uuid> = ids.into_iter().flatten().collect();
    set.into_iter().collect()
}

pub async fn customers_by_id<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Option<Uuid>>,
) -> Result<HashMap<Uuid, customer::Model>, DbErr> {
    let ids = distinct(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = customer::Entity::find().filter(customer::Column::Id.is_in(ids)).all(db).await?;
    Ok(rows.into_iter().map(|m| (m.id, m)).collect())
}

pub async fn leads_by_id<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Option<Uuid>>,
) -> Result<HashMap<Uuid, lead::Model>, DbErr> {
    let ids = distinct(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = lead::Entity::find().filter(lead::Column::Id.is_in(ids)).all(db).await?;
    Ok(rows.into_iter().map(|m| (m.id, m)).collect())
}

pub async fn opportunities_by_id<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Option<Uuid>>,
) -> Result<HashMap<Uuid, opportunity::Model>, DbErr> {
    let ids = distinct(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = opportunity::Entity::find().filter(opportunity::Column::Id.is_in(ids)).all(db).await?;
    Ok(rows.into_iter().map(|m| (m.id, m)).collect())
}

/// NotFound unless a row with this primary key exists.
pub async fn ensure_exists<E, C>(db: &C, id: Option<Uuid>, entity: &str) -> Result<(), ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    let Some(id) = id else { return Ok(()) };
    match E::find_by_id(id).one(db).await? {
        Some(_) => Ok(()),
        None => Err(ServiceError::NotFound(format!("{entity} {id} not found"))),
    }
}

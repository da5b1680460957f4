use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use models::{activity, fields, lead, opportunity};
use models::lead::{LeadPatch, LeadSource, LeadStatus, NewLead};

use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Paginated, Pagination};

#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadDetail {
    #[serde(flatten)]
    pub lead: lead::Model,
    pub opportunities: Vec<opportunity::Model>,
    pub activities: Vec<activity::Model>,
}

pub async fn list_leads(
    db: &DatabaseConnection,
    filter: LeadFilter,
    page: Pagination,
) -> Result<Paginated<lead::Model>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(s) = fields::optional_text(filter.search.as_deref()) {
        cond = cond.add(
            Condition::any()
                .add(lead::Column::Name.contains(&s))
                .add(lead::Column::Company.contains(&s))
                .add(lead::Column::Email.contains(&s)),
        );
    }
    if let Some(s) = fields::optional_text(filter.status.as_deref()) {
        let status: LeadStatus = fields::parse_enum("status", &s)?;
        cond = cond.add(lead::Column::Status.eq(status));
    }
    if let Some(s) = fields::optional_text(filter.source.as_deref()) {
        let source: LeadSource = fields::parse_enum("source", &s)?;
        cond = cond.add(lead::Column::Source.eq(source));
    }
    let select = lead::Entity::find()
        .filter(cond)
        .order_by_desc(lead::Column::CreatedAt)
        .order_by_desc(lead::Column::Id);
    Ok(fetch_page(db, select, page).await?)
}

pub async fn get_lead(db: &DatabaseConnection, id: Uuid) -> Result<LeadDetail, ServiceError> {
    let lead = lead::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("lead"))?;
    let opportunities = lead
        .find_related(opportunity::Entity)
        .order_by_desc(opportunity::Column::CreatedAt)
        .all(db)
        .await?;
    let activities = lead
        .find_related(activity::Entity)
        .order_by_desc(activity::Column::ActivityDate)
        .all(db)
        .await?;
    Ok(LeadDetail { lead, opportunities, activities })
}

pub async fn create_lead(db: &DatabaseConnection, input: NewLead) -> Result<lead::Model, ServiceError> {
    let created = input.into_active_model()?.insert(db).await?;
    info!(lead_id = %created.id, source = ?created.source, "lead created");
    Ok(created)
}

pub async fn update_lead(db: &DatabaseConnection, id: Uuid, patch: LeadPatch) -> Result<lead::Model, ServiceError> {
    let current = lead::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("lead"))?;
    let updated = patch.apply(current)?.update(db).await?;
    info!(lead_id = %id, status = ?updated.status, "lead updated");
    Ok(updated)
}

/// Converted leads are removed by the conversion itself, so they answer NotFound here.
pub async fn delete_lead(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = lead::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("lead"));
    }
    info!(lead_id = %id, "lead deleted");
    Ok(())
}

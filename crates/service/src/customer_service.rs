use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use models::{activity, customer, fields, opportunity};
use models::customer::{CustomerPatch, CustomerStatus, NewCustomer};

use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Paginated, Pagination};

#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    /// Substring match on name, company or email.
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: customer::Model,
    pub opportunities: Vec<opportunity::Model>,
    pub activities: Vec<activity::Model>,
}

pub async fn list_customers(
    db: &DatabaseConnection,
    filter: CustomerFilter,
    page: Pagination,
) -> Result<Paginated<customer::Model>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(s) = fields::optional_text(filter.search.as_deref()) {
        cond = cond.add(
            Condition::any()
                .add(customer::Column::Name.contains(&s))
                .add(customer::Column::Company.contains(&s))
                .add(customer::Column::Email.contains(&s)),
        );
    }
    if let Some(s) = fields::optional_text(filter.status.as_deref()) {
        let status: CustomerStatus = fields::parse_enum("status", &s)?;
        cond = cond.add(customer::Column::Status.eq(status));
    }
    let select = customer::Entity::find()
        .filter(cond)
        .order_by_desc(customer::Column::CreatedAt)
        .order_by_desc(customer::Column::Id);
    Ok(fetch_page(db, select, page).await?)
}

pub async fn get_customer(db: &DatabaseConnection, id: Uuid) -> Result<CustomerDetail, ServiceError> {
    let customer = customer::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("customer"))?;
    let opportunities = customer
        .find_related(opportunity::Entity)
        .order_by_desc(opportunity::Column::CreatedAt)
        .all(db)
        .await?;
    let activities = customer
        .find_related(activity::Entity)
        .order_by_desc(activity::Column::ActivityDate)
        .all(db)
        .await?;
    Ok(CustomerDetail { customer, opportunities, activities })
}

pub async fn create_customer(db: &DatabaseConnection, input: NewCustomer) -> Result<customer::Model, ServiceError> {
    let created = input.into_active_model()?.insert(db).await?;
    info!(customer_id = %created.id, "customer created");
    Ok(created)
}

pub async fn update_customer(
    db: &DatabaseConnection,
    id: Uuid,
    patch: CustomerPatch,
) -> Result<customer::Model, ServiceError> {
    let current = customer::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("customer"))?;
    let updated = patch.apply(current)?.update(db).await?;
    info!(customer_id = %id, status = ?updated.status, "customer updated");
    Ok(updated)
}

/// Hard delete. Owned opportunities go with it; activities and email logs are detached.
pub async fn delete_customer(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = customer::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("customer"));
    }
    info!(customer_id = %id, "customer deleted");
    Ok(())
}

use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use models::{activity, customer, fields, lead, opportunity};
use models::opportunity::{NewOpportunity, OpportunityPatch, OpportunityStage};

use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Paginated, Pagination};
use crate::related::{self, PartySummary};

#[derive(Debug, Clone, Default)]
pub struct OpportunityFilter {
    pub stage: Option<String>,
    pub customer_id: Option<String>,
    pub lead_id: Option<String>,
}

/// List row: the opportunity plus a summary of whichever party owns it.
#[derive(Debug, Clone, Serialize)]
pub struct OpportunityRow {
    #[serde(flatten)]
    pub opportunity: opportunity::Model,
    pub customer: Option<PartySummary>,
    pub lead: Option<PartySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpportunityDetail {
    #[serde(flatten)]
    pub opportunity: opportunity::Model,
    pub customer: Option<customer::Model>,
    pub lead: Option<lead::Model>,
    pub activities: Vec<activity::Model>,
}

pub async fn list_opportunities(
    db: &DatabaseConnection,
    filter: OpportunityFilter,
    page: Pagination,
) -> Result<Paginated<OpportunityRow>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(s) = fields::optional_text(filter.stage.as_deref()) {
        let stage: OpportunityStage = fields::parse_enum("stage", &s)?;
        cond = cond.add(opportunity::Column::Stage.eq(stage));
    }
    if let Some(id) = fields::optional_uuid("customerId", filter.customer_id.as_deref())? {
        cond = cond.add(opportunity::Column::CustomerId.eq(id));
    }
    if let Some(id) = fields::optional_uuid("leadId", filter.lead_id.as_deref())? {
        cond = cond.add(opportunity::Column::LeadId.eq(id));
    }
    let select = opportunity::Entity::find()
        .filter(cond)
        .order_by_desc(opportunity::Column::CreatedAt)
        .order_by_desc(opportunity::Column::Id);
    let page = fetch_page(db, select, page).await?;

    let customers = related::customers_by_id(db, page.data.iter().map(|o| o.customer_id)).await?;
    let leads = related::leads_by_id(db, page.data.iter().map(|o| o.lead_id)).await?;
    Ok(page.map(|o| OpportunityRow {
        customer: o.customer_id.and_then(|id| customers.get(&id)).map(PartySummary::from),
        lead: o.lead_id.and_then(|id| leads.get(&id)).map(PartySummary::from),
        opportunity: o,
    }))
}

pub async fn get_opportunity(db: &DatabaseConnection, id: Uuid) -> Result<OpportunityDetail, ServiceError> {
    let opportunity = opportunity::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("opportunity"))?;
    let customer = opportunity.find_related(customer::Entity).one(db).await?;
    let lead = opportunity.find_related(lead::Entity).one(db).await?;
    let activities = opportunity
        .find_related(activity::Entity)
        .order_by_desc(activity::Column::ActivityDate)
        .all(db)
        .await?;
    Ok(OpportunityDetail { opportunity, customer, lead, activities })
}

/// Existence checks for parents that are being newly set.
async fn check_parents(db: &DatabaseConnection, am: &opportunity::ActiveModel) -> Result<(), ServiceError> {
    if let ActiveValue::Set(id) = &am.customer_id {
        related::ensure_exists::<customer::Entity, _>(db, *id, "customer").await?;
    }
    if let ActiveValue::Set(id) = &am.lead_id {
        related::ensure_exists::<lead::Entity, _>(db, *id, "lead").await?;
    }
    Ok(())
}

pub async fn create_opportunity(
    db: &DatabaseConnection,
    input: NewOpportunity,
) -> Result<opportunity::Model, ServiceError> {
    let am = input.into_active_model()?;
    check_parents(db, &am).await?;
    let created = am.insert(db).await?;
    info!(opportunity_id = %created.id, stage = ?created.stage, value = created.value, "opportunity created");
    Ok(created)
}

pub async fn update_opportunity(
    db: &DatabaseConnection,
    id: Uuid,
    patch: OpportunityPatch,
) -> Result<opportunity::Model, ServiceError> {
    let current = opportunity::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("opportunity"))?;
    let am = patch.apply(current)?;
    check_parents(db, &am).await?;
    let updated = am.update(db).await?;
    info!(opportunity_id = %id, stage = ?updated.stage, "opportunity updated");
    Ok(updated)
}

pub async fn delete_opportunity(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = opportunity::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("opportunity"));
    }
    info!(opportunity_id = %id, "opportunity deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer_service::create_customer;
    use crate::lead_service::create_lead;
    use crate::test_support::get_db;
    use models::customer::NewCustomer;
    use models::lead::NewLead;

    fn for_customer(id: Uuid, title: &str) -> NewOpportunity {
        NewOpportunity {
            title: title.into(),
            customer_id: Some(id.to_string()),
            expected_close_date: Some("2025-09-30".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_applies_defaults_and_detail_embeds_parent() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = create_customer(&db, NewCustomer { name: "Acme".into(), ..Default::default() }).await?;

        let o = create_opportunity(&db, for_customer(c.id, " Renewal ")).await?;
        assert_eq!(o.title, "Renewal");
        assert_eq!(o.stage, OpportunityStage::Prospecting);
        assert_eq!(o.probability, 10);
        assert_eq!(o.value, 0.0);
        assert_eq!(o.expected_close_date.to_rfc3339(), "2025-09-30T00:00:00+00:00");

        let detail = get_opportunity(&db, o.id).await?;
        assert_eq!(detail.customer.map(|m| m.id), Some(c.id));
        assert!(detail.lead.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn create_validates_parent_and_ranges() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let orphan = NewOpportunity {
            title: "Orphan".into(),
            expected_close_date: Some("2025-01-01".into()),
            ..Default::default()
        };
        assert!(matches!(create_opportunity(&db, orphan).await, Err(ServiceError::Validation(_))));

        let dangling = for_customer(Uuid::new_v4(), "Ghost");
        assert!(matches!(create_opportunity(&db, dangling).await, Err(ServiceError::NotFound(_))));

        let c = create_customer(&db, NewCustomer { name: "Acme".into(), ..Default::default() }).await?;
        let too_likely = NewOpportunity { probability: Some(101), ..for_customer(c.id, "x") };
        assert!(matches!(create_opportunity(&db, too_likely).await, Err(ServiceError::Validation(_))));
        let negative = NewOpportunity { value: Some(-1.0), ..for_customer(c.id, "x") };
        assert!(matches!(create_opportunity(&db, negative).await, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn update_keeps_single_parent() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = create_customer(&db, NewCustomer { name: "Acme".into(), ..Default::default() }).await?;
        let l = create_lead(&db, NewLead { name: "Lee".into(), ..Default::default() }).await?;
        let o = create_opportunity(&db, for_customer(c.id, "Deal")).await?;

        let both: OpportunityPatch = serde_json::from_str(&format!(r#"{{"leadId": "{}"}}"#, l.id))?;
        assert!(matches!(update_opportunity(&db, o.id, both).await, Err(ServiceError::Validation(_))));

        let moved: OpportunityPatch =
            serde_json::from_str(&format!(r#"{{"leadId": "{}", "customerId": null}}"#, l.id))?;
        let o2 = update_opportunity(&db, o.id, moved).await?;
        assert_eq!(o2.lead_id, Some(l.id));
        assert_eq!(o2.customer_id, None);
        assert_eq!(o2.title, "Deal");

        let notes: OpportunityPatch = serde_json::from_str(r#"{"notes": "call back", "stage": "proposal"}"#)?;
        let o3 = update_opportunity(&db, o.id, notes).await?;
        assert_eq!(o3.notes.as_deref(), Some("call back"));
        assert_eq!(o3.stage, OpportunityStage::Proposal);
        assert_eq!(o3.value, o2.value);
        Ok(())
    }

    #[tokio::test]
    async fn list_embeds_owner_summaries_and_filters_stage() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = create_customer(
            &db,
            NewCustomer { name: "Acme".into(), company: Some("Acme Inc".into()), ..Default::default() },
        )
        .await?;
        let l = create_lead(&db, NewLead { name: "Lee".into(), ..Default::default() }).await?;
        create_opportunity(&db, for_customer(c.id, "A")).await?;
        create_opportunity(
            &db,
            NewOpportunity {
                title: "B".into(),
                lead_id: Some(l.id.to_string()),
                stage: Some("negotiation".into()),
                expected_close_date: Some("2025-10-01".into()),
                ..Default::default()
            },
        )
        .await?;

        let all = list_opportunities(&db, OpportunityFilter::default(), Pagination::default()).await?;
        assert_eq!(all.pagination.total, 2);
        let a = all.data.iter().find(|r| r.opportunity.title == "A").expect("row A");
        assert_eq!(a.customer.as_ref().and_then(|s| s.company.as_deref()), Some("Acme Inc"));
        assert!(a.lead.is_none());
        let b = all.data.iter().find(|r| r.opportunity.title == "B").expect("row B");
        assert_eq!(b.lead.as_ref().map(|s| s.name.as_str()), Some("Lee"));

        let negotiating = list_opportunities(
            &db,
            OpportunityFilter { stage: Some("negotiation".into()), ..Default::default() },
            Pagination::default(),
        )
        .await?;
        assert_eq!(negotiating.data.len(), 1);

        let by_customer = list_opportunities(
            &db,
            OpportunityFilter { customer_id: Some(c.id.to_string()), ..Default::default() },
            Pagination::default(),
        )
        .await?;
        assert_eq!(by_customer.data.len(), 1);
        assert_eq!(by_customer.data[0].opportunity.title, "A");
        Ok(())
    }
}

use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use models::{activity, customer, fields, lead, opportunity};
use models::activity::{ActivityPatch, ActivityType, NewActivity};

use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Paginated, Pagination};
use crate::related::{self, OpportunityRef, PartyRef};

#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub activity_type: Option<String>,
    pub customer_id: Option<String>,
    pub lead_id: Option<String>,
    pub opportunity_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityRow {
    #[serde(flatten)]
    pub activity: activity::Model,
    pub customer: Option<PartyRef>,
    pub lead: Option<PartyRef>,
    pub opportunity: Option<OpportunityRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityDetail {
    #[serde(flatten)]
    pub activity: activity::Model,
    pub customer: Option<customer::Model>,
    pub lead: Option<lead::Model>,
    pub opportunity: Option<opportunity::Model>,
}

pub async fn list_activities(
    db: &DatabaseConnection,
    filter: ActivityFilter,
    page: Pagination,
) -> Result<Paginated<ActivityRow>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(s) = fields::optional_text(filter.activity_type.as_deref()) {
        let t: ActivityType = fields::parse_enum("type", &s)?;
        cond = cond.add(activity::Column::ActivityType.eq(t));
    }
    if let Some(id) = fields::optional_uuid("customerId", filter.customer_id.as_deref())? {
        cond = cond.add(activity::Column::CustomerId.eq(id));
    }
    if let Some(id) = fields::optional_uuid("leadId", filter.lead_id.as_deref())? {
        cond = cond.add(activity::Column::LeadId.eq(id));
    }
    if let Some(id) = fields::optional_uuid("opportunityId", filter.opportunity_id.as_deref())? {
        cond = cond.add(activity::Column::OpportunityId.eq(id));
    }
    let select = activity::Entity::find()
        .filter(cond)
        .order_by_desc(activity::Column::ActivityDate)
        .order_by_desc(activity::Column::Id);
    let page = fetch_page(db, select, page).await?;

    let customers = related::customers_by_id(db, page.data.iter().map(|a| a.customer_id)).await?;
    let leads = related::leads_by_id(db, page.data.iter().map(|a| a.lead_id)).await?;
    let opportunities = related::opportunities_by_id(db, page.data.iter().map(|a| a.opportunity_id)).await?;
    Ok(page.map(|a| ActivityRow {
        customer: a.customer_id.and_then(|id| customers.get(&id)).map(PartyRef::from),
        lead: a.lead_id.and_then(|id| leads.get(&id)).map(PartyRef::from),
        opportunity: a.opportunity_id.and_then(|id| opportunities.get(&id)).map(OpportunityRef::from),
        activity: a,
    }))
}

pub async fn get_activity(db: &DatabaseConnection, id: Uuid) -> Result<ActivityDetail, ServiceError> {
    let activity = activity::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("activity"))?;
    let customer = activity.find_related(customer::Entity).one(db).await?;
    let lead = activity.find_related(lead::Entity).one(db).await?;
    let opportunity = activity.find_related(opportunity::Entity).one(db).await?;
    Ok(ActivityDetail { activity, customer, lead, opportunity })
}

async fn check_links(db: &DatabaseConnection, am: &activity::ActiveModel) -> Result<(), ServiceError> {
    if let ActiveValue::Set(id) = &am.customer_id {
        related::ensure_exists::<customer::Entity, _>(db, *id, "customer").await?;
    }
    if let ActiveValue::Set(id) = &am.lead_id {
        related::ensure_exists::<lead::Entity, _>(db, *id, "lead").await?;
    }
    if let ActiveValue::Set(id) = &am.opportunity_id {
        related::ensure_exists::<opportunity::Entity, _>(db, *id, "opportunity").await?;
    }
    Ok(())
}

pub async fn create_activity(db: &DatabaseConnection, input: NewActivity) -> Result<activity::Model, ServiceError> {
    let am = input.into_active_model()?;
    check_links(db, &am).await?;
    let created = am.insert(db).await?;
    info!(activity_id = %created.id, activity_type = ?created.activity_type, "activity logged");
    Ok(created)
}

pub async fn update_activity(
    db: &DatabaseConnection,
    id: Uuid,
    patch: ActivityPatch,
) -> Result<activity::Model, ServiceError> {
    let current = activity::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("activity"))?;
    let am = patch.apply(current)?;
    check_links(db, &am).await?;
    let updated = am.update(db).await?;
    info!(activity_id = %id, activity_type = ?updated.activity_type, "activity updated");
    Ok(updated)
}

pub async fn delete_activity(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = activity::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("activity"));
    }
    info!(activity_id = %id, "activity deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer_service::create_customer;
    use crate::opportunity_service::create_opportunity;
    use crate::test_support::get_db;
    use models::customer::NewCustomer;
    use models::opportunity::NewOpportunity;

    fn activity(kind: &str, title: &str, date: &str) -> NewActivity {
        NewActivity {
            activity_type: Some(kind.into()),
            title: title.into(),
            activity_date: Some(date.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn activity_crud_service() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = create_customer(&db, NewCustomer { name: "Acme".into(), ..Default::default() }).await?;

        let a = create_activity(
            &db,
            NewActivity {
                customer_id: Some(c.id.to_string()),
                duration: Some(30),
                outcome: Some(" booked ".into()),
                ..activity("meeting", "Demo", "2025-04-01T15:00:00Z")
            },
        )
        .await?;
        assert_eq!(a.activity_type, ActivityType::Meeting);
        assert_eq!(a.outcome.as_deref(), Some("booked"));

        let detail = get_activity(&db, a.id).await?;
        assert_eq!(detail.customer.map(|m| m.name), Some("Acme".to_string()));
        assert!(detail.opportunity.is_none());

        let patch: ActivityPatch = serde_json::from_str(r#"{"duration": null, "outcome": ""}"#)?;
        let updated = update_activity(&db, a.id, patch).await?;
        assert_eq!(updated.duration, None);
        assert_eq!(updated.outcome, None);
        assert_eq!(updated.title, "Demo");
        assert_eq!(updated.customer_id, Some(c.id));

        delete_activity(&db, a.id).await?;
        assert!(matches!(get_activity(&db, a.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn dangling_links_are_not_found() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let input = NewActivity {
            opportunity_id: Some(Uuid::new_v4().to_string()),
            ..activity("call", "Ring", "2025-04-01")
        };
        assert!(matches!(create_activity(&db, input).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn list_orders_by_activity_date_and_embeds_refs() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = create_customer(&db, NewCustomer { name: "Acme".into(), ..Default::default() }).await?;
        let o = create_opportunity(
            &db,
            NewOpportunity {
                title: "Deal".into(),
                customer_id: Some(c.id.to_string()),
                expected_close_date: Some("2025-12-01".into()),
                ..Default::default()
            },
        )
        .await?;
        create_activity(&db, activity("note", "old", "2025-01-01")).await?;
        create_activity(
            &db,
            NewActivity {
                customer_id: Some(c.id.to_string()),
                opportunity_id: Some(o.id.to_string()),
                ..activity("call", "new", "2025-03-01")
            },
        )
        .await?;
        create_activity(&db, activity("call", "mid", "2025-02-01")).await?;

        let all = list_activities(&db, ActivityFilter::default(), Pagination::default()).await?;
        let titles: Vec<_> = all.data.iter().map(|r| r.activity.title.as_str()).collect();
        assert_eq!(titles, ["new", "mid", "old"]);
        assert_eq!(all.data[0].customer.as_ref().map(|p| p.name.as_str()), Some("Acme"));
        assert_eq!(all.data[0].opportunity.as_ref().map(|p| p.title.as_str()), Some("Deal"));
        assert!(all.data[1].customer.is_none());

        let calls = list_activities(
            &db,
            ActivityFilter { activity_type: Some("call".into()), ..Default::default() },
            Pagination::default(),
        )
        .await?;
        assert_eq!(calls.pagination.total, 2);

        let for_opp = list_activities(
            &db,
            ActivityFilter { opportunity_id: Some(o.id.to_string()), ..Default::default() },
            Pagination::default(),
        )
        .await?;
        assert_eq!(for_opp.data.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn updates_are_logged_for_every_entity() -> Result<(), anyhow::Error> {
        use crate::customer_service::update_customer;
        use crate::lead_service::{create_lead, update_lead};
        use crate::opportunity_service::{create_opportunity, update_opportunity};
        use crate::test_support::capture_logs;
        use models::lead::NewLead;

        let db = get_db().await?;
        let c = create_customer(&db, NewCustomer { name: "Acme".into(), ..Default::default() }).await?;
        let l = create_lead(&db, NewLead { name: "Lin".into(), ..Default::default() }).await?;
        let o = create_opportunity(
            &db,
            NewOpportunity {
                title: "Deal".into(),
                customer_id: Some(c.id.to_string()),
                expected_close_date: Some("2025-09-01".into()),
                ..Default::default()
            },
        )
        .await?;
        let a = create_activity(&db, activity("note", "Memo", "2025-04-01")).await?;

        let (logs, _guard) = capture_logs();
        update_customer(&db, c.id, serde_json::from_str(r#"{"status": "inactive"}"#)?).await?;
        update_lead(&db, l.id, serde_json::from_str(r#"{"status": "contacted"}"#)?).await?;
        update_opportunity(&db, o.id, serde_json::from_str(r#"{"stage": "proposal"}"#)?).await?;
        update_activity(&db, a.id, serde_json::from_str(r#"{"title": "Memo v2"}"#)?).await?;
        delete_activity(&db, a.id).await?;

        let out = logs.contents();
        for line in ["customer updated", "lead updated", "opportunity updated", "activity updated", "activity deleted"] {
            assert!(out.contains(line), "missing '{line}' in:\n{out}");
        }
        Ok(())
    }
}

//! Lead to customer conversion.
//!
//! Runs inside one transaction: create the customer, move every opportunity
//! and activity owned by the lead onto it, then delete the lead. Nothing is
//! visible to other connections until commit.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use common::metrics::LEADS_CONVERTED_TOTAL;
use models::customer::CustomerStatus;
use models::{activity, customer, fields, lead, opportunity};

use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutcome {
    pub customer_id: Uuid,
    pub lead_id: Uuid,
    pub opportunities_moved: u64,
    pub activities_moved: u64,
    pub message: String,
}

pub async fn convert_lead(db: &DatabaseConnection, lead_id: Uuid) -> Result<ConversionOutcome, ServiceError> {
    let txn = db.begin().await?;

    let lead = lead::Entity::find_by_id(lead_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("lead"))?;

    let now = fields::now();
    let customer = customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(lead.name.clone()),
        company: Set(lead.company.clone()),
        email: Set(lead.email.clone()),
        phone: Set(lead.phone.clone()),
        status: Set(CustomerStatus::Active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let opportunities = opportunity::Entity::update_many()
        .col_expr(opportunity::Column::CustomerId, Expr::value(Some(customer.id)))
        .col_expr(opportunity::Column::LeadId, Expr::value(Option::<Uuid>::None))
        .col_expr(opportunity::Column::UpdatedAt, Expr::value(now))
        .filter(opportunity::Column::LeadId.eq(lead.id))
        .exec(&txn)
        .await?;

    let activities = activity::Entity::update_many()
        .col_expr(activity::Column::CustomerId, Expr::value(Some(customer.id)))
        .col_expr(activity::Column::LeadId, Expr::value(Option::<Uuid>::None))
        .col_expr(activity::Column::UpdatedAt, Expr::value(now))
        .filter(activity::Column::LeadId.eq(lead.id))
        .exec(&txn)
        .await?;

    lead::Entity::delete_by_id(lead.id).exec(&txn).await?;
    txn.commit().await?;

    LEADS_CONVERTED_TOTAL.inc();
    info!(
        lead_id = %lead.id,
        customer_id = %customer.id,
        opportunities = opportunities.rows_affected,
        activities = activities.rows_affected,
        "lead converted"
    );

    Ok(ConversionOutcome {
        customer_id: customer.id,
        lead_id: lead.id,
        opportunities_moved: opportunities.rows_affected,
        activities_moved: activities.rows_affected,
        message: format!("lead '{}' converted to customer", lead.name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity_service::create_activity;
    use crate::customer_service::get_customer;
    use crate::lead_service::{create_lead, get_lead};
    use crate::opportunity_service::create_opportunity;
    use crate::test_support::get_db;
    use models::activity::NewActivity;
    use models::lead::NewLead;
    use models::opportunity::NewOpportunity;

    #[tokio::test]
    async fn conversion_moves_children_and_removes_lead() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let l = create_lead(
            &db,
            NewLead {
                name: "Lin".into(),
                company: Some("Init".into()),
                email: Some("lin@init.io".into()),
                phone: Some("555".into()),
                status: Some("qualified".into()),
                ..Default::default()
            },
        )
        .await?;
        for title in ["one", "two"] {
            create_opportunity(
                &db,
                NewOpportunity {
                    title: title.into(),
                    lead_id: Some(l.id.to_string()),
                    expected_close_date: Some("2025-08-01".into()),
                    ..Default::default()
                },
            )
            .await?;
        }
        create_activity(
            &db,
            NewActivity {
                activity_type: Some("call".into()),
                title: "intro".into(),
                lead_id: Some(l.id.to_string()),
                activity_date: Some("2025-07-01".into()),
                ..Default::default()
            },
        )
        .await?;

        let out = convert_lead(&db, l.id).await?;
        assert_eq!(out.lead_id, l.id);
        assert_eq!(out.opportunities_moved, 2);
        assert_eq!(out.activities_moved, 1);

        assert!(matches!(get_lead(&db, l.id).await, Err(ServiceError::NotFound(_))));

        let c = get_customer(&db, out.customer_id).await?;
        assert_eq!(c.customer.name, "Lin");
        assert_eq!(c.customer.company.as_deref(), Some("Init"));
        assert_eq!(c.customer.email.as_deref(), Some("lin@init.io"));
        assert_eq!(c.customer.phone.as_deref(), Some("555"));
        assert_eq!(c.customer.status, CustomerStatus::Active);
        assert_eq!(c.opportunities.len(), 2);
        assert!(c.opportunities.iter().all(|o| o.lead_id.is_none() && o.customer_id == Some(c.customer.id)));
        assert_eq!(c.activities.len(), 1);
        assert_eq!(c.activities[0].lead_id, None);

        assert!(matches!(convert_lead(&db, l.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_lead_leaves_no_customer_behind() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        assert!(matches!(convert_lead(&db, Uuid::new_v4()).await, Err(ServiceError::NotFound(_))));
        let n = customer::Entity::find().all(&db).await?.len();
        assert_eq!(n, 0);
        Ok(())
    }

    #[tokio::test]
    async fn conversion_failure_rolls_back_everything() -> Result<(), anyhow::Error> {
        use sea_orm::ConnectionTrait;

        let db = get_db().await?;
        let l = create_lead(&db, NewLead { name: "Rollback".into(), ..Default::default() }).await?;
        let o = create_opportunity(
            &db,
            NewOpportunity {
                title: "kept on lead".into(),
                lead_id: Some(l.id.to_string()),
                expected_close_date: Some("2025-08-01".into()),
                ..Default::default()
            },
        )
        .await?;

        // fail the last step, after the customer insert and the re-parenting
        db.execute_unprepared(
            "CREATE TRIGGER lead_delete_blocked BEFORE DELETE ON lead \
             BEGIN SELECT RAISE(ABORT, 'lead delete blocked'); END;",
        )
        .await?;

        let err = convert_lead(&db, l.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Db(ref msg) if msg.contains("lead delete blocked")), "{err:?}");

        assert_eq!(customer::Entity::find().all(&db).await?.len(), 0);
        let o = opportunity::Entity::find_by_id(o.id).one(&db).await?.unwrap();
        assert_eq!(o.lead_id, Some(l.id));
        assert_eq!(o.customer_id, None);
        assert!(get_lead(&db, l.id).await.is_ok());
        Ok(())
    }
}

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    TransactionTrait,
};
use uuid::Uuid;

use crate::db::{connect_with_config, migrate, DatabaseConfig};
use crate::errors::ModelError;
use crate::{activity, customer, email_log, lead, opportunity};

async fn setup_test_db() -> Result<DatabaseConnection> {
    let cfg = DatabaseConfig { url: "sqlite::memory:".into(), ..Default::default() };
    let db = connect_with_config(&cfg).await?;
    migrate(&db).await?;
    Ok(db)
}

async fn insert_customer(db: &DatabaseConnection, name: &str) -> Result<customer::Model> {
    let am = customer::NewCustomer { name: name.into(), email: Some(format!("{name}@example.com")), ..Default::default() }
        .into_active_model()?;
    Ok(am.insert(db).await?)
}

async fn insert_lead(db: &DatabaseConnection, name: &str) -> Result<lead::Model> {
    let am = lead::NewLead { name: name.into(), ..Default::default() }.into_active_model()?;
    Ok(am.insert(db).await?)
}

fn opportunity_for(customer_id: Option<Uuid>, lead_id: Option<Uuid>) -> opportunity::NewOpportunity {
    opportunity::NewOpportunity {
        title: "Deal".into(),
        customer_id: customer_id.map(|id| id.to_string()),
        lead_id: lead_id.map(|id| id.to_string()),
        expected_close_date: Some("2025-06-30".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_customer_crud() -> Result<()> {
    let db = setup_test_db().await?;

    let created = insert_customer(&db, "ada").await?;
    assert_eq!(created.status, customer::CustomerStatus::Active);

    let found = customer::Entity::find_by_id(created.id).one(&db).await?.expect("customer");
    assert_eq!(found.email.as_deref(), Some("ada@example.com"));

    let patch: customer::CustomerPatch = serde_json::from_str(r#"{"company": "Engines", "email": null}"#)?;
    let updated = patch.apply(found)?.update(&db).await?;
    assert_eq!(updated.company.as_deref(), Some("Engines"));
    assert_eq!(updated.email, None);
    assert_eq!(updated.name, "ada");

    let res = customer::Entity::delete_by_id(created.id).exec(&db).await?;
    assert_eq!(res.rows_affected, 1);
    assert!(customer::Entity::find_by_id(created.id).one(&db).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_deleting_customer_cascades_and_nulls_children() -> Result<()> {
    let db = setup_test_db().await?;
    let c = insert_customer(&db, "grace").await?;

    let opp = opportunity_for(Some(c.id), None).into_active_model()?.insert(&db).await?;
    let act = activity::NewActivity {
        activity_type: Some("call".into()),
        title: "Kickoff".into(),
        customer_id: Some(c.id.to_string()),
        activity_date: Some("2025-01-10T10:00:00Z".into()),
        ..Default::default()
    }
    .into_active_model()?
    .insert(&db)
    .await?;
    let log = email_log::sending(&["grace@example.com".into()], &[], "Hi", "Body", Some(c.id))
        .insert(&db)
        .await?;

    assert_eq!(c.find_related(opportunity::Entity).count(&db).await?, 1);

    customer::Entity::delete_by_id(c.id).exec(&db).await?;

    assert!(opportunity::Entity::find_by_id(opp.id).one(&db).await?.is_none());
    let act = activity::Entity::find_by_id(act.id).one(&db).await?.expect("activity survives");
    assert_eq!(act.customer_id, None);
    let log = email_log::Entity::find_by_id(log.id).one(&db).await?.expect("log survives");
    assert_eq!(log.customer_id, None);
    Ok(())
}

#[tokio::test]
async fn test_foreign_key_violation_maps_to_validation() -> Result<()> {
    let db = setup_test_db().await?;
    let err = opportunity_for(Some(Uuid::new_v4()), None)
        .into_active_model()?
        .insert(&db)
        .await
        .expect_err("dangling customer id");
    assert!(matches!(ModelError::from(err), ModelError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn test_reparent_inside_transaction() -> Result<()> {
    let db = setup_test_db().await?;
    let l = insert_lead(&db, "lin").await?;
    let c = insert_customer(&db, "lin").await?;
    opportunity_for(None, Some(l.id)).into_active_model()?.insert(&db).await?;

    let txn = db.begin().await?;
    let moved = opportunity::Entity::update_many()
        .col_expr(opportunity::Column::CustomerId, sea_orm::sea_query::Expr::value(Some(c.id)))
        .col_expr(opportunity::Column::LeadId, sea_orm::sea_query::Expr::value(Option::<Uuid>::None))
        .filter(opportunity::Column::LeadId.eq(l.id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    assert_eq!(moved.rows_affected, 1);
    let owned = opportunity::Entity::find()
        .filter(opportunity::Column::CustomerId.eq(c.id))
        .all(&db)
        .await?;
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].lead_id, None);
    Ok(())
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (index name, table, column)
const INDEXES: &[(&str, Tbl, Col)] = &[
    ("idx_customer_created_at", Tbl::Customer, Col::CreatedAt),
    ("idx_customer_status", Tbl::Customer, Col::Status),
    ("idx_lead_created_at", Tbl::Lead, Col::CreatedAt),
    ("idx_lead_status", Tbl::Lead, Col::Status),
    ("idx_opportunity_created_at", Tbl::Opportunity, Col::CreatedAt),
    ("idx_opportunity_stage", Tbl::Opportunity, Col::Stage),
    ("idx_opportunity_customer", Tbl::Opportunity, Col::CustomerId),
    ("idx_opportunity_lead", Tbl::Opportunity, Col::LeadId),
    ("idx_activity_date", Tbl::Activity, Col::ActivityDate),
    ("idx_activity_type", Tbl::Activity, Col::Type),
    ("idx_activity_customer", Tbl::Activity, Col::CustomerId),
    ("idx_activity_lead", Tbl::Activity, Col::LeadId),
    ("idx_activity_opportunity", Tbl::Activity, Col::OpportunityId),
    ("idx_emaillog_created_at", Tbl::EmailLog, Col::CreatedAt),
    ("idx_emaillog_customer", Tbl::EmailLog, Col::CustomerId),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, col) in INDEXES {
            manager
                .create_index(
                    Index::create()
                        .name(*name)
                        .table(*table)
                        .col(*col)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, _) in INDEXES.iter().rev() {
            manager
                .drop_index(Index::drop().name(*name).table(*table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Tbl { Customer, Lead, Opportunity, Activity, EmailLog }

#[derive(DeriveIden, Clone, Copy)]
enum Col { CreatedAt, Status, Stage, CustomerId, LeadId, OpportunityId, ActivityDate, Type }

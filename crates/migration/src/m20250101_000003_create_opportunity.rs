//! Create `opportunity` table with FKs to `customer` and `lead`.
//!
//! Exactly one parent is set under normal operation; both FKs cascade so an
//! opportunity never outlives its owner.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Opportunity::Table)
                    .if_not_exists()
                    .col(uuid(Opportunity::Id).primary_key())
                    .col(string_len(Opportunity::Title, 255).not_null())
                    .col(uuid_null(Opportunity::CustomerId))
                    .col(uuid_null(Opportunity::LeadId))
                    .col(string_len(Opportunity::Stage, 32).not_null())
                    .col(double(Opportunity::Value).not_null().default(0.0))
                    .col(integer(Opportunity::Probability).not_null().default(10))
                    .col(timestamp_with_time_zone(Opportunity::ExpectedCloseDate).not_null())
                    .col(timestamp_with_time_zone_null(Opportunity::ActualCloseDate))
                    .col(text_null(Opportunity::Notes))
                    .col(timestamp_with_time_zone(Opportunity::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Opportunity::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_opportunity_customer")
                            .from(Opportunity::Table, Opportunity::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_opportunity_lead")
                            .from(Opportunity::Table, Opportunity::LeadId)
                            .to(Lead::Table, Lead::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Opportunity::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Opportunity {
    Table,
    Id,
    Title,
    CustomerId,
    LeadId,
    Stage,
    Value,
    Probability,
    ExpectedCloseDate,
    ActualCloseDate,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Customer { Table, Id }

#[derive(DeriveIden)]
enum Lead { Table, Id }

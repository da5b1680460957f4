//! Create `activity` table with optional FKs to `customer`, `lead` and `opportunity`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(uuid(Activity::Id).primary_key())
                    .col(string_len(Activity::Type, 32).not_null())
                    .col(string_len(Activity::Title, 255).not_null())
                    .col(uuid_null(Activity::CustomerId))
                    .col(uuid_null(Activity::LeadId))
                    .col(uuid_null(Activity::OpportunityId))
                    .col(text_null(Activity::Description))
                    .col(timestamp_with_time_zone(Activity::ActivityDate).not_null())
                    .col(integer_null(Activity::Duration))
                    .col(string_len_null(Activity::Outcome, 255))
                    .col(timestamp_with_time_zone(Activity::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Activity::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_customer")
                            .from(Activity::Table, Activity::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_lead")
                            .from(Activity::Table, Activity::LeadId)
                            .to(Lead::Table, Lead::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_opportunity")
                            .from(Activity::Table, Activity::OpportunityId)
                            .to(Opportunity::Table, Opportunity::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Activity::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Activity {
    Table,
    Id,
    Type,
    Title,
    CustomerId,
    LeadId,
    OpportunityId,
    Description,
    ActivityDate,
    Duration,
    Outcome,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Customer { Table, Id }

#[derive(DeriveIden)]
enum Lead { Table, Id }

#[derive(DeriveIden)]
enum Opportunity { Table, Id }

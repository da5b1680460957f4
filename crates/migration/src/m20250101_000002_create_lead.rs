//! Create `lead` table.
//!
//! Leads live here until converted; conversion deletes the row.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Lead::Table)
                    .if_not_exists()
                    .col(uuid(Lead::Id).primary_key())
                    .col(string_len(Lead::Name, 255).not_null())
                    .col(string_len_null(Lead::Company, 255))
                    .col(string_len_null(Lead::Email, 255))
                    .col(string_len_null(Lead::Phone, 64))
                    .col(string_len(Lead::Source, 32).not_null())
                    .col(string_len(Lead::Status, 32).not_null())
                    .col(timestamp_with_time_zone(Lead::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Lead::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Lead::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Lead { Table, Id, Name, Company, Email, Phone, Source, Status, CreatedAt, UpdatedAt }

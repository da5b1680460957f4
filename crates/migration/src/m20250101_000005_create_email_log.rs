//! Create `email_log` table with optional FK to `customer`.
//!
//! One row per send attempt; status moves from `sending` to `sent` or `failed`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailLog::Table)
                    .if_not_exists()
                    .col(uuid(EmailLog::Id).primary_key())
                    .col(text(EmailLog::To).not_null())
                    .col(text_null(EmailLog::Cc))
                    .col(string_len(EmailLog::Subject, 512).not_null())
                    .col(text(EmailLog::Body).not_null())
                    .col(string_len(EmailLog::Status, 32).not_null())
                    .col(string_len_null(EmailLog::MessageId, 255))
                    .col(text_null(EmailLog::Error))
                    .col(uuid_null(EmailLog::CustomerId))
                    .col(timestamp_with_time_zone(EmailLog::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(EmailLog::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_emaillog_customer")
                            .from(EmailLog::Table, EmailLog::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(EmailLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum EmailLog { Table, Id, To, Cc, Subject, Body, Status, MessageId, Error, CustomerId, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Customer { Table, Id }

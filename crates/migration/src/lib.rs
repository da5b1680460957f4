//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_customer;
mod m20250101_000002_create_lead;
mod m20250101_000003_create_opportunity;
mod m20250101_000004_create_activity;
mod m20250101_000005_create_email_log;
mod m20250101_000006_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_customer::Migration),
            Box::new(m20250101_000002_create_lead::Migration),
            Box::new(m20250101_000003_create_opportunity::Migration),
            Box::new(m20250101_000004_create_activity::Migration),
            Box::new(m20250101_000005_create_email_log::Migration),
            // Indexes should always be applied last
            Box::new(m20250101_000006_add_indexes::Migration),
        ]
    }
}

pub use sea_orm_migration::prelude::*;

mod m20261001_090000_create_schema_and_base_db_setup;
mod m20261001_090100_create_users;
mod m20261001_090200_create_notification_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_090000_create_schema_and_base_db_setup::Migration),
            Box::new(m20261001_090100_create_users::Migration),
            Box::new(m20261001_090200_create_notification_tables::Migration),
        ]
    }
}

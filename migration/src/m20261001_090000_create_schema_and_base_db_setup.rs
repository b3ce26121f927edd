use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS notifier;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO notifier, public;")
            .await?;

        // The application connects as `notifier`; migrations may run as a superuser
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    GRANT ALL ON SCHEMA notifier TO notifier;

                    ALTER DEFAULT PRIVILEGES IN SCHEMA notifier GRANT ALL ON TABLES TO notifier;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA notifier GRANT ALL ON SEQUENCES TO notifier;
                END $$;
            "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    ALTER DEFAULT PRIVILEGES IN SCHEMA notifier REVOKE ALL ON SEQUENCES FROM notifier;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA notifier REVOKE ALL ON TABLES FROM notifier;
                    REVOKE ALL ON SCHEMA notifier FROM notifier;
                END $$;
            "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS notifier CASCADE;")
            .await?;

        Ok(())
    }
}

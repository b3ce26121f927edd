use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TYPE notifier.role AS ENUM ('user', 'country_admin', 'admin', 'super_admin')",
        )
        .await?;

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS notifier.users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                email VARCHAR(255) NOT NULL UNIQUE,
                display_name VARCHAR(255),
                password VARCHAR(255) NOT NULL,
                role notifier.role NOT NULL DEFAULT 'user',
                country VARCHAR(64),
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TABLE IF EXISTS notifier.users")
            .await?;
        db.execute_unprepared("DROP TYPE IF EXISTS notifier.role")
            .await?;

        Ok(())
    }
}

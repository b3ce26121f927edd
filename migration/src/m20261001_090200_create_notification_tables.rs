use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CREATE_TYPES: [&str; 3] = [
    "CREATE TYPE notifier.notification_variant AS ENUM ('default', 'info', 'warning', 'error')",
    "CREATE TYPE notifier.notification_priority AS ENUM ('normal', 'high')",
    "CREATE TYPE notifier.notification_channel AS ENUM ('in_app', 'push', 'both')",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for create_type in CREATE_TYPES {
            db.execute_unprepared(create_type).await?;
        }

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS notifier.notification_templates (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                name VARCHAR(255) NOT NULL UNIQUE,
                category VARCHAR(255) NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                variant notifier.notification_variant NOT NULL DEFAULT 'default',
                priority notifier.notification_priority NOT NULL DEFAULT 'normal',
                persistent BOOLEAN NOT NULL DEFAULT false,
                channel notifier.notification_channel NOT NULL DEFAULT 'in_app',
                variables TEXT[] NOT NULL DEFAULT '{}',
                active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .await?;

        // Templates that still back notifications must be deactivated, not deleted
        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS notifier.notifications (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                recipient_id UUID NOT NULL,
                template_id UUID,
                title TEXT NOT NULL,
                body TEXT,
                variant notifier.notification_variant NOT NULL DEFAULT 'default',
                priority notifier.notification_priority NOT NULL DEFAULT 'normal',
                persistent BOOLEAN NOT NULL DEFAULT false,
                read_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                CONSTRAINT fk_notifications_recipient
                    FOREIGN KEY (recipient_id)
                    REFERENCES notifier.users(id)
                    ON DELETE CASCADE,
                CONSTRAINT fk_notifications_template
                    FOREIGN KEY (template_id)
                    REFERENCES notifier.notification_templates(id)
                    ON DELETE RESTRICT
            )",
        )
        .await?;

        // Listing a user's notifications newest first
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS notifications_recipient_created_at_idx
            ON notifier.notifications(recipient_id, created_at DESC)",
        )
        .await?;

        // Unread counts and mark-all-read
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS notifications_recipient_unread_idx
            ON notifier.notifications(recipient_id)
            WHERE read_at IS NULL",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TABLE IF EXISTS notifier.notifications")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS notifier.notification_templates")
            .await?;
        for type_name in [
            "notification_channel",
            "notification_priority",
            "notification_variant",
        ] {
            db.execute_unprepared(&format!("DROP TYPE IF EXISTS notifier.{type_name}"))
                .await?;
        }

        Ok(())
    }
}

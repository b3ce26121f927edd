//! The persistence contract for notification rows and templates.
//!
//! Higher layers depend on [`NotificationStore`] rather than on a concrete
//! connection so that the same operations can run against PostgreSQL in
//! production and against an in-process store in tests.

use crate::error::Error;
use crate::notification::ReadState;
use crate::{notification, notification_template};
use async_trait::async_trait;
use entity::{notification_templates, notifications, Id};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::DatabaseConnection;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(
        &self,
        notification: notifications::Model,
    ) -> Result<notifications::Model, Error>;

    /// Inserts all rows or none of them.
    async fn insert_notifications(
        &self,
        notifications: Vec<notifications::Model>,
    ) -> Result<Vec<notifications::Model>, Error>;

    async fn find_notification(&self, id: Id) -> Result<notifications::Model, Error>;

    async fn find_notifications(
        &self,
        recipient_id: Id,
        read_state: ReadState,
        limit: Option<u64>,
    ) -> Result<Vec<notifications::Model>, Error>;

    async fn count_unread(&self, recipient_id: Id) -> Result<u64, Error>;

    /// Sets `read_at` if it is still unset and returns the row as stored.
    async fn mark_read(
        &self,
        id: Id,
        read_at: DateTimeWithTimeZone,
    ) -> Result<notifications::Model, Error>;

    /// Sets `read_at` on every unread row of `recipient_id`, returning how many changed.
    async fn mark_all_read(
        &self,
        recipient_id: Id,
        read_at: DateTimeWithTimeZone,
    ) -> Result<u64, Error>;

    async fn delete_notification(&self, id: Id) -> Result<(), Error>;

    async fn insert_template(
        &self,
        template: notification_templates::Model,
    ) -> Result<notification_templates::Model, Error>;

    async fn update_template(
        &self,
        id: Id,
        template: notification_templates::Model,
    ) -> Result<notification_templates::Model, Error>;

    async fn find_template(&self, id: Id) -> Result<notification_templates::Model, Error>;

    async fn find_template_by_name(
        &self,
        name: &str,
    ) -> Result<Option<notification_templates::Model>, Error>;

    async fn find_templates(
        &self,
        active_only: bool,
    ) -> Result<Vec<notification_templates::Model>, Error>;
}

#[async_trait]
impl NotificationStore for DatabaseConnection {
    async fn insert_notification(
        &self,
        model: notifications::Model,
    ) -> Result<notifications::Model, Error> {
        notification::create(self, model).await
    }

    async fn insert_notifications(
        &self,
        models: Vec<notifications::Model>,
    ) -> Result<Vec<notifications::Model>, Error> {
        notification::create_many(self, models).await
    }

    async fn find_notification(&self, id: Id) -> Result<notifications::Model, Error> {
        notification::find_by_id(self, id).await
    }

    async fn find_notifications(
        &self,
        recipient_id: Id,
        read_state: ReadState,
        limit: Option<u64>,
    ) -> Result<Vec<notifications::Model>, Error> {
        notification::find_by_recipient(self, recipient_id, read_state, limit).await
    }

    async fn count_unread(&self, recipient_id: Id) -> Result<u64, Error> {
        notification::count_unread(self, recipient_id).await
    }

    async fn mark_read(
        &self,
        id: Id,
        read_at: DateTimeWithTimeZone,
    ) -> Result<notifications::Model, Error> {
        notification::mark_read(self, id, read_at).await
    }

    async fn mark_all_read(
        &self,
        recipient_id: Id,
        read_at: DateTimeWithTimeZone,
    ) -> Result<u64, Error> {
        notification::mark_all_read(self, recipient_id, read_at).await
    }

    async fn delete_notification(&self, id: Id) -> Result<(), Error> {
        notification::delete_by_id(self, id).await
    }

    async fn insert_template(
        &self,
        template: notification_templates::Model,
    ) -> Result<notification_templates::Model, Error> {
        notification_template::create(self, template).await
    }

    async fn update_template(
        &self,
        id: Id,
        template: notification_templates::Model,
    ) -> Result<notification_templates::Model, Error> {
        notification_template::update(self, id, template).await
    }

    async fn find_template(&self, id: Id) -> Result<notification_templates::Model, Error> {
        notification_template::find_by_id(self, id).await
    }

    async fn find_template_by_name(
        &self,
        name: &str,
    ) -> Result<Option<notification_templates::Model>, Error> {
        notification_template::find_by_name(self, name).await
    }

    async fn find_templates(
        &self,
        active_only: bool,
    ) -> Result<Vec<notification_templates::Model>, Error> {
        notification_template::find_all(self, active_only).await
    }
}

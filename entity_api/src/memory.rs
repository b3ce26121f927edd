//! In-process [`NotificationStore`] backed by `tokio::sync::RwLock`ed vectors.
//!
//! Rows are kept in insertion order, which doubles as creation order, so
//! listings come back newest first without relying on timestamp resolution.

use crate::error::{EntityApiErrorKind, Error};
use crate::notification::ReadState;
use crate::store::NotificationStore;
use async_trait::async_trait;
use entity::{notification_templates, notifications, Id};
use sea_orm::prelude::DateTimeWithTimeZone;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    notifications: RwLock<Vec<notifications::Model>>,
    templates: RwLock<Vec<notification_templates::Model>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found() -> Error {
    Error::of_kind(EntityApiErrorKind::RecordNotFound)
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(
        &self,
        model: notifications::Model,
    ) -> Result<notifications::Model, Error> {
        let stored = notifications::Model {
            id: Id::new_v4(),
            read_at: None,
            created_at: chrono::Utc::now().into(),
            ..model
        };
        self.notifications.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn insert_notifications(
        &self,
        models: Vec<notifications::Model>,
    ) -> Result<Vec<notifications::Model>, Error> {
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let stored: Vec<_> = models
            .into_iter()
            .map(|model| notifications::Model {
                id: Id::new_v4(),
                read_at: None,
                created_at: now,
                ..model
            })
            .collect();
        self.notifications.write().await.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn find_notification(&self, id: Id) -> Result<notifications::Model, Error> {
        self.notifications
            .read()
            .await
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn find_notifications(
        &self,
        recipient_id: Id,
        read_state: ReadState,
        limit: Option<u64>,
    ) -> Result<Vec<notifications::Model>, Error> {
        let limit = limit.map_or(usize::MAX, |l| l as usize);
        Ok(self
            .notifications
            .read()
            .await
            .iter()
            .rev()
            .filter(|n| n.recipient_id == recipient_id)
            .filter(|n| match read_state {
                ReadState::All => true,
                ReadState::Read => n.is_read(),
                ReadState::Unread => !n.is_read(),
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_unread(&self, recipient_id: Id) -> Result<u64, Error> {
        Ok(self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read())
            .count() as u64)
    }

    async fn mark_read(
        &self,
        id: Id,
        read_at: DateTimeWithTimeZone,
    ) -> Result<notifications::Model, Error> {
        let mut notifications = self.notifications.write().await;
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(not_found)?;
        if notification.read_at.is_none() {
            notification.read_at = Some(read_at);
        }
        Ok(notification.clone())
    }

    async fn mark_all_read(
        &self,
        recipient_id: Id,
        read_at: DateTimeWithTimeZone,
    ) -> Result<u64, Error> {
        let mut updated = 0;
        for notification in self
            .notifications
            .write()
            .await
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && n.read_at.is_none())
        {
            notification.read_at = Some(read_at);
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_notification(&self, id: Id) -> Result<(), Error> {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| n.id != id);
        if notifications.len() == before {
            return Err(not_found());
        }
        Ok(())
    }

    async fn insert_template(
        &self,
        template: notification_templates::Model,
    ) -> Result<notification_templates::Model, Error> {
        let mut templates = self.templates.write().await;
        if templates.iter().any(|t| t.name == template.name) {
            return Err(Error::of_kind(EntityApiErrorKind::ValidationError));
        }
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let stored = notification_templates::Model {
            id: Id::new_v4(),
            created_at: now,
            updated_at: now,
            ..template
        };
        templates.push(stored.clone());
        Ok(stored)
    }

    async fn update_template(
        &self,
        id: Id,
        template: notification_templates::Model,
    ) -> Result<notification_templates::Model, Error> {
        let mut templates = self.templates.write().await;
        if templates
            .iter()
            .any(|t| t.name == template.name && t.id != id)
        {
            return Err(Error::of_kind(EntityApiErrorKind::ValidationError));
        }
        let existing = templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(not_found)?;
        *existing = notification_templates::Model {
            id,
            created_at: existing.created_at,
            updated_at: chrono::Utc::now().into(),
            ..template
        };
        Ok(existing.clone())
    }

    async fn find_template(&self, id: Id) -> Result<notification_templates::Model, Error> {
        self.templates
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn find_template_by_name(
        &self,
        name: &str,
    ) -> Result<Option<notification_templates::Model>, Error> {
        Ok(self
            .templates
            .read()
            .await
            .iter()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn find_templates(
        &self,
        active_only: bool,
    ) -> Result<Vec<notification_templates::Model>, Error> {
        let mut templates: Vec<_> = self
            .templates
            .read()
            .await
            .iter()
            .filter(|t| !active_only || t.active)
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }
}

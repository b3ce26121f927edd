//! Creating, listing and acknowledging a user's notifications.
//!
//! Every created notification is persisted first and only then handed to the
//! event publisher, so a live subscriber never sees a notification that a
//! later listing would not return.

use crate::error::Error;
use crate::template::{self, Bindings, RenderedNotification};
use crate::{channel::Channel, notifications, priority::Priority, variant::Variant, Id};
use entity_api::notification::ReadState;
use entity_api::store::NotificationStore;
use events::{DomainEvent, EventPublisher};
use log::*;
use serde::Serialize;

/// Display fields for a notification that is not backed by a template.
#[derive(Clone, Debug, Default)]
pub struct AdHocNotification {
    pub title: String,
    pub body: Option<String>,
    pub variant: Variant,
    pub priority: Priority,
    pub persistent: bool,
    pub channel: Channel,
}

/// What to create for a recipient.
#[derive(Clone, Debug)]
pub enum NewNotification {
    /// Render the active template called `name` with `bindings`.
    FromTemplate { name: String, bindings: Bindings },
    AdHoc(AdHocNotification),
}

impl From<AdHocNotification> for RenderedNotification {
    fn from(ad_hoc: AdHocNotification) -> Self {
        RenderedNotification {
            template_id: None,
            title: ad_hoc.title,
            body: ad_hoc.body,
            variant: ad_hoc.variant,
            priority: ad_hoc.priority,
            persistent: ad_hoc.persistent,
            channel: ad_hoc.channel,
        }
    }
}

/// The live frame payload: the stored row plus the channel it was rendered for.
#[derive(Serialize)]
struct LiveNotification<'a> {
    #[serde(flatten)]
    notification: &'a notifications::Model,
    channel: Channel,
}

async fn resolve(
    store: &dyn NotificationStore,
    new_notification: NewNotification,
) -> Result<RenderedNotification, Error> {
    match new_notification {
        NewNotification::FromTemplate { name, bindings } => {
            template::render(store, &name, &bindings).await
        }
        NewNotification::AdHoc(ad_hoc) => Ok(ad_hoc.into()),
    }
}

fn unsaved_row(recipient_id: Id, rendered: &RenderedNotification) -> notifications::Model {
    notifications::Model {
        id: Id::nil(),
        recipient_id,
        template_id: rendered.template_id,
        title: rendered.title.clone(),
        body: rendered.body.clone(),
        variant: rendered.variant,
        priority: rendered.priority,
        persistent: rendered.persistent,
        read_at: None,
        created_at: chrono::Utc::now().into(),
    }
}

/// Must only be called once `notification` is durably stored.
async fn publish_stored(
    publisher: &EventPublisher,
    notification: &notifications::Model,
    channel: Channel,
) -> Result<(), Error> {
    let payload = serde_json::to_value(LiveNotification {
        notification,
        channel,
    })?;

    debug!(
        "Notification {} stored for user {}, publishing",
        notification.id, notification.recipient_id
    );
    publisher
        .publish(DomainEvent::NotificationCreated {
            recipient_id: notification.recipient_id,
            notification: payload,
        })
        .await;

    Ok(())
}

/// Persists a notification for `recipient_id` and pushes it to that user's live stream, if any.
pub async fn create(
    store: &dyn NotificationStore,
    publisher: &EventPublisher,
    recipient_id: Id,
    new_notification: NewNotification,
) -> Result<notifications::Model, Error> {
    let rendered = resolve(store, new_notification).await?;
    let notification = store
        .insert_notification(unsaved_row(recipient_id, &rendered))
        .await?;
    publish_stored(publisher, &notification, rendered.channel).await?;
    Ok(notification)
}

/// Renders once and creates one independent notification per recipient.
///
/// The rows are stored all together or not at all. Nothing is published until
/// every row exists, so a failed call stores and pushes nothing.
pub async fn create_for_recipients(
    store: &dyn NotificationStore,
    publisher: &EventPublisher,
    recipient_ids: &[Id],
    new_notification: NewNotification,
) -> Result<Vec<notifications::Model>, Error> {
    let rendered = resolve(store, new_notification).await?;

    let rows = recipient_ids
        .iter()
        .map(|recipient_id| unsaved_row(*recipient_id, &rendered))
        .collect();
    let created = store.insert_notifications(rows).await?;

    for notification in &created {
        publish_stored(publisher, notification, rendered.channel).await?;
    }
    Ok(created)
}

/// Newest first.
pub async fn find_by_recipient(
    store: &dyn NotificationStore,
    recipient_id: Id,
    read_state: ReadState,
    limit: Option<u64>,
) -> Result<Vec<notifications::Model>, Error> {
    Ok(store
        .find_notifications(recipient_id, read_state, limit)
        .await?)
}

pub async fn unread_count(store: &dyn NotificationStore, recipient_id: Id) -> Result<u64, Error> {
    Ok(store.count_unread(recipient_id).await?)
}

async fn find_owned(
    store: &dyn NotificationStore,
    id: Id,
    user_id: Id,
) -> Result<notifications::Model, Error> {
    let notification = store.find_notification(id).await?;
    if notification.recipient_id != user_id {
        warn!("User {user_id} attempted to access notification {id} owned by another user");
        return Err(Error::forbidden());
    }
    Ok(notification)
}

/// Marks one of `user_id`'s notifications read. Repeating the call leaves the
/// original `read_at` untouched.
pub async fn mark_as_read(
    store: &dyn NotificationStore,
    id: Id,
    user_id: Id,
) -> Result<notifications::Model, Error> {
    let notification = find_owned(store, id, user_id).await?;
    if notification.is_read() {
        return Ok(notification);
    }
    Ok(store.mark_read(id, chrono::Utc::now().into()).await?)
}

/// Returns how many notifications changed from unread to read.
pub async fn mark_all_as_read(store: &dyn NotificationStore, user_id: Id) -> Result<u64, Error> {
    Ok(store
        .mark_all_read(user_id, chrono::Utc::now().into())
        .await?)
}

pub async fn delete(store: &dyn NotificationStore, id: Id, user_id: Id) -> Result<(), Error> {
    find_owned(store, id, user_id).await?;
    Ok(store.delete_notification(id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind, TemplateErrorKind};
    use crate::notification_templates;
    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset};
    use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
    use entity_api::memory::MemoryStore;
    use events::EventHandler;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// Records each published payload along with whether the row was already
    /// readable from the store when the event arrived.
    struct Recorder {
        store: Arc<MemoryStore>,
        seen: Mutex<Vec<(Id, Value, bool)>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: &DomainEvent) {
            let DomainEvent::NotificationCreated {
                recipient_id,
                notification,
            } = event;
            let id: Id = serde_json::from_value(notification["id"].clone()).unwrap();
            let stored = self.store.find_notification(id).await.is_ok();
            self.seen
                .lock()
                .unwrap()
                .push((*recipient_id, notification.clone(), stored));
        }
    }

    fn setup() -> (Arc<MemoryStore>, Arc<Recorder>, EventPublisher) {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(Recorder {
            store: store.clone(),
            seen: Mutex::new(Vec::new()),
        });
        let publisher = EventPublisher::new().with_handler(recorder.clone());
        (store, recorder, publisher)
    }

    /// Rejects any batch that names `rejected`, the way a foreign key
    /// violation rolls back the whole insert transaction.
    struct RejectingStore {
        inner: Arc<MemoryStore>,
        rejected: Id,
    }

    #[async_trait]
    impl NotificationStore for RejectingStore {
        async fn insert_notification(
            &self,
            notification: notifications::Model,
        ) -> Result<notifications::Model, EntityApiError> {
            self.inner.insert_notification(notification).await
        }

        async fn insert_notifications(
            &self,
            rows: Vec<notifications::Model>,
        ) -> Result<Vec<notifications::Model>, EntityApiError> {
            if rows.iter().any(|n| n.recipient_id == self.rejected) {
                return Err(EntityApiError {
                    source: None,
                    error_kind: EntityApiErrorKind::ValidationError,
                });
            }
            self.inner.insert_notifications(rows).await
        }

        async fn find_notification(&self, id: Id) -> Result<notifications::Model, EntityApiError> {
            self.inner.find_notification(id).await
        }

        async fn find_notifications(
            &self,
            recipient_id: Id,
            read_state: ReadState,
            limit: Option<u64>,
        ) -> Result<Vec<notifications::Model>, EntityApiError> {
            self.inner
                .find_notifications(recipient_id, read_state, limit)
                .await
        }

        async fn count_unread(&self, recipient_id: Id) -> Result<u64, EntityApiError> {
            self.inner.count_unread(recipient_id).await
        }

        async fn mark_read(
            &self,
            id: Id,
            read_at: DateTime<FixedOffset>,
        ) -> Result<notifications::Model, EntityApiError> {
            self.inner.mark_read(id, read_at).await
        }

        async fn mark_all_read(
            &self,
            recipient_id: Id,
            read_at: DateTime<FixedOffset>,
        ) -> Result<u64, EntityApiError> {
            self.inner.mark_all_read(recipient_id, read_at).await
        }

        async fn delete_notification(&self, id: Id) -> Result<(), EntityApiError> {
            self.inner.delete_notification(id).await
        }

        async fn insert_template(
            &self,
            template: notification_templates::Model,
        ) -> Result<notification_templates::Model, EntityApiError> {
            self.inner.insert_template(template).await
        }

        async fn update_template(
            &self,
            id: Id,
            template: notification_templates::Model,
        ) -> Result<notification_templates::Model, EntityApiError> {
            self.inner.update_template(id, template).await
        }

        async fn find_template(
            &self,
            id: Id,
        ) -> Result<notification_templates::Model, EntityApiError> {
            self.inner.find_template(id).await
        }

        async fn find_template_by_name(
            &self,
            name: &str,
        ) -> Result<Option<notification_templates::Model>, EntityApiError> {
            self.inner.find_template_by_name(name).await
        }

        async fn find_templates(
            &self,
            active_only: bool,
        ) -> Result<Vec<notification_templates::Model>, EntityApiError> {
            self.inner.find_templates(active_only).await
        }
    }

    fn ad_hoc(title: &str) -> NewNotification {
        NewNotification::AdHoc(AdHocNotification {
            title: title.to_owned(),
            ..Default::default()
        })
    }

    async fn seed_welcome(store: &MemoryStore) -> Result<(), Error> {
        template::create(
            store,
            notification_templates::Model {
                id: Id::nil(),
                name: "welcome".to_owned(),
                category: "onboarding".to_owned(),
                title: "Hi {{name}}".to_owned(),
                description: None,
                variant: Variant::Info,
                priority: Priority::High,
                persistent: true,
                channel: Channel::Both,
                variables: vec!["name".to_owned()],
                active: true,
                created_at: chrono::Utc::now().into(),
                updated_at: chrono::Utc::now().into(),
            },
        )
        .await?;
        Ok(())
    }

    #[tokio::test]
    async fn create_persists_before_publishing() -> Result<(), Error> {
        let (store, recorder, publisher) = setup();
        let recipient = Id::new_v4();

        let created = create(store.as_ref(), &publisher, recipient, ad_hoc("Lead assigned")).await?;

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (published_to, payload, was_stored) = &seen[0];
        assert_eq!(*published_to, recipient);
        assert!(was_stored);
        assert_eq!(payload["title"], "Lead assigned");
        assert_eq!(payload["channel"], "in_app");
        assert_eq!(payload["id"], json!(created.id));
        assert!(!created.is_read());
        Ok(())
    }

    #[tokio::test]
    async fn create_from_template_renders_and_links_the_template() -> Result<(), Error> {
        let (store, recorder, publisher) = setup();
        seed_welcome(&store).await?;
        let recipient = Id::new_v4();

        let created = create(
            store.as_ref(),
            &publisher,
            recipient,
            NewNotification::FromTemplate {
                name: "welcome".to_owned(),
                bindings: serde_json::from_value(json!({"name": "Ana"})).unwrap(),
            },
        )
        .await?;

        assert_eq!(created.title, "Hi Ana");
        assert_eq!(created.variant, Variant::Info);
        assert_eq!(created.priority, Priority::High);
        assert!(created.persistent);
        assert!(created.template_id.is_some());
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0].1["channel"], "both");
        Ok(())
    }

    #[tokio::test]
    async fn create_from_template_with_missing_binding_stores_nothing() -> Result<(), Error> {
        let (store, recorder, publisher) = setup();
        seed_welcome(&store).await?;
        let recipient = Id::new_v4();

        let err = create(
            store.as_ref(),
            &publisher,
            recipient,
            NewNotification::FromTemplate {
                name: "welcome".to_owned(),
                bindings: Bindings::new(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Template(
                TemplateErrorKind::MissingVariable("name".to_owned())
            ))
        );
        assert!(recorder.seen.lock().unwrap().is_empty());
        assert_eq!(unread_count(store.as_ref(), recipient).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn create_for_recipients_creates_independent_rows() -> Result<(), Error> {
        let (store, recorder, publisher) = setup();
        let recipients = [Id::new_v4(), Id::new_v4(), Id::new_v4()];

        let created =
            create_for_recipients(store.as_ref(), &publisher, &recipients, ad_hoc("Heads up"))
                .await?;

        assert_eq!(created.len(), 3);
        for (notification, recipient) in created.iter().zip(recipients) {
            assert_eq!(notification.recipient_id, recipient);
            assert_eq!(unread_count(store.as_ref(), recipient).await?, 1);
        }
        assert_eq!(recorder.seen.lock().unwrap().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn create_for_recipients_is_all_or_nothing() -> Result<(), Error> {
        let (inner, recorder, publisher) = setup();
        let known = Id::new_v4();
        let unknown = Id::new_v4();
        let store = RejectingStore {
            inner: inner.clone(),
            rejected: unknown,
        };

        let err = create_for_recipients(&store, &publisher, &[known, unknown], ad_hoc("Heads up"))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
        );
        assert_eq!(unread_count(inner.as_ref(), known).await?, 0);
        assert!(recorder.seen.lock().unwrap().is_empty());

        let created =
            create_for_recipients(&store, &publisher, &[known], ad_hoc("Heads up")).await?;
        assert_eq!(created.len(), 1);
        assert_eq!(unread_count(inner.as_ref(), known).await?, 1);
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn mark_as_read_is_idempotent() -> Result<(), Error> {
        let (store, _, publisher) = setup();
        let recipient = Id::new_v4();
        let created = create(store.as_ref(), &publisher, recipient, ad_hoc("one")).await?;

        let first = mark_as_read(store.as_ref(), created.id, recipient).await?;
        let second = mark_as_read(store.as_ref(), created.id, recipient).await?;

        assert!(first.is_read());
        assert_eq!(first.read_at, second.read_at);
        assert_eq!(unread_count(store.as_ref(), recipient).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn mark_all_as_read_only_touches_unread_rows_of_the_user() -> Result<(), Error> {
        let (store, _, publisher) = setup();
        let recipient = Id::new_v4();
        let other = Id::new_v4();
        let read = create(store.as_ref(), &publisher, recipient, ad_hoc("a")).await?;
        mark_as_read(store.as_ref(), read.id, recipient).await?;
        create(store.as_ref(), &publisher, recipient, ad_hoc("b")).await?;
        create(store.as_ref(), &publisher, recipient, ad_hoc("c")).await?;
        create(store.as_ref(), &publisher, other, ad_hoc("d")).await?;

        assert_eq!(mark_all_as_read(store.as_ref(), recipient).await?, 2);
        assert_eq!(unread_count(store.as_ref(), recipient).await?, 0);
        assert_eq!(unread_count(store.as_ref(), other).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn find_by_recipient_filters_by_read_state() -> Result<(), Error> {
        let (store, _, publisher) = setup();
        let recipient = Id::new_v4();
        let older = create(store.as_ref(), &publisher, recipient, ad_hoc("older")).await?;
        create(store.as_ref(), &publisher, recipient, ad_hoc("newer")).await?;
        mark_as_read(store.as_ref(), older.id, recipient).await?;

        let all = find_by_recipient(store.as_ref(), recipient, ReadState::All, None).await?;
        let unread =
            find_by_recipient(store.as_ref(), recipient, ReadState::Unread, None).await?;
        let limited =
            find_by_recipient(store.as_ref(), recipient, ReadState::All, Some(1)).await?;

        assert_eq!(
            all.iter().map(|n| n.title.as_str()).collect::<Vec<_>>(),
            vec!["newer", "older"]
        );
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].title, "newer");
        assert_eq!(limited.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn other_users_cannot_read_or_delete() -> Result<(), Error> {
        let (store, _, publisher) = setup();
        let owner = Id::new_v4();
        let intruder = Id::new_v4();
        let created = create(store.as_ref(), &publisher, owner, ad_hoc("private")).await?;

        let read_err = mark_as_read(store.as_ref(), created.id, intruder)
            .await
            .unwrap_err();
        let delete_err = delete(store.as_ref(), created.id, intruder)
            .await
            .unwrap_err();

        let forbidden = DomainErrorKind::Internal(InternalErrorKind::Forbidden);
        assert_eq!(read_err.error_kind, forbidden);
        assert_eq!(delete_err.error_kind, forbidden);
        assert_eq!(unread_count(store.as_ref(), owner).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_the_row() -> Result<(), Error> {
        let (store, _, publisher) = setup();
        let owner = Id::new_v4();
        let created = create(store.as_ref(), &publisher, owner, ad_hoc("bye")).await?;

        delete(store.as_ref(), created.id, owner).await?;

        let err = delete(store.as_ref(), created.id, owner).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
        );
        Ok(())
    }
}

//! Bridges one client connection to one broker registration.

use crate::connection::{Subscription, UserId};
use crate::message::Event;
use crate::Manager;
use async_stream::stream;
use futures::Stream;
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Owns a registration for the lifetime of a stream and releases it exactly
/// once, whether the stream ends on its own or is dropped by a disconnecting
/// client.
pub struct SubscriptionGuard {
    manager: Arc<Manager>,
    subscription: Option<Subscription>,
}

impl SubscriptionGuard {
    pub fn new(manager: Arc<Manager>, subscription: Subscription) -> Self {
        Self {
            manager,
            subscription: Some(subscription),
        }
    }

    pub fn close(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.manager.unsubscribe(&subscription);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.subscription.is_none()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.close();
    }
}

/// Register `user_id` with the broker right away and return the stream of
/// events for that connection: `connected` first, then every event published
/// to the user while this registration is current.
///
/// The stream ends once a newer connection for the same user replaces this
/// one. Dropping the stream unsubscribes.
pub fn subscribe(manager: Arc<Manager>, user_id: UserId) -> impl Stream<Item = Event> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = manager.subscribe(user_id.clone(), tx);
    let mut guard = SubscriptionGuard::new(manager, subscription);

    stream! {
        yield Event::Connected;

        while let Some(event) = rx.recv().await {
            yield event;
        }

        debug!("SSE connection for user {user_id} was superseded, closing");
        guard.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn stream_opens_with_connected_then_delivers_in_publish_order() {
        let manager = Arc::new(Manager::new());
        let user = "user-a".to_string();
        let mut events = Box::pin(subscribe(manager.clone(), user.clone()));

        manager.publish(&user, Event::Notification(json!({"n": 1})));
        manager.publish(&user, Event::Notification(json!({"n": 2})));

        assert_eq!(events.next().await, Some(Event::Connected));
        assert_eq!(events.next().await, Some(Event::Notification(json!({"n": 1}))));
        assert_eq!(events.next().await, Some(Event::Notification(json!({"n": 2}))));
    }

    #[tokio::test]
    async fn dropping_the_stream_unsubscribes() {
        let manager = Arc::new(Manager::new());
        let user = "user-a".to_string();

        let events = subscribe(manager.clone(), user.clone());
        assert!(manager.is_connected(&user));

        drop(events);

        assert!(!manager.is_connected(&user));
        assert!(!manager.publish(&user, Event::Notification(json!({}))));
    }

    #[tokio::test]
    async fn a_newer_stream_ends_the_older_one_without_unregistering_it() {
        let manager = Arc::new(Manager::new());
        let user = "user-a".to_string();

        let mut first = Box::pin(subscribe(manager.clone(), user.clone()));
        let mut second = Box::pin(subscribe(manager.clone(), user.clone()));

        manager.publish(&user, Event::Notification(json!({"n": 1})));

        assert_eq!(first.next().await, Some(Event::Connected));
        assert_eq!(first.next().await, None);
        drop(first);

        assert!(manager.is_connected(&user));
        assert_eq!(second.next().await, Some(Event::Connected));
        assert_eq!(second.next().await, Some(Event::Notification(json!({"n": 1}))));
    }

    #[test]
    fn guard_close_is_idempotent() {
        let manager = Arc::new(Manager::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let subscription = manager.subscribe("user-a".to_string(), tx);
        let mut guard = SubscriptionGuard::new(manager.clone(), subscription);

        guard.close();
        guard.close();

        assert!(guard.is_closed());
        assert_eq!(manager.connection_count(), 0);
        drop(guard);
    }
}

use crate::message::Event;
use dashmap::DashMap;
use log::*;
use tokio::sync::mpsc::UnboundedSender;

// Type alias for user IDs (web layer converts domain::Id to String)
pub type UserId = String;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to one registration, returned by [`ConnectionRegistry::register`].
///
/// Unregistering through a handle only removes the registration it was issued
/// for; once a newer registration has replaced it the handle is stale and
/// unregistering becomes a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    user_id: UserId,
    connection_id: ConnectionId,
}

impl Subscription {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }
}

/// The single live delivery path for a user.
#[derive(Debug)]
struct Subscriber {
    connection_id: ConnectionId,
    sender: UnboundedSender<Event>,
}

/// Registry holding at most one live subscriber per user.
///
/// Each user's slot lives in a `DashMap` shard, so replacing, removing and
/// delivering to a slot are serialized by the shard lock: a delivery observes
/// either the previous or the new subscriber, and never one that has already
/// been replaced or removed.
pub struct ConnectionRegistry {
    subscribers: DashMap<UserId, Subscriber>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Make `sender` the only live subscriber for `user_id`.
    ///
    /// A previous subscriber for the same user is dropped from the registry,
    /// which closes its channel: its receiver drains what was already queued
    /// and then ends.
    pub fn register(&self, user_id: UserId, sender: UnboundedSender<Event>) -> Subscription {
        let connection_id = ConnectionId::new();

        let previous = self.subscribers.insert(
            user_id.clone(),
            Subscriber {
                connection_id: connection_id.clone(),
                sender,
            },
        );

        if let Some(previous) = previous {
            debug!(
                "Connection {} for user {user_id} replaced by {}",
                previous.connection_id.as_str(),
                connection_id.as_str()
            );
        }

        Subscription {
            user_id,
            connection_id,
        }
    }

    /// Remove the registration `subscription` refers to, if it is still current.
    /// Returns whether anything was removed.
    pub fn unregister(&self, subscription: &Subscription) -> bool {
        self.subscribers
            .remove_if(&subscription.user_id, |_, subscriber| {
                subscriber.connection_id == subscription.connection_id
            })
            .is_some()
    }

    /// Remove whatever registration `user_id` currently has.
    pub fn unregister_user(&self, user_id: &UserId) -> bool {
        self.subscribers.remove(user_id).is_some()
    }

    /// Deliver `event` to the user's live subscriber, if any.
    /// Returns whether the event was handed to a live connection.
    pub fn send_to_user(&self, user_id: &UserId, event: Event) -> bool {
        let stale = match self.subscribers.get(user_id) {
            None => {
                trace!("No live connection for user {user_id}, dropping event");
                return false;
            }
            Some(subscriber) => match subscriber.sender.send(event) {
                Ok(()) => return true,
                Err(e) => {
                    warn!(
                        "Failed to send event to connection {}: {}. Connection will be cleaned up.",
                        subscriber.connection_id.as_str(),
                        e
                    );
                    subscriber.connection_id.clone()
                }
            },
        };

        // The read guard is released above; only remove the slot if it still
        // holds the connection whose receiver went away.
        self.subscribers
            .remove_if(user_id, |_, subscriber| subscriber.connection_id == stale);
        false
    }

    pub fn is_connected(&self, user_id: &UserId) -> bool {
        self.subscribers.contains_key(user_id)
    }

    pub fn connection_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::{self, error::TryRecvError};

    fn notification(n: u32) -> Event {
        Event::Notification(json!({ "n": n }))
    }

    #[test]
    fn register_replaces_the_previous_subscriber_for_the_same_user() {
        let registry = ConnectionRegistry::new();
        let user = "user-a".to_string();
        let (first_tx, mut first_rx) = mpsc::unbounded_channel();
        let (second_tx, mut second_rx) = mpsc::unbounded_channel();

        registry.register(user.clone(), first_tx);
        assert!(registry.send_to_user(&user, notification(1)));
        registry.register(user.clone(), second_tx);
        assert!(registry.send_to_user(&user, notification(2)));

        assert_eq!(registry.connection_count(), 1);
        assert_eq!(first_rx.try_recv(), Ok(notification(1)));
        assert_eq!(first_rx.try_recv(), Err(TryRecvError::Disconnected));
        assert_eq!(second_rx.try_recv(), Ok(notification(2)));
    }

    #[test]
    fn nothing_is_delivered_after_unregister() {
        let registry = ConnectionRegistry::new();
        let user = "user-a".to_string();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let subscription = registry.register(user.clone(), tx);
        assert!(registry.unregister(&subscription));

        assert!(!registry.send_to_user(&user, notification(1)));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn unregister_with_a_stale_handle_keeps_the_newer_registration() {
        let registry = ConnectionRegistry::new();
        let user = "user-a".to_string();
        let (old_tx, _old_rx) = mpsc::unbounded_channel();
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();

        let stale = registry.register(user.clone(), old_tx);
        let current = registry.register(user.clone(), new_tx);

        assert!(!registry.unregister(&stale));
        assert!(registry.is_connected(&user));
        assert!(registry.send_to_user(&user, notification(7)));
        assert_eq!(new_rx.try_recv(), Ok(notification(7)));

        assert!(registry.unregister(&current));
        assert!(!registry.unregister(&current));
    }

    #[test]
    fn unregister_user_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let user = "user-a".to_string();
        let (tx, _rx) = mpsc::unbounded_channel();
        registry.register(user.clone(), tx);

        assert!(registry.unregister_user(&user));
        assert!(!registry.unregister_user(&user));
    }

    #[test]
    fn send_to_a_dropped_receiver_cleans_up_the_slot() {
        let registry = ConnectionRegistry::new();
        let user = "user-a".to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register(user.clone(), tx);
        drop(rx);

        assert!(!registry.send_to_user(&user, notification(1)));
        assert!(!registry.is_connected(&user));
    }

    #[test]
    fn events_for_one_user_arrive_in_publish_order() {
        let registry = ConnectionRegistry::new();
        let user = "user-a".to_string();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register(user.clone(), tx);

        for n in 0..100 {
            registry.send_to_user(&user, notification(n));
        }

        for n in 0..100 {
            assert_eq!(rx.try_recv(), Ok(notification(n)));
        }
    }
}

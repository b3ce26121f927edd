use crate::connection::{ConnectionRegistry, Subscription, UserId};
use crate::message::{Event, EventType};
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Process-wide broker routing pushed events to each user's live stream.
///
/// Delivery is best effort and online only: an event published while a user
/// has no live subscriber is dropped. Persisted notifications remain the source
/// of truth.
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register `sender` as the user's only live subscriber, superseding any
    /// previous one.
    pub fn subscribe(&self, user_id: UserId, sender: UnboundedSender<Event>) -> Subscription {
        let subscription = self.registry.register(user_id, sender);
        info!(
            "Registered SSE connection {} for user {}",
            subscription.connection_id().as_str(),
            subscription.user_id()
        );
        subscription
    }

    /// Drop the registration behind `subscription` unless it was already replaced.
    pub fn unsubscribe(&self, subscription: &Subscription) {
        if self.registry.unregister(subscription) {
            info!(
                "Unregistered SSE connection {} for user {}",
                subscription.connection_id().as_str(),
                subscription.user_id()
            );
        } else {
            debug!(
                "SSE connection {} already superseded or removed",
                subscription.connection_id().as_str()
            );
        }
    }

    /// Drop whatever registration the user currently has.
    pub fn unsubscribe_user(&self, user_id: &UserId) {
        if self.registry.unregister_user(user_id) {
            info!("Unregistered SSE connection for user {user_id}");
        }
    }

    /// Push `event` to the user's live subscriber without waiting on it.
    /// Returns whether a live subscriber accepted the event.
    pub fn publish(&self, user_id: &UserId, event: Event) -> bool {
        let event_type = event.event_type();
        let delivered = self.registry.send_to_user(user_id, event);
        trace!("Published {event_type} event to user {user_id}: delivered={delivered}");
        delivered
    }

    pub fn is_connected(&self, user_id: &UserId) -> bool {
        self.registry.is_connected(user_id)
    }

    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

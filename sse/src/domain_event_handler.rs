use crate::message::Event as SseEvent;
use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Handles domain events by converting them to SSE events and pushing them to
/// the affected user's live connection.
///
/// The domain layer decides who the recipient is; this handler only routes.
pub struct SseDomainEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::NotificationCreated {
                recipient_id,
                notification,
            } => {
                let delivered = self.sse_manager.publish(
                    &recipient_id.to_string(),
                    SseEvent::Notification(notification.clone()),
                );

                debug!("Handled NotificationCreated for user {recipient_id}: live={delivered}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::{EventPublisher, Id};
    use serde_json::json;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn notification_created_is_pushed_to_the_recipient_only() {
        let manager = Arc::new(Manager::new());
        let recipient_id = Id::new_v4();
        let bystander_id = Id::new_v4();
        let (recipient_tx, mut recipient_rx) = mpsc::unbounded_channel();
        let (bystander_tx, mut bystander_rx) = mpsc::unbounded_channel();
        manager.subscribe(recipient_id.to_string(), recipient_tx);
        manager.subscribe(bystander_id.to_string(), bystander_tx);

        let publisher = EventPublisher::new()
            .with_handler(Arc::new(SseDomainEventHandler::new(manager.clone())));
        publisher
            .publish(DomainEvent::NotificationCreated {
                recipient_id,
                notification: json!({"title": "Lead assigned"}),
            })
            .await;

        assert_eq!(
            recipient_rx.try_recv(),
            Ok(SseEvent::Notification(json!({"title": "Lead assigned"})))
        );
        assert!(bystander_rx.try_recv().is_err());
    }
}

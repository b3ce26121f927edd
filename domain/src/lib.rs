//! Notification rules layered over `entity_api`.
//!
//! Consumers of the `domain` crate work with the items re-exported here rather
//! than depending on `entity_api` or `entity` directly.

pub use entity_api::{
    channel, notification::ReadState, notification_templates, notifications, priority, roles,
    store::NotificationStore, users, variant, Id,
};

pub mod error;
pub mod notification;
pub mod template;
pub mod user;

use uuid::Uuid;

pub mod channel;
pub mod notification_templates;
pub mod notifications;
pub mod priority;
pub mod roles;
pub mod users;
pub mod variant;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;

use serde::Serialize;
use serde_json::Value;

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Payloads pushed over a live stream. Each one is written to the wire as a
/// single `data: <json>` frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// Sent once when a stream opens, before any notification.
    #[serde(rename = "connected")]
    Connected,

    /// A freshly persisted notification for the stream's user.
    #[serde(rename = "notification")]
    Notification(Value),
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::Connected => "connected",
            Event::Notification(_) => "notification",
        }
    }
}

impl Event {
    /// Encode as an SSE frame carrying only a JSON `data` field.
    pub fn to_frame(&self) -> Result<axum::response::sse::Event, axum::Error> {
        axum::response::sse::Event::default().json_data(self)
    }
}

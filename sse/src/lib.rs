//! Server-Sent Events (SSE) infrastructure for live notification delivery.
//!
//! This crate is the in-process publish/subscribe broker that pushes freshly
//! persisted notifications to the browser sessions that are open right now.
//!
//! # Architecture
//!
//! - **At most one live connection per user**: registering a new stream for a
//!   user atomically replaces the previous one. The replaced stream stops
//!   receiving events and ends once its queue drains.
//! - **Handle based cleanup**: `subscribe` returns a [`connection::Subscription`]
//!   handle; unsubscribing with a handle that was already replaced is a no-op,
//!   so a late cleanup never tears down a newer connection.
//! - **Ephemeral messages**: events for users without a live connection are
//!   dropped. Clients reconcile through the notification list on reconnect.
//! - **Non-blocking publish**: each connection has an unbounded channel, so a
//!   slow client never blocks the publisher. Events to one user keep their
//!   publish order.
//!
//! # Message Flow
//!
//! 1. Frontend opens `GET /notifications/stream`
//! 2. Backend resolves the user from the session cookie (AuthenticatedUser)
//! 3. [`stream::subscribe`] registers the connection and yields `connected`
//! 4. The domain layer persists a notification and publishes a
//!    `DomainEvent::NotificationCreated`
//! 5. [`domain_event_handler::SseDomainEventHandler`] routes it to
//!    [`Manager::publish`], which hands it to the user's connection
//! 6. The web layer writes each event as a `data: <json>` frame
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry with single-slot-per-user registrations
//! - `manager`: Broker facade (subscribe, unsubscribe, publish)
//! - `message`: Typed event payloads and their SSE framing
//! - `stream`: Per-connection event stream with exactly-once cleanup

pub mod connection;
pub mod domain_event_handler;
pub mod manager;
pub mod message;
pub mod stream;

pub use manager::Manager;

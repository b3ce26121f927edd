//! Typed parameters for endpoint inputs.
//!
//! Query strings and request bodies are deserialized into these types so that
//! handlers only ever see well-formed input.

pub(crate) mod notification;
pub(crate) mod notification_template;

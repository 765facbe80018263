//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::events::StateEvent;
use crate::state::{ReflectionError, ReflectionState};
use crate::view::ViewModel;

/// Largest accepted message body
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Requests from a front end to the daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Raw state snapshot
    GetState,

    /// Presentation-ready projection of the state
    GetView,

    /// Replace the reflection text
    SetText { text: String },

    /// Submit the current reflection text
    Submit,

    /// Start a dictation session
    StartDictation,

    /// Window resized to `width` logical pixels
    Resize { width: u32 },

    /// Subscribe to state event pushes
    Subscribe,
}

/// Responses and pushes from the daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong,

    State(ReflectionState),

    View(ViewModel),

    /// Action accepted
    Ok,

    /// Subscription confirmed
    Subscribed,

    /// Pushed to subscribed clients
    Event { event: StateEvent },

    /// Error response
    Error { code: String, message: String },
}

impl From<ReflectionError> for Response {
    fn from(kind: ReflectionError) -> Self {
        Response::Error {
            code: kind.code().to_string(),
            message: kind.user_message().to_string(),
        }
    }
}

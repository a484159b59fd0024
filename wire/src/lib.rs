//! Session-room wire protocol shared by the server and clients.
//!
//! ARCHITECTURE
//! ============
//! Every message exchanged over the realtime transport is a [`Frame`]. Clients
//! send request frames, the server dispatches on the event prefix
//! (`"session:"`, `"action:"`, `"cursor:"`, `"chat:"`) and fans requests out
//! to room peers; replies flow back as done/error frames correlated via
//! `parent_id`.
//!
//! DESIGN
//! ======
//! - The payload is open-ended JSON (`serde_json::Value`): the transport layer
//!   routes on `event` and never inspects drawing payloads.
//! - JSON text frames are the primary encoding; [`codec`] provides a compact
//!   protobuf encoding for binary transports.
//! - Responses correlate to requests via `parent_id`.

pub mod codec;
pub mod ids;

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Frame data key for error messages.
pub const FRAME_MESSAGE: &str = "message";

/// Frame data key for grepable error codes.
pub const FRAME_CODE: &str = "code";

/// Frame data key for the retryable flag on error frames.
pub const FRAME_RETRYABLE: &str = "retryable";

/// Lifecycle position of a frame in a request/response stream.
///
/// Every exchange is `request → item* → done` or `request → error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Request,
    Item,
    Done,
    Error,
    Cancel,
}

impl Status {
    /// Terminal statuses end a response stream.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::Error | Status::Cancel)
    }
}

/// The universal message type on the realtime wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    /// Milliseconds since Unix epoch. Set automatically at construction.
    pub ts: i64,
    /// Room context, if any. Session ids are opaque client-minted strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Sender identifier (user id or system label).
    pub from: Option<String>,
    /// Namespaced event name, e.g. `"action:append"`.
    pub event: String,
    pub status: Status,
    /// Arbitrary JSON payload. Never inspected by the routing layer.
    pub data: Value,
}

/// Grepable error code and retryable flag for structured error frames.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Current time as milliseconds since Unix epoch.
pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Frame {
    /// Create a request frame. Entry point for every event.
    pub fn request(event: impl Into<String>, data: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: None,
            ts: now_ms(),
            session_id: None,
            from: None,
            event: event.into(),
            status: Status::Request,
            data,
        }
    }

    /// Create an item response carrying one result.
    #[must_use]
    pub fn item(&self, data: Value) -> Self {
        self.reply(Status::Item, data)
    }

    /// Create a done response. Terminal, carries no data.
    #[must_use]
    pub fn done(&self) -> Self {
        self.reply(Status::Done, Value::Null)
    }

    /// Create a done response carrying data. Terminal.
    #[must_use]
    pub fn done_with(&self, data: Value) -> Self {
        self.reply(Status::Done, data)
    }

    /// Create an error response from a plain string. Terminal.
    #[must_use]
    pub fn error(&self, message: impl Into<String>) -> Self {
        self.reply(Status::Error, serde_json::json!({ FRAME_MESSAGE: message.into() }))
    }

    /// Create a structured error response from a typed error. Terminal.
    #[must_use]
    pub fn error_from(&self, err: &(impl ErrorCode + ?Sized)) -> Self {
        self.reply(
            Status::Error,
            serde_json::json!({
                FRAME_CODE: err.error_code(),
                FRAME_MESSAGE: err.to_string(),
                FRAME_RETRYABLE: err.retryable(),
            }),
        )
    }

    /// Build a reply frame. Inherits `parent_id`, `session_id`, and `event`.
    fn reply(&self, status: Status, data: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: Some(self.id),
            ts: now_ms(),
            session_id: self.session_id.clone(),
            from: None,
            event: self.event.clone(),
            status,
            data,
        }
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Insert one key into the data payload, promoting it to an object first
    /// if it isn't one already.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if !self.data.is_object() {
            self.data = Value::Object(serde_json::Map::new());
        }
        if let Some(map) = self.data.as_object_mut() {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Extract the event prefix (everything before the first ':').
    #[must_use]
    pub fn prefix(&self) -> &str {
        let Some((prefix, _)) = self.event.split_once(':') else {
            return &self.event;
        };
        prefix
    }
}

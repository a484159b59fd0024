//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the live session directory and the optional invite mailer. Rooms
//! exist only in memory: one is created implicitly on first join and evicted
//! when its last client parts. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::mail::Mailer;
use wire::Frame;

// =============================================================================
// CONNECTED CLIENT
// =============================================================================

/// Identity a client presented when joining a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedClient {
    pub user_id: String,
    pub username: String,
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Per-room live state. Both maps are keyed by connection id, so a rejoining
/// socket replaces its own registration rather than duplicating it.
pub struct SessionState {
    /// Connected clients: connection id -> sender for outgoing frames.
    pub clients: HashMap<Uuid, mpsc::Sender<Frame>>,
    /// Presented identities, same keys as `clients`.
    pub users: HashMap<Uuid, ConnectedClient>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self { clients: HashMap::new(), users: HashMap::new() }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum — all inner fields
/// are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    /// Live rooms keyed by session id.
    pub sessions: Arc<RwLock<HashMap<String, SessionState>>>,
    /// Optional invite mailer. `None` if SMTP env vars are not configured.
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl AppState {
    #[must_use]
    pub fn new(mailer: Option<Arc<dyn Mailer>>) -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())), mailer }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;

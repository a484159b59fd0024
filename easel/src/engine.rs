//! The client engine: one participant's view of a shared session.
//!
//! DESIGN
//! ======
//! The engine owns the local history, a cached canvas surface, the remote
//! cursor registry, and the chat log. Local gestures go through `draw`,
//! `undo`, `redo`, and `clear`; everything arriving from the transport is a
//! typed [`Remote`] message that the host drains into `apply_remote` from a
//! single consumer, preserving per-sender order with no shared-memory races.
//!
//! Outbound traffic is fire-and-forget: methods return the [`Frame`] to send
//! (or `None` when no session is joined — sends while disconnected are
//! silently dropped, matching the transport failure policy). Local state is
//! final before anything is sent.
//!
//! Undo, redo, and clear are local-only and produce no outbound frames, so
//! peers can diverge after one participant rewinds. Documented limitation.
//!
//! RENDERING
//! =========
//! Appends draw only the newest action onto the cached surface. A fill
//! append, undo, redo, or clear forces a full replay, since those change
//! what lies beneath already-rendered pixels.

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;

use std::collections::HashMap;

use image::RgbaImage;
use serde_json::{Value, json};
use wire::Frame;

use crate::action::{self, BrushType, ChatMessage, CursorRecord, DrawingAction, Point};
use crate::history::HistoryState;
use crate::prefs::ClientPreferences;
use crate::raster::Surface;
use crate::replay;

/// Typed messages delivered by the transport, drained sequentially.
#[derive(Debug, Clone)]
pub enum Remote {
    /// A peer appended a drawing action.
    Action(DrawingAction),
    /// A peer moved their cursor.
    Cursor { user_id: String, point: Point, username: String },
    /// A chat message reached the room (the sender's own messages included —
    /// chat is appended on broadcast receipt, never optimistically).
    Chat(ChatMessage),
    /// A peer left the session.
    PeerLeft { user_id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("session id must not be empty")]
    EmptySessionId,
}

pub struct Engine {
    history: HistoryState,
    surface: Surface,
    width: u32,
    height: u32,
    prefs: ClientPreferences,
    session_id: Option<String>,
    user_id: String,
    cursors: HashMap<String, CursorRecord>,
    chat: Vec<ChatMessage>,
}

impl Engine {
    #[must_use]
    pub fn new(width: u32, height: u32, prefs: ClientPreferences) -> Self {
        Self {
            history: HistoryState::new(),
            surface: Surface::new(width, height, replay::BACKGROUND),
            width,
            height,
            prefs,
            session_id: None,
            user_id: wire::ids::user_id(),
            cursors: HashMap::new(),
            chat: Vec::new(),
        }
    }

    // --- Session membership ---

    /// Mint a fresh session id, adopt it, and return the join frame to send.
    pub fn create_session(&mut self) -> Frame {
        let session_id = wire::ids::session_id();
        self.session_id = Some(session_id.clone());
        self.join_frame(&session_id)
    }

    /// Join an existing session by id (the id is the capability — no further
    /// validation exists). Returns the join frame to send.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptySessionId`] for a blank id.
    pub fn join_session(&mut self, session_id: &str) -> Result<Frame, EngineError> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(EngineError::EmptySessionId);
        }
        self.session_id = Some(session_id.to_owned());
        Ok(self.join_frame(session_id))
    }

    fn join_frame(&self, session_id: &str) -> Frame {
        Frame::request("session:join", json!({ "username": self.prefs.username }))
            .with_session_id(session_id)
            .with_from(self.user_id.clone())
    }

    // --- Local gestures ---

    /// Append a locally-produced action, rasterize it, and return the
    /// broadcast frame (if a session is joined).
    pub fn draw(&mut self, action: DrawingAction) -> Option<Frame> {
        let payload = serde_json::to_value(&action).unwrap_or(Value::Null);
        let is_fill = action.brush_type == BrushType::Fill;

        self.history.append(action);
        if is_fill {
            self.rerender();
        } else if let Some(appended) = self.history.actions().last() {
            replay::draw_action(&mut self.surface, appended);
        }

        self.outbound("action:append", payload)
    }

    /// Convenience: append a background fill in the given color.
    pub fn fill_canvas(&mut self, color: impl Into<String>) -> Option<Frame> {
        self.draw(DrawingAction::fill(color, self.prefs.brush_size))
    }

    /// Local-only undo. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo();
        if changed {
            self.rerender();
        }
        changed
    }

    /// Local-only redo. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo();
        if changed {
            self.rerender();
        }
        changed
    }

    /// Local-only clear: wipes the log and the redo stack and resets the
    /// canvas to white. Not broadcast.
    pub fn clear(&mut self) {
        self.history.clear();
        self.rerender();
    }

    /// Produce a cursor-update frame for the local pointer. Ephemeral: no
    /// local state changes.
    #[must_use]
    pub fn move_cursor(&self, point: Point) -> Option<Frame> {
        self.outbound(
            "cursor:update",
            json!({
                "userId": self.user_id,
                "x": point.x,
                "y": point.y,
                "username": self.prefs.username,
            }),
        )
    }

    /// Produce a chat frame. The message is NOT appended locally — the chat
    /// log is driven by the echoed broadcast, so the sender sees their own
    /// message exactly when peers do.
    #[must_use]
    pub fn chat(&self, content: impl Into<String>) -> Option<Frame> {
        let message = ChatMessage {
            id: wire::ids::action_id(),
            user_id: self.user_id.clone(),
            username: self.prefs.username.clone(),
            content: content.into(),
            timestamp: action::now_ms(),
        };
        let payload = serde_json::to_value(&message).unwrap_or(Value::Null);
        self.outbound("chat:message", payload)
    }

    fn outbound(&self, event: &str, data: Value) -> Option<Frame> {
        let session_id = self.session_id.as_deref()?;
        Some(
            Frame::request(event, data)
                .with_session_id(session_id)
                .with_from(self.user_id.clone()),
        )
    }

    // --- Remote messages ---

    /// Apply one message from the transport. The caller drains messages
    /// sequentially, so per-sender order is preserved by construction.
    pub fn apply_remote(&mut self, message: Remote) {
        match message {
            Remote::Action(action) => {
                let is_fill = action.brush_type == BrushType::Fill;
                self.history.append(action);
                if is_fill {
                    self.rerender();
                } else if let Some(appended) = self.history.actions().last() {
                    replay::draw_action(&mut self.surface, appended);
                }
            }
            Remote::Cursor { user_id, point, username } => {
                self.upsert_cursor(user_id, point, username);
            }
            Remote::Chat(message) => self.chat.push(message),
            Remote::PeerLeft { user_id } => {
                self.cursors.remove(&user_id);
            }
        }
    }

    fn upsert_cursor(&mut self, user_id: String, point: Point, username: String) {
        if let Some(existing) = self.cursors.get_mut(&user_id) {
            existing.point = point;
            if !username.is_empty() {
                existing.username = username;
            }
        } else {
            let color = cursor_color(&user_id);
            let username = if username.is_empty() {
                // Ids are remote input and not necessarily ASCII, so take
                // characters rather than byte-slicing.
                let tag: String = user_id.chars().take(4).collect();
                format!("User-{tag}")
            } else {
                username
            };
            self.cursors
                .insert(user_id.clone(), CursorRecord { user_id, point, color, username });
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn canvas(&self) -> &RgbaImage {
        self.surface.as_image()
    }

    /// Encode the current canvas as PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn export_png(&self) -> Result<Vec<u8>, image::ImageError> {
        self.surface.encode_png()
    }

    #[must_use]
    pub fn history(&self) -> &HistoryState {
        &self.history
    }

    #[must_use]
    pub fn actions(&self) -> &[DrawingAction] {
        self.history.actions()
    }

    #[must_use]
    pub fn cursors(&self) -> &HashMap<String, CursorRecord> {
        &self.cursors
    }

    #[must_use]
    pub fn chat_log(&self) -> &[ChatMessage] {
        &self.chat
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub fn prefs(&self) -> &ClientPreferences {
        &self.prefs
    }

    pub fn prefs_mut(&mut self) -> &mut ClientPreferences {
        &mut self.prefs
    }

    fn rerender(&mut self) {
        self.surface = replay::render_surface(self.history.actions(), self.width, self.height);
    }
}

/// Stable display color for a remote cursor, derived from the user id so
/// every view of the same participant picks the same hue.
fn cursor_color(user_id: &str) -> String {
    // FNV-1a.
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in user_id.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    format!("hsl({}, 70%, 50%)", hash % 360)
}

//! Room membership and frame fan-out.
//!
//! DESIGN
//! ======
//! A session id is the capability: presenting one on join is all the
//! authorization there is. Rooms are created implicitly on first join and
//! evicted when the last client parts, so the directory only ever holds
//! live rooms.
//!
//! Fan-out is best-effort. Frames are pushed with `try_send` and a full or
//! closed peer channel is skipped — a slow client loses frames rather than
//! stalling the room. Per-sender order is preserved by the channel; no
//! ordering is imposed across senders.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::{AppState, ConnectedClient};
use wire::Frame;

/// Register a client in a room, creating the room on first join. Rejoining
/// under the same connection id replaces the previous registration. Returns
/// the roster after the join, the joiner included.
pub async fn join_session(
    state: &AppState,
    session_id: &str,
    client_id: Uuid,
    tx: mpsc::Sender<Frame>,
    user: ConnectedClient,
) -> Vec<ConnectedClient> {
    let mut sessions = state.sessions.write().await;
    let room = sessions.entry(session_id.to_owned()).or_default();
    if room.clients.is_empty() {
        info!(%session_id, "session: room created");
    }
    room.clients.insert(client_id, tx);
    room.users.insert(client_id, user);
    room.users.values().cloned().collect()
}

/// Remove a client from a room, evicting the room when it empties. Returns
/// the departed identity if the client was a member.
pub async fn part_session(
    state: &AppState,
    session_id: &str,
    client_id: Uuid,
) -> Option<ConnectedClient> {
    let mut sessions = state.sessions.write().await;
    let user = {
        let room = sessions.get_mut(session_id)?;
        room.clients.remove(&client_id);
        room.users.remove(&client_id)
    };
    if sessions.get(session_id).is_some_and(|room| room.clients.is_empty()) {
        sessions.remove(session_id);
        info!(%session_id, "session: room evicted");
    }
    user
}

/// Fan a frame out to room members, optionally excluding one connection.
/// Best-effort: a full or closed channel is skipped.
pub async fn broadcast(state: &AppState, session_id: &str, frame: &Frame, exclude: Option<Uuid>) {
    let sessions = state.sessions.read().await;
    let Some(room) = sessions.get(session_id) else {
        return;
    };
    for (client_id, tx) in &room.clients {
        if Some(*client_id) == exclude {
            continue;
        }
        if let Err(e) = tx.try_send(frame.clone()) {
            debug!(%client_id, error = %e, "session: broadcast skipped");
        }
    }
}

/// Current roster of a room. Empty for unknown rooms.
pub async fn list_session_users(state: &AppState, session_id: &str) -> Vec<ConnectedClient> {
    let sessions = state.sessions.read().await;
    sessions
        .get(session_id)
        .map(|room| room.users.values().cloned().collect())
        .unwrap_or_default()
}

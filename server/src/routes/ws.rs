//! WebSocket handler — bidirectional frame relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection id and enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by event prefix
//! - Broadcast frames from room peers → forward to client
//!
//! Handler functions are pure routing logic — they validate, update room
//! membership, and return an [`Outcome`]. The dispatch layer owns all
//! outbound concerns: reply to sender and fan-out to peers. The relay never
//! inspects drawing payloads; `data` passes through opaquely.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with the connection id
//! 2. Client sends frames → dispatch → handler returns Outcome
//! 3. Dispatch applies Outcome (reply / broadcast / both)
//! 4. Close → broadcast `session:part` to peers → cleanup
//!
//! A socket is in at most one room: joining while joined parts the previous
//! room first.

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services;
use crate::state::{AppState, ConnectedClient};
use wire::{Frame, Status};

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what — handlers never send frames directly.
enum Outcome {
    /// Done+data to the sender; a copy to every room peer. Used for chat,
    /// where the sender's echo doubles as the append signal.
    Broadcast(Value),
    /// Request copy to room peers only, nothing to the sender. Used for
    /// actions and cursor moves.
    BroadcastExcludeSender(Value),
    /// Done+data to the sender only.
    Reply(Value),
    /// Empty done to the sender only.
    Done,
    /// Done+reply to the sender, a different request payload to peers.
    /// Used for join: the sender gets the roster, peers get the arrival.
    ReplyAndBroadcast { reply: Value, broadcast: Value },
}

/// Per-connection routing context.
struct Conn {
    client_id: Uuid,
    /// Room this socket has joined, if any.
    session: Option<String>,
    /// User id presented at join time, for the part broadcast.
    user_id: Option<String>,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for receiving broadcast frames from peers.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(256);

    let welcome = Frame::request("session:connected", json!({ "clientId": client_id }));
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(%client_id, "ws: client connected");

    let mut conn = Conn { client_id, session: None, user_id: None };

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies =
                            process_inbound_text(&state, &mut conn, &client_tx, &text).await;
                        for frame in replies {
                            let _ = send_frame(&mut socket, &frame).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    // Notify peers BEFORE cleanup (part_session may evict the room).
    if let Some(session_id) = conn.session.take() {
        part_and_notify(&state, &session_id, &conn).await;
    }
    info!(%client_id, "ws: client disconnected");
}

/// Broadcast `session:part` to the room's other members, then deregister.
async fn part_and_notify(state: &AppState, session_id: &str, conn: &Conn) {
    let user_id = conn
        .user_id
        .clone()
        .unwrap_or_else(|| conn.client_id.to_string());
    let part = Frame::request("session:part", json!({ "userId": user_id }))
        .with_session_id(session_id);
    services::session::broadcast(state, session_id, &part, Some(conn.client_id)).await;
    services::session::part_session(state, session_id, conn.client_id).await;
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the
/// sender. Split from the socket loop so tests can exercise dispatch
/// without a live websocket.
async fn process_inbound_text(
    state: &AppState,
    conn: &mut Conn,
    client_tx: &mpsc::Sender<Frame>,
    text: &str,
) -> Vec<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(client_id = %conn.client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", json!({}))
                .with_data("message", format!("invalid json: {e}"));
            return vec![err];
        }
    };

    let prefix = req.prefix();
    if prefix != "cursor" {
        info!(client_id = %conn.client_id, id = %req.id, event = %req.event, status = ?req.status, "ws: recv frame");
    }

    // Dispatch to handler — returns Outcome or error Frame.
    let result = match prefix {
        "session" => handle_session(state, conn, client_tx, &req).await,
        "action" => handle_action(conn, &req),
        "cursor" => Ok(handle_cursor(conn, &req)),
        "chat" => handle_chat(conn, &req),
        other => Err(req.error(format!("unknown prefix: {other}"))),
    };

    // Apply outcome — the dispatch layer owns all outbound logic.
    match result {
        Ok(Outcome::Broadcast(data)) => {
            if let Some(session_id) = conn.session.as_deref() {
                // Peers didn't originate the request, so they get a fresh
                // request frame, same as the other fan-out paths.
                let mut peer_frame =
                    Frame::request(&req.event, data.clone()).with_session_id(session_id);
                peer_frame.from.clone_from(&req.from);
                services::session::broadcast(state, session_id, &peer_frame, Some(conn.client_id))
                    .await;
            }
            vec![req.done_with(data)]
        }
        Ok(Outcome::BroadcastExcludeSender(data)) => {
            if let Some(session_id) = conn.session.as_deref() {
                let mut frame = Frame::request(&req.event, data).with_session_id(session_id);
                frame.from.clone_from(&req.from);
                services::session::broadcast(state, session_id, &frame, Some(conn.client_id))
                    .await;
            }
            vec![]
        }
        Ok(Outcome::Reply(data)) => vec![req.done_with(data)],
        Ok(Outcome::Done) => vec![req.done()],
        Ok(Outcome::ReplyAndBroadcast { reply, broadcast }) => {
            let sender_frame = req.done_with(reply);
            if let Some(session_id) = conn.session.as_deref() {
                let mut notif = Frame::request(&req.event, broadcast).with_session_id(session_id);
                notif.from.clone_from(&req.from);
                services::session::broadcast(state, session_id, &notif, Some(conn.client_id))
                    .await;
            }
            vec![sender_frame]
        }
        Err(err_frame) => vec![err_frame],
    }
}

// =============================================================================
// SESSION HANDLERS
// =============================================================================

async fn handle_session(
    state: &AppState,
    conn: &mut Conn,
    client_tx: &mpsc::Sender<Frame>,
    req: &Frame,
) -> Result<Outcome, Frame> {
    let op = req.event.split_once(':').map_or("", |(_, op)| op);

    match op {
        "join" => {
            let session_id = match req.session_id.as_deref().map(str::trim) {
                Some(id) if !id.is_empty() => id.to_owned(),
                _ => return Err(req.error("session_id required")),
            };

            // One room per socket: part the previous room first.
            if let Some(old) = conn.session.take() {
                if old != session_id {
                    part_and_notify(state, &old, conn).await;
                }
            }

            let username = req
                .data
                .get("username")
                .and_then(|v| v.as_str())
                .unwrap_or("anonymous")
                .to_owned();
            let user_id = req
                .from
                .clone()
                .unwrap_or_else(|| conn.client_id.to_string());

            let user = ConnectedClient { user_id: user_id.clone(), username: username.clone() };
            let users = services::session::join_session(
                state,
                &session_id,
                conn.client_id,
                client_tx.clone(),
                user,
            )
            .await;

            conn.session = Some(session_id);
            conn.user_id = Some(user_id.clone());

            Ok(Outcome::ReplyAndBroadcast {
                reply: json!({ "users": users }),
                broadcast: json!({ "userId": user_id, "username": username }),
            })
        }
        "part" => {
            if let Some(session_id) = conn.session.take() {
                part_and_notify(state, &session_id, conn).await;
                conn.user_id = None;
            }
            Ok(Outcome::Done)
        }
        "users" => {
            let Some(session_id) = conn.session.as_deref() else {
                return Err(req.error("must join a session first"));
            };
            let users = services::session::list_session_users(state, session_id).await;
            Ok(Outcome::Reply(json!({ "users": users })))
        }
        _ => Err(req.error(format!("unknown session op: {op}"))),
    }
}

// =============================================================================
// ACTION / CURSOR / CHAT HANDLERS
// =============================================================================

fn handle_action(conn: &Conn, req: &Frame) -> Result<Outcome, Frame> {
    if conn.session.is_none() {
        return Err(req.error("must join a session first"));
    }
    let op = req.event.split_once(':').map_or("", |(_, op)| op);
    match op {
        // Opaque relay: the action payload is never inspected.
        "append" => Ok(Outcome::BroadcastExcludeSender(req.data.clone())),
        _ => Err(req.error(format!("unknown action op: {op}"))),
    }
}

fn handle_cursor(conn: &Conn, req: &Frame) -> Outcome {
    if conn.session.is_none() {
        // Silently ignore cursor moves before joining.
        return Outcome::Done;
    }
    Outcome::BroadcastExcludeSender(req.data.clone())
}

fn handle_chat(conn: &Conn, req: &Frame) -> Result<Outcome, Frame> {
    if conn.session.is_none() {
        return Err(req.error("must join a session first"));
    }
    let op = req.event.split_once(':').map_or("", |(_, op)| op);
    match op {
        // Chat reaches everyone, the sender included: clients append their
        // own messages on the echo, not optimistically.
        "message" => Ok(Outcome::Broadcast(req.data.clone())),
        _ => Err(req.error(format!("unknown chat op: {op}"))),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    let is_cursor = frame.event.starts_with("cursor:");
    if !is_cursor {
        if frame.status == Status::Error {
            let message = frame
                .data
                .get(wire::FRAME_MESSAGE)
                .and_then(|v| v.as_str())
                .unwrap_or("-");
            warn!(id = %frame.id, event = %frame.event, message, "ws: send frame status=Error");
        } else {
            info!(id = %frame.id, event = %frame.event, status = ?frame.status, "ws: send frame");
        }
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

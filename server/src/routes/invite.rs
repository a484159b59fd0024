//! Invite side channel.
//!
//! `POST /invite` emails a session link to a recipient. It is independent of
//! the session directory: inviting someone to a room that doesn't exist yet
//! is fine, since rooms are created implicitly on first join.

#[cfg(test)]
#[path = "invite_test.rs"]
mod tests;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub link: String,
}

/// Send an invite email. Delivery is fire-and-forget: the response confirms
/// the send was queued, not that it arrived.
pub async fn send_invite(
    State(state): State<AppState>,
    Json(req): Json<InviteRequest>,
) -> Response {
    let email = req.email.trim().to_owned();
    let link = req.link.trim().to_owned();
    if email.is_empty() || link.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "email and link are required" })),
        )
            .into_response();
    }

    let Some(mailer) = state.mailer.clone() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "email delivery is not configured" })),
        )
            .into_response();
    };

    info!(%email, "invite: queueing send");
    tokio::spawn(async move {
        if let Err(e) = mailer.send_invite(&email, &link).await {
            warn!(%email, error = %e, "invite: send failed");
        }
    });

    Json(json!({ "success": true })).into_response()
}

use std::sync::Arc;

use axum::body::to_bytes;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Duration, timeout};

use super::*;
use crate::mail::{MailError, Mailer};
use crate::state::test_helpers;

struct MockMailer {
    sent: mpsc::Sender<(String, String)>,
    fail: bool,
}

#[async_trait::async_trait]
impl Mailer for MockMailer {
    async fn send_invite(&self, to: &str, link: &str) -> Result<(), MailError> {
        let _ = self.sent.send((to.to_owned(), link.to_owned())).await;
        if self.fail {
            return Err(MailError::Address("@".parse::<lettre::Address>().unwrap_err()));
        }
        Ok(())
    }
}

fn mock_mailer(fail: bool) -> (Arc<MockMailer>, Mutex<mpsc::Receiver<(String, String)>>) {
    let (tx, rx) = mpsc::channel(4);
    (Arc::new(MockMailer { sent: tx, fail }), Mutex::new(rx))
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body read");
    serde_json::from_slice(&bytes).expect("body is json")
}

fn request(email: &str, link: &str) -> Json<InviteRequest> {
    Json(InviteRequest { email: email.into(), link: link.into() })
}

#[tokio::test]
async fn missing_fields_return_400() {
    let (mailer, rx) = mock_mailer(false);
    let state = test_helpers::test_app_state_with_mailer(mailer);

    for (email, link) in [("", "https://x/s/abc"), ("a@b.example", ""), ("  ", "  ")] {
        let response = send_invite(State(state.clone()), request(email, link)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "email and link are required");
    }
    assert!(rx.lock().await.try_recv().is_err(), "nothing should be sent");
}

#[tokio::test]
async fn unconfigured_mailer_returns_503() {
    let state = test_helpers::test_app_state();
    let response = send_invite(State(state), request("a@b.example", "https://x/s/abc")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"], "email delivery is not configured");
}

#[tokio::test]
async fn valid_invite_queues_a_send() {
    let (mailer, rx) = mock_mailer(false);
    let state = test_helpers::test_app_state_with_mailer(mailer);

    let response =
        send_invite(State(state), request(" a@b.example ", " https://x/s/abc ")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let (to, link) = timeout(Duration::from_millis(500), rx.lock().await.recv())
        .await
        .expect("send timed out")
        .expect("mailer channel closed");
    assert_eq!(to, "a@b.example");
    assert_eq!(link, "https://x/s/abc");
}

#[tokio::test]
async fn delivery_failure_is_not_surfaced_to_the_caller() {
    let (mailer, rx) = mock_mailer(true);
    let state = test_helpers::test_app_state_with_mailer(mailer);

    let response = send_invite(State(state), request("a@b.example", "https://x/s/abc")).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The failing send still happened; the caller never sees it.
    assert!(
        timeout(Duration::from_millis(500), rx.lock().await.recv())
            .await
            .expect("send timed out")
            .is_some()
    );
}

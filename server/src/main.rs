mod mail;
mod routes;
mod services;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "4000".into())
        .parse()
        .expect("invalid PORT");

    // Mailer is non-fatal: invites are disabled if SMTP config is missing.
    let mailer: Option<Arc<dyn mail::Mailer>> = match mail::SmtpMailer::from_env() {
        Ok(Some(m)) => {
            tracing::info!("smtp mailer configured");
            Some(Arc::new(m))
        }
        Ok(None) => {
            tracing::warn!("SMTP_HOST not set — invites disabled");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "smtp mailer misconfigured — invites disabled");
            None
        }
    };

    let state = state::AppState::new(mailer);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "sketchroom server listening");
    axum::serve(listener, app).await.expect("server failed");
}

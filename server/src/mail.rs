//! Outbound invite email.
//!
//! The invite endpoint is a plain side channel: it never touches session
//! state, and delivery is fire-and-forget. The [`Mailer`] trait exists so
//! the route can be tested without an SMTP server.

#[cfg(test)]
#[path = "mail_test.rs"]
mod tests;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Sends session invites. Implemented by [`SmtpMailer`] in production and by
/// mocks in tests.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_invite(&self, to: &str, link: &str) -> Result<(), MailError>;
}

/// Real mailer over SMTP with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer from `SMTP_HOST`, `SMTP_USER`, `SMTP_PASS`, and
    /// `SMTP_FROM`. Returns `None` when `SMTP_HOST` is unset — invites are
    /// simply disabled in that case.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay host is rejected by lettre or
    /// `SMTP_FROM` is not a valid mailbox.
    pub fn from_env() -> Result<Option<Self>, MailError> {
        let Ok(host) = std::env::var("SMTP_HOST") else {
            return Ok(None);
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)?;
        if let (Ok(user), Ok(pass)) = (std::env::var("SMTP_USER"), std::env::var("SMTP_PASS")) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        let from = std::env::var("SMTP_FROM")
            .unwrap_or_else(|_| "Sketchroom <no-reply@sketchroom.app>".into())
            .parse()?;

        Ok(Some(Self { transport: builder.build(), from }))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_invite(&self, to: &str, link: &str) -> Result<(), MailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject("You've been invited to a drawing session")
            .body(format!(
                "You've been invited to draw together.\n\nJoin here: {link}\n"
            ))?;
        self.transport.send(email).await?;
        Ok(())
    }
}

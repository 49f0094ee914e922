//! Outbound mail port.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::MailError;

/// A plain-text message ready to be handed to a mail backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Mailer trait - abstraction over mail backends (SMTP, console, in-memory).
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

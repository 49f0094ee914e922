//! Console mailer - writes outgoing mail to the log instead of sending it.

use async_trait::async_trait;

use blog_core::error::MailError;
use blog_core::ports::{Mailer, OutgoingMail};

/// Development backend: every message is logged at INFO and reported as sent.
#[derive(Debug, Default)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            from = %mail.from,
            to = ?mail.to,
            subject = %mail.subject,
            body = %mail.body,
            "Email (console backend)"
        );
        Ok(())
    }
}

//! In-memory mailer - collects messages in an outbox for inspection.

use async_trait::async_trait;
use tokio::sync::RwLock;

use blog_core::error::MailError;
use blog_core::ports::{Mailer, OutgoingMail};

pub struct InMemoryMailer {
    outbox: RwLock<Vec<OutgoingMail>>,
    fail_with: Option<String>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self {
            outbox: RwLock::new(Vec::new()),
            fail_with: None,
        }
    }

    /// A mailer whose transport always fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outbox: RwLock::new(Vec::new()),
            fail_with: Some(reason.into()),
        }
    }

    /// Messages sent so far, oldest first.
    pub async fn outbox(&self) -> Vec<OutgoingMail> {
        self.outbox.read().await.clone()
    }
}

impl Default for InMemoryMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if let Some(reason) = &self.fail_with {
            return Err(MailError::Transport(reason.clone()));
        }
        self.outbox.write().await.push(mail.clone());
        Ok(())
    }
}

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, trace};

/// An outgoing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct MailError(pub String);

/// Delivers notifications to account holders.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &Message) -> std::result::Result<(), MailError>;
}

/// Mailer that writes messages to the log instead of delivering them.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from_name: String,
    from_email: String,
}

impl LogMailer {
    pub fn new(from_name: impl Into<String>, from_email: impl Into<String>) -> Self {
        Self {
            from_name: from_name.into(),
            from_email: from_email.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &Message) -> std::result::Result<(), MailError> {
        info!(
            from = %format!("{} <{}>", self.from_name, self.from_email),
            to = %message.to,
            subject = %message.subject,
            "sending email"
        );
        // Bodies may carry reset links.
        trace!(body = %message.body, "email body");
        Ok(())
    }
}

use async_trait::async_trait;
use tracing::info;

/// Outbound email delivery abstraction.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message or return an error for the caller to log.
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()>;
}

/// Local dev sender that logs the message instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        info!(to = %to, subject = %subject, body = %html_body, "email send stub");
        Ok(())
    }
}

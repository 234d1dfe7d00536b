//! Outgoing mail.
//!
//! Uses SMTP via lettre when credentials are configured; otherwise messages
//! are written to the log so local setups keep working.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::MailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig, username: &str, password: &str) -> anyhow::Result<Self> {
        // Implicit TLS, matching the 465 default.
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .context("smtp relay")?
            .port(config.smtp_port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        let from = config
            .from_address
            .parse::<Mailbox>()
            .with_context(|| format!("invalid from address {}", config.from_address))?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: Mail) -> anyhow::Result<()> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .with_context(|| format!("invalid recipient {}", mail.to))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .context("build message")?;
        self.transport.send(message).await.context("smtp send")?;
        info!(to = %mail.to, subject = %mail.subject, "mail sent");
        Ok(())
    }
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> anyhow::Result<()> {
        info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "mail (not delivered)");
        Ok(())
    }
}

pub fn from_config(config: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match (&config.username, &config.password) {
        (Some(user), Some(pass)) => Ok(Arc::new(SmtpMailer::new(config, user, pass)?)),
        _ => {
            tracing::warn!("EMAIL_USER/EMAIL_PASS not set; mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Keeps every message in memory.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: tokio::sync::Mutex<Vec<Mail>>,
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: Mail) -> anyhow::Result<()> {
        self.sent.lock().await.push(mail);
        Ok(())
    }
}

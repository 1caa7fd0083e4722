//! Outgoing mail over SMTP.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use lostfound_core::Config;

/// Sends a single plain-text message. Failures come back as text, never a panic.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl EmailService {
    /// Returns `None` when SMTP is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let Some(host) = config.smtp_host() else {
            tracing::info!("SMTP_HOST not set, outgoing mail disabled");
            return None;
        };
        let from = config.smtp_from()?.to_string();
        let port = config.smtp_port().unwrap_or(587);
        let credentials = match (config.smtp_user(), config.smtp_password()) {
            (Some(u), Some(p)) => Some(Credentials::new(u.to_string(), p.to_string())),
            _ => None,
        };

        let mailer = if config.smtp_tls() {
            let builder = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(builder) => builder.port(port),
                Err(e) => {
                    tracing::error!(error = %e, host = %host, "Invalid SMTP relay, outgoing mail disabled");
                    return None;
                }
            };
            let builder = match credentials {
                Some(c) => builder.credentials(c),
                None => builder,
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP with STARTTLS)");
            builder.build()
        } else {
            let builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let builder = match credentials {
                Some(c) => builder.credentials(c),
                None => builder,
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP)");
            builder.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
        })
    }
}

#[async_trait]
impl Mailer for EmailService {
    #[tracing::instrument(skip(self, body))]
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let to_addr: Mailbox = to
            .parse()
            .map_err(|e| format!("Invalid recipient address '{}': {}", to, e))?;
        let from_addr: Mailbox = self
            .from
            .parse()
            .map_err(|e| format!("Invalid SMTP_FROM: {}", e))?;

        let email = Message::builder()
            .from(from_addr)
            .to(to_addr)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| e.to_string())?;

        self.mailer.send(email).await.map_err(|e| e.to_string())?;
        tracing::info!("Notification email sent");
        Ok(())
    }
}

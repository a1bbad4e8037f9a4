pub mod templates;

use async_trait::async_trait;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

/// Delivers password-reset links to a user's registered address.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_password_reset(
        &self,
        to_email: &str,
        reset_url: &str,
        ttl_minutes: i64,
    ) -> Result<(), String>;
}

pub struct SystemMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SystemMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("System SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    async fn send(&self, to: &str, subject: &str, text: String, html: String) -> Result<(), String> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for SystemMailer {
    async fn send_password_reset(
        &self,
        to_email: &str,
        reset_url: &str,
        ttl_minutes: i64,
    ) -> Result<(), String> {
        let html = templates::render_password_reset(reset_url, ttl_minutes);
        let text = templates::render_password_reset_text(reset_url, ttl_minutes);
        self.send(to_email, "Password Reset - CareerPath", text, html)
            .await
    }
}

/// Used when no SMTP relay is configured: the link goes to the log instead.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_password_reset(
        &self,
        to_email: &str,
        reset_url: &str,
        _ttl_minutes: i64,
    ) -> Result<(), String> {
        tracing::warn!("System SMTP not configured. Password reset link for {to_email}: {reset_url}");
        Ok(())
    }
}

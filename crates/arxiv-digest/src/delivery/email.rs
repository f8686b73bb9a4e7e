//! Email delivery over SMTP.

use async_trait::async_trait;
use chrono::Utc;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::render::DigestRenderer;
use super::Delivery;
use crate::arxiv::Paper;
use crate::error::DeliveryError;
use crate::summary::Summary;

/// SMTP connection and addressing settings.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port (STARTTLS).
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender address.
    pub from: String,
    /// Recipient addresses; all receive the same digest.
    pub recipients: Vec<String>,
}

/// Sends digests by email.
pub struct EmailDelivery {
    settings: SmtpSettings,
}

impl EmailDelivery {
    #[must_use]
    pub const fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
        address.parse().map_err(|e: lettre::address::AddressError| DeliveryError::Address {
            address: address.to_string(),
            reason: e.to_string(),
        })
    }

    /// Build a multipart message with HTML and plain-text alternatives.
    pub fn build_message(
        &self,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<Message, DeliveryError> {
        let mut builder = Message::builder()
            .from(Self::parse_mailbox(&self.settings.from)?)
            .subject(subject);
        for recipient in &self.settings.recipients {
            builder = builder.to(Self::parse_mailbox(recipient)?);
        }

        builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| DeliveryError::Message(e.to_string()))
    }

    /// Send one email to every recipient.
    pub async fn send_email(
        &self,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), DeliveryError> {
        let email = self.build_message(subject, html_body, text_body)?;

        let creds = Credentials::new(
            self.settings.username.clone(),
            self.settings.password.clone(),
        );

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.host)
                .map_err(|e| DeliveryError::Transport(e.to_string()))?
                .port(self.settings.port)
                .credentials(creds)
                .build();

        mailer
            .send(email)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        tracing::info!(
            recipients = self.settings.recipients.len(),
            subject = subject,
            "Email sent successfully"
        );

        Ok(())
    }

    /// Send a simple test email to verify configuration.
    pub async fn send_test(&self) -> Result<(), DeliveryError> {
        let subject = "arXiv Digest - Test Email";
        let html_body = r#"<!DOCTYPE html>
<html>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; padding: 20px;">
    <h1 style="color: #b31b1b;">arXiv Daily Digest</h1>
    <p style="color: #16a34a; font-weight: bold;">Email configuration is working.</p>
    <p>This is a test message. Daily digests will arrive at this address.</p>
</body>
</html>
"#;
        let text_body = "arXiv Daily Digest - Test Email

Email configuration is working.
This is a test message. Daily digests will arrive at this address.
";

        self.send_email(subject, html_body, text_body).await
    }
}

#[async_trait]
impl Delivery for EmailDelivery {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, papers: &[Paper], summaries: &[Summary]) -> Result<(), DeliveryError> {
        let digest = DigestRenderer::render(papers, summaries, Utc::now())?;
        self.send_email(&digest.subject, &digest.html, &digest.text)
            .await
    }
}

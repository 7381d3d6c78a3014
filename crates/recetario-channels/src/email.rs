//! Email transports: a transactional HTTP API and SMTP.
//!
//! Both implement [`EmailSender`]. Neither retries: a failed send is
//! reported once and the caller decides what to do next.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message as LettreMessage, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use recetario_core::config::{EmailConfig, EmailProvider};
use recetario_core::error::{RecetarioError, Result};
use recetario_core::traits::EmailSender;
use recetario_core::types::OutgoingEmail;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Build the sender selected by `config.provider`.
/// Fails with a configuration error when the provider credential is missing.
pub fn build_sender(config: &EmailConfig) -> Result<Arc<dyn EmailSender>> {
    if !config.has_credential() {
        return Err(RecetarioError::Config("Email service not configured".into()));
    }
    Ok(match config.provider {
        EmailProvider::Resend => Arc::new(ResendSender::new(config)?),
        EmailProvider::Smtp => Arc::new(SmtpSender::new(config)?),
    })
}

fn from_address(config: &EmailConfig) -> String {
    match &config.display_name {
        Some(name) if !name.trim().is_empty() => format!("{name} <{}>", config.from),
        _ => config.from.clone(),
    }
}

/// Request body for the transactional email API.
#[derive(Debug, Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Sender for a Resend-compatible transactional email API.
pub struct ResendSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl ResendSender {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(RecetarioError::Config("Email service not configured".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RecetarioError::Email(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/emails", config.api_base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            from: from_address(config),
        })
    }

    fn payload<'a>(&'a self, email: &'a OutgoingEmail) -> ResendPayload<'a> {
        ResendPayload {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
        }
    }
}

#[async_trait]
impl EmailSender for ResendSender {
    fn name(&self) -> &str {
        "resend"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(email))
            .send()
            .await
            .map_err(|e| RecetarioError::Email(format!("Email API request failed: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("📤 Email sent to: {}", email.to);
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(RecetarioError::Email(format!("Email API error {status}: {body}")))
        }
    }
}

/// Sender for an SMTP relay (STARTTLS + credentials).
pub struct SmtpSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        if config.smtp_host.trim().is_empty() {
            return Err(RecetarioError::Config("SMTP host not configured".into()));
        }
        let from: Mailbox = from_address(config)
            .parse()
            .map_err(|e| RecetarioError::Config(format!("Invalid from: {e}")))?;

        let user = if config.smtp_user.is_empty() {
            config.from.clone()
        } else {
            config.smtp_user.clone()
        };
        let creds = Credentials::new(user, config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| RecetarioError::Config(format!("SMTP relay: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, from })
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| RecetarioError::Email(format!("Invalid to: {e}")))?;

        let message = LettreMessage::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| RecetarioError::Email(format!("Build email: {e}")))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| RecetarioError::Email(format!("SMTP send: {e}")))?;

        tracing::info!("📤 Email sent to: {}", email.to);
        Ok(())
    }
}

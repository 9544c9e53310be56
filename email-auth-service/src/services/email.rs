use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};
use std::time::Duration;
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Delivers one-time codes. Implementations must return an error rather than
/// drop a message silently.
#[async_trait]
pub trait CodeMailer: Send + Sync {
    async fn send_code(&self, to_email: &str, code: &str) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    timeout: Duration,
}

impl SmtpMailer {
    /// `timeout` bounds each SMTP command, the same budget the caller allows
    /// for a whole dispatch.
    pub fn new(config: &SmtpConfig, timeout: Duration) -> Result<Self, anyhow::Error> {
        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().clone(),
        );

        // Port 465 speaks TLS from the first byte; anything else upgrades via STARTTLS.
        let relay = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        };
        let builder = relay.map_err(|e| {
            anyhow::anyhow!("Failed to create SMTP relay for {}: {}", config.host, e)
        })?;

        let transport = builder
            .port(config.port)
            .credentials(creds)
            .timeout(Some(timeout))
            .build();

        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid SMTP_FROM address '{}': {}", config.from, e))?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            timeout_seconds = timeout.as_secs(),
            "SMTP mailer initialized"
        );

        Ok(Self {
            transport,
            from,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl CodeMailer for SmtpMailer {
    async fn send_code(&self, to_email: &str, code: &str) -> Result<(), MailError> {
        let to: Mailbox = to_email
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::InvalidRecipient(e.to_string()))?;

        let (subject, plain_body, html_body) = render_code_email(code);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| MailError::Build(e.to_string()))?;

        match self.transport.send(message).await {
            Ok(_) => {
                tracing::info!(to = %to_email, "Code email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %to_email, "Failed to send code email");
                Err(MailError::SendFailed(e.to_string()))
            }
        }
    }
}

/// Subject, plain-text body and HTML body for a code email.
fn render_code_email(code: &str) -> (String, String, String) {
    let subject = format!("Your sign-in code: {}", code);

    let plain_body = format!(
        "Your verification code is {}.\n\nIt is valid for 10 minutes. If you did not request it, you can ignore this email.",
        code
    );

    let html_body = format!(
        r###"<div style="font-family: Arial, sans-serif; line-height: 1.4;">
    <h2>Verification code</h2>
    <p>Your code: <b style="font-size: 24px; letter-spacing: 3px;">{}</b></p>
    <p>The code is valid for 10 minutes.</p>
    <p style="color: #666; font-size: 12px;">If you did not request it, you can ignore this email.</p>
</div>"###,
        code
    );

    (subject, plain_body, html_body)
}

/// Development stand-in for a mailbox: writes the code to the log.
///
/// Only selectable outside production.
pub struct LogMailer;

#[async_trait]
impl CodeMailer for LogMailer {
    async fn send_code(&self, to_email: &str, code: &str) -> Result<(), MailError> {
        tracing::warn!(to = %to_email, code = %code, "[DEV] SMTP disabled, code not emailed");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCode {
    pub to: String,
    pub code: String,
}

/// In-memory mailer for tests. Records deliveries and can be made to fail or stall.
#[derive(Default)]
pub struct MockMailer {
    sent: Mutex<Vec<SentCode>>,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.set_failing(true);
        mailer
    }

    /// Sleep for `delay` before each delivery.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentCode> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|s| s.to == email)
            .map(|s| s.code)
    }
}

#[async_trait]
impl CodeMailer for MockMailer {
    async fn send_code(&self, to_email: &str, code: &str) -> Result<(), MailError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::SendFailed("mock mailer set to fail".to_string()));
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentCode {
                to: to_email.to_string(),
                code: code.to_string(),
            });
        }
        Ok(())
    }
}

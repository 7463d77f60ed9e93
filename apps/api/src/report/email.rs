//! Email dispatch of the CSV ranking. Sends once; failures are reported, never retried.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

use crate::report::csv_export::EXPORT_FILENAME;

pub const SUBJECT: &str = "AI Resume Screening Results";
const BODY: &str = "Hello,\n\nPlease find attached the resume screening results.\n";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("missing credential: {0} is not configured")]
    MissingCredential(&'static str),

    #[error("invalid address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Message(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// SMTP relay and sender credentials. Passed in explicitly; never read from the
/// environment at send time.
#[derive(Clone, Default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub sender: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("sender", &self.sender)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl EmailConfig {
    pub fn credentials(&self) -> Result<(&str, &str), EmailError> {
        let sender = self
            .sender
            .as_deref()
            .ok_or(EmailError::MissingCredential("EMAIL_SENDER"))?;
        let password = self
            .password
            .as_deref()
            .ok_or(EmailError::MissingCredential("EMAIL_PASSWORD"))?;
        Ok((sender, password))
    }
}

/// Sends a CSV ranking to a recipient. Carried in `AppState` as `Arc<dyn ResultMailer>`.
#[async_trait]
pub trait ResultMailer: Send + Sync {
    async fn send_results(&self, recipient: &str, csv: &str) -> Result<(), EmailError>;
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address.trim().parse().map_err(|e: lettre::address::AddressError| {
        EmailError::Address {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Multipart message: plain-text body plus the CSV as `results.csv`.
pub fn compose_message(sender: &str, recipient: &str, csv: &str) -> Result<Message, EmailError> {
    let csv_type =
        ContentType::parse("text/csv").map_err(|e| EmailError::Message(e.to_string()))?;

    Message::builder()
        .from(parse_mailbox(sender)?)
        .to(parse_mailbox(recipient)?)
        .subject(SUBJECT)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(BODY.to_string()))
                .singlepart(
                    Attachment::new(EXPORT_FILENAME.to_string()).body(csv.to_string(), csv_type),
                ),
        )
        .map_err(|e| EmailError::Message(e.to_string()))
}

/// Delivers over implicit-TLS SMTP with login credentials.
pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ResultMailer for SmtpMailer {
    async fn send_results(&self, recipient: &str, csv: &str) -> Result<(), EmailError> {
        let (sender, password) = self.config.credentials()?;
        let message = compose_message(sender, recipient, csv)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::Transport(e.to_string()))?
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        info!("Screening results emailed to {recipient}");
        Ok(())
    }
}

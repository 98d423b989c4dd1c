use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

use crate::config::Config;
use crate::forms::email::EmailForm;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("invalid content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    #[error("mail delivery is not configured")]
    NotConfigured,

    #[error("mail task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A file to attach to an outgoing message.
#[derive(Debug, Clone)]
pub struct MailAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// An outgoing message with a plain-text body.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<MailAttachment>,
}

impl From<EmailForm> for OutgoingMail {
    fn from(form: EmailForm) -> Self {
        Self {
            to: form.receiver,
            subject: form.subject,
            body: form.message,
            attachments: form
                .files
                .into_iter()
                .map(|file| MailAttachment {
                    file_name: file.file_name,
                    content_type: file.content_type,
                    bytes: file.bytes,
                })
                .collect(),
        }
    }
}

/// Sends mail through the configured SMTP relay.
#[derive(Clone)]
pub struct Mailer {
    from: Mailbox,
    transport: Option<SmtpTransport>,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Result<Self, MailError> {
        let from: Mailbox = config.mail_from.parse()?;

        let transport = match &config.smtp_host {
            Some(host) => {
                let mut builder = SmtpTransport::relay(host)?;
                if let (Some(username), Some(password)) =
                    (&config.smtp_username, &config.smtp_password)
                {
                    let creds = Credentials::new(username.clone(), password.clone());
                    builder = builder.credentials(creds);
                }
                Some(builder.build())
            }
            None => {
                tracing::warn!("SMTP_HOST is not set; outgoing mail is disabled");
                None
            }
        };

        Ok(Self { from, transport })
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Builds the MIME message without sending it.
    pub fn build_message(&self, mail: &OutgoingMail) -> Result<Message, MailError> {
        let mut body = MultiPart::mixed().singlepart(SinglePart::plain(mail.body.clone()));
        for attachment in &mail.attachments {
            let content_type = ContentType::parse(&attachment.content_type)?;
            body = body.singlepart(
                Attachment::new(attachment.file_name.clone())
                    .body(attachment.bytes.clone(), content_type),
            );
        }

        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse()?)
            .subject(mail.subject.clone())
            .multipart(body)?;

        Ok(message)
    }

    pub async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let transport = self.transport.clone().ok_or(MailError::NotConfigured)?;
        let message = self.build_message(&mail)?;

        // SmtpTransport blocks; keep it off the runtime threads
        tokio::task::spawn_blocking(move || transport.send(&message)).await??;

        tracing::info!("sent \"{}\" to {}", mail.subject, mail.to);
        Ok(())
    }
}

//! SMTP delivery via lettre. The blocking transport runs on the blocking pool.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::delivery::{DeliveryError, DeliveryReceipt, Mailer, OutgoingMail};

/// SMTP relay settings, taken from `Config`.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct SmtpMailer {
    settings: SmtpSettings,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// Builds the multipart/mixed message: plain-text body, then the PDFs in order.
    pub fn build_message(&self, mail: &OutgoingMail) -> Result<Message, DeliveryError> {
        let from = parse_mailbox(&self.settings.sender)?;
        let to = parse_mailbox(&mail.recipient)?;
        let pdf = ContentType::parse("application/pdf")
            .map_err(|e| DeliveryError::Message(e.to_string()))?;

        let mut body = MultiPart::mixed().singlepart(SinglePart::plain(mail.body.clone()));
        for attachment in &mail.attachments {
            body = body.singlepart(
                MailAttachment::new(attachment.filename.clone())
                    .body(attachment.document.0.to_vec(), pdf.clone()),
            );
        }

        Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.clone())
            .multipart(body)
            .map_err(|e| DeliveryError::Message(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| DeliveryError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// The transport runs under `spawn_blocking`, so a caller-side timeout stops waiting
/// but does not stop the send: a message may still go out after the caller has
/// reported a timeout. `SmtpSettings::timeout` bounds each socket operation.
#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<DeliveryReceipt, DeliveryError> {
        let message = self.build_message(&mail)?;
        let settings = self.settings.clone();

        tokio::task::spawn_blocking(move || {
            let transport = SmtpTransport::relay(&settings.host)
                .map_err(|e| DeliveryError::Transport(format!("SMTP relay error: {e}")))?
                .port(settings.port)
                .credentials(Credentials::new(
                    settings.username.clone(),
                    settings.password.clone(),
                ))
                .timeout(Some(settings.timeout))
                .build();

            transport
                .send(&message)
                .map_err(|e| DeliveryError::Transport(format!("SMTP send failed: {e}")))
        })
        .await
        .map_err(|e| DeliveryError::Transport(format!("mail task aborted: {e}")))??;

        info!(attachments = mail.attachments.len(), "Email sent");

        Ok(DeliveryReceipt {
            recipient: mail.recipient,
            attachments: mail.attachments.into_iter().map(|a| a.filename).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::delivery::{Attachment, PdfDocument};

    fn mailer() -> SmtpMailer {
        SmtpMailer::new(SmtpSettings {
            host: "smtp.example.com".into(),
            port: 465,
            username: "reports@example.com".into(),
            password: "secret".into(),
            sender: "reports@example.com".into(),
            timeout: Duration::from_secs(5),
        })
    }

    fn mail(recipient: &str) -> OutgoingMail {
        OutgoingMail {
            recipient: recipient.into(),
            subject: "Your Holland Bridge Reports".into(),
            body: "Attached are your personalized Holland Bridge reports.".into(),
            attachments: vec![
                Attachment {
                    filename: "roles.pdf".into(),
                    document: PdfDocument(Bytes::from_static(b"%PDF-1.4 roles")),
                },
                Attachment {
                    filename: "industries.pdf".into(),
                    document: PdfDocument(Bytes::from_static(b"%PDF-1.4 industries")),
                },
            ],
        }
    }

    #[test]
    fn test_message_carries_both_pdfs() {
        let message = mailer().build_message(&mail("ada@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Your Holland Bridge Reports"));
        assert!(raw.contains("multipart/mixed"));
        assert_eq!(raw.matches("Content-Type: application/pdf").count(), 2);
        let roles = raw.find("roles.pdf").unwrap();
        let industries = raw.find("industries.pdf").unwrap();
        assert!(roles < industries);
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        let err = mailer().build_message(&mail("not an address")).unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidAddress { .. }));
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let mut m = mailer();
        m.settings.sender = "nobody".into();
        assert!(matches!(
            m.build_message(&mail("ada@example.com")),
            Err(DeliveryError::InvalidAddress { .. })
        ));
    }
}

// Delivery: HTML → PDF rendering and SMTP mail with PDF attachments.
// Both are external collaborators behind traits carried in `AppState`.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod mailer;
pub mod pdf;

pub use mailer::{SmtpMailer, SmtpSettings};
pub use pdf::HttpPdfRenderer;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("PDF renderer unreachable: {0}")]
    Unavailable(String),

    #[error("PDF rendering failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("SMTP transport failed: {0}")]
    Transport(String),
}

/// A rendered binary document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocument(pub Bytes);

impl PdfDocument {
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub document: PdfDocument,
}

/// One outgoing message. Attachments are sent in the given order.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub recipient: String,
    pub attachments: Vec<String>,
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<PdfDocument, RenderError>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<DeliveryReceipt, DeliveryError>;
}

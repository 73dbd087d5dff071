//! HTML → PDF via an HTTP conversion service (Gotenberg-compatible Chromium route).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use tracing::{debug, warn};

use crate::delivery::{PdfDocument, PdfRenderer, RenderError};

const CONVERT_HTML_PATH: &str = "/forms/chromium/convert/html";
const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Clone)]
pub struct HttpPdfRenderer {
    client: Client,
    endpoint: String,
}

impl HttpPdfRenderer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RenderError::Unavailable(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: convert_endpoint(base_url),
        })
    }
}

fn convert_endpoint(base_url: &str) -> String {
    format!("{}{CONVERT_HTML_PATH}", base_url.trim_end_matches('/'))
}

fn is_pdf(body: &[u8]) -> bool {
    body.starts_with(PDF_MAGIC)
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    async fn render(&self, html: &str) -> Result<PdfDocument, RenderError> {
        // The converter requires the entry document to be named index.html.
        let part = multipart::Part::text(html.to_string())
            .file_name("index.html")
            .mime_str("text/html; charset=utf-8")
            .map_err(|e| RenderError::Failed(format!("invalid multipart body: {e}")))?;
        let form = multipart::Form::new().part("files", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RenderError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("PDF renderer returned {}: {}", status, body);
            return Err(RenderError::Failed(format!("status {status}: {body}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RenderError::Unavailable(e.to_string()))?;

        if !is_pdf(&body) {
            return Err(RenderError::Failed(
                "renderer response is not a PDF document".to_string(),
            ));
        }

        debug!(bytes = body.len(), "PDF rendered");
        Ok(PdfDocument(body))
    }
}

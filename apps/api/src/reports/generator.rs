//! LLM-backed report generator.
//!
//! The model's HTML is not schema-validated. Fences are stripped and fragments are
//! wrapped into a full document; anything else malformed surfaces at render time.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::form::SubmissionPayload;
use crate::llm_client::prompts::HTML_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};
use crate::reports::prompts::build_prompt;
use crate::reports::{Report, ReportError, ReportGenerator, ReportKind};

#[derive(Clone)]
pub struct LlmReportGenerator {
    llm: LlmClient,
}

impl LlmReportGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ReportGenerator for LlmReportGenerator {
    async fn generate(
        &self,
        payload: &SubmissionPayload,
        kind: ReportKind,
    ) -> Result<Report, ReportError> {
        let prompt = build_prompt(payload, kind);

        let html = self
            .llm
            .call_text(&prompt, HTML_ONLY_SYSTEM)
            .await
            .map_err(|e| {
                warn!(report = %kind, "Report generation failed: {e}");
                map_llm_error(e)
            })?;

        info!(report = %kind, bytes = html.len(), "Report generated");

        Ok(Report {
            kind,
            html: ensure_document(&html, &kind.title(&payload.identity)),
        })
    }
}

fn map_llm_error(e: LlmError) -> ReportError {
    if e.is_rate_limited() {
        ReportError::RateLimited(e.to_string())
    } else {
        ReportError::UpstreamUnavailable(e.to_string())
    }
}

/// Wraps an HTML fragment into a standalone UTF-8 document.
/// Input that already declares `<html` is returned unchanged.
pub fn ensure_document(html: &str, title: &str) -> String {
    if html.to_ascii_lowercase().contains("<html") {
        return html.to_string();
    }
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{html}\n</body>\n</html>\n",
        escape_text(title)
    )
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

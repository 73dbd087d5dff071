//! Report generation — turns a submission payload into the two narrative HTML reports.
//!
//! `ReportGenerator` is the seam: `AppState` carries an `Arc<dyn ReportGenerator>`,
//! the production backend is `LlmReportGenerator`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::{Identity, SubmissionPayload};

pub mod generator;
pub mod prompts;

pub use generator::LlmReportGenerator;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("Report service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Report service rate limited: {0}")]
    RateLimited(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Roles,
    Industries,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Roles => "roles",
            ReportKind::Industries => "industries",
        }
    }

    pub fn title(&self, identity: &Identity) -> String {
        let heading = match self {
            ReportKind::Roles => "Aligned Roles",
            ReportKind::Industries => "Aligned Megatrends and Industries",
        };
        format!(
            "{} – The Holland Bridge – {heading}",
            identity.full_name()
        )
    }

    pub fn pdf_filename(&self, identity: &Identity) -> String {
        let suffix = match self {
            ReportKind::Roles => "Aligned Roles",
            ReportKind::Industries => "Aligned Industries and Megatrends",
        };
        format!("{} - Holland Bridge - {suffix}.pdf", identity.full_name())
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated report: a complete HTML document ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: ReportKind,
    pub html: String,
}

#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(
        &self,
        payload: &SubmissionPayload,
        kind: ReportKind,
    ) -> Result<Report, ReportError>;
}

//! Recording fakes for the external collaborators, shared by unit and router tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::delivery::{
    DeliveryError, DeliveryReceipt, Mailer, OutgoingMail, PdfDocument, PdfRenderer, RenderError,
};
use crate::form::{SessionStore, StepCatalog, SubmissionPayload};
use crate::reports::{Report, ReportError, ReportGenerator, ReportKind};
use crate::state::AppState;
use crate::submission::SubmissionPipeline;

#[derive(Default)]
pub struct FakeReports {
    pub calls: Mutex<Vec<ReportKind>>,
    pub payloads: Mutex<Vec<SubmissionPayload>>,
    pub fail: Option<ReportError>,
    pub stall: bool,
}

#[async_trait]
impl ReportGenerator for FakeReports {
    async fn generate(
        &self,
        payload: &SubmissionPayload,
        kind: ReportKind,
    ) -> Result<Report, ReportError> {
        self.calls.lock().unwrap().push(kind);
        self.payloads.lock().unwrap().push(payload.clone());
        if self.stall {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(e) = &self.fail {
            return Err(e.clone());
        }
        Ok(Report {
            kind,
            html: format!("<h1>{kind}</h1>"),
        })
    }
}

#[derive(Default)]
pub struct FakeRenderer {
    pub rendered: Mutex<Vec<String>>,
    /// Fails any document containing this text.
    pub fail_on: Option<&'static str>,
    pub stall: bool,
}

#[async_trait]
impl PdfRenderer for FakeRenderer {
    async fn render(&self, html: &str) -> Result<PdfDocument, RenderError> {
        self.rendered.lock().unwrap().push(html.to_string());
        if self.stall {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_on.is_some_and(|needle| html.contains(needle)) {
            return Err(RenderError::Failed("malformed html".into()));
        }
        Ok(PdfDocument(Bytes::from(format!("%PDF {html}"))))
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
    pub fail: bool,
    pub stall: bool,
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<DeliveryReceipt, DeliveryError> {
        if self.stall {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail {
            return Err(DeliveryError::Transport("535 auth failed".into()));
        }
        let receipt = DeliveryReceipt {
            recipient: mail.recipient.clone(),
            attachments: mail.attachments.iter().map(|a| a.filename.clone()).collect(),
        };
        self.sent.lock().unwrap().push(mail);
        Ok(receipt)
    }
}

pub struct Harness {
    pub reports: Arc<FakeReports>,
    pub renderer: Arc<FakeRenderer>,
    pub mailer: Arc<FakeMailer>,
    pub pipeline: SubmissionPipeline,
}

impl Harness {
    pub fn new(reports: FakeReports, renderer: FakeRenderer, mailer: FakeMailer) -> Self {
        let reports = Arc::new(reports);
        let renderer = Arc::new(renderer);
        let mailer = Arc::new(mailer);
        let pipeline = SubmissionPipeline::new(
            reports.clone(),
            renderer.clone(),
            mailer.clone(),
            Duration::from_secs(30),
        );
        Self {
            reports,
            renderer,
            mailer,
            pipeline,
        }
    }

    pub fn healthy() -> Self {
        Self::new(
            FakeReports::default(),
            FakeRenderer::default(),
            FakeMailer::default(),
        )
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            sessions: SessionStore::new(
                Arc::new(StepCatalog::holland_bridge(4).expect("catalog")),
                Duration::from_secs(3600),
            ),
            pipeline: self.pipeline.clone(),
        }
    }
}

//! Submit pipeline — assemble → generate (roles ‖ industries) → render ×2 → email.
//!
//! Any failure aborts the remaining stages and is reported as a single error naming
//! the stage. Nothing is persisted between attempts, so re-running the whole
//! submission is safe; the worst case is a duplicate email.
//!
//! The email is only built once both PDFs exist: one report without the other is
//! never sent.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::delivery::{
    Attachment, DeliveryError, Mailer, OutgoingMail, PdfDocument, PdfRenderer, RenderError,
};
use crate::form::{FormError, FormSession, SubmissionPayload};
use crate::reports::{Report, ReportError, ReportGenerator, ReportKind};

pub mod handlers;

pub const EMAIL_SUBJECT: &str = "Your Holland Bridge Reports";
pub const EMAIL_BODY: &str = "Attached are your personalized Holland Bridge reports.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error("Generating the {kind} report failed: {source}")]
    Report {
        kind: ReportKind,
        #[source]
        source: ReportError,
    },

    #[error("Rendering the {kind} report failed: {source}")]
    Render {
        kind: ReportKind,
        #[source]
        source: RenderError,
    },

    #[error("Sending the reports failed: {0}")]
    Delivery(#[source] DeliveryError),
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub recipient: String,
    pub attachments: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SubmissionPipeline {
    reports: Arc<dyn ReportGenerator>,
    renderer: Arc<dyn PdfRenderer>,
    mailer: Arc<dyn Mailer>,
    call_timeout: Duration,
}

impl SubmissionPipeline {
    pub fn new(
        reports: Arc<dyn ReportGenerator>,
        renderer: Arc<dyn PdfRenderer>,
        mailer: Arc<dyn Mailer>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            reports,
            renderer,
            mailer,
            call_timeout,
        }
    }

    /// Validates and assembles the session's payload, then runs the pipeline.
    /// Nothing external is called unless assembly succeeds.
    pub async fn submit(&self, session: &FormSession) -> Result<SubmissionReceipt, SubmissionError> {
        let payload = session.prepare_submission()?;
        info!(session_id = %session.id(), "Submission payload assembled");
        self.run(&payload).await
    }

    pub async fn run(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        // Both reports see the full payload.
        let (roles, industries) = tokio::try_join!(
            self.generate(payload, ReportKind::Roles),
            self.generate(payload, ReportKind::Industries),
        )?;

        let (roles_pdf, industries_pdf) =
            tokio::try_join!(self.render(&roles), self.render(&industries))?;

        let identity = &payload.identity;
        let mail = OutgoingMail {
            recipient: identity.email.clone(),
            subject: EMAIL_SUBJECT.to_string(),
            body: EMAIL_BODY.to_string(),
            attachments: vec![
                Attachment {
                    filename: roles.kind.pdf_filename(identity),
                    document: roles_pdf,
                },
                Attachment {
                    filename: industries.kind.pdf_filename(identity),
                    document: industries_pdf,
                },
            ],
        };

        let receipt = bounded(self.call_timeout, self.mailer.send(mail), |msg| {
            DeliveryError::Transport(msg)
        })
        .await
        .map_err(|e| {
            warn!("Delivery failed: {e}");
            SubmissionError::Delivery(e)
        })?;

        info!(attachments = receipt.attachments.len(), "Submission delivered");

        Ok(SubmissionReceipt {
            recipient: receipt.recipient,
            attachments: receipt.attachments,
            submitted_at: Utc::now(),
        })
    }

    async fn generate(
        &self,
        payload: &SubmissionPayload,
        kind: ReportKind,
    ) -> Result<Report, SubmissionError> {
        bounded(
            self.call_timeout,
            self.reports.generate(payload, kind),
            ReportError::UpstreamUnavailable,
        )
        .await
        .map_err(|source| SubmissionError::Report { kind, source })
    }

    async fn render(&self, report: &Report) -> Result<PdfDocument, SubmissionError> {
        let pdf = bounded(
            self.call_timeout,
            self.renderer.render(&report.html),
            RenderError::Unavailable,
        )
        .await
        .map_err(|source| SubmissionError::Render {
            kind: report.kind,
            source,
        })?;
        info!(report = %report.kind, bytes = pdf.len(), "Report rendered");
        Ok(pdf)
    }
}

/// Runs `fut` under `limit`; on expiry returns `on_timeout` applied to a description.
async fn bounded<T, E>(
    limit: Duration,
    fut: impl Future<Output = Result<T, E>>,
    on_timeout: impl FnOnce(String) -> E,
) -> Result<T, E> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(format!(
            "timed out after {}s",
            limit.as_secs()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use uuid::Uuid;

    use super::*;
    use crate::errors::AppError;
    use crate::form::catalog::{CORE_VALUES, EMAIL, FIRST_NAME, HOLLAND, LAST_NAME, TRAITS, VALUES};
    use crate::form::{FieldValue, StepCatalog};
    use crate::testing::{FakeMailer, FakeRenderer, FakeReports, Harness};

    fn harness(reports: FakeReports, renderer: FakeRenderer, mailer: FakeMailer) -> Harness {
        Harness::new(reports, renderer, mailer)
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    /// Walks a fresh session through all six steps.
    fn completed_session(email: &str) -> FormSession {
        let mut s = FormSession::new(
            Uuid::new_v4(),
            Arc::new(StepCatalog::holland_bridge(4).unwrap()),
        );
        s.answer(
            HOLLAND,
            FieldValue::Choices(vec!["Investigative".into(), "Artistic".into()]),
        )
        .unwrap();
        s.advance().unwrap();
        s.answer(
            VALUES,
            FieldValue::Choices(CORE_VALUES[..5].iter().map(|v| v.to_string()).collect()),
        )
        .unwrap();
        s.advance().unwrap();
        s.advance().unwrap();
        for t in TRAITS {
            s.answer(t.id, text(t.options[0])).unwrap();
        }
        s.advance().unwrap();
        s.advance().unwrap();
        s.answer(FIRST_NAME, text("Ada")).unwrap();
        s.answer(LAST_NAME, text("Lovelace")).unwrap();
        s.answer(EMAIL, text(email)).unwrap();
        s
    }

    #[tokio::test]
    async fn test_end_to_end_submission() {
        let h = harness(
            FakeReports::default(),
            FakeRenderer::default(),
            FakeMailer::default(),
        );
        let receipt = h
            .pipeline
            .submit(&completed_session("ada@example.com"))
            .await
            .unwrap();

        let mut calls = h.reports.calls.lock().unwrap().clone();
        calls.sort_by_key(|k| k.as_str());
        assert_eq!(calls, vec![ReportKind::Industries, ReportKind::Roles]);

        let payloads = h.reports.payloads.lock().unwrap();
        let payload = &payloads[0];
        assert_eq!(payloads[0], payloads[1]);
        assert_eq!(payload.holland.items, vec!["Investigative", "Artistic"]);
        assert_eq!(payload.values.items.len(), 5);
        assert_eq!(payload.admired_lives.len(), 4);
        assert!(payload.admired_lives.iter().all(|l| l.is_empty()));
        assert_eq!(payload.traits.len(), 8);
        assert!(payload
            .traits
            .iter()
            .zip(TRAITS)
            .all(|(sel, spec)| sel.value == spec.options[0]));
        assert_eq!(payload.industries_to_avoid, "");
        assert_eq!(payload.identity.full_name(), "Ada Lovelace");
        assert_eq!(payload.identity.email, "ada@example.com");

        let sent = h.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "ada@example.com");
        assert_eq!(sent[0].subject, EMAIL_SUBJECT);
        assert_eq!(
            receipt.attachments,
            vec![
                "Ada Lovelace - Holland Bridge - Aligned Roles.pdf",
                "Ada Lovelace - Holland Bridge - Aligned Industries and Megatrends.pdf",
            ]
        );
        assert!(sent[0].attachments[0].document.0.ends_with(b"<h1>roles</h1>"));
    }

    #[tokio::test]
    async fn test_bad_identity_makes_no_external_calls() {
        let h = harness(
            FakeReports::default(),
            FakeRenderer::default(),
            FakeMailer::default(),
        );
        let err = h
            .pipeline
            .submit(&completed_session("ada.example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Form(FormError::IncompleteIdentity(_))
        ));
        assert!(h.reports.calls.lock().unwrap().is_empty());
        assert!(h.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_failure_sends_nothing() {
        let h = harness(
            FakeReports {
                fail: Some(ReportError::RateLimited("429".into())),
                ..Default::default()
            },
            FakeRenderer::default(),
            FakeMailer::default(),
        );
        let err = h
            .pipeline
            .submit(&completed_session("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Report {
                source: ReportError::RateLimited(_),
                ..
            }
        ));
        assert!(h.renderer.rendered.lock().unwrap().is_empty());
        assert!(h.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_render_failure_sends_nothing() {
        let h = harness(
            FakeReports::default(),
            FakeRenderer {
                fail_on: Some("industries"),
                ..Default::default()
            },
            FakeMailer::default(),
        );
        let err = h
            .pipeline
            .submit(&completed_session("ada@example.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SubmissionError::Render {
                kind: ReportKind::Industries,
                source: RenderError::Failed("malformed html".into()),
            }
        );
        assert!(h.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_is_not_success() {
        let h = harness(
            FakeReports::default(),
            FakeRenderer::default(),
            FakeMailer {
                fail: true,
                ..Default::default()
            },
        );
        let err = h
            .pipeline
            .submit(&completed_session("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Delivery(_)));
        assert_eq!(h.renderer.rendered.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resubmission_repeats_whole_pipeline() {
        let h = harness(
            FakeReports::default(),
            FakeRenderer::default(),
            FakeMailer::default(),
        );
        let session = completed_session("ada@example.com");
        h.pipeline.submit(&session).await.unwrap();
        h.pipeline.submit(&session).await.unwrap();
        assert_eq!(h.reports.calls.lock().unwrap().len(), 4);
        assert_eq!(h.mailer.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_generator_times_out() {
        let h = harness(
            FakeReports {
                stall: true,
                ..Default::default()
            },
            FakeRenderer::default(),
            FakeMailer::default(),
        );
        let err = h
            .pipeline
            .submit(&completed_session("ada@example.com"))
            .await
            .unwrap_err();
        match err {
            SubmissionError::Report {
                source: ReportError::UpstreamUnavailable(msg),
                ..
            } => assert_eq!(msg, "timed out after 30s"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(h.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_renderer_times_out_as_upstream_unavailable() {
        let h = harness(
            FakeReports::default(),
            FakeRenderer {
                stall: true,
                ..Default::default()
            },
            FakeMailer::default(),
        );
        let err = h
            .pipeline
            .submit(&completed_session("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            SubmissionError::Render {
                source: RenderError::Unavailable(msg),
                ..
            } if msg == "timed out after 30s"
        ));
        assert!(h.mailer.sent.lock().unwrap().is_empty());

        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "UPSTREAM_UNAVAILABLE");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_mailer_times_out_as_delivery_error() {
        let h = harness(
            FakeReports::default(),
            FakeRenderer::default(),
            FakeMailer {
                stall: true,
                ..Default::default()
            },
        );
        let err = h
            .pipeline
            .submit(&completed_session("ada@example.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SubmissionError::Delivery(DeliveryError::Transport("timed out after 30s".into()))
        );
        assert_eq!(h.renderer.rendered.lock().unwrap().len(), 2);
        assert!(h.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undeliverable_address_makes_no_external_calls() {
        let h = harness(
            FakeReports::default(),
            FakeRenderer::default(),
            FakeMailer::default(),
        );
        let err = h
            .pipeline
            .submit(&completed_session("ada@exa(mple.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Form(FormError::IncompleteIdentity(_))
        ));
        assert!(h.reports.calls.lock().unwrap().is_empty());
    }
}

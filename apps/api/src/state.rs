use crate::form::SessionStore;
use crate::submission::SubmissionPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Live questionnaire sessions; each one owns its stepper and answers.
    pub sessions: SessionStore,
    /// Report generation, PDF rendering and mail delivery behind trait objects.
    pub pipeline: SubmissionPipeline,
}

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::submission::SubmissionReceipt;

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub session_id: Uuid,
    pub receipt: SubmissionReceipt,
}

/// POST /api/v1/sessions/:id/submit
///
/// Runs the full pipeline on a copy of the session; the session itself is left
/// untouched so a failed submission can simply be retried.
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitResponse>, AppError> {
    let session = state.sessions.get(id).await?;

    let receipt = state.pipeline.submit(&session).await.map_err(|e| {
        warn!(session_id = %id, "Submission failed: {e}");
        AppError::from(e)
    })?;

    info!(session_id = %id, "Submission completed");

    Ok(Json(SubmitResponse {
        session_id: id,
        receipt,
    }))
}

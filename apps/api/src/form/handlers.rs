//! Axum route handlers for the questionnaire.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::form::{FieldValue, StepCatalog, StepView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub value: FieldValue,
}

/// GET /api/v1/catalog
pub async fn handle_get_catalog(State(state): State<AppState>) -> Json<StepCatalog> {
    Json(state.sessions.catalog().as_ref().clone())
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<StepView>) {
    let session = state.sessions.create().await;
    info!(session_id = %session.id(), "Questionnaire started");
    (StatusCode::CREATED, Json(session.view()))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepView>, AppError> {
    Ok(Json(state.sessions.get(id).await?.view()))
}

/// PUT /api/v1/sessions/:id/answers/:field_id
///
/// Only fields on the current step are writable. A rejected value leaves the
/// stored answer unchanged.
pub async fn handle_set_answer(
    State(state): State<AppState>,
    Path((id, field_id)): Path<(Uuid, String)>,
    body: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Json<StepView>, AppError> {
    let Json(request) = body?;
    let view = state
        .sessions
        .update(id, |session| {
            session.answer(&field_id, request.value)?;
            Ok(session.view())
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/back
pub async fn handle_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepView>, AppError> {
    let view = state
        .sessions
        .update(id, |session| {
            session.back();
            Ok(session.view())
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/next
///
/// Refuses to leave a step whose minimum selections are not met.
pub async fn handle_next(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepView>, AppError> {
    let view = state
        .sessions
        .update(id, |session| {
            session.advance()?;
            Ok(session.view())
        })
        .await?;
    Ok(Json(view))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

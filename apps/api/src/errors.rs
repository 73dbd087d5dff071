use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::delivery::RenderError;
use crate::form::FormError;
use crate::reports::ReportError;
use crate::submission::SubmissionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Incomplete identity: {0}")]
    IncompleteIdentity(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<FormError> for AppError {
    fn from(e: FormError) -> Self {
        match e {
            FormError::ConstraintViolation { .. } => AppError::ConstraintViolation(e.to_string()),
            FormError::IncompleteIdentity(msg) => AppError::IncompleteIdentity(msg),
            FormError::UnknownField(_) | FormError::SessionNotFound(_) => {
                AppError::NotFound(e.to_string())
            }
            FormError::FieldNotOnStep { .. } | FormError::NotOnFinalStep { .. } => {
                AppError::Validation(e.to_string())
            }
            FormError::InvalidCatalog(_) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<SubmissionError> for AppError {
    fn from(e: SubmissionError) -> Self {
        let message = e.to_string();
        match e {
            SubmissionError::Form(form) => form.into(),
            SubmissionError::Report {
                source: ReportError::RateLimited(_),
                ..
            } => AppError::RateLimited(message),
            SubmissionError::Report {
                source: ReportError::UpstreamUnavailable(_),
                ..
            } => AppError::UpstreamUnavailable(message),
            SubmissionError::Render {
                source: RenderError::Unavailable(_),
                ..
            } => AppError::UpstreamUnavailable(message),
            SubmissionError::Render {
                source: RenderError::Failed(_),
                ..
            } => AppError::Render(message),
            SubmissionError::Delivery(_) => AppError::Delivery(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::ConstraintViolation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "CONSTRAINT_VIOLATION",
                msg.clone(),
            ),
            AppError::IncompleteIdentity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INCOMPLETE_IDENTITY",
                msg.clone(),
            ),
            AppError::UpstreamUnavailable(msg) => {
                tracing::error!("Upstream unavailable: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_UNAVAILABLE",
                    "Report generation is temporarily unavailable. Please submit again."
                        .to_string(),
                )
            }
            AppError::RateLimited(msg) => {
                tracing::warn!("Rate limited: {msg}");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMITED",
                    "Too many requests to the report service. Please submit again shortly."
                        .to_string(),
                )
            }
            AppError::Render(msg) => {
                tracing::error!("Render error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "RENDER_ERROR",
                    "Your reports could not be converted to PDF. Please submit again."
                        .to_string(),
                )
            }
            AppError::Delivery(msg) => {
                tracing::error!("Delivery error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "DELIVERY_ERROR",
                    "Your reports could not be emailed. Please submit again.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

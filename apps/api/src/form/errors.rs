use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the questionnaire core (catalog, answers, stepper, assembler).
/// None of these involve an external call; all are recoverable by the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Constraint violation on '{field}': {reason}")]
    ConstraintViolation { field: String, reason: String },

    #[error("Incomplete identity: {0}")]
    IncompleteIdentity(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Field '{field}' belongs to step {owner}, but the current step is {current}")]
    FieldNotOnStep {
        field: String,
        owner: usize,
        current: usize,
    },

    #[error("Submission is only possible from the final step (current step is {current})")]
    NotOnFinalStep { current: usize },

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Invalid step catalog: {0}")]
    InvalidCatalog(String),
}

impl FormError {
    pub fn violation(field: &str, reason: impl Into<String>) -> Self {
        FormError::ConstraintViolation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

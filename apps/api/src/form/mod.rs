// Questionnaire core: field catalog, answer store, stepper, payload assembly.
// Nothing in this module performs I/O; the submit pipeline lives in `submission`.

pub mod answers;
pub mod catalog;
pub mod errors;
pub mod fields;
pub mod handlers;
pub mod payload;
pub mod session;
pub mod stepper;

pub use answers::{AnswerSnapshot, AnswerStore};
pub use catalog::StepCatalog;
pub use errors::FormError;
pub use fields::FieldValue;
pub use payload::{assemble, Identity, SubmissionPayload};
pub use session::{FormSession, SessionStore, StepView};

// grocer/src/workflow/error.rs
use thiserror::Error;

/// Failures raised by the workflow engine itself, as opposed to the
/// domain errors step handlers return.
#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("No workflow registered for context type {type_name}")]
  NotRegistered { type_name: String },

  #[error("Context type mismatch in workflow dispatch (expected {expected_type})")]
  TypeMismatch { expected_type: String },
}

// grocer/src/workflow/control.rs

//! Signals for controlling workflow flow and the outcome of a run.

/// Returned by every step handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Keep going: remaining handlers of this step, then the next step.
  Continue,
  /// Halt the run here. Nothing after this handler executes.
  Stop,
}

/// Outcome of a whole workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  Completed,
  /// A handler returned `StepControl::Stop`.
  Stopped,
}

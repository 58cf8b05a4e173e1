// grocer/src/workflow/mod.rs

//! A small async step engine. Every lifecycle operation is a `Workflow` of
//! named steps (load, authorize, validate, persist, notify) run against a
//! shared `ContextData`.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod error;
pub mod execution;
pub mod registry;
pub mod step;

pub use context_data::ContextData;
pub use control::{FlowOutcome, StepControl};
pub use definition::Workflow;
pub use error::WorkflowError;
pub use registry::WorkflowRegistry;
pub use step::{Handler, SkipCondition, StepDef};

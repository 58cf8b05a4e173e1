// grocer/src/flows/mod.rs

//! The lifecycle operations as workflows, one per context type.

pub mod assignment_flow;
pub mod checkout_flow;
pub mod common_steps;
pub mod contexts;
pub mod otp;
pub mod return_flow;
pub mod transition_flow;

use crate::error::LifecycleError;
use crate::workflow::WorkflowRegistry;

pub use contexts::{Checkout, Services, TransitionRequest};

pub fn register_all_flows(registry: &WorkflowRegistry<LifecycleError>) {
  checkout_flow::register_checkout_flow(registry);
  transition_flow::register_transition_flow(registry);
  assignment_flow::register_assignment_flow(registry);
  assignment_flow::register_auto_assign_flow(registry);
  return_flow::register_request_return_flow(registry);
  return_flow::register_return_step_flow(registry);
}

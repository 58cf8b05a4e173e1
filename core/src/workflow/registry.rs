// grocer/src/workflow/registry.rs

//! `WorkflowRegistry<E>`: workflows keyed by their context data type, so a
//! caller only has to build the right context to dispatch the right workflow.

use super::context_data::ContextData;
use super::control::FlowOutcome;
use super::definition::Workflow;
use super::error::WorkflowError;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait ErasedRunner<E>: Send + Sync
where
  E: std::error::Error + Send + Sync + 'static,
{
  fn workflow_name(&self) -> &'static str;

  /// `ctx_obj` holds a `ContextData<TData>` for the runner's `TData`.
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<FlowOutcome, E>;
}

struct TypedRunner<TData, HandlerErr, E>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  workflow: Arc<Workflow<TData, HandlerErr>>,
  _phantom: PhantomData<fn() -> E>,
}

#[async_trait]
impl<TData, HandlerErr, E> ErasedRunner<E> for TypedRunner<TData, HandlerErr, E>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
  E: std::error::Error + From<HandlerErr> + From<WorkflowError> + Send + Sync + 'static,
{
  fn workflow_name(&self) -> &'static str {
    self.workflow.name()
  }

  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<FlowOutcome, E> {
    let ctx_data = match ctx_obj.downcast::<ContextData<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        return Err(E::from(WorkflowError::TypeMismatch {
          expected_type: std::any::type_name::<ContextData<TData>>().to_string(),
        }))
      }
    };
    self.workflow.run(ctx_data).await.map_err(E::from)
  }
}

/// Registry of workflows, one per context data type.
pub struct WorkflowRegistry<E = WorkflowError>
where
  E: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  runners: RwLock<HashMap<TypeId, Arc<dyn ErasedRunner<E>>>>,
}

impl<E> Default for WorkflowRegistry<E>
where
  E: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<E> WorkflowRegistry<E>
where
  E: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      runners: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `workflow` for its context type, replacing any previous one.
  pub fn register<TData, HandlerErr>(&self, workflow: Workflow<TData, HandlerErr>)
  where
    TData: 'static + Send + Sync,
    HandlerErr: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
    E: From<HandlerErr>,
  {
    event!(
      Level::DEBUG,
      workflow = workflow.name(),
      tdata_type = %std::any::type_name::<TData>(),
      "Registering workflow."
    );
    let runner = TypedRunner::<TData, HandlerErr, E> {
      workflow: Arc::new(workflow),
      _phantom: PhantomData,
    };
    self.runners.write().insert(TypeId::of::<TData>(), Arc::new(runner));
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.runners.read().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the workflow registered for `TData`.
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<FlowOutcome, E>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self.runners.read().get(&TypeId::of::<TData>()).cloned().ok_or_else(|| {
      let type_name = std::any::type_name::<TData>();
      event!(Level::ERROR, "No workflow registered for {}.", type_name);
      E::from(WorkflowError::NotRegistered {
        type_name: type_name.to_string(),
      })
    })?;

    event!(Level::TRACE, workflow = runner.workflow_name(), "Dispatching workflow.");
    runner.run_erased(Box::new(ctx_data)).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::workflow::StepControl;

  struct Counter(u32);
  struct Unregistered;

  #[tokio::test]
  async fn dispatches_by_context_type() {
    let registry = WorkflowRegistry::<WorkflowError>::new();
    let mut wf = Workflow::<Counter, WorkflowError>::new("count", &[("bump", false, None)]);
    wf.on("bump", |ctx: ContextData<Counter>| async move {
      ctx.write().0 += 1;
      Ok::<_, WorkflowError>(StepControl::Continue)
    });
    registry.register(wf);
    assert!(registry.is_registered::<Counter>());

    let ctx = ContextData::new(Counter(41));
    assert_eq!(registry.run(ctx.clone()).await.unwrap(), FlowOutcome::Completed);
    assert_eq!(ctx.read().0, 42);
  }

  #[tokio::test]
  async fn unknown_context_type_is_reported() {
    let registry = WorkflowRegistry::<WorkflowError>::new();
    let err = registry.run(ContextData::new(Unregistered)).await.unwrap_err();
    assert!(matches!(err, WorkflowError::NotRegistered { .. }));
  }
}

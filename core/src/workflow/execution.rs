// grocer/src/workflow/execution.rs

//! `Workflow::run()`: walks the steps in order and drives each phase's handlers.

use super::context_data::ContextData;
use super::control::{FlowOutcome, StepControl};
use super::definition::{Phase, Workflow};
use super::error::WorkflowError;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Workflow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  /// Runs every step against `ctx_data`.
  ///
  /// Returns `Stopped` as soon as a handler asks to stop, and the handler's
  /// error as soon as one fails. Skipped steps and handler-less optional steps
  /// are passed over silently.
  #[instrument(
    name = "Workflow::run",
    skip_all,
    fields(workflow = self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Workflow run starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::DEBUG,
        "workflow_step",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(ctx_data.clone()) {
          event!(parent: &step_span, Level::DEBUG, "Step skipped by its skip condition.");
          continue;
        }
      }

      let has_handlers = [Phase::Before, Phase::On, Phase::After]
        .iter()
        .any(|phase| !self.handlers(*phase, step_name).is_empty());
      if !has_handlers {
        if step_def.optional {
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
        return Err(Err::from(WorkflowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      for phase in [Phase::Before, Phase::On, Phase::After] {
        let outcome = self
          .run_phase(phase, step_name, &ctx_data)
          .instrument(step_span.clone())
          .await?;
        if outcome == StepControl::Stop {
          event!(parent: &step_span, Level::INFO, phase = phase.label(), "Workflow stopped by a handler.");
          return Ok(FlowOutcome::Stopped);
        }
      }
    }

    event!(Level::DEBUG, "Workflow run completed.");
    Ok(FlowOutcome::Completed)
  }

  async fn run_phase(&self, phase: Phase, step_name: &str, ctx_data: &ContextData<TData>) -> Result<StepControl, Err> {
    for handler_fn in self.handlers(phase, step_name) {
      match handler_fn(ctx_data.clone()).await {
        Ok(StepControl::Continue) => {}
        Ok(StepControl::Stop) => return Ok(StepControl::Stop),
        Err(e) => {
          event!(Level::WARN, phase = phase.label(), error = %e, "Step handler failed.");
          return Err(e);
        }
      }
    }
    Ok(StepControl::Continue)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  #[derive(Debug, thiserror::Error)]
  enum TestError {
    #[error("engine: {0}")]
    Engine(#[from] WorkflowError),
    #[error("handler: {0}")]
    Handler(String),
  }

  #[derive(Default)]
  struct Trace {
    visited: Vec<&'static str>,
  }

  fn visit(name: &'static str) -> impl Fn(ContextData<Trace>) -> std::future::Ready<Result<StepControl, TestError>> {
    move |ctx| {
      ctx.write().visited.push(name);
      std::future::ready(Ok(StepControl::Continue))
    }
  }

  #[tokio::test]
  async fn runs_phases_in_order_and_skips_flagged_steps() {
    let mut wf = Workflow::<Trace, TestError>::new(
      "trace",
      &[
        ("first", false, None),
        ("skipped", false, Some(Arc::new(|_| true))),
        ("second", false, None),
      ],
    );
    wf.after("first", visit("first:after"));
    wf.on("first", visit("first:on"));
    wf.before("first", visit("first:before"));
    wf.on("skipped", visit("skipped:on"));
    wf.on("second", visit("second:on"));

    let ctx = ContextData::new(Trace::default());
    let outcome = wf.run(ctx.clone()).await.unwrap();

    assert_eq!(outcome, FlowOutcome::Completed);
    assert_eq!(
      ctx.read().visited,
      vec!["first:before", "first:on", "first:after", "second:on"]
    );
  }

  #[tokio::test]
  async fn stop_halts_remaining_steps() {
    let mut wf = Workflow::<Trace, TestError>::new("stop", &[("a", false, None), ("b", false, None)]);
    wf.on("a", |ctx: ContextData<Trace>| async move {
      ctx.write().visited.push("a");
      Ok::<_, TestError>(StepControl::Stop)
    });
    wf.on("b", visit("b"));

    let ctx = ContextData::new(Trace::default());
    assert_eq!(wf.run(ctx.clone()).await.unwrap(), FlowOutcome::Stopped);
    assert_eq!(ctx.read().visited, vec!["a"]);
  }

  #[tokio::test]
  async fn handler_error_propagates() {
    let mut wf = Workflow::<Trace, TestError>::new("fail", &[("a", false, None), ("b", false, None)]);
    wf.on("a", |_ctx: ContextData<Trace>| async move { Err::<StepControl, _>(TestError::Handler("boom".into())) });
    wf.on("b", visit("b"));

    let ctx = ContextData::new(Trace::default());
    let err = wf.run(ctx.clone()).await.unwrap_err();
    assert!(matches!(err, TestError::Handler(ref m) if m == "boom"));
    assert!(ctx.read().visited.is_empty());
  }

  #[tokio::test]
  async fn missing_handler_only_fails_required_steps() {
    let optional = Workflow::<Trace, TestError>::new("optional", &[("notify", true, None)]);
    assert_eq!(
      optional.run(ContextData::new(Trace::default())).await.unwrap(),
      FlowOutcome::Completed
    );

    let required = Workflow::<Trace, TestError>::new("required", &[("persist", false, None)]);
    let err = required.run(ContextData::new(Trace::default())).await.unwrap_err();
    assert!(matches!(
      err,
      TestError::Engine(WorkflowError::HandlerMissing { ref step_name }) if step_name == "persist"
    ));
  }

  #[test]
  #[should_panic(expected = "is not declared")]
  fn registering_on_unknown_step_panics() {
    let mut wf = Workflow::<Trace, TestError>::new("typo", &[("real", false, None)]);
    wf.on("reel", visit("reel"));
  }
}

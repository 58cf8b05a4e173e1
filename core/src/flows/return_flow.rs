// grocer/src/flows/return_flow.rs

//! Return requests: opening one on a delivered item, then walking it through
//! approval, pickup, receipt and refund.

use super::common_steps::{authorize_return_access, take_output};
use super::contexts::{RequestReturnCtxData, ReturnStepCtxData};
use crate::domain::{OrderStatus, Role};
use crate::error::LifecycleError;
use crate::notify::OrderNotice;
use crate::store::{NewReturnRequest, ReturnTransition};
use crate::workflow::{ContextData, StepControl, Workflow, WorkflowRegistry};
use chrono::Duration;
use tracing::{info, warn};

pub fn register_request_return_flow(registry: &WorkflowRegistry<LifecycleError>) {
  let mut wf = Workflow::<RequestReturnCtxData, LifecycleError>::new(
    "request_return",
    &[
      ("load_item", false, None),
      ("authorize", false, None),
      ("check_eligibility", false, None),
      ("open_request", false, None),
    ],
  );

  wf.on("load_item", |ctx: ContextData<RequestReturnCtxData>| async move {
    let (services, item_id, reason_blank) = {
      let guard = ctx.read();
      (guard.services.clone(), guard.order_item_id, guard.reason.trim().is_empty())
    };
    if reason_blank {
      return Err(LifecycleError::validation("a return needs a reason"));
    }
    let item = services
      .store
      .get_order_item(item_id)
      .await?
      .ok_or_else(|| LifecycleError::not_found("order item", item_id))?;
    ctx.write().item = Some(item);
    Ok(StepControl::Continue)
  });

  wf.on("authorize", |ctx: ContextData<RequestReturnCtxData>| async move {
    let guard = ctx.read();
    let found = take_output(guard.item.as_ref(), "request_return")?;
    if guard.actor.role != Role::Customer || found.order.customer_id != guard.actor.id {
      warn!(actor_id = %guard.actor.id, order_item_id = %found.item.id, "Return requested by someone other than the buyer.");
      return Err(LifecycleError::not_found("order item", found.item.id));
    }
    Ok(StepControl::Continue)
  });

  wf.on("check_eligibility", |ctx: ContextData<RequestReturnCtxData>| async move {
    let guard = ctx.read();
    let found = take_output(guard.item.as_ref(), "request_return")?;
    let (order, item) = (&found.order, &found.item);

    let delivered_at = match (order.status, order.delivered_at) {
      (OrderStatus::Delivered, Some(at)) => at,
      _ => return Err(LifecycleError::OrderNotDelivered { order_id: order.id }),
    };
    if !item.returnable {
      return Err(LifecycleError::ItemNotReturnable { order_item_id: item.id });
    }
    let now = guard.services.clock.now();
    if now - delivered_at > Duration::days(i64::from(item.return_period_days)) {
      warn!(order_item_id = %item.id, %delivered_at, period_days = item.return_period_days, "Return window closed.");
      return Err(LifecycleError::ReturnWindowExpired {
        return_period_days: item.return_period_days,
      });
    }
    Ok(StepControl::Continue)
  });

  wf.on("open_request", |ctx: ContextData<RequestReturnCtxData>| async move {
    let (services, request) = {
      let guard = ctx.read();
      let found = take_output(guard.item.as_ref(), "request_return")?;
      let request = NewReturnRequest {
        order_item_id: found.item.id,
        order_id: found.order.id,
        customer_id: found.order.customer_id,
        shop_id: found.order.shop_id,
        reason: guard.reason.trim().to_string(),
        actor: guard.actor,
        at: guard.services.clock.now(),
      };
      (guard.services.clone(), request)
    };

    let created = services.store.create_return_request(request).await?;
    info!(return_id = %created.id, order_item_id = %created.order_item_id, "Return requested.");
    ctx.write().created = Some(created);
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  wf.after("open_request", |ctx: ContextData<RequestReturnCtxData>| async move {
    let guard = ctx.read();
    if let Some(created) = &guard.created {
      guard.services.notifier.notify(OrderNotice::ReturnStatusChanged {
        return_id: created.id,
        customer_id: created.customer_id,
        status: created.status,
      });
    }
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  registry.register(wf);
}

pub fn register_return_step_flow(registry: &WorkflowRegistry<LifecycleError>) {
  let mut wf = Workflow::<ReturnStepCtxData, LifecycleError>::new(
    "return_step",
    &[
      ("load_return", false, None),
      ("authorize", false, None),
      ("check_status", false, None),
      ("apply_return_step", false, None),
    ],
  );

  wf.on("load_return", |ctx: ContextData<ReturnStepCtxData>| async move {
    let (services, return_id) = {
      let guard = ctx.read();
      (guard.services.clone(), guard.return_id)
    };
    let request = services
      .store
      .get_return_request(return_id)
      .await?
      .ok_or_else(|| LifecycleError::not_found("return request", return_id))?;
    ctx.write().request = Some(request);
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  wf.on("authorize", |ctx: ContextData<ReturnStepCtxData>| async move {
    let (services, actor, request, target) = {
      let guard = ctx.read();
      let request = take_output(guard.request.clone(), "return_step")?;
      (guard.services.clone(), guard.actor, request, guard.target)
    };
    authorize_return_access(
      &services,
      actor,
      request.customer_id,
      request.shop_id,
      "return request",
      request.id,
    )
    .await?;
    if actor.role != Role::Shopkeeper {
      return Err(LifecycleError::invalid_transition("return request", request.status, target, actor.role));
    }
    Ok(StepControl::Continue)
  });

  wf.on("check_status", |ctx: ContextData<ReturnStepCtxData>| async move {
    let guard = ctx.read();
    let request = take_output(guard.request.as_ref(), "return_step")?;
    if guard.target.predecessor() != Some(request.status) {
      warn!(return_id = %request.id, from = %request.status, to = %guard.target, "Return step out of order.");
      return Err(LifecycleError::invalid_transition(
        "return request",
        request.status,
        guard.target,
        guard.actor.role,
      ));
    }
    Ok(StepControl::Continue)
  });

  wf.on("apply_return_step", |ctx: ContextData<ReturnStepCtxData>| async move {
    let (services, transition) = {
      let guard = ctx.read();
      let request = take_output(guard.request.as_ref(), "return_step")?;
      let transition = ReturnTransition {
        return_id: request.id,
        expected: request.status,
        target: guard.target,
        actor: guard.actor,
        note: guard.note.clone(),
        at: guard.services.clock.now(),
      };
      (guard.services.clone(), transition)
    };

    let updated = services.store.transition_return_status(transition).await?;
    info!(return_id = %updated.id, status = %updated.status, "Return request advanced.");
    ctx.write().updated = Some(updated);
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  wf.after("apply_return_step", |ctx: ContextData<ReturnStepCtxData>| async move {
    let guard = ctx.read();
    if let Some(updated) = &guard.updated {
      guard.services.notifier.notify(OrderNotice::ReturnStatusChanged {
        return_id: updated.id,
        customer_id: updated.customer_id,
        status: updated.status,
      });
    }
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  registry.register(wf);
}

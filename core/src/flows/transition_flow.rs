// grocer/src/flows/transition_flow.rs

//! Order status changes driven by the transition table.

use super::common_steps::{authorize_order_access, auto_assignment_candidate, notify_order_update, take_output};
use super::contexts::TransitionCtxData;
use super::otp::is_well_formed;
use crate::domain::OrderStatus;
use crate::error::LifecycleError;
use crate::state_machine::find_edge;
use crate::store::{Cancellation, OtpCheck, RiderGuard, StatusTransition, TransitionEffects};
use crate::workflow::{ContextData, SkipCondition, StepControl, Workflow, WorkflowRegistry};
use std::sync::Arc;
use tracing::{debug, info, warn};

fn edge_flag(flag: fn(&crate::state_machine::Edge) -> bool) -> SkipCondition<TransitionCtxData> {
  Arc::new(move |ctx: ContextData<TransitionCtxData>| !ctx.read().edge.is_some_and(flag))
}

pub fn register_transition_flow(registry: &WorkflowRegistry<LifecycleError>) {
  let mut wf = Workflow::<TransitionCtxData, LifecycleError>::new(
    "order_transition",
    &[
      ("load_order", false, None),
      ("authorize", false, None),
      ("match_edge", false, None),
      ("verify_otp", false, Some(edge_flag(|e| e.requires_otp))),
      ("pick_auto_rider", false, Some(edge_flag(|e| e.may_auto_assign))),
      ("apply_transition", false, None),
    ],
  );

  wf.on("load_order", |ctx: ContextData<TransitionCtxData>| async move {
    let (services, order_id) = {
      let guard = ctx.read();
      (guard.services.clone(), guard.order_id)
    };
    let details = services
      .store
      .get_order(order_id)
      .await?
      .ok_or_else(|| LifecycleError::not_found("order", order_id))?;
    ctx.write().order = Some(details.order);
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  wf.on("authorize", |ctx: ContextData<TransitionCtxData>| async move {
    let (services, actor, order) = {
      let guard = ctx.read();
      (guard.services.clone(), guard.actor, take_output(guard.order.clone(), "order_transition")?)
    };
    authorize_order_access(&services, actor, &order).await?;
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  wf.on("match_edge", |ctx: ContextData<TransitionCtxData>| async move {
    let mut guard = ctx.write();
    let role = guard.actor.role;
    let target = guard.request.target;
    let from = guard
      .order
      .as_ref()
      .map(|o| o.status)
      .ok_or_else(|| LifecycleError::internal("order not loaded"))?;
    match find_edge(role, from, target) {
      Some(edge) => {
        guard.edge = Some(edge);
        Ok(StepControl::Continue)
      }
      None => {
        warn!(%from, to = %target, %role, "Transition rejected by the table.");
        Err(LifecycleError::invalid_transition("order", from, target, role))
      }
    }
  });

  wf.on("verify_otp", |ctx: ContextData<TransitionCtxData>| async move {
    let (services, order, supplied) = {
      let guard = ctx.read();
      (
        guard.services.clone(),
        take_output(guard.order.clone(), "order_transition")?,
        guard.request.otp.clone(),
      )
    };

    let supplied = supplied.unwrap_or_default();
    let supplied = supplied.trim();
    if !is_well_formed(supplied) {
      return Err(LifecycleError::validation("delivery code must be 4 digits"));
    }
    let check = services
      .store
      .check_delivery_otp(order.id, supplied, services.config.max_otp_attempts)
      .await?;
    match check {
      OtpCheck::Matched => {}
      OtpCheck::Mismatched { attempts } => {
        warn!(order_id = %order.id, attempts, "Delivery code mismatch.");
        return Err(LifecycleError::InvalidOtp);
      }
      OtpCheck::Locked { attempts } => {
        warn!(order_id = %order.id, attempts, "Delivery locked after repeated bad codes.");
        return Err(LifecycleError::OtpAttemptsExceeded { order_id: order.id });
      }
    }
    Ok(StepControl::Continue)
  });

  wf.on("pick_auto_rider", |ctx: ContextData<TransitionCtxData>| async move {
    let (services, shop_id) = {
      let guard = ctx.read();
      let order = take_output(guard.order.as_ref(), "order_transition")?;
      (guard.services.clone(), order.shop_id)
    };
    let candidate = auto_assignment_candidate(&services, shop_id).await?;
    ctx.write().auto_rider = candidate;
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  wf.on("apply_transition", |ctx: ContextData<TransitionCtxData>| async move {
    let (services, transition) = {
      let guard = ctx.read();
      let order = take_output(guard.order.as_ref(), "order_transition")?;
      let edge = take_output(guard.edge, "order_transition")?;
      let actor = guard.actor;

      let rider_guard = if edge.requires_assigned_rider {
        RiderGuard::AssignedTo(actor.id)
      } else if guard.auto_rider.is_some() {
        RiderGuard::Unassigned
      } else {
        RiderGuard::Any
      };
      let (target, passes_through) = match guard.auto_rider {
        Some(_) => (OrderStatus::Shipped, Some(edge.to)),
        None => (edge.to, None),
      };
      let effects = TransitionEffects {
        assign_rider: guard.auto_rider,
        rider_capacity: guard.auto_rider.and(guard.services.policy.hard_cap()),
        restore_stock: edge.restores_stock,
        cancellation: edge.cancels.then(|| Cancellation {
          by: actor.role,
          reason: guard.request.reason.clone(),
        }),
        mark_delivered: edge.requires_otp,
      };
      let note = match guard.auto_rider {
        Some(rider_id) => Some(format!("auto-assigned rider {}", rider_id)),
        None => guard.request.reason.clone(),
      };

      let transition = StatusTransition {
        order_id: order.id,
        expected: vec![order.status],
        rider_guard,
        target,
        passes_through,
        effects,
        actor,
        note,
        at: guard.services.clock.now(),
      };
      (guard.services.clone(), transition)
    };

    let from = transition.expected.first().copied();
    let fallback = transition
      .effects
      .assign_rider
      .is_some()
      .then(|| without_auto_rider(transition.clone()));
    let updated = match (services.store.transition_order_status(transition).await, fallback) {
      (Err(LifecycleError::RiderUnavailable { rider_id }), Some(fallback)) => {
        debug!(%rider_id, "Auto-assign candidate filled up; confirming without a rider.");
        ctx.write().auto_rider = None;
        services.store.transition_order_status(fallback).await?
      }
      (outcome, _) => outcome?,
    };
    info!(
      order_id = %updated.id,
      from = ?from,
      to = %updated.status,
      rider = ?updated.assigned_rider_id,
      "Order status changed."
    );
    ctx.write().updated = Some(updated);
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  wf.after("apply_transition", |ctx: ContextData<TransitionCtxData>| async move {
    let guard = ctx.read();
    if let Some(updated) = &guard.updated {
      notify_order_update(&guard.services, updated, guard.auto_rider.is_some());
    }
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  registry.register(wf);
}

/// The plain confirmation behind an auto-assigning one.
fn without_auto_rider(mut transition: StatusTransition) -> StatusTransition {
  if let Some(via) = transition.passes_through.take() {
    transition.target = via;
  }
  transition.rider_guard = RiderGuard::Any;
  transition.effects.assign_rider = None;
  transition.effects.rider_capacity = None;
  transition.note = None;
  transition
}

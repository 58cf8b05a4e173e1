// grocer/src/flows/assignment_flow.rs

//! Manual rider assignment by the shop, plus the standalone auto-assignment
//! used for orders that were confirmed before a rider became available.

use super::common_steps::{
  authorize_order_access, auto_assignment_candidate, notify_order_update, rider_has_capacity, take_output,
};
use super::contexts::{AssignRiderCtxData, AutoAssignCtxData};
use crate::domain::{OrderStatus, Role};
use crate::error::LifecycleError;
use crate::store::{RiderGuard, StatusTransition, TransitionEffects};
use crate::workflow::{ContextData, StepControl, Workflow, WorkflowRegistry};
use tracing::{debug, info, warn};

const ASSIGNABLE: [OrderStatus; 3] = [OrderStatus::Pending, OrderStatus::Confirmed, OrderStatus::Ready];
const ASSIGN_LABEL: &str = "rider assignment";

pub fn register_assignment_flow(registry: &WorkflowRegistry<LifecycleError>) {
  let mut wf = Workflow::<AssignRiderCtxData, LifecycleError>::new(
    "assign_rider",
    &[
      ("load_order", false, None),
      ("authorize", false, None),
      ("check_order", false, None),
      ("check_rider", false, None),
      ("apply_assignment", false, None),
    ],
  );

  wf.on("load_order", |ctx: ContextData<AssignRiderCtxData>| async move {
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

  wf.on("authorize", |ctx: ContextData<AssignRiderCtxData>| async move {
    let (services, actor, order) = {
      let guard = ctx.read();
      (guard.services.clone(), guard.actor, take_output(guard.order.clone(), "assign_rider")?)
    };
    authorize_order_access(&services, actor, &order).await?;
    if actor.role != Role::Shopkeeper {
      warn!(role = %actor.role, order_id = %order.id, "Only the shop can assign riders.");
      return Err(LifecycleError::invalid_transition("order", order.status, ASSIGN_LABEL, actor.role));
    }
    Ok(StepControl::Continue)
  });

  wf.on("check_order", |ctx: ContextData<AssignRiderCtxData>| async move {
    let guard = ctx.read();
    let order = take_output(guard.order.as_ref(), "assign_rider")?;
    let already_assigned = order.assigned_rider_id.is_some() && !guard.services.config.allow_reassignment;
    if !ASSIGNABLE.contains(&order.status) || already_assigned {
      warn!(
        order_id = %order.id,
        status = %order.status,
        assigned = ?order.assigned_rider_id,
        "Order cannot take a rider now."
      );
      return Err(LifecycleError::invalid_transition(
        "order",
        order.status,
        ASSIGN_LABEL,
        guard.actor.role,
      ));
    }
    Ok(StepControl::Continue)
  });

  wf.on("check_rider", |ctx: ContextData<AssignRiderCtxData>| async move {
    let (services, rider_id, shop_id) = {
      let guard = ctx.read();
      let order = take_output(guard.order.as_ref(), "assign_rider")?;
      (guard.services.clone(), guard.rider_id, order.shop_id)
    };

    if !services.directory.rider_belongs_to_shop(rider_id, shop_id).await? {
      warn!(%rider_id, %shop_id, "Rider does not work for this shop.");
      return Err(LifecycleError::not_found("rider", rider_id));
    }
    let rider = services
      .store
      .get_rider(rider_id)
      .await?
      .ok_or_else(|| LifecycleError::not_found("rider", rider_id))?;
    if !rider_has_capacity(&services, &rider).await? {
      warn!(%rider_id, "Rider is at capacity.");
      return Err(LifecycleError::RiderUnavailable { rider_id });
    }
    ctx.write().rider = Some(rider);
    Ok(StepControl::Continue)
  });

  wf.on("apply_assignment", |ctx: ContextData<AssignRiderCtxData>| async move {
    let (services, transition) = {
      let guard = ctx.read();
      let order = take_output(guard.order.as_ref(), "assign_rider")?;
      let target = match order.status {
        OrderStatus::Pending => OrderStatus::Confirmed,
        other => other,
      };
      let rider_guard = match order.assigned_rider_id {
        Some(current) => RiderGuard::AssignedTo(current),
        None => RiderGuard::Unassigned,
      };
      let transition = StatusTransition {
        order_id: order.id,
        expected: vec![order.status],
        rider_guard,
        target,
        passes_through: None,
        effects: TransitionEffects {
          assign_rider: Some(guard.rider_id),
          rider_capacity: guard.services.policy.hard_cap(),
          ..Default::default()
        },
        actor: guard.actor,
        note: Some(format!("assigned rider {}", guard.rider_id)),
        at: guard.services.clock.now(),
      };
      (guard.services.clone(), transition)
    };

    let updated = services.store.transition_order_status(transition).await?;
    info!(order_id = %updated.id, rider = ?updated.assigned_rider_id, status = %updated.status, "Rider assigned.");
    ctx.write().updated = Some(updated);
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  wf.after("apply_assignment", |ctx: ContextData<AssignRiderCtxData>| async move {
    let guard = ctx.read();
    if let Some(updated) = &guard.updated {
      notify_order_update(&guard.services, updated, true);
    }
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  registry.register(wf);
}

pub fn register_auto_assign_flow(registry: &WorkflowRegistry<LifecycleError>) {
  let mut wf = Workflow::<AutoAssignCtxData, LifecycleError>::new(
    "auto_assign",
    &[
      ("load_order", false, None),
      ("authorize", false, None),
      ("pick_rider", false, None),
      ("apply_assignment", false, None),
    ],
  );

  wf.on("load_order", |ctx: ContextData<AutoAssignCtxData>| async move {
    let (services, order_id, shop_id) = {
      let guard = ctx.read();
      (guard.services.clone(), guard.order_id, guard.shop_id)
    };
    let order = services
      .store
      .get_order(order_id)
      .await?
      .map(|d| d.order)
      .filter(|o| o.shop_id == shop_id)
      .ok_or_else(|| LifecycleError::not_found("order", order_id))?;
    ctx.write().order = Some(order);
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  wf.on("authorize", |ctx: ContextData<AutoAssignCtxData>| async move {
    let (services, actor, order) = {
      let guard = ctx.read();
      (guard.services.clone(), guard.actor, take_output(guard.order.clone(), "auto_assign")?)
    };
    authorize_order_access(&services, actor, &order).await?;
    if actor.role != Role::Shopkeeper {
      return Err(LifecycleError::invalid_transition("order", order.status, ASSIGN_LABEL, actor.role));
    }
    Ok(StepControl::Continue)
  });

  wf.on("pick_rider", |ctx: ContextData<AutoAssignCtxData>| async move {
    let (services, order) = {
      let guard = ctx.read();
      (guard.services.clone(), take_output(guard.order.clone(), "auto_assign")?)
    };
    if order.status != OrderStatus::Confirmed || order.assigned_rider_id.is_some() {
      debug!(order_id = %order.id, status = %order.status, "Order is not waiting for a rider.");
      return Ok::<_, LifecycleError>(StepControl::Stop);
    }
    match auto_assignment_candidate(&services, order.shop_id).await? {
      Some(rider_id) => {
        ctx.write().rider_id = Some(rider_id);
        Ok(StepControl::Continue)
      }
      None => Ok(StepControl::Stop),
    }
  });

  wf.on("apply_assignment", |ctx: ContextData<AutoAssignCtxData>| async move {
    let (services, transition) = {
      let guard = ctx.read();
      let order = take_output(guard.order.as_ref(), "auto_assign")?;
      let rider_id = take_output(guard.rider_id, "auto_assign")?;
      let transition = StatusTransition {
        order_id: order.id,
        expected: vec![OrderStatus::Confirmed],
        rider_guard: RiderGuard::Unassigned,
        target: OrderStatus::Shipped,
        passes_through: None,
        effects: TransitionEffects {
          assign_rider: Some(rider_id),
          rider_capacity: guard.services.policy.hard_cap(),
          ..Default::default()
        },
        actor: guard.actor,
        note: Some(format!("auto-assigned rider {}", rider_id)),
        at: guard.services.clock.now(),
      };
      (guard.services.clone(), transition)
    };

    let updated = services.store.transition_order_status(transition).await?;
    info!(order_id = %updated.id, rider = ?updated.assigned_rider_id, "Order auto-assigned and shipped.");
    ctx.write().updated = Some(updated);
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  wf.after("apply_assignment", |ctx: ContextData<AutoAssignCtxData>| async move {
    let guard = ctx.read();
    if let Some(updated) = &guard.updated {
      notify_order_update(&guard.services, updated, true);
    }
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  registry.register(wf);
}

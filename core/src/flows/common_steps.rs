// grocer/src/flows/common_steps.rs

//! Checks and side effects shared by several workflows.

use super::contexts::Services;
use crate::domain::{Actor, Order, Rider, Role};
use crate::error::{LifecycleError, Result};
use crate::notify::OrderNotice;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Fails with `NotFound` unless `actor` may see `order`.
///
/// Customers see their own orders, shopkeepers their shop's, riders the ones
/// assigned to them, admins everything.
#[instrument(name = "common_step::authorize_order_access", skip(services, order), fields(order_id = %order.id), err(Display))]
pub async fn authorize_order_access(services: &Services, actor: Actor, order: &Order) -> Result<()> {
  let allowed = match actor.role {
    Role::Customer => order.customer_id == actor.id,
    Role::Rider => order.is_assigned_to(actor.id),
    Role::Shopkeeper => services.directory.shop_owned_by(actor.id).await? == Some(order.shop_id),
    Role::Admin => true,
  };
  if allowed {
    Ok(())
  } else {
    warn!(actor_id = %actor.id, role = %actor.role, "Order is outside the actor's scope.");
    Err(LifecycleError::not_found("order", order.id))
  }
}

/// Return requests and their history are visible to the owning customer, the
/// owning shop and admins. Riders never see them.
pub async fn authorize_return_access(
  services: &Services,
  actor: Actor,
  customer_id: Uuid,
  shop_id: Uuid,
  entity: &'static str,
  id: Uuid,
) -> Result<()> {
  let allowed = match actor.role {
    Role::Customer => customer_id == actor.id,
    Role::Shopkeeper => services.directory.shop_owned_by(actor.id).await? == Some(shop_id),
    Role::Rider => false,
    Role::Admin => true,
  };
  if allowed {
    Ok(())
  } else {
    warn!(actor_id = %actor.id, role = %actor.role, %id, "Return data is outside the actor's scope.");
    Err(LifecycleError::not_found(entity, id))
  }
}

/// Whether the assignment policy lets `rider` take one more order.
pub async fn rider_has_capacity(services: &Services, rider: &Rider) -> Result<bool> {
  let active = if services.policy.needs_active_count() {
    services.store.count_active_orders_for_rider(rider.id).await?
  } else {
    0
  };
  Ok(services.policy.admits(rider, active))
}

/// The rider to hand `shop_id`'s next confirmed order to, if there is exactly
/// one available rider and the policy admits them.
#[instrument(name = "common_step::auto_assignment_candidate", skip(services), err(Display))]
pub async fn auto_assignment_candidate(services: &Services, shop_id: Uuid) -> Result<Option<Uuid>> {
  let mut riders = services.store.find_available_riders(shop_id).await?;
  if riders.len() != 1 {
    debug!(available = riders.len(), "No auto-assignment: need exactly one available rider.");
    return Ok(None);
  }
  let Some(rider) = riders.pop() else {
    return Ok(None);
  };
  if !rider_has_capacity(services, &rider).await? {
    debug!(rider_id = %rider.id, "No auto-assignment: rider is at capacity.");
    return Ok(None);
  }
  Ok(Some(rider.id))
}

/// Tells the customer (and, when a rider was just attached, the rider) what
/// happened to `order`.
pub fn notify_order_update(services: &Services, order: &Order, rider_assigned: bool) {
  services.notifier.notify(OrderNotice::OrderStatusChanged {
    order_id: order.id,
    customer_id: order.customer_id,
    status: order.status,
  });
  if rider_assigned {
    if let Some(rider_id) = order.assigned_rider_id {
      services.notifier.notify(OrderNotice::RiderAssigned {
        order_id: order.id,
        rider_id,
      });
    }
  }
}

/// Pulls a workflow's output slot, failing if the workflow never filled it.
pub fn take_output<T>(slot: Option<T>, workflow: &'static str) -> Result<T> {
  slot.ok_or_else(|| {
    warn!(workflow, "Workflow finished without producing its result.");
    LifecycleError::internal("workflow finished without producing its result")
  })
}

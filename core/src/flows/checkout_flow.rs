// grocer/src/flows/checkout_flow.rs

use super::contexts::CheckoutCtxData;
use super::otp::generate_delivery_otp;
use crate::domain::Role;
use crate::error::LifecycleError;
use crate::notify::OrderNotice;
use crate::store::{checkout_quantity, NewOrder};
use crate::workflow::{ContextData, StepControl, Workflow, WorkflowRegistry};
use tracing::{info, warn};

pub fn register_checkout_flow(registry: &WorkflowRegistry<LifecycleError>) {
  let mut wf = Workflow::<CheckoutCtxData, LifecycleError>::new(
    "checkout",
    &[("validate_checkout", false, None), ("reserve_and_create", false, None)],
  );

  wf.on("validate_checkout", |ctx: ContextData<CheckoutCtxData>| async move {
    let guard = ctx.read();
    if guard.actor.role != Role::Customer {
      warn!(role = %guard.actor.role, "Checkout attempted by a non-customer.");
      return Err(LifecycleError::validation("only customers can place orders"));
    }
    if guard.checkout.lines.is_empty() {
      return Err(LifecycleError::validation("an order needs at least one item"));
    }
    checkout_quantity(&guard.checkout.lines)?;
    Ok(StepControl::Continue)
  });

  wf.on("reserve_and_create", |ctx: ContextData<CheckoutCtxData>| async move {
    let (services, new_order) = {
      let guard = ctx.read();
      let new_order = NewOrder {
        customer_id: guard.actor.id,
        address_id: guard.checkout.address_id,
        lines: guard.checkout.lines.clone(),
        payment_method: guard.checkout.payment_method,
        delivery_otp: generate_delivery_otp(),
        created_at: guard.services.clock.now(),
      };
      (guard.services.clone(), new_order)
    };

    let placed = services.store.create_order_with_items(new_order).await?;
    info!(
      order_id = %placed.order.id,
      shop_id = %placed.order.shop_id,
      total_cents = placed.order.total_amount_cents,
      "Order placed and stock reserved."
    );
    ctx.write().placed = Some(placed);
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  wf.after("reserve_and_create", |ctx: ContextData<CheckoutCtxData>| async move {
    let guard = ctx.read();
    if let Some(placed) = &guard.placed {
      guard.services.notifier.notify(OrderNotice::OrderPlaced {
        order_id: placed.order.id,
        shop_id: placed.order.shop_id,
        customer_id: placed.order.customer_id,
      });
    }
    Ok::<_, LifecycleError>(StepControl::Continue)
  });

  registry.register(wf);
}

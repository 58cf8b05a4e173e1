// grocer/src/lifecycle.rs

//! `LifecycleManager`: one async method per lifecycle operation.
//!
//! Mutating operations build a context and dispatch it to the workflow
//! registered for that context type. Reads go straight to the store after the
//! same scoping checks the workflows apply.

use crate::clock::{Clock, SystemClock};
use crate::config::LifecycleConfig;
use crate::domain::{
  Actor, GeoPoint, Order, OrderDetails, OrderHistoryEntry, OrderStatus, ReturnDecision, ReturnHistoryEntry,
  ReturnRequest, ReturnStatus, Rider, Role,
};
use crate::error::{LifecycleError, Result};
use crate::flows::common_steps::{authorize_order_access, authorize_return_access, take_output};
use crate::flows::contexts::{
  AssignRiderCtxData, AutoAssignCtxData, CheckoutCtxData, RequestReturnCtxData, ReturnStepCtxData, TransitionCtxData,
};
use crate::flows::{register_all_flows, Checkout, Services, TransitionRequest};
use crate::notify::{Notifier, TracingNotifier};
use crate::policy::{AssignmentPolicy, Unbounded};
use crate::store::{Directory, OrderFilter, OrderStore};
use crate::workflow::{ContextData, FlowOutcome, WorkflowRegistry};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub struct LifecycleManagerBuilder {
  store: Arc<dyn OrderStore>,
  directory: Arc<dyn Directory>,
  notifier: Arc<dyn Notifier>,
  clock: Arc<dyn Clock>,
  policy: Arc<dyn AssignmentPolicy>,
  config: LifecycleConfig,
}

impl LifecycleManagerBuilder {
  pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn policy(mut self, policy: Arc<dyn AssignmentPolicy>) -> Self {
    self.policy = policy;
    self
  }

  pub fn config(mut self, config: LifecycleConfig) -> Self {
    self.config = config;
    self
  }

  pub fn build(self) -> LifecycleManager {
    let workflows = WorkflowRegistry::new();
    register_all_flows(&workflows);
    LifecycleManager {
      services: Arc::new(Services {
        store: self.store,
        directory: self.directory,
        notifier: self.notifier,
        clock: self.clock,
        policy: self.policy,
        config: self.config,
      }),
      workflows: Arc::new(workflows),
    }
  }
}

#[derive(Clone)]
pub struct LifecycleManager {
  services: Arc<Services>,
  workflows: Arc<WorkflowRegistry<LifecycleError>>,
}

impl LifecycleManager {
  pub fn builder(store: Arc<dyn OrderStore>, directory: Arc<dyn Directory>) -> LifecycleManagerBuilder {
    LifecycleManagerBuilder {
      store,
      directory,
      notifier: Arc::new(TracingNotifier),
      clock: Arc::new(SystemClock),
      policy: Arc::new(Unbounded),
      config: LifecycleConfig::default(),
    }
  }

  pub fn config(&self) -> &LifecycleConfig {
    &self.services.config
  }

  // --- Orders ---

  #[instrument(name = "lifecycle::create_order", skip(self, checkout), fields(customer_id = %actor.id, lines = checkout.lines.len()), err(Display))]
  pub async fn create_order(&self, actor: Actor, checkout: Checkout) -> Result<OrderDetails> {
    let ctx = ContextData::new(CheckoutCtxData {
      services: self.services.clone(),
      actor,
      checkout,
      placed: None,
    });
    self.workflows.run(ctx.clone()).await?;
    let placed = ctx.take(|c| &mut c.placed);
    take_output(placed, "checkout")
  }

  #[instrument(name = "lifecycle::get_order", skip(self), fields(actor_id = %actor.id, role = %actor.role), err(Display))]
  pub async fn get_order(&self, actor: Actor, order_id: Uuid) -> Result<OrderDetails> {
    let details = self
      .services
      .store
      .get_order(order_id)
      .await?
      .ok_or_else(|| LifecycleError::not_found("order", order_id))?;
    authorize_order_access(&self.services, actor, &details.order).await?;
    Ok(details)
  }

  /// Audit trail of the order, newest first.
  pub async fn order_history(&self, actor: Actor, order_id: Uuid) -> Result<Vec<OrderHistoryEntry>> {
    self.get_order(actor, order_id).await?;
    self.services.store.order_history(order_id).await
  }

  #[instrument(name = "lifecycle::list_orders", skip(self), fields(actor_id = %actor.id, role = %actor.role), err(Display))]
  pub async fn list_orders(&self, actor: Actor, status: Option<OrderStatus>) -> Result<Vec<Order>> {
    let mut filter = OrderFilter {
      status,
      ..Default::default()
    };
    match actor.role {
      Role::Customer => filter.customer_id = Some(actor.id),
      Role::Rider => filter.rider_id = Some(actor.id),
      Role::Shopkeeper => match self.services.directory.shop_owned_by(actor.id).await? {
        Some(shop_id) => filter.shop_id = Some(shop_id),
        None => return Ok(Vec::new()),
      },
      Role::Admin => {}
    }
    self.services.store.list_orders(&filter).await
  }

  /// Moves an order along the transition table on behalf of `actor`.
  #[instrument(
    name = "lifecycle::transition_order",
    skip(self, request),
    fields(actor_id = %actor.id, role = %actor.role, target = %request.target),
    err(Display)
  )]
  pub async fn transition_order(&self, actor: Actor, order_id: Uuid, request: TransitionRequest) -> Result<Order> {
    let ctx = ContextData::new(TransitionCtxData {
      services: self.services.clone(),
      actor,
      order_id,
      request,
      order: None,
      edge: None,
      auto_rider: None,
      updated: None,
    });
    self.workflows.run(ctx.clone()).await?;
    let updated = ctx.take(|c| &mut c.updated);
    take_output(updated, "order_transition")
  }

  /// Shopkeeper confirmation. May hand the order to the shop's only available
  /// rider, in which case it comes back `shipped`.
  pub async fn confirm_order(&self, actor: Actor, order_id: Uuid) -> Result<Order> {
    self
      .transition_order(actor, order_id, TransitionRequest::to(OrderStatus::Confirmed))
      .await
  }

  pub async fn update_preparation(&self, actor: Actor, order_id: Uuid, status: OrderStatus) -> Result<Order> {
    if !matches!(status, OrderStatus::Preparing | OrderStatus::Ready) {
      return Err(LifecycleError::validation(format!(
        "preparation status must be preparing or ready, got {}",
        status
      )));
    }
    self.transition_order(actor, order_id, TransitionRequest::to(status)).await
  }

  /// Shopkeeper cancellation of a pending order.
  pub async fn reject_order(&self, actor: Actor, order_id: Uuid, reason: Option<String>) -> Result<Order> {
    self.cancel(actor, order_id, reason).await
  }

  pub async fn ship_order(&self, actor: Actor, order_id: Uuid) -> Result<Order> {
    self
      .transition_order(actor, order_id, TransitionRequest::to(OrderStatus::Shipped))
      .await
  }

  pub async fn mark_delivered(&self, actor: Actor, order_id: Uuid, otp: &str) -> Result<Order> {
    self
      .transition_order(actor, order_id, TransitionRequest::to(OrderStatus::Delivered).with_otp(otp))
      .await
  }

  pub async fn rider_cancel_order(&self, actor: Actor, order_id: Uuid, reason: Option<String>) -> Result<Order> {
    self.cancel(actor, order_id, reason).await
  }

  pub async fn customer_cancel_order(&self, actor: Actor, order_id: Uuid, reason: Option<String>) -> Result<Order> {
    self.cancel(actor, order_id, reason).await
  }

  async fn cancel(&self, actor: Actor, order_id: Uuid, reason: Option<String>) -> Result<Order> {
    let request = TransitionRequest {
      target: OrderStatus::Cancelled,
      otp: None,
      reason,
    };
    self.transition_order(actor, order_id, request).await
  }

  // --- Riders ---

  #[instrument(name = "lifecycle::assign_rider", skip(self), fields(actor_id = %actor.id), err(Display))]
  pub async fn assign_rider(&self, actor: Actor, order_id: Uuid, rider_id: Uuid) -> Result<Order> {
    let ctx = ContextData::new(AssignRiderCtxData {
      services: self.services.clone(),
      actor,
      order_id,
      rider_id,
      order: None,
      rider: None,
      updated: None,
    });
    self.workflows.run(ctx.clone()).await?;
    let updated = ctx.take(|c| &mut c.updated);
    take_output(updated, "assign_rider")
  }

  /// Hands a confirmed, unassigned order to the shop's only available rider
  /// and ships it. Any other situation returns the order unchanged.
  #[instrument(name = "lifecycle::auto_assign_if_single_rider", skip(self), fields(actor_id = %actor.id), err(Display))]
  pub async fn auto_assign_if_single_rider(&self, actor: Actor, shop_id: Uuid, order_id: Uuid) -> Result<Order> {
    let ctx = ContextData::new(AutoAssignCtxData {
      services: self.services.clone(),
      actor,
      shop_id,
      order_id,
      order: None,
      rider_id: None,
      updated: None,
    });
    let outcome = self.workflows.run(ctx.clone()).await?;
    let mut guard = ctx.write();
    match outcome {
      FlowOutcome::Completed => take_output(guard.updated.take(), "auto_assign"),
      FlowOutcome::Stopped => take_output(guard.order.take(), "auto_assign"),
    }
  }

  #[instrument(name = "lifecycle::set_rider_availability", skip(self), fields(rider_id = %actor.id), err(Display))]
  pub async fn set_rider_availability(&self, actor: Actor, available: bool) -> Result<Rider> {
    ensure_rider(actor)?;
    let rider = self.services.store.set_rider_availability(actor.id, available).await?;
    info!(available, "Rider availability updated.");
    Ok(rider)
  }

  #[instrument(name = "lifecycle::update_rider_location", skip(self), fields(rider_id = %actor.id), err(Display))]
  pub async fn update_rider_location(&self, actor: Actor, location: GeoPoint) -> Result<Rider> {
    ensure_rider(actor)?;
    if !location.is_valid() {
      return Err(LifecycleError::validation(format!(
        "coordinates out of range: lat {} lng {}",
        location.lat, location.lng
      )));
    }
    let now = self.services.clock.now();
    self.services.store.update_rider_location(actor.id, location, now).await
  }

  // --- Returns ---

  #[instrument(name = "lifecycle::request_return", skip(self, reason), fields(customer_id = %actor.id), err(Display))]
  pub async fn request_return(&self, actor: Actor, order_item_id: Uuid, reason: &str) -> Result<ReturnRequest> {
    let ctx = ContextData::new(RequestReturnCtxData {
      services: self.services.clone(),
      actor,
      order_item_id,
      reason: reason.to_string(),
      item: None,
      created: None,
    });
    self.workflows.run(ctx.clone()).await?;
    let created = ctx.take(|c| &mut c.created);
    take_output(created, "request_return")
  }

  pub async fn process_return(
    &self,
    actor: Actor,
    return_id: Uuid,
    decision: ReturnDecision,
    note: Option<String>,
  ) -> Result<ReturnRequest> {
    self.advance_return(actor, return_id, decision.target(), note).await
  }

  pub async fn mark_return_picked_up(&self, actor: Actor, return_id: Uuid) -> Result<ReturnRequest> {
    self.advance_return(actor, return_id, ReturnStatus::PickedUp, None).await
  }

  pub async fn mark_return_received(&self, actor: Actor, return_id: Uuid) -> Result<ReturnRequest> {
    self.advance_return(actor, return_id, ReturnStatus::Received, None).await
  }

  pub async fn mark_refunded(&self, actor: Actor, return_id: Uuid) -> Result<ReturnRequest> {
    self.advance_return(actor, return_id, ReturnStatus::Refunded, None).await
  }

  #[instrument(name = "lifecycle::advance_return", skip(self, note), fields(actor_id = %actor.id, target = %target), err(Display))]
  async fn advance_return(
    &self,
    actor: Actor,
    return_id: Uuid,
    target: ReturnStatus,
    note: Option<String>,
  ) -> Result<ReturnRequest> {
    let ctx = ContextData::new(ReturnStepCtxData {
      services: self.services.clone(),
      actor,
      return_id,
      target,
      note,
      request: None,
      updated: None,
    });
    self.workflows.run(ctx.clone()).await?;
    let updated = ctx.take(|c| &mut c.updated);
    take_output(updated, "return_step")
  }

  pub async fn get_return_request(&self, actor: Actor, return_id: Uuid) -> Result<ReturnRequest> {
    let request = self
      .services
      .store
      .get_return_request(return_id)
      .await?
      .ok_or_else(|| LifecycleError::not_found("return request", return_id))?;
    authorize_return_access(
      &self.services,
      actor,
      request.customer_id,
      request.shop_id,
      "return request",
      return_id,
    )
    .await?;
    Ok(request)
  }

  /// Every return event for the item, newest first.
  #[instrument(name = "lifecycle::get_return_history", skip(self), fields(actor_id = %actor.id), err(Display))]
  pub async fn get_return_history(&self, actor: Actor, order_item_id: Uuid) -> Result<Vec<ReturnHistoryEntry>> {
    let found = self
      .services
      .store
      .get_order_item(order_item_id)
      .await?
      .ok_or_else(|| LifecycleError::not_found("order item", order_item_id))?;
    authorize_return_access(
      &self.services,
      actor,
      found.order.customer_id,
      found.order.shop_id,
      "order item",
      order_item_id,
    )
    .await?;
    self.services.store.return_history_for_item(order_item_id).await
  }
}

fn ensure_rider(actor: Actor) -> Result<()> {
  if actor.role == Role::Rider {
    Ok(())
  } else {
    warn!(actor_id = %actor.id, role = %actor.role, "Rider-only operation called by another role.");
    Err(LifecycleError::not_found("rider", actor.id))
  }
}

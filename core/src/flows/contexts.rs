// grocer/src/flows/contexts.rs

//! Context data structs the lifecycle workflows run over. Operations wrap
//! these in `ContextData` before dispatching.

use crate::clock::Clock;
use crate::config::LifecycleConfig;
use crate::domain::{Actor, Order, OrderDetails, OrderStatus, PaymentMethod, ReturnRequest, ReturnStatus, Rider};
use crate::notify::Notifier;
use crate::policy::AssignmentPolicy;
use crate::state_machine::Edge;
use crate::store::{CheckoutLine, Directory, ItemWithOrder, OrderStore};
use std::sync::Arc;
use uuid::Uuid;

/// Collaborators shared by every workflow.
#[derive(Clone)]
pub struct Services {
  pub store: Arc<dyn OrderStore>,
  pub directory: Arc<dyn Directory>,
  pub notifier: Arc<dyn Notifier>,
  pub clock: Arc<dyn Clock>,
  pub policy: Arc<dyn AssignmentPolicy>,
  pub config: LifecycleConfig,
}

#[derive(Debug, Clone)]
pub struct Checkout {
  pub address_id: Uuid,
  pub lines: Vec<CheckoutLine>,
  pub payment_method: PaymentMethod,
}

/// What an actor asks `transition_order` to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
  pub target: OrderStatus,
  /// Delivery code, required when the target is `delivered`.
  pub otp: Option<String>,
  /// Cancellation reason or free-form note.
  pub reason: Option<String>,
}

impl TransitionRequest {
  pub fn to(target: OrderStatus) -> Self {
    Self {
      target,
      otp: None,
      reason: None,
    }
  }

  pub fn with_otp(mut self, otp: impl Into<String>) -> Self {
    self.otp = Some(otp.into());
    self
  }

  pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
    self.reason = Some(reason.into());
    self
  }
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub services: Arc<Services>,
  pub actor: Actor,
  pub checkout: Checkout,
  pub placed: Option<OrderDetails>,
}

#[derive(Clone)]
pub struct TransitionCtxData {
  pub services: Arc<Services>,
  pub actor: Actor,
  pub order_id: Uuid,
  pub request: TransitionRequest,
  pub order: Option<Order>,
  pub edge: Option<&'static Edge>,
  pub auto_rider: Option<Uuid>,
  pub updated: Option<Order>,
}

#[derive(Clone)]
pub struct AssignRiderCtxData {
  pub services: Arc<Services>,
  pub actor: Actor,
  pub order_id: Uuid,
  pub rider_id: Uuid,
  pub order: Option<Order>,
  pub rider: Option<Rider>,
  pub updated: Option<Order>,
}

/// Auto-assignment outside a confirmation, for orders already confirmed.
#[derive(Clone)]
pub struct AutoAssignCtxData {
  pub services: Arc<Services>,
  pub actor: Actor,
  pub shop_id: Uuid,
  pub order_id: Uuid,
  pub order: Option<Order>,
  pub rider_id: Option<Uuid>,
  pub updated: Option<Order>,
}

#[derive(Clone)]
pub struct RequestReturnCtxData {
  pub services: Arc<Services>,
  pub actor: Actor,
  pub order_item_id: Uuid,
  pub reason: String,
  pub item: Option<ItemWithOrder>,
  pub created: Option<ReturnRequest>,
}

#[derive(Clone)]
pub struct ReturnStepCtxData {
  pub services: Arc<Services>,
  pub actor: Actor,
  pub return_id: Uuid,
  pub target: ReturnStatus,
  pub note: Option<String>,
  pub request: Option<ReturnRequest>,
  pub updated: Option<ReturnRequest>,
}

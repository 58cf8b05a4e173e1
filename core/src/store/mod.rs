// grocer/src/store/mod.rs

//! Persistence seam of the lifecycle.
//!
//! Every write method is a single atomic unit: a status change, its side effects
//! (stock restore, rider assignment, cancellation data) and its history row
//! either all land or none do. Status writes are compare-and-swap on the
//! status column, so two racing writers cannot both win.

pub mod memory;

use crate::domain::{
  Actor, GeoPoint, Order, OrderDetails, OrderHistoryEntry, OrderItem, OrderStatus, PaymentMethod, ReturnHistoryEntry,
  ReturnRequest, ReturnStatus, Rider, Role,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use memory::MemoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutLine {
  pub price_option_id: Uuid,
  pub quantity: i32,
}

/// Units across all lines of a checkout.
///
/// Every quantity must be positive and the sum must fit in `i32`, so any
/// per-product subtotal fits as well.
pub fn checkout_quantity(lines: &[CheckoutLine]) -> Result<i32> {
  use crate::error::LifecycleError;

  lines.iter().try_fold(0i32, |total, line| {
    if line.quantity <= 0 {
      return Err(LifecycleError::validation(format!(
        "quantity for price option {} must be positive",
        line.price_option_id
      )));
    }
    total
      .checked_add(line.quantity)
      .ok_or_else(|| LifecycleError::validation("order quantity is too large"))
  })
}

/// Input of `create_order_with_items`. The store resolves the address and
/// price options, snapshots them onto the order and decrements stock.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub customer_id: Uuid,
  pub address_id: Uuid,
  pub lines: Vec<CheckoutLine>,
  pub payment_method: PaymentMethod,
  pub delivery_otp: String,
  pub created_at: DateTime<Utc>,
}

/// Condition on `assigned_rider_id` checked together with the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiderGuard {
  Any,
  Unassigned,
  AssignedTo(Uuid),
}

impl RiderGuard {
  pub fn matches(&self, assigned: Option<Uuid>) -> bool {
    match self {
      RiderGuard::Any => true,
      RiderGuard::Unassigned => assigned.is_none(),
      RiderGuard::AssignedTo(rider_id) => assigned == Some(*rider_id),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancellation {
  pub by: Role,
  pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionEffects {
  pub assign_rider: Option<Uuid>,
  /// With `assign_rider`: refuse with `RiderUnavailable` when the rider
  /// already holds this many active orders. Checked in the same atomic step
  /// as the status write.
  pub rider_capacity: Option<u32>,
  /// Put every line item's quantity back on the shelf.
  pub restore_stock: bool,
  /// Records who cancelled and why, and clears the rider.
  pub cancellation: Option<Cancellation>,
  pub mark_delivered: bool,
}

/// A compare-and-swap on an order's status.
#[derive(Debug, Clone)]
pub struct StatusTransition {
  pub order_id: Uuid,
  pub expected: Vec<OrderStatus>,
  pub rider_guard: RiderGuard,
  pub target: OrderStatus,
  /// Intermediate status recorded in the history ahead of `target`, for
  /// transitions that skip a step (confirm followed by auto-assignment).
  pub passes_through: Option<OrderStatus>,
  pub effects: TransitionEffects,
  pub actor: Actor,
  pub note: Option<String>,
  pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReturnRequest {
  pub order_item_id: Uuid,
  pub order_id: Uuid,
  pub customer_id: Uuid,
  pub shop_id: Uuid,
  pub reason: String,
  pub actor: Actor,
  pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReturnTransition {
  pub return_id: Uuid,
  pub expected: ReturnStatus,
  pub target: ReturnStatus,
  pub actor: Actor,
  pub note: Option<String>,
  pub at: DateTime<Utc>,
}

/// Conjunction of optional constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
  pub customer_id: Option<Uuid>,
  pub shop_id: Option<Uuid>,
  pub rider_id: Option<Uuid>,
  pub status: Option<OrderStatus>,
}

impl OrderFilter {
  pub fn matches(&self, order: &Order) -> bool {
    self.customer_id.map_or(true, |id| order.customer_id == id)
      && self.shop_id.map_or(true, |id| order.shop_id == id)
      && self.rider_id.map_or(true, |id| order.assigned_rider_id == Some(id))
      && self.status.map_or(true, |s| order.status == s)
  }
}

/// Outcome of one delivery-code attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
  Matched,
  /// Wrong code. `attempts` is the failure count including this one.
  Mismatched { attempts: i32 },
  Locked { attempts: i32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemWithOrder {
  pub item: OrderItem,
  pub order: Order,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Fails with `InsufficientStock` (and writes nothing) when any line cannot
  /// be covered.
  async fn create_order_with_items(&self, new_order: NewOrder) -> Result<OrderDetails>;

  async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderDetails>>;

  async fn get_order_item(&self, order_item_id: Uuid) -> Result<Option<ItemWithOrder>>;

  /// Newest first.
  async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>>;

  /// Newest first.
  async fn order_history(&self, order_id: Uuid) -> Result<Vec<OrderHistoryEntry>>;

  /// Applies `transition` if the order is still in one of `expected` and the
  /// rider guard holds. Otherwise reports `NotFound` or `InvalidTransition`
  /// against the status the order is actually in.
  async fn transition_order_status(&self, transition: StatusTransition) -> Result<Order>;

  /// Compares `code` with the order's delivery code and counts a miss, as
  /// one atomic step. Once `max_attempts` misses are on record the code is
  /// no longer compared and the result is `Locked`.
  async fn check_delivery_otp(&self, order_id: Uuid, code: &str, max_attempts: u32) -> Result<OtpCheck>;

  async fn find_available_riders(&self, shop_id: Uuid) -> Result<Vec<Rider>>;

  async fn get_rider(&self, rider_id: Uuid) -> Result<Option<Rider>>;

  async fn count_active_orders_for_rider(&self, rider_id: Uuid) -> Result<u32>;

  async fn set_rider_availability(&self, rider_id: Uuid, available: bool) -> Result<Rider>;

  async fn update_rider_location(&self, rider_id: Uuid, location: GeoPoint, at: DateTime<Utc>) -> Result<Rider>;

  /// Fails with `DuplicateActiveReturn` when the item already has a
  /// non-terminal request.
  async fn create_return_request(&self, request: NewReturnRequest) -> Result<ReturnRequest>;

  async fn get_return_request(&self, return_id: Uuid) -> Result<Option<ReturnRequest>>;

  async fn transition_return_status(&self, transition: ReturnTransition) -> Result<ReturnRequest>;

  /// Newest first, across every request ever made for the item.
  async fn return_history_for_item(&self, order_item_id: Uuid) -> Result<Vec<ReturnHistoryEntry>>;
}

/// Who owns what, as far as the lifecycle cares.
#[async_trait]
pub trait Directory: Send + Sync {
  async fn shop_owned_by(&self, actor_id: Uuid) -> Result<Option<Uuid>>;

  async fn rider_belongs_to_shop(&self, rider_id: Uuid, shop_id: Uuid) -> Result<bool>;
}

/// Error for an order transition whose compare-and-swap matched nothing.
///
/// `current` is the order's `(status, assigned rider)` re-read after the miss.
/// A rider whose guard failed is told the order does not exist.
pub fn rejected_transition(
  transition: &StatusTransition,
  current: Option<(OrderStatus, Option<Uuid>)>,
) -> crate::error::LifecycleError {
  use crate::error::LifecycleError;

  match current {
    None => LifecycleError::not_found("order", transition.order_id),
    Some((_, assigned)) if transition.actor.role == Role::Rider && !transition.rider_guard.matches(assigned) => {
      LifecycleError::not_found("order", transition.order_id)
    }
    Some((status, _)) => LifecycleError::invalid_transition("order", status, transition.target, transition.actor.role),
  }
}

/// Same as `rejected_transition`, for return requests.
pub fn rejected_return_transition(
  transition: &ReturnTransition,
  current: Option<ReturnStatus>,
) -> crate::error::LifecycleError {
  use crate::error::LifecycleError;

  match current {
    None => LifecycleError::not_found("return request", transition.return_id),
    Some(status) => LifecycleError::invalid_transition("return request", status, transition.target, transition.actor.role),
  }
}

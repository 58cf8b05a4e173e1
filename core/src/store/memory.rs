// grocer/src/store/memory.rs

//! In-process store. One mutex around the whole state makes every method a
//! serializable transaction.

use super::{
  checkout_quantity, rejected_return_transition, rejected_transition, Directory, ItemWithOrder, NewOrder,
  NewReturnRequest, OrderFilter, OrderStore, OtpCheck, ReturnTransition, StatusTransition,
};
use crate::domain::{
  AddressSnapshot, GeoPoint, Order, OrderDetails, OrderHistoryEntry, OrderItem, OrderStatus, PriceOption,
  ReturnHistoryEntry, ReturnRequest, ReturnStatus, Rider, ShopProduct,
};
use crate::error::{LifecycleError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{event, Level};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct ShopRecord {
  owner_id: Uuid,
}

#[derive(Debug, Clone)]
struct AddressRecord {
  customer_id: Uuid,
  snapshot: AddressSnapshot,
}

#[derive(Debug, Default)]
struct State {
  shops: HashMap<Uuid, ShopRecord>,
  products: HashMap<Uuid, ShopProduct>,
  price_options: HashMap<Uuid, PriceOption>,
  addresses: HashMap<Uuid, AddressRecord>,
  riders: HashMap<Uuid, Rider>,
  orders: HashMap<Uuid, Order>,
  // Creation order; listing walks it backwards.
  order_ids: Vec<Uuid>,
  items: HashMap<Uuid, OrderItem>,
  items_by_order: HashMap<Uuid, Vec<Uuid>>,
  order_history: Vec<OrderHistoryEntry>,
  returns: HashMap<Uuid, ReturnRequest>,
  return_history: Vec<ReturnHistoryEntry>,
}

impl State {
  fn details(&self, order_id: Uuid) -> Option<OrderDetails> {
    let order = self.orders.get(&order_id)?.clone();
    let items = self
      .items_by_order
      .get(&order_id)
      .map(|ids| ids.iter().filter_map(|id| self.items.get(id).cloned()).collect())
      .unwrap_or_default();
    Some(OrderDetails { order, items })
  }

  fn push_order_history(&mut self, order_id: Uuid, status: OrderStatus, transition: &StatusTransition, note: Option<String>) {
    self.order_history.push(OrderHistoryEntry {
      id: Uuid::new_v4(),
      order_id,
      status,
      actor_id: transition.actor.id,
      actor_role: transition.actor.role,
      note,
      created_at: transition.at,
    });
  }

  /// Active orders held by `rider_id`, not counting `except`.
  fn active_orders_for(&self, rider_id: Uuid, except: Option<Uuid>) -> usize {
    self
      .orders
      .values()
      .filter(|o| Some(o.id) != except && o.assigned_rider_id == Some(rider_id) && o.status.is_rider_active())
      .count()
  }

  fn restore_stock(&mut self, order_id: Uuid) {
    let Some(item_ids) = self.items_by_order.get(&order_id) else {
      return;
    };
    for item_id in item_ids {
      if let Some(item) = self.items.get(item_id) {
        if let Some(product) = self.products.get_mut(&item.shop_product_id) {
          product.stock += item.quantity;
        }
      }
    }
  }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  state: Mutex<State>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_shop(&self, owner_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    self.state.lock().shops.insert(id, ShopRecord { owner_id });
    id
  }

  pub fn add_product(&self, shop_id: Uuid, name: &str, stock: i32, returnable: bool, return_period_days: i32) -> Uuid {
    let id = Uuid::new_v4();
    self.state.lock().products.insert(
      id,
      ShopProduct {
        id,
        shop_id,
        name: name.to_string(),
        stock,
        returnable,
        return_period_days,
      },
    );
    id
  }

  pub fn add_price_option(&self, shop_product_id: Uuid, price_cents: i64, weight: &str, unit: &str) -> Uuid {
    let id = Uuid::new_v4();
    self.state.lock().price_options.insert(
      id,
      PriceOption {
        id,
        shop_product_id,
        price_cents,
        weight: weight.to_string(),
        unit: unit.to_string(),
      },
    );
    id
  }

  pub fn add_address(&self, customer_id: Uuid, snapshot: AddressSnapshot) -> Uuid {
    let id = Uuid::new_v4();
    self
      .state
      .lock()
      .addresses
      .insert(id, AddressRecord { customer_id, snapshot });
    id
  }

  /// Registers a rider whose user id is `rider_id`.
  pub fn add_rider(&self, rider_id: Uuid, shop_id: Uuid, name: &str, available: bool) {
    let suffix = rider_id.simple().to_string();
    self.state.lock().riders.insert(
      rider_id,
      Rider {
        id: rider_id,
        shop_id,
        name: name.to_string(),
        available,
        location: None,
        location_updated_at: None,
        vehicle_number: format!("V-{}", &suffix[..8]),
        license_number: format!("L-{}", &suffix[..8]),
      },
    );
  }

  pub fn product_stock(&self, shop_product_id: Uuid) -> Option<i32> {
    self.state.lock().products.get(&shop_product_id).map(|p| p.stock)
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn create_order_with_items(&self, new_order: NewOrder) -> Result<OrderDetails> {
    let mut state = self.state.lock();

    let address = state
      .addresses
      .get(&new_order.address_id)
      .filter(|a| a.customer_id == new_order.customer_id)
      .map(|a| a.snapshot.clone())
      .ok_or_else(|| LifecycleError::not_found("address", new_order.address_id))?;

    let total_items = checkout_quantity(&new_order.lines)?;

    // Resolve and check everything before touching stock.
    let mut shop_id: Option<Uuid> = None;
    let mut demand: HashMap<Uuid, i32> = HashMap::new();
    let mut resolved = Vec::with_capacity(new_order.lines.len());
    for line in &new_order.lines {
      let option = state
        .price_options
        .get(&line.price_option_id)
        .cloned()
        .ok_or_else(|| LifecycleError::not_found("price option", line.price_option_id))?;
      let product = state
        .products
        .get(&option.shop_product_id)
        .cloned()
        .ok_or_else(|| LifecycleError::not_found("product", option.shop_product_id))?;
      match shop_id {
        None => shop_id = Some(product.shop_id),
        Some(id) if id != product.shop_id => {
          return Err(LifecycleError::validation("all items of an order must come from one shop"));
        }
        Some(_) => {}
      }
      *demand.entry(product.id).or_insert(0) += line.quantity;
      resolved.push((line.quantity, option, product));
    }
    let shop_id = shop_id.ok_or_else(|| LifecycleError::validation("an order needs at least one item"))?;

    for (product_id, quantity) in &demand {
      let in_stock = state.products.get(product_id).map_or(0, |p| p.stock);
      if in_stock < *quantity {
        event!(Level::WARN, %product_id, in_stock, requested = quantity, "Checkout rejected for stock.");
        return Err(LifecycleError::InsufficientStock { product_id: *product_id });
      }
    }
    for (product_id, quantity) in &demand {
      if let Some(product) = state.products.get_mut(product_id) {
        product.stock -= quantity;
      }
    }

    let order_id = Uuid::new_v4();
    let items: Vec<OrderItem> = resolved
      .into_iter()
      .map(|(quantity, option, product)| OrderItem {
        id: Uuid::new_v4(),
        order_id,
        shop_product_id: product.id,
        price_option_id: option.id,
        product_name: product.name,
        quantity,
        unit_price_cents: option.price_cents,
        weight: option.weight,
        unit: option.unit,
        returnable: product.returnable,
        return_period_days: product.return_period_days,
      })
      .collect();

    let order = Order {
      id: order_id,
      customer_id: new_order.customer_id,
      shop_id,
      status: OrderStatus::Pending,
      total_amount_cents: items.iter().map(OrderItem::line_total_cents).sum(),
      total_items,
      payment_method: new_order.payment_method,
      delivery_otp: new_order.delivery_otp,
      otp_failed_attempts: 0,
      delivery_address: address,
      assigned_rider_id: None,
      cancel_reason: None,
      cancelled_by: None,
      created_at: new_order.created_at,
      rider_assigned_at: None,
      delivered_at: None,
      updated_at: new_order.created_at,
    };

    state.orders.insert(order_id, order.clone());
    state.order_ids.push(order_id);
    state
      .items_by_order
      .insert(order_id, items.iter().map(|i| i.id).collect());
    for item in &items {
      state.items.insert(item.id, item.clone());
    }
    state.order_history.push(OrderHistoryEntry {
      id: Uuid::new_v4(),
      order_id,
      status: OrderStatus::Pending,
      actor_id: new_order.customer_id,
      actor_role: crate::domain::Role::Customer,
      note: Some("order placed".to_string()),
      created_at: new_order.created_at,
    });

    Ok(OrderDetails { order, items })
  }

  async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderDetails>> {
    Ok(self.state.lock().details(order_id))
  }

  async fn get_order_item(&self, order_item_id: Uuid) -> Result<Option<ItemWithOrder>> {
    let state = self.state.lock();
    let Some(item) = state.items.get(&order_item_id).cloned() else {
      return Ok(None);
    };
    let order = state
      .orders
      .get(&item.order_id)
      .cloned()
      .ok_or_else(|| LifecycleError::internal("order item without an order"))?;
    Ok(Some(ItemWithOrder { item, order }))
  }

  async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
    let state = self.state.lock();
    Ok(
      state
        .order_ids
        .iter()
        .rev()
        .filter_map(|id| state.orders.get(id))
        .filter(|order| filter.matches(order))
        .cloned()
        .collect(),
    )
  }

  async fn order_history(&self, order_id: Uuid) -> Result<Vec<OrderHistoryEntry>> {
    let state = self.state.lock();
    Ok(
      state
        .order_history
        .iter()
        .rev()
        .filter(|entry| entry.order_id == order_id)
        .cloned()
        .collect(),
    )
  }

  async fn transition_order_status(&self, transition: StatusTransition) -> Result<Order> {
    let mut state = self.state.lock();

    let current = state
      .orders
      .get(&transition.order_id)
      .map(|o| (o.status, o.assigned_rider_id));
    let applies = matches!(
      current,
      Some((status, assigned)) if transition.expected.contains(&status) && transition.rider_guard.matches(assigned)
    );
    if !applies {
      return Err(rejected_transition(&transition, current));
    }

    if let (Some(rider_id), Some(cap)) = (transition.effects.assign_rider, transition.effects.rider_capacity) {
      let held = state.active_orders_for(rider_id, Some(transition.order_id));
      if u32::try_from(held).unwrap_or(u32::MAX) >= cap {
        event!(Level::WARN, %rider_id, held, cap, "Assignment refused at rider capacity.");
        return Err(LifecycleError::RiderUnavailable { rider_id });
      }
    }

    if transition.effects.restore_stock {
      state.restore_stock(transition.order_id);
    }

    let effects = &transition.effects;
    let order = state
      .orders
      .get_mut(&transition.order_id)
      .ok_or_else(|| LifecycleError::not_found("order", transition.order_id))?;
    order.status = transition.target;
    order.updated_at = transition.at;
    if let Some(rider_id) = effects.assign_rider {
      order.assigned_rider_id = Some(rider_id);
      order.rider_assigned_at = Some(transition.at);
    }
    if let Some(cancellation) = &effects.cancellation {
      order.cancelled_by = Some(cancellation.by);
      order.cancel_reason = cancellation.reason.clone();
      order.assigned_rider_id = None;
    }
    if effects.mark_delivered {
      order.delivered_at = Some(transition.at);
    }
    let updated = order.clone();

    if let Some(via) = transition.passes_through {
      state.push_order_history(transition.order_id, via, &transition, None);
    }
    state.push_order_history(transition.order_id, transition.target, &transition, transition.note.clone());

    Ok(updated)
  }

  async fn check_delivery_otp(&self, order_id: Uuid, code: &str, max_attempts: u32) -> Result<OtpCheck> {
    let mut state = self.state.lock();
    let order = state
      .orders
      .get_mut(&order_id)
      .ok_or_else(|| LifecycleError::not_found("order", order_id))?;
    if i64::from(order.otp_failed_attempts) >= i64::from(max_attempts) {
      return Ok(OtpCheck::Locked {
        attempts: order.otp_failed_attempts,
      });
    }
    if order.delivery_otp == code {
      return Ok(OtpCheck::Matched);
    }
    order.otp_failed_attempts += 1;
    Ok(OtpCheck::Mismatched {
      attempts: order.otp_failed_attempts,
    })
  }

  async fn find_available_riders(&self, shop_id: Uuid) -> Result<Vec<Rider>> {
    let state = self.state.lock();
    let mut riders: Vec<Rider> = state
      .riders
      .values()
      .filter(|r| r.shop_id == shop_id && r.available)
      .cloned()
      .collect();
    riders.sort_by_key(|r| r.id);
    Ok(riders)
  }

  async fn get_rider(&self, rider_id: Uuid) -> Result<Option<Rider>> {
    Ok(self.state.lock().riders.get(&rider_id).cloned())
  }

  async fn count_active_orders_for_rider(&self, rider_id: Uuid) -> Result<u32> {
    let count = self.state.lock().active_orders_for(rider_id, None);
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
  }

  async fn set_rider_availability(&self, rider_id: Uuid, available: bool) -> Result<Rider> {
    let mut state = self.state.lock();
    let rider = state
      .riders
      .get_mut(&rider_id)
      .ok_or_else(|| LifecycleError::not_found("rider", rider_id))?;
    rider.available = available;
    Ok(rider.clone())
  }

  async fn update_rider_location(&self, rider_id: Uuid, location: GeoPoint, at: DateTime<Utc>) -> Result<Rider> {
    let mut state = self.state.lock();
    let rider = state
      .riders
      .get_mut(&rider_id)
      .ok_or_else(|| LifecycleError::not_found("rider", rider_id))?;
    rider.location = Some(location);
    rider.location_updated_at = Some(at);
    Ok(rider.clone())
  }

  async fn create_return_request(&self, request: NewReturnRequest) -> Result<ReturnRequest> {
    let mut state = self.state.lock();

    let has_active = state
      .returns
      .values()
      .any(|r| r.order_item_id == request.order_item_id && !r.status.is_terminal());
    if has_active {
      return Err(LifecycleError::DuplicateActiveReturn {
        order_item_id: request.order_item_id,
      });
    }

    let created = ReturnRequest {
      id: Uuid::new_v4(),
      order_item_id: request.order_item_id,
      order_id: request.order_id,
      customer_id: request.customer_id,
      shop_id: request.shop_id,
      status: ReturnStatus::Requested,
      reason: request.reason.clone(),
      created_at: request.at,
      updated_at: request.at,
    };
    state.returns.insert(created.id, created.clone());
    state.return_history.push(ReturnHistoryEntry {
      id: Uuid::new_v4(),
      return_id: created.id,
      order_item_id: created.order_item_id,
      status: ReturnStatus::Requested,
      actor_id: request.actor.id,
      actor_role: request.actor.role,
      note: Some(request.reason),
      created_at: request.at,
    });
    Ok(created)
  }

  async fn get_return_request(&self, return_id: Uuid) -> Result<Option<ReturnRequest>> {
    Ok(self.state.lock().returns.get(&return_id).cloned())
  }

  async fn transition_return_status(&self, transition: ReturnTransition) -> Result<ReturnRequest> {
    let mut state = self.state.lock();
    let current = state.returns.get(&transition.return_id).map(|r| r.status);
    if current != Some(transition.expected) {
      return Err(rejected_return_transition(&transition, current));
    }

    let request = state
      .returns
      .get_mut(&transition.return_id)
      .ok_or_else(|| LifecycleError::not_found("return request", transition.return_id))?;
    request.status = transition.target;
    request.updated_at = transition.at;
    let updated = request.clone();

    state.return_history.push(ReturnHistoryEntry {
      id: Uuid::new_v4(),
      return_id: updated.id,
      order_item_id: updated.order_item_id,
      status: transition.target,
      actor_id: transition.actor.id,
      actor_role: transition.actor.role,
      note: transition.note,
      created_at: transition.at,
    });
    Ok(updated)
  }

  async fn return_history_for_item(&self, order_item_id: Uuid) -> Result<Vec<ReturnHistoryEntry>> {
    let state = self.state.lock();
    Ok(
      state
        .return_history
        .iter()
        .rev()
        .filter(|entry| entry.order_item_id == order_item_id)
        .cloned()
        .collect(),
    )
  }
}

#[async_trait]
impl Directory for MemoryStore {
  async fn shop_owned_by(&self, actor_id: Uuid) -> Result<Option<Uuid>> {
    let state = self.state.lock();
    Ok(
      state
        .shops
        .iter()
        .find(|(_, shop)| shop.owner_id == actor_id)
        .map(|(id, _)| *id),
    )
  }

  async fn rider_belongs_to_shop(&self, rider_id: Uuid, shop_id: Uuid) -> Result<bool> {
    Ok(
      self
        .state
        .lock()
        .riders
        .get(&rider_id)
        .is_some_and(|r| r.shop_id == shop_id),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Actor, PaymentMethod, Role};
  use crate::store::{Cancellation, CheckoutLine, RiderGuard, TransitionEffects};

  fn address() -> AddressSnapshot {
    AddressSnapshot {
      recipient_name: "Asha".into(),
      phone: "555-0100".into(),
      line1: "1 Market St".into(),
      line2: None,
      city: "Springfield".into(),
      postal_code: "11111".into(),
      lat: None,
      lng: None,
    }
  }

  struct Seeded {
    store: MemoryStore,
    customer: Uuid,
    address_id: Uuid,
    product: Uuid,
    option: Uuid,
  }

  fn seeded(stock: i32) -> Seeded {
    let store = MemoryStore::new();
    let customer = Uuid::new_v4();
    let shop = store.add_shop(Uuid::new_v4());
    let product = store.add_product(shop, "Rice", stock, true, 7);
    let option = store.add_price_option(product, 250, "1", "kg");
    let address_id = store.add_address(customer, address());
    Seeded {
      store,
      customer,
      address_id,
      product,
      option,
    }
  }

  fn new_order(s: &Seeded, lines: Vec<CheckoutLine>) -> NewOrder {
    NewOrder {
      customer_id: s.customer,
      address_id: s.address_id,
      lines,
      payment_method: PaymentMethod::CashOnDelivery,
      delivery_otp: "1234".into(),
      created_at: Utc::now(),
    }
  }

  #[tokio::test]
  async fn checkout_decrements_stock_and_snapshots_lines() {
    let s = seeded(10);
    let lines = vec![
      CheckoutLine { price_option_id: s.option, quantity: 3 },
      CheckoutLine { price_option_id: s.option, quantity: 2 },
    ];
    let details = s.store.create_order_with_items(new_order(&s, lines)).await.unwrap();

    assert_eq!(details.items.len(), 2);
    assert_eq!(details.order.total_items, 5);
    assert_eq!(details.order.total_amount_cents, 1250);
    assert_eq!(s.store.product_stock(s.product), Some(5));
    assert_eq!(s.store.order_history(details.order.id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn checkout_short_on_stock_writes_nothing() {
    let s = seeded(4);
    let lines = vec![
      CheckoutLine { price_option_id: s.option, quantity: 3 },
      CheckoutLine { price_option_id: s.option, quantity: 2 },
    ];
    let err = s.store.create_order_with_items(new_order(&s, lines)).await.unwrap_err();

    assert!(matches!(err, LifecycleError::InsufficientStock { product_id } if product_id == s.product));
    assert_eq!(s.store.product_stock(s.product), Some(4));
    assert!(s.store.list_orders(&OrderFilter::default()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn checkout_quantity_overflow_is_a_validation_error() {
    let s = seeded(10);
    let lines = vec![
      CheckoutLine { price_option_id: s.option, quantity: i32::MAX },
      CheckoutLine { price_option_id: s.option, quantity: i32::MAX },
    ];
    let err = s.store.create_order_with_items(new_order(&s, lines)).await.unwrap_err();

    assert!(matches!(err, LifecycleError::Validation(_)));
    assert_eq!(s.store.product_stock(s.product), Some(10));
  }

  #[tokio::test]
  async fn otp_check_counts_misses_and_locks() {
    let s = seeded(5);
    let lines = vec![CheckoutLine { price_option_id: s.option, quantity: 1 }];
    let order = s.store.create_order_with_items(new_order(&s, lines)).await.unwrap().order;

    assert_eq!(
      s.store.check_delivery_otp(order.id, "9999", 2).await.unwrap(),
      OtpCheck::Mismatched { attempts: 1 }
    );
    assert_eq!(s.store.check_delivery_otp(order.id, "1234", 2).await.unwrap(), OtpCheck::Matched);
    assert_eq!(
      s.store.check_delivery_otp(order.id, "9999", 2).await.unwrap(),
      OtpCheck::Mismatched { attempts: 2 }
    );
    assert_eq!(
      s.store.check_delivery_otp(order.id, "1234", 2).await.unwrap(),
      OtpCheck::Locked { attempts: 2 }
    );

    let err = s.store.check_delivery_otp(Uuid::new_v4(), "1234", 2).await.unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound { .. }));
  }

  #[tokio::test]
  async fn cas_miss_reports_current_status() {
    let s = seeded(5);
    let lines = vec![CheckoutLine { price_option_id: s.option, quantity: 1 }];
    let order = s.store.create_order_with_items(new_order(&s, lines)).await.unwrap().order;
    let actor = Actor::customer(s.customer);

    let cancel = StatusTransition {
      order_id: order.id,
      expected: vec![OrderStatus::Pending],
      rider_guard: RiderGuard::Any,
      target: OrderStatus::Cancelled,
      passes_through: None,
      effects: TransitionEffects {
        restore_stock: true,
        cancellation: Some(Cancellation { by: Role::Customer, reason: None }),
        ..Default::default()
      },
      actor,
      note: None,
      at: Utc::now(),
    };
    s.store.transition_order_status(cancel.clone()).await.unwrap();
    assert_eq!(s.store.product_stock(s.product), Some(5));

    let err = s.store.transition_order_status(cancel).await.unwrap_err();
    match err {
      LifecycleError::InvalidTransition { from, .. } => assert_eq!(from, "cancelled"),
      other => panic!("unexpected error: {other:?}"),
    }
    // The failed second attempt must not restore stock twice.
    assert_eq!(s.store.product_stock(s.product), Some(5));
  }

  #[tokio::test]
  async fn assignment_past_rider_capacity_is_refused() {
    let s = seeded(5);
    let rider = Uuid::new_v4();
    let shopkeeper = Actor::shopkeeper(Uuid::new_v4());
    let lines = vec![CheckoutLine { price_option_id: s.option, quantity: 1 }];
    let first = s.store.create_order_with_items(new_order(&s, lines.clone())).await.unwrap().order;
    let second = s.store.create_order_with_items(new_order(&s, lines)).await.unwrap().order;

    let assign = |order_id: Uuid| StatusTransition {
      order_id,
      expected: vec![OrderStatus::Pending],
      rider_guard: RiderGuard::Unassigned,
      target: OrderStatus::Confirmed,
      passes_through: None,
      effects: TransitionEffects {
        assign_rider: Some(rider),
        rider_capacity: Some(1),
        ..Default::default()
      },
      actor: shopkeeper,
      note: None,
      at: Utc::now(),
    };

    s.store.transition_order_status(assign(first.id)).await.unwrap();
    let err = s.store.transition_order_status(assign(second.id)).await.unwrap_err();
    assert!(matches!(err, LifecycleError::RiderUnavailable { rider_id } if rider_id == rider));

    let untouched = s.store.get_order(second.id).await.unwrap().unwrap().order;
    assert_eq!(untouched.status, OrderStatus::Pending);
    assert_eq!(untouched.assigned_rider_id, None);
    assert_eq!(s.store.count_active_orders_for_rider(rider).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn directory_answers_from_seeded_shops_and_riders() {
    let store = MemoryStore::new();
    let owner = Uuid::new_v4();
    let shop = store.add_shop(owner);
    let rider = Uuid::new_v4();
    store.add_rider(rider, shop, "Ravi", true);

    assert_eq!(store.shop_owned_by(owner).await.unwrap(), Some(shop));
    assert_eq!(store.shop_owned_by(Uuid::new_v4()).await.unwrap(), None);
    assert!(store.rider_belongs_to_shop(rider, shop).await.unwrap());
    assert!(!store.rider_belongs_to_shop(rider, Uuid::new_v4()).await.unwrap());
  }
}

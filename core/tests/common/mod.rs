// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every fixture.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use grocer::store::{ItemWithOrder, NewOrder, NewReturnRequest, OrderFilter, ReturnTransition, StatusTransition};
use grocer::{
  Actor, AddressSnapshot, AssignmentPolicy, Checkout, CheckoutLine, GeoPoint, LifecycleConfig, LifecycleManager,
  ManualClock, MemoryStore, Notifier, Order, OrderDetails, OrderHistoryEntry, OrderNotice, OrderStatus, OrderStore,
  OtpCheck, PaymentMethod, ReturnHistoryEntry, ReturnRequest, Rider, Unbounded,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

// --- Notifier that remembers what it was told ---
#[derive(Default)]
pub struct RecordingNotifier {
  notices: Mutex<Vec<OrderNotice>>,
}

impl RecordingNotifier {
  pub fn notices(&self) -> Vec<OrderNotice> {
    self.notices.lock().clone()
  }

  pub fn count_rider_assignments(&self, rider_id: Uuid) -> usize {
    self
      .notices
      .lock()
      .iter()
      .filter(|n| matches!(n, OrderNotice::RiderAssigned { rider_id: r, .. } if *r == rider_id))
      .count()
  }
}

impl Notifier for RecordingNotifier {
  fn notify(&self, notice: OrderNotice) {
    NOTICES_SENT.fetch_add(1, Ordering::SeqCst);
    self.notices.lock().push(notice);
  }
}

/// Process-wide notice counter; tests reading it run `#[serial]`.
pub static NOTICES_SENT: Lazy<AtomicUsize> = Lazy::new(|| AtomicUsize::new(0));

// --- Store whose order reads lag behind ---
/// Memory store whose order reads lag, so concurrent callers all act on the
/// same stale snapshot.
struct SlowReads(Arc<MemoryStore>);

#[async_trait]
impl OrderStore for SlowReads {
  async fn create_order_with_items(&self, new_order: NewOrder) -> grocer::Result<OrderDetails> {
    self.0.create_order_with_items(new_order).await
  }

  async fn get_order(&self, order_id: Uuid) -> grocer::Result<Option<OrderDetails>> {
    let details = self.0.get_order(order_id).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    details
  }

  async fn get_order_item(&self, order_item_id: Uuid) -> grocer::Result<Option<ItemWithOrder>> {
    self.0.get_order_item(order_item_id).await
  }

  async fn list_orders(&self, filter: &OrderFilter) -> grocer::Result<Vec<Order>> {
    self.0.list_orders(filter).await
  }

  async fn order_history(&self, order_id: Uuid) -> grocer::Result<Vec<OrderHistoryEntry>> {
    self.0.order_history(order_id).await
  }

  async fn transition_order_status(&self, transition: StatusTransition) -> grocer::Result<Order> {
    self.0.transition_order_status(transition).await
  }

  async fn check_delivery_otp(&self, order_id: Uuid, code: &str, max_attempts: u32) -> grocer::Result<OtpCheck> {
    self.0.check_delivery_otp(order_id, code, max_attempts).await
  }

  async fn find_available_riders(&self, shop_id: Uuid) -> grocer::Result<Vec<Rider>> {
    self.0.find_available_riders(shop_id).await
  }

  async fn get_rider(&self, rider_id: Uuid) -> grocer::Result<Option<Rider>> {
    self.0.get_rider(rider_id).await
  }

  async fn count_active_orders_for_rider(&self, rider_id: Uuid) -> grocer::Result<u32> {
    self.0.count_active_orders_for_rider(rider_id).await
  }

  async fn set_rider_availability(&self, rider_id: Uuid, available: bool) -> grocer::Result<Rider> {
    self.0.set_rider_availability(rider_id, available).await
  }

  async fn update_rider_location(&self, rider_id: Uuid, location: GeoPoint, at: DateTime<Utc>) -> grocer::Result<Rider> {
    self.0.update_rider_location(rider_id, location, at).await
  }

  async fn create_return_request(&self, request: NewReturnRequest) -> grocer::Result<ReturnRequest> {
    self.0.create_return_request(request).await
  }

  async fn get_return_request(&self, return_id: Uuid) -> grocer::Result<Option<ReturnRequest>> {
    self.0.get_return_request(return_id).await
  }

  async fn transition_return_status(&self, transition: ReturnTransition) -> grocer::Result<ReturnRequest> {
    self.0.transition_return_status(transition).await
  }

  async fn return_history_for_item(&self, order_item_id: Uuid) -> grocer::Result<Vec<ReturnHistoryEntry>> {
    self.0.return_history_for_item(order_item_id).await
  }
}

#[derive(Debug, Clone, Copy)]
pub struct Listing {
  pub product_id: Uuid,
  pub option_id: Uuid,
}

/// A shop, its owner, a customer with an address, and a fully wired manager
/// over `MemoryStore`.
pub struct Marketplace {
  pub store: Arc<MemoryStore>,
  pub clock: Arc<ManualClock>,
  pub notifier: Arc<RecordingNotifier>,
  pub manager: LifecycleManager,
  pub customer: Actor,
  pub other_customer: Actor,
  pub shopkeeper: Actor,
  pub other_shopkeeper: Actor,
  pub admin: Actor,
  pub shop_id: Uuid,
  pub other_shop_id: Uuid,
  pub address_id: Uuid,
  /// Returnable within 7 days, 10 in stock, 250 cents per kg.
  pub rice: Listing,
  /// Not returnable, 20 in stock.
  pub milk: Listing,
}

pub fn address() -> AddressSnapshot {
  AddressSnapshot {
    recipient_name: "Asha Rao".into(),
    phone: "555-0100".into(),
    line1: "12 Market Road".into(),
    line2: Some("Flat 3".into()),
    city: "Pune".into(),
    postal_code: "411001".into(),
    lat: Some(18.52),
    lng: Some(73.85),
  }
}

impl Marketplace {
  pub fn new() -> Self {
    Self::with(LifecycleConfig::default(), Arc::new(Unbounded))
  }

  pub fn with(config: LifecycleConfig, policy: Arc<dyn AssignmentPolicy>) -> Self {
    setup_tracing();
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()));
    let notifier = Arc::new(RecordingNotifier::default());

    let shopkeeper = Actor::shopkeeper(Uuid::new_v4());
    let other_shopkeeper = Actor::shopkeeper(Uuid::new_v4());
    let customer = Actor::customer(Uuid::new_v4());
    let shop_id = store.add_shop(shopkeeper.id);
    let other_shop_id = store.add_shop(other_shopkeeper.id);
    let address_id = store.add_address(customer.id, address());

    let rice_id = store.add_product(shop_id, "Basmati Rice", 10, true, 7);
    let rice = Listing {
      product_id: rice_id,
      option_id: store.add_price_option(rice_id, 250, "1", "kg"),
    };
    let milk_id = store.add_product(shop_id, "Milk", 20, false, 0);
    let milk = Listing {
      product_id: milk_id,
      option_id: store.add_price_option(milk_id, 60, "500", "ml"),
    };

    let manager = LifecycleManager::builder(store.clone(), store.clone())
      .clock(clock.clone())
      .notifier(notifier.clone())
      .policy(policy)
      .config(config)
      .build();

    Self {
      store,
      clock,
      notifier,
      manager,
      customer,
      other_customer: Actor::customer(Uuid::new_v4()),
      shopkeeper,
      other_shopkeeper,
      admin: Actor::admin(Uuid::new_v4()),
      shop_id,
      other_shop_id,
      address_id,
      rice,
      milk,
    }
  }

  /// A second manager over the same store, with order reads delayed so
  /// concurrent calls all start from one stale snapshot.
  pub fn slow_reads_manager(&self, config: LifecycleConfig, policy: Arc<dyn AssignmentPolicy>) -> LifecycleManager {
    LifecycleManager::builder(Arc::new(SlowReads(self.store.clone())), self.store.clone())
      .clock(self.clock.clone())
      .notifier(self.notifier.clone())
      .policy(policy)
      .config(config)
      .build()
  }

  pub fn add_rider(&self, available: bool) -> Actor {
    let rider = Actor::rider(Uuid::new_v4());
    self.store.add_rider(rider.id, self.shop_id, "Ravi", available);
    rider
  }

  pub fn add_foreign_rider(&self) -> Actor {
    let rider = Actor::rider(Uuid::new_v4());
    self.store.add_rider(rider.id, self.other_shop_id, "Sam", true);
    rider
  }

  pub fn stock(&self, listing: Listing) -> i32 {
    self.store.product_stock(listing.product_id).unwrap_or(-1)
  }

  pub fn checkout(&self, lines: &[(Listing, i32)]) -> Checkout {
    Checkout {
      address_id: self.address_id,
      lines: lines
        .iter()
        .map(|(listing, quantity)| CheckoutLine {
          price_option_id: listing.option_id,
          quantity: *quantity,
        })
        .collect(),
      payment_method: PaymentMethod::CashOnDelivery,
    }
  }

  pub async fn place_order(&self, lines: &[(Listing, i32)]) -> Order {
    self
      .manager
      .create_order(self.customer, self.checkout(lines))
      .await
      .expect("order placement")
      .order
  }

  /// Current state of an order, read as admin.
  pub async fn order(&self, order_id: Uuid) -> Order {
    self.manager.get_order(self.admin, order_id).await.expect("order read").order
  }

  /// Builds an order in `status` through real operations. Returns the rider
  /// assigned to it, if any. No rider of the shop is available afterwards.
  pub async fn drive_to(&self, status: OrderStatus) -> (Order, Option<Actor>) {
    let order = self.place_order(&[(self.rice, 2)]).await;
    let m = &self.manager;
    match status {
      OrderStatus::Pending => (order, None),
      OrderStatus::Preparing | OrderStatus::Ready => {
        let order = m.update_preparation(self.shopkeeper, order.id, status).await.expect("prepare");
        if status == OrderStatus::Ready {
          let rider = self.add_rider(false);
          let order = m.assign_rider(self.shopkeeper, order.id, rider.id).await.expect("assign");
          (order, Some(rider))
        } else {
          (order, None)
        }
      }
      OrderStatus::Confirmed | OrderStatus::Shipped | OrderStatus::Delivered => {
        let rider = self.add_rider(false);
        m.confirm_order(self.shopkeeper, order.id).await.expect("confirm");
        let mut order = m.assign_rider(self.shopkeeper, order.id, rider.id).await.expect("assign");
        if status != OrderStatus::Confirmed {
          order = m.ship_order(rider, order.id).await.expect("ship");
        }
        if status == OrderStatus::Delivered {
          order = m.mark_delivered(rider, order.id, &order.delivery_otp).await.expect("deliver");
        }
        (order, Some(rider))
      }
      OrderStatus::Cancelled => {
        let order = m.customer_cancel_order(self.customer, order.id, None).await.expect("cancel");
        (order, None)
      }
    }
  }

  pub async fn delivered_order_with(&self, lines: &[(Listing, i32)]) -> (Order, Actor) {
    let order = self.place_order(lines).await;
    let rider = self.add_rider(false);
    let m = &self.manager;
    m.confirm_order(self.shopkeeper, order.id).await.expect("confirm");
    m.assign_rider(self.shopkeeper, order.id, rider.id).await.expect("assign");
    let order = m.ship_order(rider, order.id).await.expect("ship");
    let order = m.mark_delivered(rider, order.id, &order.delivery_otp).await.expect("deliver");
    (order, rider)
  }
}

pub fn wrong_otp(right: &str) -> String {
  let value: u32 = right.parse().unwrap_or(0);
  format!("{:04}", (value + 1) % 10_000)
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

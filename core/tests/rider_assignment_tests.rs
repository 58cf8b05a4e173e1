// tests/rider_assignment_tests.rs
mod common;

use common::*;
use grocer::{
  ErrorKind, GeoPoint, LifecycleConfig, LifecycleError, MaxActiveOrders, OrderNotice, OrderStatus, Unbounded,
};
use serial_test::serial;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn test_confirm_without_riders_stays_confirmed() {
  let m = Marketplace::new();
  let order = m.place_order(&[(m.rice, 1)]).await;

  let confirmed = m.manager.confirm_order(m.shopkeeper, order.id).await.unwrap();
  assert_eq!(confirmed.status, OrderStatus::Confirmed);
  assert_eq!(confirmed.assigned_rider_id, None);
}

#[tokio::test]
#[serial]
async fn test_confirm_with_exactly_one_available_rider_ships() {
  let m = Marketplace::new();
  let rider = m.add_rider(true);
  m.add_rider(false);
  let order = m.place_order(&[(m.rice, 1)]).await;

  let shipped = m.manager.confirm_order(m.shopkeeper, order.id).await.unwrap();
  assert_eq!(shipped.status, OrderStatus::Shipped);
  assert_eq!(shipped.assigned_rider_id, Some(rider.id));
  assert!(shipped.rider_assigned_at.is_some());
  assert_eq!(m.notifier.count_rider_assignments(rider.id), 1);

  let history = m.manager.order_history(m.shopkeeper, order.id).await.unwrap();
  let statuses: Vec<_> = history.iter().map(|h| h.status).collect();
  assert_eq!(statuses, vec![OrderStatus::Shipped, OrderStatus::Confirmed, OrderStatus::Pending]);
}

#[tokio::test]
#[serial]
async fn test_confirm_with_two_available_riders_stays_confirmed() {
  let m = Marketplace::new();
  m.add_rider(true);
  m.add_rider(true);
  let order = m.place_order(&[(m.rice, 1)]).await;

  let confirmed = m.manager.confirm_order(m.shopkeeper, order.id).await.unwrap();
  assert_eq!(confirmed.status, OrderStatus::Confirmed);
  assert_eq!(confirmed.assigned_rider_id, None);
}

#[tokio::test]
#[serial]
async fn test_riders_of_other_shops_do_not_count() {
  let m = Marketplace::new();
  let rider = m.add_rider(true);
  m.add_foreign_rider();
  let order = m.place_order(&[(m.rice, 1)]).await;

  let shipped = m.manager.confirm_order(m.shopkeeper, order.id).await.unwrap();
  assert_eq!(shipped.assigned_rider_id, Some(rider.id));
}

#[tokio::test]
#[serial]
async fn test_capacity_policy_blocks_auto_assignment() {
  let m = Marketplace::with(LifecycleConfig::default(), Arc::new(MaxActiveOrders(1)));
  let rider = m.add_rider(true);

  let first = m.place_order(&[(m.rice, 1)]).await;
  let first = m.manager.confirm_order(m.shopkeeper, first.id).await.unwrap();
  assert_eq!(first.assigned_rider_id, Some(rider.id));

  let second = m.place_order(&[(m.rice, 1)]).await;
  let second = m.manager.confirm_order(m.shopkeeper, second.id).await.unwrap();
  assert_eq!(second.status, OrderStatus::Confirmed);
  assert_eq!(second.assigned_rider_id, None);

  let err = m.manager.assign_rider(m.shopkeeper, second.id, rider.id).await.unwrap_err();
  assert!(matches!(err, LifecycleError::RiderUnavailable { rider_id } if rider_id == rider.id));
}

#[tokio::test]
#[serial]
async fn test_manual_assignment_confirms_pending_orders() {
  let m = Marketplace::new();
  let rider = m.add_rider(false);
  let order = m.place_order(&[(m.rice, 1)]).await;

  let assigned = m.manager.assign_rider(m.shopkeeper, order.id, rider.id).await.unwrap();
  assert_eq!(assigned.status, OrderStatus::Confirmed);
  assert_eq!(assigned.assigned_rider_id, Some(rider.id));

  let shipped = m.manager.ship_order(rider, order.id).await.unwrap();
  assert_eq!(shipped.status, OrderStatus::Shipped);
}

#[tokio::test]
#[serial]
async fn test_manual_assignment_rules() {
  let m = Marketplace::new();
  let rider = m.add_rider(false);
  let foreign = m.add_foreign_rider();
  let order = m.place_order(&[(m.rice, 1)]).await;

  let err = m.manager.assign_rider(m.shopkeeper, order.id, foreign.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound, "rider of another shop");

  let err = m.manager.assign_rider(m.other_shopkeeper, order.id, foreign.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound, "order of another shop");

  let err = m.manager.assign_rider(m.customer, order.id, rider.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidTransition, "customers cannot assign");

  m.manager.assign_rider(m.shopkeeper, order.id, rider.id).await.unwrap();
  let second = m.add_rider(false);
  let err = m.manager.assign_rider(m.shopkeeper, order.id, second.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidTransition, "already assigned");

  let (shipped, _) = m.drive_to(OrderStatus::Shipped).await;
  let err = m.manager.assign_rider(m.shopkeeper, shipped.id, second.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidTransition, "too late to assign");
}

#[tokio::test]
#[serial]
async fn test_reassignment_when_enabled() {
  let config = LifecycleConfig {
    allow_reassignment: true,
    ..Default::default()
  };
  let m = Marketplace::with(config, Arc::new(Unbounded));
  let (order, first) = m.drive_to(OrderStatus::Confirmed).await;
  let second = m.add_rider(false);

  let reassigned = m.manager.assign_rider(m.shopkeeper, order.id, second.id).await.unwrap();
  assert_eq!(reassigned.status, OrderStatus::Confirmed);
  assert_eq!(reassigned.assigned_rider_id, Some(second.id));

  let err = m.manager.ship_order(first.unwrap(), order.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[serial]
async fn test_auto_assign_picks_up_waiting_orders() {
  let m = Marketplace::new();
  let order = m.place_order(&[(m.rice, 1)]).await;
  m.manager.confirm_order(m.shopkeeper, order.id).await.unwrap();

  let unchanged = m
    .manager
    .auto_assign_if_single_rider(m.shopkeeper, m.shop_id, order.id)
    .await
    .unwrap();
  assert_eq!(unchanged.status, OrderStatus::Confirmed);

  let rider = m.add_rider(false);
  m.manager.set_rider_availability(rider, true).await.unwrap();
  let shipped = m
    .manager
    .auto_assign_if_single_rider(m.shopkeeper, m.shop_id, order.id)
    .await
    .unwrap();
  assert_eq!(shipped.status, OrderStatus::Shipped);
  assert_eq!(shipped.assigned_rider_id, Some(rider.id));

  let err = m
    .manager
    .auto_assign_if_single_rider(m.shopkeeper, m.other_shop_id, order.id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[serial]
async fn test_rider_availability_and_location() {
  let m = Marketplace::new();
  let rider = m.add_rider(false);

  let updated = m.manager.set_rider_availability(rider, true).await.unwrap();
  assert!(updated.available);

  let at = GeoPoint { lat: 18.5, lng: 73.8 };
  let moved = m.manager.update_rider_location(rider, at).await.unwrap();
  assert_eq!(moved.location, Some(at));
  assert!(moved.location_updated_at.is_some());

  let bad = GeoPoint { lat: 91.0, lng: 0.0 };
  let err = m.manager.update_rider_location(rider, bad).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ValidationError);
  let bad = GeoPoint { lat: 0.0, lng: -180.5 };
  let err = m.manager.update_rider_location(rider, bad).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ValidationError);

  let err = m.manager.set_rider_availability(m.customer, true).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[serial]
async fn test_notifications_follow_each_change() {
  NOTICES_SENT.store(0, Ordering::SeqCst);
  let m = Marketplace::new();
  let order = m.place_order(&[(m.rice, 1)]).await;
  m.manager.customer_cancel_order(m.customer, order.id, None).await.unwrap();

  let notices = m.notifier.notices();
  assert_eq!(NOTICES_SENT.load(Ordering::SeqCst), 2);
  assert!(matches!(notices[0], OrderNotice::OrderPlaced { order_id, .. } if order_id == order.id));
  assert!(matches!(
    notices[1],
    OrderNotice::OrderStatusChanged { status: OrderStatus::Cancelled, .. }
  ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_manual_assignments_respect_the_cap() {
  let m = Marketplace::with(LifecycleConfig::default(), Arc::new(MaxActiveOrders(1)));
  let rider = m.add_rider(false);
  let first = m.place_order(&[(m.rice, 1)]).await;
  let second = m.place_order(&[(m.rice, 1)]).await;
  m.manager.confirm_order(m.shopkeeper, first.id).await.unwrap();
  m.manager.confirm_order(m.shopkeeper, second.id).await.unwrap();

  let manager = m.slow_reads_manager(LifecycleConfig::default(), Arc::new(MaxActiveOrders(1)));
  let mut tasks = Vec::new();
  for order_id in [first.id, second.id] {
    let manager = manager.clone();
    let shopkeeper = m.shopkeeper;
    tasks.push(tokio::spawn(async move {
      manager.assign_rider(shopkeeper, order_id, rider.id).await
    }));
  }

  let mut assigned = 0;
  for task in tasks {
    match task.await.unwrap() {
      Ok(order) => {
        assert_eq!(order.assigned_rider_id, Some(rider.id));
        assigned += 1;
      }
      Err(err) => assert!(matches!(err, LifecycleError::RiderUnavailable { rider_id } if rider_id == rider.id)),
    }
  }
  assert_eq!(assigned, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_racing_confirmations_hand_a_capped_rider_one_order() {
  let m = Marketplace::with(LifecycleConfig::default(), Arc::new(MaxActiveOrders(1)));
  let rider = m.add_rider(true);
  let first = m.place_order(&[(m.rice, 1)]).await;
  let second = m.place_order(&[(m.rice, 1)]).await;

  let manager = m.slow_reads_manager(LifecycleConfig::default(), Arc::new(MaxActiveOrders(1)));
  let mut tasks = Vec::new();
  for order_id in [first.id, second.id] {
    let manager = manager.clone();
    let shopkeeper = m.shopkeeper;
    tasks.push(tokio::spawn(async move { manager.confirm_order(shopkeeper, order_id).await }));
  }

  let mut statuses = Vec::new();
  for task in tasks {
    let order = task.await.unwrap().unwrap();
    match order.status {
      OrderStatus::Shipped => assert_eq!(order.assigned_rider_id, Some(rider.id)),
      OrderStatus::Confirmed => assert_eq!(order.assigned_rider_id, None),
      other => panic!("unexpected status {other}"),
    }
    statuses.push(order.status);
  }
  statuses.sort_by_key(|s| s.as_str());
  assert_eq!(statuses, vec![OrderStatus::Confirmed, OrderStatus::Shipped]);
}

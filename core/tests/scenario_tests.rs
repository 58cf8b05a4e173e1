// tests/scenario_tests.rs
mod common;

use common::*;
use grocer::{ErrorKind, LifecycleError, OrderStatus, Role};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_customer_cancel_then_shop_confirm() {
  let m = Marketplace::new();
  assert_eq!(m.stock(m.rice), 10);

  let o1 = m.place_order(&[(m.rice, 3)]).await;
  assert_eq!(m.stock(m.rice), 7);

  let cancelled = m.manager.customer_cancel_order(m.customer, o1.id, None).await.unwrap();
  assert_eq!(cancelled.status, OrderStatus::Cancelled);
  assert_eq!(cancelled.cancelled_by, Some(Role::Customer));
  assert_eq!(m.stock(m.rice), 10);

  let err = m.manager.confirm_order(m.shopkeeper, o1.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidTransition);
  assert!(matches!(
    err,
    LifecycleError::InvalidTransition { ref from, ref to, role: Role::Shopkeeper, .. }
      if from == "cancelled" && to == "confirmed"
  ));
  assert_eq!(m.stock(m.rice), 10);
}

#[tokio::test]
#[serial]
async fn test_happy_path_from_checkout_to_refund() {
  let m = Marketplace::new();
  let rider = m.add_rider(true);

  let order = m.place_order(&[(m.rice, 2)]).await;
  let order = m.manager.confirm_order(m.shopkeeper, order.id).await.unwrap();
  assert_eq!(order.status, OrderStatus::Shipped);

  let order = m.manager.mark_delivered(rider, order.id, &order.delivery_otp).await.unwrap();
  assert_eq!(order.status, OrderStatus::Delivered);

  let item = m.manager.get_order(m.customer, order.id).await.unwrap().items[0].id;
  let request = m.manager.request_return(m.customer, item, "grains were wet").await.unwrap();
  m.manager
    .process_return(m.shopkeeper, request.id, grocer::ReturnDecision::Approve, None)
    .await
    .unwrap();
  m.manager.mark_return_picked_up(m.shopkeeper, request.id).await.unwrap();
  m.manager.mark_return_received(m.shopkeeper, request.id).await.unwrap();
  let refunded = m.manager.mark_refunded(m.shopkeeper, request.id).await.unwrap();
  assert_eq!(refunded.status, grocer::ReturnStatus::Refunded);

  // Returns never touch the order or the shelf.
  assert_eq!(m.order(order.id).await.status, OrderStatus::Delivered);
  assert_eq!(m.stock(m.rice), 8);
}

// tests/delivery_otp_tests.rs
mod common;

use common::*;
use grocer::{Clock, ErrorKind, LifecycleConfig, LifecycleError, OrderStatus, Unbounded};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn test_wrong_code_leaves_order_shipped_and_counts() {
  let m = Marketplace::new();
  let (order, rider) = m.drive_to(OrderStatus::Shipped).await;
  let rider = rider.unwrap();

  let err = m
    .manager
    .mark_delivered(rider, order.id, &wrong_otp(&order.delivery_otp))
    .await
    .unwrap_err();
  assert!(matches!(err, LifecycleError::InvalidOtp));

  let after = m.order(order.id).await;
  assert_eq!(after.status, OrderStatus::Shipped);
  assert_eq!(after.delivered_at, None);
  assert_eq!(after.otp_failed_attempts, 1);
}

#[tokio::test]
#[serial]
async fn test_right_code_delivers_and_stamps_time() {
  let m = Marketplace::new();
  let (order, rider) = m.drive_to(OrderStatus::Shipped).await;

  let delivered = m
    .manager
    .mark_delivered(rider.unwrap(), order.id, &order.delivery_otp)
    .await
    .unwrap();
  assert_eq!(delivered.status, OrderStatus::Delivered);
  assert_eq!(delivered.delivered_at, Some(m.clock.now()));
  assert_eq!(delivered.delivery_otp, order.delivery_otp, "code never changes");
}

#[tokio::test]
#[serial]
async fn test_malformed_code_is_a_validation_error_and_not_counted() {
  let m = Marketplace::new();
  let (order, rider) = m.drive_to(OrderStatus::Shipped).await;

  for code in ["", "12", "12345", "abcd"] {
    let err = m.manager.mark_delivered(rider.unwrap(), order.id, code).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError, "code {code:?}");
  }
  assert_eq!(m.order(order.id).await.otp_failed_attempts, 0);
}

#[tokio::test]
#[serial]
async fn test_repeated_failures_lock_delivery() {
  let config = LifecycleConfig {
    max_otp_attempts: 3,
    ..Default::default()
  };
  let m = Marketplace::with(config, Arc::new(Unbounded));
  let (order, rider) = m.drive_to(OrderStatus::Shipped).await;
  let rider = rider.unwrap();
  let wrong = wrong_otp(&order.delivery_otp);

  for _ in 0..3 {
    let err = m.manager.mark_delivered(rider, order.id, &wrong).await.unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidOtp));
  }

  // Even the right code is refused once locked.
  let err = m
    .manager
    .mark_delivered(rider, order.id, &order.delivery_otp)
    .await
    .unwrap_err();
  assert!(matches!(err, LifecycleError::OtpAttemptsExceeded { order_id } if order_id == order.id));

  let after = m.order(order.id).await;
  assert_eq!(after.status, OrderStatus::Shipped);
  assert_eq!(after.otp_failed_attempts, 3);
}

#[tokio::test]
#[serial]
async fn test_only_the_assigned_rider_can_deliver() {
  let m = Marketplace::new();
  let (order, _) = m.drive_to(OrderStatus::Shipped).await;
  let stranger = m.add_rider(true);

  let err = m
    .manager
    .mark_delivered(stranger, order.id, &order.delivery_otp)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let err = m
    .manager
    .mark_delivered(m.customer, order.id, &order.delivery_otp)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidTransition);
  assert_eq!(m.order(order.id).await.status, OrderStatus::Shipped);
}

#[tokio::test]
#[serial]
async fn test_code_is_not_checked_before_shipping() {
  let m = Marketplace::new();
  let (order, rider) = m.drive_to(OrderStatus::Confirmed).await;

  let err = m
    .manager
    .mark_delivered(rider.unwrap(), order.id, &order.delivery_otp)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidTransition);
  assert_eq!(m.order(order.id).await.otp_failed_attempts, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_wrong_codes_cannot_outrun_the_lockout() {
  let config = LifecycleConfig {
    max_otp_attempts: 5,
    ..Default::default()
  };
  let m = Marketplace::with(config.clone(), Arc::new(Unbounded));
  let (order, rider) = m.drive_to(OrderStatus::Shipped).await;
  let rider = rider.unwrap();
  let order_id = order.id;
  let wrong = wrong_otp(&order.delivery_otp);

  let manager = m.slow_reads_manager(config, Arc::new(Unbounded));

  let mut tasks = Vec::new();
  for _ in 0..50 {
    let manager = manager.clone();
    let code = wrong.clone();
    tasks.push(tokio::spawn(async move { manager.mark_delivered(rider, order_id, &code).await }));
  }

  let mut mismatched = 0;
  let mut locked = 0;
  for task in tasks {
    match task.await.unwrap() {
      Err(LifecycleError::InvalidOtp) => mismatched += 1,
      Err(LifecycleError::OtpAttemptsExceeded { .. }) => locked += 1,
      other => panic!("unexpected outcome: {other:?}"),
    }
  }
  assert_eq!(mismatched, 5, "only the allowed attempts compare a code");
  assert_eq!(locked, 45);

  let after = m.order(order_id).await;
  assert_eq!(after.otp_failed_attempts, 5);
  assert_eq!(after.status, OrderStatus::Shipped);
}

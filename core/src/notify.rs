// grocer/src/notify.rs

//! Fire-and-forget notifications about order and return events.

use crate::domain::{OrderStatus, ReturnStatus};
use tracing::{event, Level};
use uuid::Uuid;

/// What happened, addressed to whoever cares about it.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderNotice {
  OrderPlaced {
    order_id: Uuid,
    shop_id: Uuid,
    customer_id: Uuid,
  },
  OrderStatusChanged {
    order_id: Uuid,
    customer_id: Uuid,
    status: OrderStatus,
  },
  RiderAssigned {
    order_id: Uuid,
    rider_id: Uuid,
  },
  ReturnStatusChanged {
    return_id: Uuid,
    customer_id: Uuid,
    status: ReturnStatus,
  },
}

impl OrderNotice {
  pub fn label(&self) -> &'static str {
    match self {
      OrderNotice::OrderPlaced { .. } => "order_placed",
      OrderNotice::OrderStatusChanged { .. } => "order_status_changed",
      OrderNotice::RiderAssigned { .. } => "rider_assigned",
      OrderNotice::ReturnStatusChanged { .. } => "return_status_changed",
    }
  }
}

/// Delivery channel for notices. Implementations must not block or fail the
/// caller: a notice that cannot be delivered is dropped.
pub trait Notifier: Send + Sync {
  fn notify(&self, notice: OrderNotice);
}

/// Writes every notice to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn notify(&self, notice: OrderNotice) {
    event!(Level::INFO, notice = notice.label(), details = ?notice, "Notification dispatched.");
  }
}

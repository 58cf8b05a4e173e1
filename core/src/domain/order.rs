// grocer/src/domain/order.rs

use super::actor::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Preparing,
  Ready,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 7] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Preparing => "preparing",
      OrderStatus::Ready => "ready",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
  }

  /// Statuses in which a rider is working the order.
  pub fn is_rider_active(self) -> bool {
    matches!(self, OrderStatus::Confirmed | OrderStatus::Ready | OrderStatus::Shipped)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| format!("unknown order status '{}'", s))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
  CashOnDelivery,
  Online,
}

impl PaymentMethod {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentMethod::CashOnDelivery => "cash_on_delivery",
      PaymentMethod::Online => "online",
    }
  }
}

impl FromStr for PaymentMethod {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "cash_on_delivery" | "cod" => Ok(PaymentMethod::CashOnDelivery),
      "online" => Ok(PaymentMethod::Online),
      other => Err(format!("unknown payment method '{}'", other)),
    }
  }
}

/// Copy of the customer's address taken at checkout. Later edits to the
/// address book do not touch placed orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSnapshot {
  pub recipient_name: String,
  pub phone: String,
  pub line1: String,
  pub line2: Option<String>,
  pub city: String,
  pub postal_code: String,
  pub lat: Option<f64>,
  pub lng: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub customer_id: Uuid,
  pub shop_id: Uuid,
  pub status: OrderStatus,
  pub total_amount_cents: i64,
  pub total_items: i32,
  pub payment_method: PaymentMethod,
  pub delivery_otp: String,
  pub otp_failed_attempts: i32,
  pub delivery_address: AddressSnapshot,
  pub assigned_rider_id: Option<Uuid>,
  pub cancel_reason: Option<String>,
  pub cancelled_by: Option<Role>,
  pub created_at: DateTime<Utc>,
  pub rider_assigned_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn is_assigned_to(&self, rider_id: Uuid) -> bool {
    self.assigned_rider_id == Some(rider_id)
  }
}

/// Line item snapshot. Never edited after checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub shop_product_id: Uuid,
  pub price_option_id: Uuid,
  pub product_name: String,
  pub quantity: i32,
  pub unit_price_cents: i64,
  pub weight: String,
  pub unit: String,
  pub returnable: bool,
  pub return_period_days: i32,
}

impl OrderItem {
  pub fn line_total_cents(&self) -> i64 {
    self.unit_price_cents * i64::from(self.quantity)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
  pub order: Order,
  pub items: Vec<OrderItem>,
}

/// One row of an order's append-only audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHistoryEntry {
  pub id: Uuid,
  pub order_id: Uuid,
  pub status: OrderStatus,
  pub actor_id: Uuid,
  pub actor_role: Role,
  pub note: Option<String>,
  pub created_at: DateTime<Utc>,
}

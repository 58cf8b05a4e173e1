// grocer_server/src/db/rows.rs

//! Row shapes as they come out of PostgreSQL, and their conversion into
//! domain types. Enum columns are TEXT, so conversion can fail on a value the
//! CHECK constraints should never have let in.

use chrono::{DateTime, Utc};
use grocer::{
  AddressSnapshot, GeoPoint, LifecycleError, Order, OrderHistoryEntry, OrderItem, ReturnHistoryEntry, ReturnRequest,
  Rider,
};
use sqlx::types::Json;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

pub const ORDER_COLUMNS: &str = "id, customer_id, shop_id, status, total_amount_cents, total_items, payment_method, \
   delivery_otp, otp_failed_attempts, delivery_address, assigned_rider_id, cancel_reason, cancelled_by, created_at, \
   rider_assigned_at, delivered_at, updated_at";

pub const ORDER_ITEM_COLUMNS: &str = "id, order_id, shop_product_id, price_option_id, product_name, quantity, \
   unit_price_cents, weight, unit, returnable, return_period_days";

pub const RIDER_COLUMNS: &str =
  "id, shop_id, name, available, lat, lng, location_updated_at, vehicle_number, license_number";

pub const RETURN_COLUMNS: &str =
  "id, order_item_id, order_id, customer_id, shop_id, status, reason, created_at, updated_at";

fn parse_column<T>(column: &'static str, raw: &str) -> Result<T, LifecycleError>
where
  T: FromStr<Err = String>,
{
  raw
    .parse::<T>()
    .map_err(|e| LifecycleError::store(anyhow::anyhow!("corrupt {} column: {}", column, e)))
}

#[derive(Debug, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub customer_id: Uuid,
  pub shop_id: Uuid,
  pub status: String,
  pub total_amount_cents: i64,
  pub total_items: i32,
  pub payment_method: String,
  pub delivery_otp: String,
  pub otp_failed_attempts: i32,
  pub delivery_address: Json<AddressSnapshot>,
  pub assigned_rider_id: Option<Uuid>,
  pub cancel_reason: Option<String>,
  pub cancelled_by: Option<String>,
  pub created_at: DateTime<Utc>,
  pub rider_assigned_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
  pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = LifecycleError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    Ok(Order {
      id: row.id,
      customer_id: row.customer_id,
      shop_id: row.shop_id,
      status: parse_column("orders.status", &row.status)?,
      total_amount_cents: row.total_amount_cents,
      total_items: row.total_items,
      payment_method: parse_column("orders.payment_method", &row.payment_method)?,
      delivery_otp: row.delivery_otp,
      otp_failed_attempts: row.otp_failed_attempts,
      delivery_address: row.delivery_address.0,
      assigned_rider_id: row.assigned_rider_id,
      cancel_reason: row.cancel_reason,
      cancelled_by: row
        .cancelled_by
        .as_deref()
        .map(|raw| parse_column("orders.cancelled_by", raw))
        .transpose()?,
      created_at: row.created_at,
      rider_assigned_at: row.rider_assigned_at,
      delivered_at: row.delivered_at,
      updated_at: row.updated_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub struct OrderItemRow {
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

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    OrderItem {
      id: row.id,
      order_id: row.order_id,
      shop_product_id: row.shop_product_id,
      price_option_id: row.price_option_id,
      product_name: row.product_name,
      quantity: row.quantity,
      unit_price_cents: row.unit_price_cents,
      weight: row.weight,
      unit: row.unit,
      returnable: row.returnable,
      return_period_days: row.return_period_days,
    }
  }
}

/// A price option joined with the product it sells, as checkout needs it.
#[derive(Debug, Clone, FromRow)]
pub struct CheckoutOptionRow {
  pub price_option_id: Uuid,
  pub price_cents: i64,
  pub weight: String,
  pub unit: String,
  pub product_id: Uuid,
  pub shop_id: Uuid,
  pub product_name: String,
  pub returnable: bool,
  pub return_period_days: i32,
}

#[derive(Debug, FromRow)]
pub struct AddressRow {
  pub recipient_name: String,
  pub phone: String,
  pub line1: String,
  pub line2: Option<String>,
  pub city: String,
  pub postal_code: String,
  pub lat: Option<f64>,
  pub lng: Option<f64>,
}

impl From<AddressRow> for AddressSnapshot {
  fn from(row: AddressRow) -> Self {
    AddressSnapshot {
      recipient_name: row.recipient_name,
      phone: row.phone,
      line1: row.line1,
      line2: row.line2,
      city: row.city,
      postal_code: row.postal_code,
      lat: row.lat,
      lng: row.lng,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct RiderRow {
  pub id: Uuid,
  pub shop_id: Uuid,
  pub name: String,
  pub available: bool,
  pub lat: Option<f64>,
  pub lng: Option<f64>,
  pub location_updated_at: Option<DateTime<Utc>>,
  pub vehicle_number: String,
  pub license_number: String,
}

impl From<RiderRow> for Rider {
  fn from(row: RiderRow) -> Self {
    let location = match (row.lat, row.lng) {
      (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
      _ => None,
    };
    Rider {
      id: row.id,
      shop_id: row.shop_id,
      name: row.name,
      available: row.available,
      location,
      location_updated_at: row.location_updated_at,
      vehicle_number: row.vehicle_number,
      license_number: row.license_number,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct OrderHistoryRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub status: String,
  pub actor_id: Uuid,
  pub actor_role: String,
  pub note: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<OrderHistoryRow> for OrderHistoryEntry {
  type Error = LifecycleError;

  fn try_from(row: OrderHistoryRow) -> Result<Self, Self::Error> {
    Ok(OrderHistoryEntry {
      id: row.id,
      order_id: row.order_id,
      status: parse_column("order_history.status", &row.status)?,
      actor_id: row.actor_id,
      actor_role: parse_column("order_history.actor_role", &row.actor_role)?,
      note: row.note,
      created_at: row.created_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub struct ReturnRow {
  pub id: Uuid,
  pub order_item_id: Uuid,
  pub order_id: Uuid,
  pub customer_id: Uuid,
  pub shop_id: Uuid,
  pub status: String,
  pub reason: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl TryFrom<ReturnRow> for ReturnRequest {
  type Error = LifecycleError;

  fn try_from(row: ReturnRow) -> Result<Self, Self::Error> {
    Ok(ReturnRequest {
      id: row.id,
      order_item_id: row.order_item_id,
      order_id: row.order_id,
      customer_id: row.customer_id,
      shop_id: row.shop_id,
      status: parse_column("return_requests.status", &row.status)?,
      reason: row.reason,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub struct ReturnHistoryRow {
  pub id: Uuid,
  pub return_id: Uuid,
  pub order_item_id: Uuid,
  pub status: String,
  pub actor_id: Uuid,
  pub actor_role: String,
  pub note: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<ReturnHistoryRow> for ReturnHistoryEntry {
  type Error = LifecycleError;

  fn try_from(row: ReturnHistoryRow) -> Result<Self, Self::Error> {
    Ok(ReturnHistoryEntry {
      id: row.id,
      return_id: row.return_id,
      order_item_id: row.order_item_id,
      status: parse_column("return_history.status", &row.status)?,
      actor_id: row.actor_id,
      actor_role: parse_column("return_history.actor_role", &row.actor_role)?,
      note: row.note,
      created_at: row.created_at,
    })
  }
}

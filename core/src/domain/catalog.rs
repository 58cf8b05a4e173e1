// grocer/src/domain/catalog.rs

//! Store-side inventory records backing order lines.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopProduct {
  pub id: Uuid,
  pub shop_id: Uuid,
  pub name: String,
  pub stock: i32,
  pub returnable: bool,
  pub return_period_days: i32,
}

/// A purchasable size/price of a product, e.g. "500 g" at 120 cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceOption {
  pub id: Uuid,
  pub shop_product_id: Uuid,
  pub price_cents: i64,
  pub weight: String,
  pub unit: String,
}

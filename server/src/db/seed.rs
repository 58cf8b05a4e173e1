// grocer_server/src/db/seed.rs

//! Demo data so a fresh server can be driven with curl. The fixed user ids are
//! what callers put in `X-User-ID`.

use crate::errors::Result;
use grocer::{AddressSnapshot, MemoryStore};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

pub const DEMO_CUSTOMER: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0c01);
pub const DEMO_SHOPKEEPER: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0501);
pub const DEMO_RIDER: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0d01);

const DEMO_SHOP: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_5401);
const DEMO_ADDRESS: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_ad01);

struct DemoProduct {
  product_id: Uuid,
  option_id: Uuid,
  name: &'static str,
  stock: i32,
  returnable: bool,
  return_period_days: i32,
  price_cents: i64,
  weight: &'static str,
  unit: &'static str,
}

const DEMO_PRODUCTS: [DemoProduct; 2] = [
  DemoProduct {
    product_id: Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_9101),
    option_id: Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_9201),
    name: "Basmati Rice",
    stock: 50,
    returnable: true,
    return_period_days: 7,
    price_cents: 250,
    weight: "1",
    unit: "kg",
  },
  DemoProduct {
    product_id: Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_9102),
    option_id: Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_9202),
    name: "Toned Milk",
    stock: 100,
    returnable: false,
    return_period_days: 0,
    price_cents: 60,
    weight: "500",
    unit: "ml",
  },
];

fn demo_address() -> AddressSnapshot {
  AddressSnapshot {
    recipient_name: "Demo Customer".to_string(),
    phone: "555-0100".to_string(),
    line1: "1 Market Street".to_string(),
    line2: None,
    city: "Springfield".to_string(),
    postal_code: "11111".to_string(),
    lat: Some(18.52),
    lng: Some(73.85),
  }
}

/// Idempotent: rows that already exist are left alone.
pub async fn seed_postgres(pool: &PgPool) -> Result<()> {
  let mut tx = pool.begin().await?;

  sqlx::query("INSERT INTO shops (id, owner_id, name) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING")
    .bind(DEMO_SHOP)
    .bind(DEMO_SHOPKEEPER)
    .bind("Corner Grocer")
    .execute(&mut *tx)
    .await?;

  for product in &DEMO_PRODUCTS {
    sqlx::query(
      "INSERT INTO shop_products (id, shop_id, name, stock, returnable, return_period_days) \
       VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT DO NOTHING",
    )
    .bind(product.product_id)
    .bind(DEMO_SHOP)
    .bind(product.name)
    .bind(product.stock)
    .bind(product.returnable)
    .bind(product.return_period_days)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
      "INSERT INTO price_options (id, shop_product_id, price_cents, weight, unit) \
       VALUES ($1, $2, $3, $4, $5) ON CONFLICT DO NOTHING",
    )
    .bind(product.option_id)
    .bind(product.product_id)
    .bind(product.price_cents)
    .bind(product.weight)
    .bind(product.unit)
    .execute(&mut *tx)
    .await?;
  }

  let address = demo_address();
  sqlx::query(
    "INSERT INTO customer_addresses (id, customer_id, recipient_name, phone, line1, line2, city, postal_code, lat, lng) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) ON CONFLICT DO NOTHING",
  )
  .bind(DEMO_ADDRESS)
  .bind(DEMO_CUSTOMER)
  .bind(&address.recipient_name)
  .bind(&address.phone)
  .bind(&address.line1)
  .bind(&address.line2)
  .bind(&address.city)
  .bind(&address.postal_code)
  .bind(address.lat)
  .bind(address.lng)
  .execute(&mut *tx)
  .await?;

  sqlx::query(
    "INSERT INTO riders (id, shop_id, name, available, vehicle_number, license_number) \
     VALUES ($1, $2, $3, FALSE, $4, $5) ON CONFLICT DO NOTHING",
  )
  .bind(DEMO_RIDER)
  .bind(DEMO_SHOP)
  .bind("Demo Rider")
  .bind("MH12-DEMO")
  .bind("DL-DEMO-1")
  .execute(&mut *tx)
  .await?;

  tx.commit().await?;
  log_demo_ids(DEMO_SHOP, DEMO_ADDRESS, DEMO_PRODUCTS.iter().map(|p| p.option_id));
  Ok(())
}

pub fn seed_memory(store: &MemoryStore) {
  let shop_id = store.add_shop(DEMO_SHOPKEEPER);
  let mut option_ids = Vec::with_capacity(DEMO_PRODUCTS.len());
  for product in &DEMO_PRODUCTS {
    let product_id = store.add_product(
      shop_id,
      product.name,
      product.stock,
      product.returnable,
      product.return_period_days,
    );
    option_ids.push(store.add_price_option(product_id, product.price_cents, product.weight, product.unit));
  }
  let address_id = store.add_address(DEMO_CUSTOMER, demo_address());
  store.add_rider(DEMO_RIDER, shop_id, "Demo Rider", false);
  log_demo_ids(shop_id, address_id, option_ids);
}

fn log_demo_ids(shop_id: Uuid, address_id: Uuid, option_ids: impl IntoIterator<Item = Uuid>) {
  let options: Vec<String> = option_ids.into_iter().map(|id| id.to_string()).collect();
  info!(
    %shop_id,
    %address_id,
    customer = %DEMO_CUSTOMER,
    shopkeeper = %DEMO_SHOPKEEPER,
    rider = %DEMO_RIDER,
    price_options = ?options,
    "Demo data seeded."
  );
}

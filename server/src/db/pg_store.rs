// grocer_server/src/db/pg_store.rs

//! PostgreSQL implementation of the lifecycle's persistence seam.
//!
//! Status writes are a single `UPDATE ... WHERE status = ANY(..)`: under READ
//! COMMITTED a second writer blocked on the row lock re-evaluates the predicate
//! after the first commits and matches nothing. Stock is decremented with a
//! guarded `stock >= qty` update per product, in product id order so two
//! checkouts never lock the same rows in opposite orders.

use super::rows::{
  AddressRow, CheckoutOptionRow, OrderHistoryRow, OrderItemRow, OrderRow, ReturnHistoryRow, ReturnRow, RiderRow,
  ORDER_COLUMNS, ORDER_ITEM_COLUMNS, RETURN_COLUMNS, RIDER_COLUMNS,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grocer::store::{
  checkout_quantity, rejected_return_transition, rejected_transition, Directory, ItemWithOrder, NewOrder,
  NewReturnRequest, OrderFilter, OrderStore, OtpCheck, ReturnTransition, RiderGuard, StatusTransition,
};
use grocer::{
  AddressSnapshot, GeoPoint, LifecycleError, Order, OrderDetails, OrderHistoryEntry, OrderItem, OrderStatus, ReturnHistoryEntry,
  ReturnRequest, ReturnStatus, Rider, Role,
};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{BTreeMap, HashMap};
use tracing::{instrument, warn};
use uuid::Uuid;

type Result<T> = grocer::Result<T>;

const ACTIVE_RETURN_INDEX: &str = "uq_return_requests_active_item";

#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
    self.pool.begin().await.map_err(LifecycleError::store)
  }

  async fn items_of(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
    let rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY position"
    ))
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(LifecycleError::store)?;
    Ok(rows.into_iter().map(OrderItem::from).collect())
  }

  async fn fetch_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(LifecycleError::store)?;
    row.map(Order::try_from).transpose()
  }
}

async fn insert_order_history(
  tx: &mut Transaction<'static, Postgres>,
  order_id: Uuid,
  status: OrderStatus,
  actor_id: Uuid,
  actor_role: Role,
  note: Option<&str>,
  at: DateTime<Utc>,
) -> Result<()> {
  sqlx::query(
    "INSERT INTO order_history (id, order_id, status, actor_id, actor_role, note, created_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7)",
  )
  .bind(Uuid::new_v4())
  .bind(order_id)
  .bind(status.as_str())
  .bind(actor_id)
  .bind(actor_role.as_str())
  .bind(note)
  .bind(at)
  .execute(&mut **tx)
  .await
  .map_err(LifecycleError::store)?;
  Ok(())
}

async fn insert_return_history(
  tx: &mut Transaction<'static, Postgres>,
  request: &ReturnRequest,
  actor_id: Uuid,
  actor_role: Role,
  note: Option<&str>,
  at: DateTime<Utc>,
) -> Result<()> {
  sqlx::query(
    "INSERT INTO return_history (id, return_id, order_item_id, status, actor_id, actor_role, note, created_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
  )
  .bind(Uuid::new_v4())
  .bind(request.id)
  .bind(request.order_item_id)
  .bind(request.status.as_str())
  .bind(actor_id)
  .bind(actor_role.as_str())
  .bind(note)
  .bind(at)
  .execute(&mut **tx)
  .await
  .map_err(LifecycleError::store)?;
  Ok(())
}

fn is_active_return_conflict(err: &sqlx::Error) -> bool {
  err
    .as_database_error()
    .and_then(|db| db.constraint())
    .is_some_and(|constraint| constraint == ACTIVE_RETURN_INDEX)
}

fn status_texts(statuses: &[OrderStatus]) -> Vec<String> {
  statuses.iter().map(|s| s.as_str().to_string()).collect()
}

fn rider_active_statuses() -> Vec<String> {
  let active: Vec<OrderStatus> = OrderStatus::ALL.into_iter().filter(|s| s.is_rider_active()).collect();
  status_texts(&active)
}

#[async_trait]
impl OrderStore for PgStore {
  #[instrument(name = "pg::create_order", skip(self, new_order), fields(customer_id = %new_order.customer_id), err(Display))]
  async fn create_order_with_items(&self, new_order: NewOrder) -> Result<OrderDetails> {
    let mut tx = self.begin().await?;

    let address: AddressSnapshot = sqlx::query_as::<_, AddressRow>(
      "SELECT recipient_name, phone, line1, line2, city, postal_code, lat, lng \
       FROM customer_addresses WHERE id = $1 AND customer_id = $2",
    )
    .bind(new_order.address_id)
    .bind(new_order.customer_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(LifecycleError::store)?
    .map(AddressSnapshot::from)
    .ok_or_else(|| LifecycleError::not_found("address", new_order.address_id))?;

    let option_ids: Vec<Uuid> = new_order.lines.iter().map(|l| l.price_option_id).collect();
    let options: HashMap<Uuid, CheckoutOptionRow> = sqlx::query_as::<_, CheckoutOptionRow>(
      "SELECT po.id AS price_option_id, po.price_cents, po.weight, po.unit, \
              p.id AS product_id, p.shop_id, p.name AS product_name, p.returnable, p.return_period_days \
       FROM price_options po JOIN shop_products p ON p.id = po.shop_product_id \
       WHERE po.id = ANY($1)",
    )
    .bind(&option_ids)
    .fetch_all(&mut *tx)
    .await
    .map_err(LifecycleError::store)?
    .into_iter()
    .map(|row| (row.price_option_id, row))
    .collect();

    let mut shop_id: Option<Uuid> = None;
    let total_items = checkout_quantity(&new_order.lines)?;
    let mut demand: BTreeMap<Uuid, i32> = BTreeMap::new();
    let mut resolved = Vec::with_capacity(new_order.lines.len());
    for line in &new_order.lines {
      let option = options
        .get(&line.price_option_id)
        .ok_or_else(|| LifecycleError::not_found("price option", line.price_option_id))?;
      match shop_id {
        None => shop_id = Some(option.shop_id),
        Some(id) if id != option.shop_id => {
          return Err(LifecycleError::validation("all items of an order must come from one shop"));
        }
        Some(_) => {}
      }
      *demand.entry(option.product_id).or_insert(0) += line.quantity;
      resolved.push((line.quantity, option.clone()));
    }
    let shop_id = shop_id.ok_or_else(|| LifecycleError::validation("an order needs at least one item"))?;

    for (product_id, quantity) in &demand {
      let reserved = sqlx::query("UPDATE shop_products SET stock = stock - $1 WHERE id = $2 AND stock >= $1")
        .bind(quantity)
        .bind(product_id)
        .execute(&mut *tx)
        .await
        .map_err(LifecycleError::store)?;
      if reserved.rows_affected() == 0 {
        // Dropping the transaction rolls back the lines already reserved.
        warn!(%product_id, requested = quantity, "Checkout rejected for stock.");
        return Err(LifecycleError::InsufficientStock { product_id: *product_id });
      }
    }

    let order_id = Uuid::new_v4();
    let items: Vec<OrderItem> = resolved
      .into_iter()
      .map(|(quantity, option)| OrderItem {
        id: Uuid::new_v4(),
        order_id,
        shop_product_id: option.product_id,
        price_option_id: option.price_option_id,
        product_name: option.product_name,
        quantity,
        unit_price_cents: option.price_cents,
        weight: option.weight,
        unit: option.unit,
        returnable: option.returnable,
        return_period_days: option.return_period_days,
      })
      .collect();
    let total_amount_cents: i64 = items.iter().map(OrderItem::line_total_cents).sum();

    let row: OrderRow = sqlx::query_as(&format!(
      "INSERT INTO orders (id, customer_id, shop_id, status, total_amount_cents, total_items, payment_method, \
         delivery_otp, delivery_address, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
       RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order_id)
    .bind(new_order.customer_id)
    .bind(shop_id)
    .bind(OrderStatus::Pending.as_str())
    .bind(total_amount_cents)
    .bind(total_items)
    .bind(new_order.payment_method.as_str())
    .bind(&new_order.delivery_otp)
    .bind(sqlx::types::Json(&address))
    .bind(new_order.created_at)
    .fetch_one(&mut *tx)
    .await
    .map_err(LifecycleError::store)?;
    let order = Order::try_from(row)?;

    for (position, item) in items.iter().enumerate() {
      sqlx::query(
        "INSERT INTO order_items (id, order_id, shop_product_id, price_option_id, product_name, quantity, \
           unit_price_cents, weight, unit, returnable, return_period_days, position) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
      )
      .bind(item.id)
      .bind(order_id)
      .bind(item.shop_product_id)
      .bind(item.price_option_id)
      .bind(&item.product_name)
      .bind(item.quantity)
      .bind(item.unit_price_cents)
      .bind(&item.weight)
      .bind(&item.unit)
      .bind(item.returnable)
      .bind(item.return_period_days)
      .bind(i32::try_from(position).unwrap_or(i32::MAX))
      .execute(&mut *tx)
      .await
      .map_err(LifecycleError::store)?;
    }

    insert_order_history(
      &mut tx,
      order_id,
      OrderStatus::Pending,
      new_order.customer_id,
      Role::Customer,
      Some("order placed"),
      new_order.created_at,
    )
    .await?;

    tx.commit().await.map_err(LifecycleError::store)?;
    Ok(OrderDetails { order, items })
  }

  async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderDetails>> {
    let Some(order) = self.fetch_order(order_id).await? else {
      return Ok(None);
    };
    let items = self.items_of(order_id).await?;
    Ok(Some(OrderDetails { order, items }))
  }

  async fn get_order_item(&self, order_item_id: Uuid) -> Result<Option<ItemWithOrder>> {
    let row: Option<OrderItemRow> = sqlx::query_as(&format!("SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE id = $1"))
      .bind(order_item_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(LifecycleError::store)?;
    let Some(item) = row.map(OrderItem::from) else {
      return Ok(None);
    };
    let order = self
      .fetch_order(item.order_id)
      .await?
      .ok_or_else(|| LifecycleError::store(anyhow::anyhow!("order item {} without an order", item.id)))?;
    Ok(Some(ItemWithOrder { item, order }))
  }

  async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders \
       WHERE ($1::uuid IS NULL OR customer_id = $1) \
         AND ($2::uuid IS NULL OR shop_id = $2) \
         AND ($3::uuid IS NULL OR assigned_rider_id = $3) \
         AND ($4::text IS NULL OR status = $4) \
       ORDER BY created_at DESC, id"
    ))
    .bind(filter.customer_id)
    .bind(filter.shop_id)
    .bind(filter.rider_id)
    .bind(filter.status.map(OrderStatus::as_str))
    .fetch_all(&self.pool)
    .await
    .map_err(LifecycleError::store)?;
    rows.into_iter().map(Order::try_from).collect()
  }

  async fn order_history(&self, order_id: Uuid) -> Result<Vec<OrderHistoryEntry>> {
    let rows: Vec<OrderHistoryRow> = sqlx::query_as(
      "SELECT id, order_id, status, actor_id, actor_role, note, created_at \
       FROM order_history WHERE order_id = $1 ORDER BY seq DESC",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(LifecycleError::store)?;
    rows.into_iter().map(OrderHistoryEntry::try_from).collect()
  }

  #[instrument(
    name = "pg::transition_order",
    skip(self, transition),
    fields(order_id = %transition.order_id, target = %transition.target),
    err(Display)
  )]
  async fn transition_order_status(&self, transition: StatusTransition) -> Result<Order> {
    let mut tx = self.begin().await?;

    let (guard, guard_rider) = match transition.rider_guard {
      RiderGuard::Any => ("any", None),
      RiderGuard::Unassigned => ("unassigned", None),
      RiderGuard::AssignedTo(rider_id) => ("assigned", Some(rider_id)),
    };
    let effects = &transition.effects;
    let cancellation = effects.cancellation.as_ref();

    if let (Some(rider_id), Some(cap)) = (effects.assign_rider, effects.rider_capacity) {
      // Holding the rider row until commit serializes assignments to this rider.
      sqlx::query("SELECT 1 FROM riders WHERE id = $1 FOR UPDATE")
        .bind(rider_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(LifecycleError::store)?;
      let held: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE assigned_rider_id = $1 AND status = ANY($2) AND id <> $3",
      )
      .bind(rider_id)
      .bind(rider_active_statuses())
      .bind(transition.order_id)
      .fetch_one(&mut *tx)
      .await
      .map_err(LifecycleError::store)?;
      if held >= i64::from(cap) {
        tx.rollback().await.map_err(LifecycleError::store)?;
        warn!(%rider_id, held, cap, "Assignment refused at rider capacity.");
        return Err(LifecycleError::RiderUnavailable { rider_id });
      }
    }

    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "UPDATE orders SET \
         status = $2, \
         updated_at = $3, \
         assigned_rider_id = CASE WHEN $4 THEN NULL ELSE COALESCE($5, assigned_rider_id) END, \
         rider_assigned_at = CASE WHEN $5::uuid IS NOT NULL THEN $3 ELSE rider_assigned_at END, \
         cancelled_by = CASE WHEN $4 THEN $6 ELSE cancelled_by END, \
         cancel_reason = CASE WHEN $4 THEN $7 ELSE cancel_reason END, \
         delivered_at = CASE WHEN $8 THEN $3 ELSE delivered_at END \
       WHERE id = $1 \
         AND status = ANY($9) \
         AND CASE $10 \
               WHEN 'any' THEN TRUE \
               WHEN 'unassigned' THEN assigned_rider_id IS NULL \
               ELSE assigned_rider_id IS NOT DISTINCT FROM $11 \
             END \
       RETURNING {ORDER_COLUMNS}"
    ))
    .bind(transition.order_id)
    .bind(transition.target.as_str())
    .bind(transition.at)
    .bind(cancellation.is_some())
    .bind(effects.assign_rider)
    .bind(cancellation.map(|c| c.by.as_str()))
    .bind(cancellation.and_then(|c| c.reason.clone()))
    .bind(effects.mark_delivered)
    .bind(status_texts(&transition.expected))
    .bind(guard)
    .bind(guard_rider)
    .fetch_optional(&mut *tx)
    .await
    .map_err(LifecycleError::store)?;

    let Some(row) = row else {
      tx.rollback().await.map_err(LifecycleError::store)?;
      let current = self.fetch_order(transition.order_id).await?;
      return Err(rejected_transition(
        &transition,
        current.map(|o| (o.status, o.assigned_rider_id)),
      ));
    };
    let order = Order::try_from(row)?;

    if effects.restore_stock {
      sqlx::query(
        "UPDATE shop_products p SET stock = p.stock + q.quantity \
         FROM (SELECT shop_product_id, SUM(quantity)::int AS quantity \
               FROM order_items WHERE order_id = $1 GROUP BY shop_product_id) q \
         WHERE p.id = q.shop_product_id",
      )
      .bind(transition.order_id)
      .execute(&mut *tx)
      .await
      .map_err(LifecycleError::store)?;
    }

    if let Some(via) = transition.passes_through {
      insert_order_history(
        &mut tx,
        order.id,
        via,
        transition.actor.id,
        transition.actor.role,
        None,
        transition.at,
      )
      .await?;
    }
    insert_order_history(
      &mut tx,
      order.id,
      transition.target,
      transition.actor.id,
      transition.actor.role,
      transition.note.as_deref(),
      transition.at,
    )
    .await?;

    tx.commit().await.map_err(LifecycleError::store)?;
    Ok(order)
  }

  #[instrument(name = "pg::check_delivery_otp", skip(self, code), err(Display))]
  async fn check_delivery_otp(&self, order_id: Uuid, code: &str, max_attempts: u32) -> Result<OtpCheck> {
    let limit = i32::try_from(max_attempts).unwrap_or(i32::MAX);
    // Concurrent attempts queue on the row lock; the attempt guard is
    // re-evaluated against the locked row.
    let checked: Option<(bool, i32)> = sqlx::query_as(
      "UPDATE orders \
       SET otp_failed_attempts = otp_failed_attempts + CASE WHEN delivery_otp = $2 THEN 0 ELSE 1 END \
       WHERE id = $1 AND otp_failed_attempts < $3 \
       RETURNING delivery_otp = $2, otp_failed_attempts",
    )
    .bind(order_id)
    .bind(code)
    .bind(limit)
    .fetch_optional(&self.pool)
    .await
    .map_err(LifecycleError::store)?;

    match checked {
      Some((true, _)) => Ok(OtpCheck::Matched),
      Some((false, attempts)) => Ok(OtpCheck::Mismatched { attempts }),
      None => {
        let attempts: Option<i32> = sqlx::query_scalar("SELECT otp_failed_attempts FROM orders WHERE id = $1")
          .bind(order_id)
          .fetch_optional(&self.pool)
          .await
          .map_err(LifecycleError::store)?;
        attempts
          .map(|attempts| OtpCheck::Locked { attempts })
          .ok_or_else(|| LifecycleError::not_found("order", order_id))
      }
    }
  }

  async fn find_available_riders(&self, shop_id: Uuid) -> Result<Vec<Rider>> {
    let rows: Vec<RiderRow> = sqlx::query_as(&format!(
      "SELECT {RIDER_COLUMNS} FROM riders WHERE shop_id = $1 AND available ORDER BY id"
    ))
    .bind(shop_id)
    .fetch_all(&self.pool)
    .await
    .map_err(LifecycleError::store)?;
    Ok(rows.into_iter().map(Rider::from).collect())
  }

  async fn get_rider(&self, rider_id: Uuid) -> Result<Option<Rider>> {
    let row: Option<RiderRow> = sqlx::query_as(&format!("SELECT {RIDER_COLUMNS} FROM riders WHERE id = $1"))
      .bind(rider_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(LifecycleError::store)?;
    Ok(row.map(Rider::from))
  }

  async fn count_active_orders_for_rider(&self, rider_id: Uuid) -> Result<u32> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE assigned_rider_id = $1 AND status = ANY($2)")
      .bind(rider_id)
      .bind(rider_active_statuses())
      .fetch_one(&self.pool)
      .await
      .map_err(LifecycleError::store)?;
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
  }

  async fn set_rider_availability(&self, rider_id: Uuid, available: bool) -> Result<Rider> {
    let row: Option<RiderRow> = sqlx::query_as(&format!(
      "UPDATE riders SET available = $2 WHERE id = $1 RETURNING {RIDER_COLUMNS}"
    ))
    .bind(rider_id)
    .bind(available)
    .fetch_optional(&self.pool)
    .await
    .map_err(LifecycleError::store)?;
    row
      .map(Rider::from)
      .ok_or_else(|| LifecycleError::not_found("rider", rider_id))
  }

  async fn update_rider_location(&self, rider_id: Uuid, location: GeoPoint, at: DateTime<Utc>) -> Result<Rider> {
    let row: Option<RiderRow> = sqlx::query_as(&format!(
      "UPDATE riders SET lat = $2, lng = $3, location_updated_at = $4 WHERE id = $1 RETURNING {RIDER_COLUMNS}"
    ))
    .bind(rider_id)
    .bind(location.lat)
    .bind(location.lng)
    .bind(at)
    .fetch_optional(&self.pool)
    .await
    .map_err(LifecycleError::store)?;
    row
      .map(Rider::from)
      .ok_or_else(|| LifecycleError::not_found("rider", rider_id))
  }

  #[instrument(name = "pg::create_return", skip(self, request), fields(order_item_id = %request.order_item_id), err(Display))]
  async fn create_return_request(&self, request: NewReturnRequest) -> Result<ReturnRequest> {
    let mut tx = self.begin().await?;

    let inserted: std::result::Result<ReturnRow, sqlx::Error> = sqlx::query_as(&format!(
      "INSERT INTO return_requests (id, order_item_id, order_id, customer_id, shop_id, status, reason, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
       RETURNING {RETURN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(request.order_item_id)
    .bind(request.order_id)
    .bind(request.customer_id)
    .bind(request.shop_id)
    .bind(ReturnStatus::Requested.as_str())
    .bind(&request.reason)
    .bind(request.at)
    .fetch_one(&mut *tx)
    .await;

    let created = match inserted {
      Ok(row) => ReturnRequest::try_from(row)?,
      Err(e) if is_active_return_conflict(&e) => {
        return Err(LifecycleError::DuplicateActiveReturn {
          order_item_id: request.order_item_id,
        });
      }
      Err(e) => return Err(LifecycleError::store(e)),
    };

    insert_return_history(
      &mut tx,
      &created,
      request.actor.id,
      request.actor.role,
      Some(&request.reason),
      request.at,
    )
    .await?;

    tx.commit().await.map_err(LifecycleError::store)?;
    Ok(created)
  }

  async fn get_return_request(&self, return_id: Uuid) -> Result<Option<ReturnRequest>> {
    let row: Option<ReturnRow> = sqlx::query_as(&format!("SELECT {RETURN_COLUMNS} FROM return_requests WHERE id = $1"))
      .bind(return_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(LifecycleError::store)?;
    row.map(ReturnRequest::try_from).transpose()
  }

  #[instrument(
    name = "pg::transition_return",
    skip(self, transition),
    fields(return_id = %transition.return_id, target = %transition.target),
    err(Display)
  )]
  async fn transition_return_status(&self, transition: ReturnTransition) -> Result<ReturnRequest> {
    let mut tx = self.begin().await?;

    let row: Option<ReturnRow> = sqlx::query_as(&format!(
      "UPDATE return_requests SET status = $2, updated_at = $3 \
       WHERE id = $1 AND status = $4 \
       RETURNING {RETURN_COLUMNS}"
    ))
    .bind(transition.return_id)
    .bind(transition.target.as_str())
    .bind(transition.at)
    .bind(transition.expected.as_str())
    .fetch_optional(&mut *tx)
    .await
    .map_err(LifecycleError::store)?;

    let Some(row) = row else {
      tx.rollback().await.map_err(LifecycleError::store)?;
      let current = self.get_return_request(transition.return_id).await?;
      return Err(rejected_return_transition(&transition, current.map(|r| r.status)));
    };
    let updated = ReturnRequest::try_from(row)?;

    insert_return_history(
      &mut tx,
      &updated,
      transition.actor.id,
      transition.actor.role,
      transition.note.as_deref(),
      transition.at,
    )
    .await?;

    tx.commit().await.map_err(LifecycleError::store)?;
    Ok(updated)
  }

  async fn return_history_for_item(&self, order_item_id: Uuid) -> Result<Vec<ReturnHistoryEntry>> {
    let rows: Vec<ReturnHistoryRow> = sqlx::query_as(
      "SELECT id, return_id, order_item_id, status, actor_id, actor_role, note, created_at \
       FROM return_history WHERE order_item_id = $1 ORDER BY seq DESC",
    )
    .bind(order_item_id)
    .fetch_all(&self.pool)
    .await
    .map_err(LifecycleError::store)?;
    rows.into_iter().map(ReturnHistoryEntry::try_from).collect()
  }
}

#[async_trait]
impl Directory for PgStore {
  async fn shop_owned_by(&self, actor_id: Uuid) -> Result<Option<Uuid>> {
    sqlx::query_scalar("SELECT id FROM shops WHERE owner_id = $1")
      .bind(actor_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(LifecycleError::store)
  }

  async fn rider_belongs_to_shop(&self, rider_id: Uuid, shop_id: Uuid) -> Result<bool> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM riders WHERE id = $1 AND shop_id = $2)")
      .bind(rider_id)
      .bind(shop_id)
      .fetch_one(&self.pool)
      .await
      .map_err(LifecycleError::store)
  }
}

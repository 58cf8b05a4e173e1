// grocer_server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use grocer::{
  Actor, AddressSnapshot, Checkout, CheckoutLine, Order, OrderDetails, OrderItem, OrderStatus, PaymentMethod, Role,
  TransitionRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedActor;

// --- Views ---

/// An order as returned over HTTP. The delivery code is shown to the
/// customer who must hand it over, and to admins.
#[derive(Debug, Serialize)]
pub struct OrderView {
  pub id: Uuid,
  pub customer_id: Uuid,
  pub shop_id: Uuid,
  pub status: OrderStatus,
  pub total_amount_cents: i64,
  pub total_items: i32,
  pub payment_method: PaymentMethod,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub delivery_otp: Option<String>,
  pub delivery_address: AddressSnapshot,
  pub assigned_rider_id: Option<Uuid>,
  pub cancel_reason: Option<String>,
  pub cancelled_by: Option<Role>,
  pub created_at: DateTime<Utc>,
  pub rider_assigned_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
  pub updated_at: DateTime<Utc>,
}

impl OrderView {
  pub fn for_actor(order: Order, actor: Actor) -> Self {
    let reveal_otp = match actor.role {
      Role::Customer => order.customer_id == actor.id,
      Role::Admin => true,
      Role::Shopkeeper | Role::Rider => false,
    };
    OrderView {
      id: order.id,
      customer_id: order.customer_id,
      shop_id: order.shop_id,
      status: order.status,
      total_amount_cents: order.total_amount_cents,
      total_items: order.total_items,
      payment_method: order.payment_method,
      delivery_otp: reveal_otp.then_some(order.delivery_otp),
      delivery_address: order.delivery_address,
      assigned_rider_id: order.assigned_rider_id,
      cancel_reason: order.cancel_reason,
      cancelled_by: order.cancelled_by,
      created_at: order.created_at,
      rider_assigned_at: order.rider_assigned_at,
      delivered_at: order.delivered_at,
      updated_at: order.updated_at,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct OrderDetailsView {
  #[serde(flatten)]
  pub order: OrderView,
  pub items: Vec<OrderItem>,
}

impl OrderDetailsView {
  fn for_actor(details: OrderDetails, actor: Actor) -> Self {
    OrderDetailsView {
      order: OrderView::for_actor(details.order, actor),
      items: details.items,
    }
  }
}

fn order_response(order: Order, actor: Actor) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "order": OrderView::for_actor(order, actor) }))
}

// --- Request DTOs ---

#[derive(Debug, Deserialize)]
pub struct CheckoutLinePayload {
  pub price_option_id: Uuid,
  pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderPayload {
  pub address_id: Uuid,
  pub items: Vec<CheckoutLinePayload>,
  #[serde(default = "default_payment_method")]
  pub payment_method: PaymentMethod,
}

fn default_payment_method() -> PaymentMethod {
  PaymentMethod::CashOnDelivery
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
  pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionPayload {
  pub status: OrderStatus,
  pub otp: Option<String>,
  pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreparationPayload {
  pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonPayload {
  pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeliverPayload {
  pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRiderPayload {
  pub rider_id: Uuid,
}

// --- Handlers ---

#[instrument(name = "handler::create_order", skip(app_state, auth, payload), fields(actor_id = %auth.0.id))]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  payload: web::Json<CreateOrderPayload>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();
  let checkout = Checkout {
    address_id: payload.address_id,
    lines: payload
      .items
      .into_iter()
      .map(|line| CheckoutLine {
        price_option_id: line.price_option_id,
        quantity: line.quantity,
      })
      .collect(),
    payment_method: payload.payment_method,
  };

  let details = app_state.lifecycle.create_order(auth.actor(), checkout).await?;
  info!(order_id = %details.order.id, "Order placed.");
  Ok(HttpResponse::Created().json(json!({ "order": OrderDetailsView::for_actor(details, auth.actor()) })))
}

#[instrument(name = "handler::list_orders", skip(app_state, auth, query), fields(actor_id = %auth.0.id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse> {
  let status = query
    .status
    .as_deref()
    .map(str::parse::<OrderStatus>)
    .transpose()
    .map_err(AppError::Validation)?;

  let orders = app_state.lifecycle.list_orders(auth.actor(), status).await?;
  let views: Vec<OrderView> = orders
    .into_iter()
    .map(|order| OrderView::for_actor(order, auth.actor()))
    .collect();
  Ok(HttpResponse::Ok().json(json!({ "orders": views })))
}

#[instrument(name = "handler::get_order", skip(app_state, auth, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let details = app_state.lifecycle.get_order(auth.actor(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "order": OrderDetailsView::for_actor(details, auth.actor()) })))
}

#[instrument(name = "handler::order_history", skip(app_state, auth, path), fields(order_id = %path.as_ref()))]
pub async fn order_history_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let history = app_state.lifecycle.order_history(auth.actor(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "history": history })))
}

#[instrument(
  name = "handler::transition_order",
  skip(app_state, auth, path, payload),
  fields(order_id = %path.as_ref(), target = %payload.status)
)]
pub async fn transition_order_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
  payload: web::Json<TransitionPayload>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();
  let request = TransitionRequest {
    target: payload.status,
    otp: payload.otp,
    reason: payload.reason,
  };
  let order = app_state
    .lifecycle
    .transition_order(auth.actor(), path.into_inner(), request)
    .await?;
  Ok(order_response(order, auth.actor()))
}

#[instrument(name = "handler::confirm_order", skip(app_state, auth, path), fields(order_id = %path.as_ref()))]
pub async fn confirm_order_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let order = app_state.lifecycle.confirm_order(auth.actor(), path.into_inner()).await?;
  Ok(order_response(order, auth.actor()))
}

#[instrument(name = "handler::update_preparation", skip(app_state, auth, path, payload), fields(order_id = %path.as_ref()))]
pub async fn update_preparation_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
  payload: web::Json<PreparationPayload>,
) -> Result<HttpResponse> {
  let order = app_state
    .lifecycle
    .update_preparation(auth.actor(), path.into_inner(), payload.status)
    .await?;
  Ok(order_response(order, auth.actor()))
}

/// One endpoint for every role's cancellation; the transition table decides
/// whether this role may cancel from the current status.
#[instrument(name = "handler::cancel_order", skip(app_state, auth, path, payload), fields(order_id = %path.as_ref(), role = %auth.0.role))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
  payload: Option<web::Json<ReasonPayload>>,
) -> Result<HttpResponse> {
  let order_id = path.into_inner();
  let reason = payload.map(|p| p.into_inner()).unwrap_or_default().reason;
  let lifecycle = &app_state.lifecycle;
  let order = match auth.0.role {
    Role::Customer => lifecycle.customer_cancel_order(auth.actor(), order_id, reason).await?,
    Role::Rider => lifecycle.rider_cancel_order(auth.actor(), order_id, reason).await?,
    Role::Shopkeeper | Role::Admin => lifecycle.reject_order(auth.actor(), order_id, reason).await?,
  };
  Ok(order_response(order, auth.actor()))
}

#[instrument(name = "handler::ship_order", skip(app_state, auth, path), fields(order_id = %path.as_ref()))]
pub async fn ship_order_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let order = app_state.lifecycle.ship_order(auth.actor(), path.into_inner()).await?;
  Ok(order_response(order, auth.actor()))
}

#[instrument(name = "handler::deliver_order", skip(app_state, auth, path, payload), fields(order_id = %path.as_ref()))]
pub async fn deliver_order_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
  payload: web::Json<DeliverPayload>,
) -> Result<HttpResponse> {
  let order = app_state
    .lifecycle
    .mark_delivered(auth.actor(), path.into_inner(), &payload.otp)
    .await?;
  info!(order_id = %order.id, "Order delivered.");
  Ok(order_response(order, auth.actor()))
}

#[instrument(
  name = "handler::assign_rider",
  skip(app_state, auth, path, payload),
  fields(order_id = %path.as_ref(), rider_id = %payload.rider_id)
)]
pub async fn assign_rider_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
  payload: web::Json<AssignRiderPayload>,
) -> Result<HttpResponse> {
  let order = app_state
    .lifecycle
    .assign_rider(auth.actor(), path.into_inner(), payload.rider_id)
    .await?;
  Ok(order_response(order, auth.actor()))
}

#[instrument(name = "handler::auto_assign", skip(app_state, auth, path))]
pub async fn auto_assign_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
  let (shop_id, order_id) = path.into_inner();
  let order = app_state
    .lifecycle
    .auto_assign_if_single_rider(auth.actor(), shop_id, order_id)
    .await?;
  Ok(order_response(order, auth.actor()))
}

// grocer_server/src/web/handlers/return_handlers.rs

use actix_web::{web, HttpResponse};
use grocer::ReturnDecision;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::Result;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedActor;

#[derive(Debug, Deserialize)]
pub struct RequestReturnPayload {
  pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct DecisionPayload {
  pub decision: ReturnDecision,
  pub note: Option<String>,
}

#[instrument(name = "handler::request_return", skip(app_state, auth, path, payload), fields(order_item_id = %path.as_ref()))]
pub async fn request_return_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
  payload: web::Json<RequestReturnPayload>,
) -> Result<HttpResponse> {
  let request = app_state
    .lifecycle
    .request_return(auth.actor(), path.into_inner(), &payload.reason)
    .await?;
  info!(return_id = %request.id, "Return requested.");
  Ok(HttpResponse::Created().json(json!({ "return_request": request })))
}

#[instrument(name = "handler::return_history", skip(app_state, auth, path), fields(order_item_id = %path.as_ref()))]
pub async fn return_history_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let history = app_state
    .lifecycle
    .get_return_history(auth.actor(), path.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "history": history })))
}

#[instrument(name = "handler::get_return", skip(app_state, auth, path), fields(return_id = %path.as_ref()))]
pub async fn get_return_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let request = app_state
    .lifecycle
    .get_return_request(auth.actor(), path.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "return_request": request })))
}

#[instrument(
  name = "handler::process_return",
  skip(app_state, auth, path, payload),
  fields(return_id = %path.as_ref(), decision = ?payload.decision)
)]
pub async fn process_return_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
  payload: web::Json<DecisionPayload>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();
  let request = app_state
    .lifecycle
    .process_return(auth.actor(), path.into_inner(), payload.decision, payload.note)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "return_request": request })))
}

#[instrument(name = "handler::return_picked_up", skip(app_state, auth, path), fields(return_id = %path.as_ref()))]
pub async fn picked_up_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let request = app_state
    .lifecycle
    .mark_return_picked_up(auth.actor(), path.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "return_request": request })))
}

#[instrument(name = "handler::return_received", skip(app_state, auth, path), fields(return_id = %path.as_ref()))]
pub async fn received_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let request = app_state
    .lifecycle
    .mark_return_received(auth.actor(), path.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "return_request": request })))
}

#[instrument(name = "handler::return_refunded", skip(app_state, auth, path), fields(return_id = %path.as_ref()))]
pub async fn refunded_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let request = app_state.lifecycle.mark_refunded(auth.actor(), path.into_inner()).await?;
  info!(return_id = %request.id, "Return refunded.");
  Ok(HttpResponse::Ok().json(json!({ "return_request": request })))
}

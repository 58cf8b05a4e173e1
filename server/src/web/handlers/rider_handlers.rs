// grocer_server/src/web/handlers/rider_handlers.rs

use actix_web::{web, HttpResponse};
use grocer::GeoPoint;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::Result;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedActor;

#[derive(Debug, Deserialize)]
pub struct AvailabilityPayload {
  pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct LocationPayload {
  pub lat: f64,
  pub lng: f64,
}

#[instrument(name = "handler::rider_availability", skip(app_state, auth, payload), fields(rider_id = %auth.0.id, available = payload.available))]
pub async fn set_availability_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  payload: web::Json<AvailabilityPayload>,
) -> Result<HttpResponse> {
  let rider = app_state
    .lifecycle
    .set_rider_availability(auth.actor(), payload.available)
    .await?;
  info!("Rider availability changed.");
  Ok(HttpResponse::Ok().json(json!({ "rider": rider })))
}

#[instrument(name = "handler::rider_location", skip(app_state, auth, payload), fields(rider_id = %auth.0.id))]
pub async fn update_location_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedActor,
  payload: web::Json<LocationPayload>,
) -> Result<HttpResponse> {
  let location = GeoPoint {
    lat: payload.lat,
    lng: payload.lng,
  };
  let rider = app_state.lifecycle.update_rider_location(auth.actor(), location).await?;
  Ok(HttpResponse::Ok().json(json!({ "rider": rider })))
}

// grocer/src/domain/rider.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub lat: f64,
  pub lng: f64,
}

impl GeoPoint {
  pub fn is_valid(&self) -> bool {
    (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
  }
}

/// A delivery rider. `id` is the rider's user id; each rider works for one shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rider {
  pub id: Uuid,
  pub shop_id: Uuid,
  pub name: String,
  pub available: bool,
  pub location: Option<GeoPoint>,
  pub location_updated_at: Option<DateTime<Utc>>,
  pub vehicle_number: String,
  pub license_number: String,
}

//! Ride records and the inputs that create them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, lifecycle::RideStatus};

// ─── Locations ───────────────────────────────────────────────────────────────

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub lat: f64,
  pub lon: f64,
}

impl Coordinates {
  pub fn new(lat: f64, lon: f64) -> Result<Self> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
      return Err(Error::Validation(format!("latitude out of range: {lat}")));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
      return Err(Error::Validation(format!("longitude out of range: {lon}")));
    }
    Ok(Self { lat, lon })
  }
}

/// A location as entered by the passenger; either coordinate may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationInput {
  #[serde(alias = "latitude")]
  pub lat: Option<f64>,
  #[serde(alias = "longitude")]
  pub lon: Option<f64>,
}

impl LocationInput {
  pub fn new(lat: f64, lon: f64) -> Self { Self { lat: Some(lat), lon: Some(lon) } }

  pub(crate) fn validate(&self, what: &str) -> Result<Coordinates> {
    match (self.lat, self.lon) {
      (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
      _ => Err(Error::Validation(format!(
        "{what} requires both latitude and longitude"
      ))),
    }
  }
}

/// A resolved location: coordinates plus the address text they map to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
  pub lat:     f64,
  pub lon:     f64,
  pub address: String,
}

impl Place {
  pub fn new(at: Coordinates, address: impl Into<String>) -> Self {
    Self { lat: at.lat, lon: at.lon, address: address.into() }
  }
}

// ─── Ride ────────────────────────────────────────────────────────────────────

/// A persisted ride.
///
/// `driver_id` is `Some` exactly when `status` is accepted, picked up or
/// completed. Rides are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
  pub ride_id:      Uuid,
  pub passenger_id: Uuid,
  pub driver_id:    Option<Uuid>,
  pub pickup:       Place,
  pub dropoff:      Place,
  pub status:       RideStatus,
  pub price:        i64,
  pub app_fee:      i64,
  pub distance_km:  f64,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Everything the store needs to create a ride. The store assigns the id,
/// the timestamps and the initial `requested` status.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRide {
  pub passenger_id: Uuid,
  pub pickup:       Place,
  pub dropoff:      Place,
  pub price:        i64,
  pub app_fee:      i64,
  pub distance_km:  f64,
}

/// A passenger's trip request, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRequest {
  pub passenger_id: Uuid,
  #[serde(alias = "pickup_location")]
  pub pickup:       LocationInput,
  #[serde(alias = "dropoff_location")]
  pub dropoff:      LocationInput,
  pub distance_km:  f64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_coordinate_is_rejected() {
    let input = LocationInput { lat: Some(5.18), lon: None };
    assert!(matches!(input.validate("pickup"), Err(Error::Validation(_))));
  }

  #[test]
  fn coordinates_out_of_range_are_rejected() {
    assert!(Coordinates::new(91.0, 0.0).is_err());
    assert!(Coordinates::new(0.0, -180.5).is_err());
    assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    assert!(Coordinates::new(5.18, 97.15).is_ok());
  }

  #[test]
  fn request_accepts_original_field_names() {
    let json = r#"{
      "passenger_id": "6f1c0d3e-2b8a-4c39-9d39-2a9b1b7e0f11",
      "pickup_location": {"latitude": 5.18, "longitude": 97.14},
      "dropoff_location": {"lat": 5.2, "lon": 97.1},
      "distance_km": 4.5
    }"#;
    let req: RideRequest = serde_json::from_str(json).unwrap();
    assert_eq!(req.pickup.lat, Some(5.18));
    assert_eq!(req.dropoff.lon, Some(97.1));
  }
}

//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! UUIDs are stored as hyphenated lowercase strings.

use std::str::FromStr as _;

use becak_core::{
  lifecycle::RideStatus,
  profile::DriverProfile,
  ride::{Place, Ride},
};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── RideStatus ──────────────────────────────────────────────────────────────

pub fn encode_status(status: RideStatus) -> &'static str {
  match status {
    RideStatus::Requested => "requested",
    RideStatus::Accepted => "accepted",
    RideStatus::PickedUp => "picked_up",
    RideStatus::Completed => "completed",
    RideStatus::Cancelled => "cancelled",
  }
}

pub fn decode_status(s: &str) -> Result<RideStatus> {
  RideStatus::from_str(s).map_err(|_| Error::Corrupt { column: "status", value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawRide::from_row`].
pub const RIDE_COLUMNS: &str = "ride_id, passenger_id, driver_id,
  pickup_lat, pickup_lon, pickup_address,
  dropoff_lat, dropoff_lon, dropoff_address,
  status, price, app_fee, distance_km, created_at, updated_at";

/// Raw values read directly from a `rides` row.
pub struct RawRide {
  pub ride_id:         String,
  pub passenger_id:    String,
  pub driver_id:       Option<String>,
  pub pickup_lat:      f64,
  pub pickup_lon:      f64,
  pub pickup_address:  String,
  pub dropoff_lat:     f64,
  pub dropoff_lon:     f64,
  pub dropoff_address: String,
  pub status:          String,
  pub price:           i64,
  pub app_fee:         i64,
  pub distance_km:     f64,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawRide {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ride_id:         row.get(0)?,
      passenger_id:    row.get(1)?,
      driver_id:       row.get(2)?,
      pickup_lat:      row.get(3)?,
      pickup_lon:      row.get(4)?,
      pickup_address:  row.get(5)?,
      dropoff_lat:     row.get(6)?,
      dropoff_lon:     row.get(7)?,
      dropoff_address: row.get(8)?,
      status:          row.get(9)?,
      price:           row.get(10)?,
      app_fee:         row.get(11)?,
      distance_km:     row.get(12)?,
      created_at:      row.get(13)?,
      updated_at:      row.get(14)?,
    })
  }

  pub fn into_ride(self) -> Result<Ride> {
    Ok(Ride {
      ride_id:      decode_uuid(&self.ride_id)?,
      passenger_id: decode_uuid(&self.passenger_id)?,
      driver_id:    self.driver_id.as_deref().map(decode_uuid).transpose()?,
      pickup:       Place {
        lat:     self.pickup_lat,
        lon:     self.pickup_lon,
        address: self.pickup_address,
      },
      dropoff:      Place {
        lat:     self.dropoff_lat,
        lon:     self.dropoff_lon,
        address: self.dropoff_address,
      },
      status:       decode_status(&self.status)?,
      price:        self.price,
      app_fee:      self.app_fee,
      distance_km:  self.distance_km,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `drivers` row.
pub struct RawDriver {
  pub driver_id:    String,
  pub name:         String,
  pub phone:        String,
  pub vehicle:      String,
  pub plate_number: String,
  pub rating:       f64,
  pub total_trips:  i64,
  pub photo:        Option<String>,
}

impl RawDriver {
  pub fn into_profile(self) -> Result<DriverProfile> {
    Ok(DriverProfile {
      id:           decode_uuid(&self.driver_id)?,
      name:         self.name,
      phone:        self.phone,
      vehicle:      self.vehicle,
      plate_number: self.plate_number,
      rating:       self.rating,
      total_trips:  self.total_trips,
      photo:        self.photo,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_are_fixed_width() {
    let whole = DateTime::parse_from_rfc3339("2024-05-01T08:00:00Z").unwrap().with_timezone(&Utc);
    let frac = DateTime::parse_from_rfc3339("2024-05-01T08:00:00.5Z").unwrap().with_timezone(&Utc);
    assert_eq!(encode_dt(whole).len(), encode_dt(frac).len());
    assert!(encode_dt(whole) < encode_dt(frac));
    assert_eq!(decode_dt(&encode_dt(frac)).unwrap(), frac);
  }

  #[test]
  fn status_column_matches_wire_name() {
    for status in [RideStatus::Requested, RideStatus::PickedUp, RideStatus::Cancelled] {
      assert_eq!(encode_status(status), status.as_ref());
      assert_eq!(decode_status(encode_status(status)).unwrap(), status);
    }
    assert!(matches!(decode_status("lost"), Err(Error::Corrupt { .. })));
  }
}

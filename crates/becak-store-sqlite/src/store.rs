//! [`SqliteStore`] — the SQLite implementation of [`RideStore`] and
//! [`DriverProfiles`].

use std::path::Path;

use becak_core::{
  lifecycle::RideStatus,
  profile::{DriverProfile, DriverProfiles},
  ride::{NewRide, Ride},
  store::{CasOutcome, RideStore},
};
use chrono::{SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    RIDE_COLUMNS, RawDriver, RawRide, decode_status, encode_dt, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Becak ride store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Conditional update result before decoding.
enum RawCas {
  Applied(RawRide),
  Conflict(String),
  Missing,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or replace a driver's display profile.
  pub async fn put_driver(&self, profile: DriverProfile) -> Result<()> {
    let id_str = encode_uuid(profile.id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO drivers (
             driver_id, name, phone, vehicle, plate_number, rating, total_trips, photo
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT (driver_id) DO UPDATE SET
             name = excluded.name,
             phone = excluded.phone,
             vehicle = excluded.vehicle,
             plate_number = excluded.plate_number,
             rating = excluded.rating,
             total_trips = excluded.total_trips,
             photo = excluded.photo",
          rusqlite::params![
            id_str,
            profile.name,
            profile.phone,
            profile.vehicle,
            profile.plate_number,
            profile.rating,
            profile.total_trips,
            profile.photo,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a ride `SELECT` whose filter takes at most one text parameter.
  async fn query_rides(&self, filter: &'static str, param: Option<String>) -> Result<Vec<Ride>> {
    let sql = format!("SELECT {RIDE_COLUMNS} FROM rides {filter}");

    let raws: Vec<RawRide> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = match param {
          Some(p) => stmt
            .query_map(rusqlite::params![p], RawRide::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => stmt
            .query_map([], RawRide::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRide::into_ride).collect()
  }
}

// ─── RideStore impl ──────────────────────────────────────────────────────────

impl RideStore for SqliteStore {
  type Error = crate::Error;

  async fn create(&self, input: NewRide) -> Result<Ride> {
    // Truncated to the stored precision so the returned snapshot equals a re-read.
    let now = Utc::now().trunc_subsecs(6);
    let ride = Ride {
      ride_id:      Uuid::new_v4(),
      passenger_id: input.passenger_id,
      driver_id:    None,
      pickup:       input.pickup,
      dropoff:      input.dropoff,
      status:       RideStatus::Requested,
      price:        input.price,
      app_fee:      input.app_fee,
      distance_km:  input.distance_km,
      created_at:   now,
      updated_at:   now,
    };

    let ride_id_str      = encode_uuid(ride.ride_id);
    let passenger_id_str = encode_uuid(ride.passenger_id);
    let pickup           = ride.pickup.clone();
    let dropoff          = ride.dropoff.clone();
    let status_str       = encode_status(ride.status);
    let at_str           = encode_dt(now);
    let (price, app_fee, distance_km) = (ride.price, ride.app_fee, ride.distance_km);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO rides (
             ride_id, passenger_id, driver_id,
             pickup_lat, pickup_lon, pickup_address,
             dropoff_lat, dropoff_lon, dropoff_address,
             status, price, app_fee, distance_km, created_at, updated_at
           ) VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
          rusqlite::params![
            ride_id_str,
            passenger_id_str,
            pickup.lat,
            pickup.lon,
            pickup.address,
            dropoff.lat,
            dropoff.lon,
            dropoff.address,
            status_str,
            price,
            app_fee,
            distance_km,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(ride)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Ride>> {
    let id_str = encode_uuid(id);
    let sql = format!("SELECT {RIDE_COLUMNS} FROM rides WHERE ride_id = ?1");

    let raw: Option<RawRide> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawRide::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRide::into_ride).transpose()
  }

  async fn list_all(&self) -> Result<Vec<Ride>> {
    self.query_rides("ORDER BY created_at DESC, rowid DESC", None).await
  }

  async fn list_by_status(&self, status: RideStatus) -> Result<Vec<Ride>> {
    self
      .query_rides(
        "WHERE status = ?1 ORDER BY created_at ASC, rowid ASC",
        Some(encode_status(status).to_owned()),
      )
      .await
  }

  async fn list_by_driver(&self, driver_id: Uuid) -> Result<Vec<Ride>> {
    self
      .query_rides(
        "WHERE driver_id = ?1 ORDER BY created_at DESC, rowid DESC",
        Some(encode_uuid(driver_id)),
      )
      .await
  }

  async fn list_by_passenger(&self, passenger_id: Uuid) -> Result<Vec<Ride>> {
    self
      .query_rides(
        "WHERE passenger_id = ?1 ORDER BY created_at DESC, rowid DESC",
        Some(encode_uuid(passenger_id)),
      )
      .await
  }

  async fn conditional_update_status(
    &self,
    id:        Uuid,
    expected:  RideStatus,
    new:       RideStatus,
    driver_id: Option<Uuid>,
  ) -> Result<CasOutcome> {
    let id_str       = encode_uuid(id);
    let expected_str = encode_status(expected);
    let new_str      = encode_status(new);
    let driver_str   = driver_id.map(encode_uuid);
    let at_str       = encode_dt(Utc::now().trunc_subsecs(6));
    let sql = format!(
      "UPDATE rides SET status = ?1, driver_id = ?2, updated_at = ?3
       WHERE ride_id = ?4 AND status = ?5
       RETURNING {RIDE_COLUMNS}"
    );

    let raw: RawCas = self
      .conn
      .call(move |conn| {
        let updated = conn
          .query_row(
            &sql,
            rusqlite::params![new_str, driver_str, at_str, id_str, expected_str],
            RawRide::from_row,
          )
          .optional()?;
        if let Some(row) = updated {
          return Ok(RawCas::Applied(row));
        }

        // Nothing matched: the ride is missing or in another status.
        let current: Option<String> = conn
          .query_row(
            "SELECT status FROM rides WHERE ride_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        Ok(match current {
          Some(status) => RawCas::Conflict(status),
          None => RawCas::Missing,
        })
      })
      .await?;

    Ok(match raw {
      RawCas::Applied(row) => CasOutcome::Applied(row.into_ride()?),
      RawCas::Conflict(status) => CasOutcome::Conflict(decode_status(&status)?),
      RawCas::Missing => CasOutcome::Missing,
    })
  }
}

// ─── DriverProfiles impl ─────────────────────────────────────────────────────

impl DriverProfiles for SqliteStore {
  type Error = crate::Error;

  async fn profile(&self, driver_id: Uuid) -> Result<Option<DriverProfile>> {
    let id_str = encode_uuid(driver_id);

    let raw: Option<RawDriver> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT driver_id, name, phone, vehicle, plate_number, rating, total_trips, photo
               FROM drivers WHERE driver_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawDriver {
                  driver_id:    row.get(0)?,
                  name:         row.get(1)?,
                  phone:        row.get(2)?,
                  vehicle:      row.get(3)?,
                  plate_number: row.get(4)?,
                  rating:       row.get(5)?,
                  total_trips:  row.get(6)?,
                  photo:        row.get(7)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDriver::into_profile).transpose()
  }
}

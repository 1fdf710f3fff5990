//! The ride state machine.
//!
//! [`RideMachine`] validates operations and applies them to a [`RideStore`].
//! It publishes nothing; notifying subscribers is the caller's job once a
//! transition has committed.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  geo::{AddressResolver, Leg, Resolution, UNRESOLVED_ADDRESS},
  lifecycle::RideStatus,
  pricing::Tariff,
  ride::{Coordinates, NewRide, Place, Ride, RideRequest},
  store::{CasOutcome, RideStore},
};

/// A committed (or idempotently repeated) status change.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
  /// Snapshot after the change.
  pub ride:      Ride,
  pub previous:  RideStatus,
  /// The driver involved: bound after the change, or released by a cancel.
  pub driver_id: Option<Uuid>,
  /// `false` when the ride was already in the target status.
  pub applied:   bool,
}

pub struct RideMachine<S, A> {
  store:    Arc<S>,
  resolver: Arc<A>,
  tariff:   Tariff,
}

impl<S, A> RideMachine<S, A>
where
  S: RideStore,
  A: AddressResolver,
{
  pub fn new(store: Arc<S>, resolver: Arc<A>, tariff: Tariff) -> Self {
    Self { store, resolver, tariff }
  }

  pub fn tariff(&self) -> Tariff { self.tariff }

  // ── Mutations ─────────────────────────────────────────────────────────

  /// Validate a trip request, price it, resolve both addresses and persist
  /// the ride in `requested`.
  pub async fn request_ride(&self, request: RideRequest) -> Result<Ride> {
    let pickup_at = request.pickup.validate("pickup")?;
    let dropoff_at = request.dropoff.validate("dropoff")?;
    let fare = self.tariff.quote(request.distance_km)?;

    let pickup = self.place(Leg::Pickup, pickup_at).await?;
    let dropoff = self.place(Leg::Dropoff, dropoff_at).await?;

    self
      .store
      .create(NewRide {
        passenger_id: request.passenger_id,
        pickup,
        dropoff,
        price: fare.price,
        app_fee: fare.app_fee,
        distance_km: request.distance_km,
      })
      .await
      .map_err(Error::store)
  }

  /// Bind `driver_id` to a `requested` ride.
  ///
  /// The status check and the write are one conditional update in the
  /// store, so of many concurrent callers exactly one succeeds and the rest
  /// get [`Error::AlreadyTaken`].
  pub async fn accept_ride(&self, ride_id: Uuid, driver_id: Uuid) -> Result<StatusChange> {
    let outcome = self
      .store
      .conditional_update_status(
        ride_id,
        RideStatus::Requested,
        RideStatus::Accepted,
        Some(driver_id),
      )
      .await
      .map_err(Error::store)?;

    match outcome {
      CasOutcome::Applied(ride) => Ok(StatusChange {
        ride,
        previous: RideStatus::Requested,
        driver_id: Some(driver_id),
        applied: true,
      }),
      CasOutcome::Conflict(status) => Err(Error::AlreadyTaken { ride_id, status }),
      CasOutcome::Missing => Err(Error::NotFound(ride_id)),
    }
  }

  /// Move a ride along the lifecycle graph.
  ///
  /// Moving to `accepted` is [`accept_ride`](Self::accept_ride), except that
  /// a ride already past `accepted` reports an invalid transition. Repeating
  /// the current status is a no-op reported with `applied: false`. Rides
  /// with a bound driver only accept changes naming that driver.
  pub async fn update_status(
    &self,
    ride_id: Uuid,
    next: RideStatus,
    driver_id: Option<Uuid>,
  ) -> Result<StatusChange> {
    if next == RideStatus::Accepted {
      let driver_id = driver_id.ok_or_else(|| {
        Error::Validation("accepting a ride requires a driver_id".to_owned())
      })?;
      // Only a competing accept is a race loss; any other status means the
      // move itself is illegal.
      return match self.accept_ride(ride_id, driver_id).await {
        Err(Error::AlreadyTaken { status, .. }) if status != RideStatus::Accepted => {
          Err(Error::InvalidTransition { from: status, to: next })
        }
        other => other,
      };
    }

    // A lost race means someone else moved the ride forward. The graph is
    // acyclic, so re-evaluating against the fresh snapshot terminates.
    loop {
      let ride = self.get(ride_id).await?;
      check_driver(&ride, driver_id)?;

      if ride.status == next {
        return Ok(StatusChange {
          driver_id: ride.driver_id,
          previous: ride.status,
          applied: false,
          ride,
        });
      }
      if !ride.status.can_transition_to(next) {
        return Err(Error::InvalidTransition { from: ride.status, to: next });
      }

      let bound = if next.requires_driver() { ride.driver_id } else { None };
      let outcome = self
        .store
        .conditional_update_status(ride_id, ride.status, next, bound)
        .await
        .map_err(Error::store)?;

      match outcome {
        CasOutcome::Applied(updated) => {
          return Ok(StatusChange {
            ride:      updated,
            previous:  ride.status,
            driver_id: ride.driver_id,
            applied:   true,
          });
        }
        CasOutcome::Conflict(_) => continue,
        CasOutcome::Missing => return Err(Error::NotFound(ride_id)),
      }
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub async fn get(&self, ride_id: Uuid) -> Result<Ride> {
    self
      .store
      .get(ride_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(ride_id))
  }

  /// Rides waiting for a driver, oldest first.
  pub async fn available(&self) -> Result<Vec<Ride>> {
    self.store.list_by_status(RideStatus::Requested).await.map_err(Error::store)
  }

  pub async fn all(&self) -> Result<Vec<Ride>> {
    self.store.list_all().await.map_err(Error::store)
  }

  pub async fn by_driver(&self, driver_id: Uuid) -> Result<Vec<Ride>> {
    self.store.list_by_driver(driver_id).await.map_err(Error::store)
  }

  pub async fn by_passenger(&self, passenger_id: Uuid) -> Result<Vec<Ride>> {
    self.store.list_by_passenger(passenger_id).await.map_err(Error::store)
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  async fn place(&self, leg: Leg, at: Coordinates) -> Result<Place> {
    match self.resolver.resolve(at).await {
      Resolution::Address(address) if self.resolver.in_service_area(&address) => {
        Ok(Place::new(at, address))
      }
      Resolution::Address(address) => Err(Error::OutOfServiceArea { leg, address }),
      Resolution::Unresolvable => Ok(Place::new(at, UNRESOLVED_ADDRESS)),
    }
  }
}

/// A ride with a bound driver may only be moved by that driver.
fn check_driver(ride: &Ride, driver_id: Option<Uuid>) -> Result<()> {
  let Some(bound) = ride.driver_id else {
    return Ok(());
  };
  match driver_id {
    Some(id) if id == bound => Ok(()),
    Some(id) => Err(Error::Validation(format!(
      "driver {id} is not assigned to ride {}",
      ride.ride_id
    ))),
    None => Err(Error::Validation(format!(
      "ride {} has an assigned driver; driver_id is required",
      ride.ride_id
    ))),
  }
}

//! The ride service facade.
//!
//! Each operation runs the state machine to completion against the store and
//! only then publishes the resulting events. A committed transition is never
//! undone by a failed notification; undelivered notifications come back as
//! warnings in [`Committed::delivery`].

use std::sync::Arc;

use becak_core::{
  Result,
  event::Event,
  geo::AddressResolver,
  lifecycle::RideStatus,
  machine::{RideMachine, StatusChange},
  pricing::Tariff,
  profile::{DriverProfile, DriverProfiles, ProfileSource, resolve_profile},
  ride::{Ride, RideRequest},
  store::RideStore,
};
use becak_notify::{DeliveryReport, Dispatcher, SubscriptionRegistry};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// The outcome of a committed operation and what its notifications did.
#[derive(Debug, Clone)]
pub struct Committed<T> {
  pub value:    T,
  pub delivery: DeliveryReport,
}

/// An accepted ride together with the profile shown to the passenger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedRide {
  pub ride:   Ride,
  pub driver: DriverProfile,
}

pub struct RideService<S, A> {
  machine:    RideMachine<S, A>,
  store:      Arc<S>,
  dispatcher: Arc<Dispatcher>,
}

impl<S, A> RideService<S, A>
where
  S: RideStore + DriverProfiles,
  A: AddressResolver,
{
  pub fn new(store: Arc<S>, resolver: Arc<A>, tariff: Tariff, dispatcher: Arc<Dispatcher>) -> Self {
    Self {
      machine: RideMachine::new(Arc::clone(&store), resolver, tariff),
      store,
      dispatcher,
    }
  }

  pub fn registry(&self) -> &Arc<SubscriptionRegistry> { self.dispatcher.registry() }

  // ── Mutations ─────────────────────────────────────────────────────────

  pub async fn request_ride(&self, request: RideRequest) -> Result<Committed<Ride>> {
    let ride = self.machine.request_ride(request).await?;
    info!(
      ride_id = %ride.ride_id,
      passenger_id = %ride.passenger_id,
      price = ride.price,
      "ride requested"
    );

    let delivery =
      self.publish(&[Event::NewRideRequested { ride: ride.clone() }]).await;
    Ok(Committed { value: ride, delivery })
  }

  pub async fn accept_ride(&self, ride_id: Uuid, driver_id: Uuid) -> Result<Committed<AcceptedRide>> {
    let change = self.machine.accept_ride(ride_id, driver_id).await?;
    info!(%ride_id, %driver_id, "ride accepted");

    let driver = self.driver_profile(driver_id).await;
    let delivery = self.publish(&accept_events(&change.ride, &driver)).await;
    Ok(Committed { value: AcceptedRide { ride: change.ride, driver }, delivery })
  }

  pub async fn update_status(
    &self,
    ride_id: Uuid,
    status: RideStatus,
    driver_id: Option<Uuid>,
  ) -> Result<Committed<StatusChange>> {
    let change = self.machine.update_status(ride_id, status, driver_id).await?;
    if !change.applied {
      info!(%ride_id, %status, "status unchanged");
      return Ok(Committed { value: change, delivery: DeliveryReport::default() });
    }
    info!(%ride_id, from = %change.previous, to = %status, "ride status updated");

    let events = if let (RideStatus::Accepted, Some(driver_id)) = (status, change.driver_id) {
      let driver = self.driver_profile(driver_id).await;
      accept_events(&change.ride, &driver)
    } else {
      let mut events = vec![Event::RideStatusUpdated {
        ride_id,
        passenger_id: change.ride.passenger_id,
        status,
        driver_id: change.driver_id,
      }];
      // Browsing drivers still list a ride cancelled before anyone took it.
      if change.previous == RideStatus::Requested {
        events.push(Event::RideNoLongerAvailable { ride_id });
      }
      events
    };

    let delivery = self.publish(&events).await;
    Ok(Committed { value: change, delivery })
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub async fn get(&self, ride_id: Uuid) -> Result<Ride> { self.machine.get(ride_id).await }

  pub async fn available(&self) -> Result<Vec<Ride>> { self.machine.available().await }

  pub async fn all(&self) -> Result<Vec<Ride>> { self.machine.all().await }

  pub async fn by_driver(&self, driver_id: Uuid) -> Result<Vec<Ride>> {
    self.machine.by_driver(driver_id).await
  }

  pub async fn by_passenger(&self, passenger_id: Uuid) -> Result<Vec<Ride>> {
    self.machine.by_passenger(passenger_id).await
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  async fn driver_profile(&self, driver_id: Uuid) -> DriverProfile {
    let (profile, source) = resolve_profile(self.store.as_ref(), driver_id).await;
    match source {
      ProfileSource::Found => {}
      ProfileSource::Missing => info!(%driver_id, "no driver profile, using placeholder"),
      ProfileSource::Failed(e) => {
        warn!(%driver_id, error = %e, "driver profile lookup failed, using placeholder")
      }
    }
    profile
  }

  async fn publish(&self, events: &[Event]) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for event in events {
      report.merge(self.dispatcher.publish(event).await);
    }
    if !report.is_clean() {
      warn!(
        failed = report.failures.len(),
        delivered = report.delivered,
        "committed with undelivered notifications"
      );
    }
    report
  }
}

fn accept_events(ride: &Ride, driver: &DriverProfile) -> Vec<Event> {
  vec![
    Event::RideAccepted { ride: ride.clone(), driver: driver.clone() },
    Event::RideNoLongerAvailable { ride_id: ride.ride_id },
  ]
}

//! Notification frames and the event routing table.

use becak_core::{channel::Channel, event::Event};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Client-facing event name of a [`Notification`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
  NewRideRequest,
  RideAccepted,
  RideAcceptedStartNavigation,
  RideNoLongerAvailable,
  RideStatusUpdated,
}

/// One frame pushed to the members of a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub channel: Channel,
  pub event:   NotificationKind,
  pub data:    Value,
}

impl Notification {
  fn new(channel: Channel, event: NotificationKind, data: Value) -> Self {
    Self { channel, event, data }
  }
}

/// Expand `event` into its publications, one per target channel.
///
/// | Event                   | Channels                                   |
/// |-------------------------|--------------------------------------------|
/// | `NewRideRequested`      | `broadcast`                                |
/// | `RideAccepted`          | `passenger:<id>`, `driver:<id>`            |
/// | `RideNoLongerAvailable` | `broadcast`                                |
/// | `RideStatusUpdated`     | `broadcast`, plus `driver:<id>` when bound |
pub fn route(event: &Event) -> Vec<Notification> {
  use NotificationKind::*;

  match event {
    Event::NewRideRequested { ride } => {
      vec![Notification::new(Channel::Broadcast, NewRideRequest, json!(ride))]
    }
    Event::RideAccepted { ride, driver } => vec![
      Notification::new(
        Channel::Passenger(ride.passenger_id),
        RideAccepted,
        json!({
          "ride_id": ride.ride_id,
          "driver_id": driver.id,
          "status": ride.status,
          "driver": driver,
        }),
      ),
      Notification::new(
        Channel::Driver(driver.id),
        RideAcceptedStartNavigation,
        json!({ "ride_id": ride.ride_id, "ride": ride }),
      ),
    ],
    Event::RideNoLongerAvailable { ride_id } => vec![Notification::new(
      Channel::Broadcast,
      RideNoLongerAvailable,
      json!({ "ride_id": ride_id }),
    )],
    Event::RideStatusUpdated { ride_id, passenger_id, status, driver_id } => {
      let mut out = vec![Notification::new(
        Channel::Broadcast,
        RideStatusUpdated,
        json!({
          "ride_id": ride_id,
          "passenger_id": passenger_id,
          "status": status,
          "driver_id": driver_id,
        }),
      )];
      if let Some(driver_id) = driver_id {
        out.push(Notification::new(
          Channel::Driver(*driver_id),
          RideStatusUpdated,
          json!({ "ride_id": ride_id, "status": status }),
        ));
      }
      out
    }
  }
}

#[cfg(test)]
mod tests {
  use becak_core::{
    lifecycle::RideStatus,
    profile::DriverProfile,
    ride::{Place, Ride},
  };
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn ride(status: RideStatus, driver_id: Option<Uuid>) -> Ride {
    let now = Utc::now();
    Ride {
      ride_id: Uuid::new_v4(),
      passenger_id: Uuid::new_v4(),
      driver_id,
      pickup: Place { lat: 5.18, lon: 97.14, address: "Jl. Merdeka, Lhokseumawe".to_owned() },
      dropoff: Place { lat: 5.2, lon: 97.16, address: "Pasar Inpres, Lhokseumawe".to_owned() },
      status,
      price: 7_000,
      app_fee: 700,
      distance_km: 2.5,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn new_requests_go_to_broadcast() {
    let ride = ride(RideStatus::Requested, None);
    let out = route(&Event::NewRideRequested { ride: ride.clone() });
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].channel, Channel::Broadcast);
    assert_eq!(out[0].event, NotificationKind::NewRideRequest);
    assert_eq!(out[0].data["ride_id"], json!(ride.ride_id));
  }

  #[test]
  fn accept_targets_passenger_and_driver_only() {
    let driver_id = Uuid::new_v4();
    let ride = ride(RideStatus::Accepted, Some(driver_id));
    let driver = DriverProfile::placeholder(driver_id);
    let out = route(&Event::RideAccepted { ride: ride.clone(), driver });

    let channels: Vec<_> = out.iter().map(|n| n.channel).collect();
    assert_eq!(channels, vec![Channel::Passenger(ride.passenger_id), Channel::Driver(driver_id)]);

    assert_eq!(out[0].event, NotificationKind::RideAccepted);
    assert_eq!(out[0].data["status"], "accepted");
    assert_eq!(out[0].data["driver"]["name"], "Driver");
    assert_eq!(out[1].event, NotificationKind::RideAcceptedStartNavigation);
    assert_eq!(out[1].data["ride"]["driver_id"], json!(driver_id));
  }

  #[test]
  fn status_updates_reach_the_bound_driver_as_well() {
    let driver_id = Uuid::new_v4();
    let event = Event::RideStatusUpdated {
      ride_id: Uuid::new_v4(),
      passenger_id: Uuid::new_v4(),
      status: RideStatus::PickedUp,
      driver_id: Some(driver_id),
    };
    let channels: Vec<_> = route(&event).into_iter().map(|n| n.channel).collect();
    assert_eq!(channels, vec![Channel::Broadcast, Channel::Driver(driver_id)]);

    let unbound = Event::RideStatusUpdated {
      ride_id: Uuid::new_v4(),
      passenger_id: Uuid::new_v4(),
      status: RideStatus::Cancelled,
      driver_id: None,
    };
    assert_eq!(route(&unbound).len(), 1);
  }

  #[test]
  fn frame_shape() {
    let ride_id = Uuid::new_v4();
    let out = route(&Event::RideNoLongerAvailable { ride_id });
    let frame = serde_json::to_value(&out[0]).unwrap();
    assert_eq!(
      frame,
      json!({
        "channel": "broadcast",
        "event": "ride_no_longer_available",
        "data": { "ride_id": ride_id },
      })
    );
  }
}

//! Lifecycle events published after a ride transition commits.
//!
//! Events are ephemeral: they are built from the committed snapshot, handed
//! to the notification layer, and dropped.

use serde::Serialize;
use uuid::Uuid;

use crate::{lifecycle::RideStatus, profile::DriverProfile, ride::Ride};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
  NewRideRequested {
    ride: Ride,
  },
  RideAccepted {
    ride:   Ride,
    driver: DriverProfile,
  },
  RideNoLongerAvailable {
    ride_id: Uuid,
  },
  RideStatusUpdated {
    ride_id:      Uuid,
    passenger_id: Uuid,
    status:       RideStatus,
    /// The driver bound to the ride, or the one just released by a cancel.
    driver_id:    Option<Uuid>,
  },
}

impl Event {
  pub fn ride_id(&self) -> Uuid {
    match self {
      Self::NewRideRequested { ride } | Self::RideAccepted { ride, .. } => ride.ride_id,
      Self::RideNoLongerAvailable { ride_id } | Self::RideStatusUpdated { ride_id, .. } => {
        *ride_id
      }
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      Self::NewRideRequested { .. } => "new_ride_requested",
      Self::RideAccepted { .. } => "ride_accepted",
      Self::RideNoLongerAvailable { .. } => "ride_no_longer_available",
      Self::RideStatusUpdated { .. } => "ride_status_updated",
    }
  }
}

//! Ride lifecycle states and the transition graph between them.
//!
//! ```text
//! requested ──> accepted ──> picked_up ──> completed
//!     │             │
//!     └──> cancelled <┘
//! ```
//!
//! `completed` and `cancelled` are terminal. There are no edges back into
//! `requested`, so the graph is acyclic and every status change is forward
//! progress.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RideStatus {
  Requested,
  Accepted,
  PickedUp,
  Completed,
  Cancelled,
}

impl RideStatus {
  /// Whether `self -> next` is an edge of the lifecycle graph.
  pub fn can_transition_to(self, next: Self) -> bool {
    use RideStatus::*;
    matches!(
      (self, next),
      (Requested, Accepted)
        | (Accepted, PickedUp)
        | (PickedUp, Completed)
        | (Requested, Cancelled)
        | (Accepted, Cancelled)
    )
  }

  pub fn is_terminal(self) -> bool { matches!(self, Self::Completed | Self::Cancelled) }

  /// Statuses in which a ride must have a bound driver, and no others.
  pub fn requires_driver(self) -> bool {
    matches!(self, Self::Accepted | Self::PickedUp | Self::Completed)
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use strum::IntoEnumIterator as _;

  use super::RideStatus::{self, *};

  const EDGES: [(RideStatus, RideStatus); 5] = [
    (Requested, Accepted),
    (Accepted, PickedUp),
    (PickedUp, Completed),
    (Requested, Cancelled),
    (Accepted, Cancelled),
  ];

  #[test]
  fn only_lifecycle_edges_are_allowed() {
    for from in RideStatus::iter() {
      for to in RideStatus::iter() {
        let expected = EDGES.contains(&(from, to));
        assert_eq!(from.can_transition_to(to), expected, "{from} -> {to}");
      }
    }
  }

  #[test]
  fn terminal_states_have_no_exits() {
    for status in [Completed, Cancelled] {
      assert!(status.is_terminal());
      assert!(RideStatus::iter().all(|to| !status.can_transition_to(to)));
    }
  }

  #[test]
  fn wire_names_are_snake_case() {
    assert_eq!(PickedUp.as_ref(), "picked_up");
    assert_eq!(RideStatus::from_str("picked_up").unwrap(), PickedUp);
    assert_eq!(serde_json::to_string(&Cancelled).unwrap(), "\"cancelled\"");
    assert!(RideStatus::from_str("on_the_way").is_err());
  }
}

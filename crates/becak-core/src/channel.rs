//! Logical notification addresses.
//!
//! Channels are never persisted; they only key the subscription registry.
//! The string form (`passenger:<id>`, `driver:<id>`, `broadcast`) is what
//! clients send when joining.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
  Passenger(Uuid),
  Driver(Uuid),
  /// Every connected endpoint.
  Broadcast,
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Passenger(id) => write!(f, "passenger:{id}"),
      Self::Driver(id) => write!(f, "driver:{id}"),
      Self::Broadcast => f.write_str("broadcast"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid channel name: {0:?}")]
pub struct ParseChannelError(pub String);

impl FromStr for Channel {
  type Err = ParseChannelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s == "broadcast" {
      return Ok(Self::Broadcast);
    }
    let invalid = || ParseChannelError(s.to_owned());
    let (kind, id) = s.split_once(':').ok_or_else(invalid)?;
    let id = Uuid::parse_str(id).map_err(|_| invalid())?;
    match kind {
      "passenger" => Ok(Self::Passenger(id)),
      "driver" => Ok(Self::Driver(id)),
      _ => Err(invalid()),
    }
  }
}

impl Serialize for Channel {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Channel {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_and_parse_agree() {
    let id = Uuid::new_v4();
    for channel in [Channel::Passenger(id), Channel::Driver(id), Channel::Broadcast] {
      assert_eq!(channel.to_string().parse::<Channel>().unwrap(), channel);
    }
  }

  #[test]
  fn rejects_unknown_kinds_and_bad_ids() {
    assert!("rider:6f1c0d3e-2b8a-4c39-9d39-2a9b1b7e0f11".parse::<Channel>().is_err());
    assert!("driver:42".parse::<Channel>().is_err());
    assert!("driver".parse::<Channel>().is_err());
  }
}

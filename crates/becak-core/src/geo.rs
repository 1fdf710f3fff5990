//! Address resolution collaborator and the service-area predicate.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};

use crate::ride::Coordinates;

/// Address text stored when a location could not be resolved.
pub const UNRESOLVED_ADDRESS: &str = "Address not found";

/// Which end of the trip a location belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
  Pickup,
  Dropoff,
}

impl fmt::Display for Leg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Pickup => "pickup",
      Self::Dropoff => "dropoff",
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  Address(String),
  /// The lookup failed or returned nothing usable.
  Unresolvable,
}

/// Reverse-geocodes coordinates and decides whether an address is served.
pub trait AddressResolver: Send + Sync {
  fn resolve(&self, at: Coordinates) -> impl Future<Output = Resolution> + Send + '_;

  fn in_service_area(&self, address: &str) -> bool;
}

/// A set of region names; an address is served if it mentions any of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceArea {
  regions: Vec<String>,
}

impl ServiceArea {
  pub fn new<I, S>(regions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self { regions: regions.into_iter().map(Into::into).collect() }
  }

  /// An empty area serves everywhere.
  pub fn contains(&self, address: &str) -> bool {
    self.regions.is_empty() || self.regions.iter().any(|r| address.contains(r.as_str()))
  }

  pub fn regions(&self) -> &[String] { &self.regions }
}

impl Default for ServiceArea {
  fn default() -> Self { Self::new(["Lhokseumawe", "Aceh Utara"]) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_area_matches_region_names() {
    let area = ServiceArea::default();
    assert!(area.contains("Jalan Merdeka, Banda Sakti, Lhokseumawe, Aceh, Indonesia"));
    assert!(area.contains("Lhoksukon, Aceh Utara, Aceh"));
    assert!(!area.contains("Kuta Alam, Banda Aceh, Aceh, Indonesia"));
  }

  #[test]
  fn empty_area_serves_everywhere() {
    assert!(ServiceArea::new(Vec::<String>::new()).contains("anywhere"));
  }
}

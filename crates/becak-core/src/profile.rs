//! Driver display profiles and their lookup collaborator.
//!
//! Profile enrichment is best-effort: [`resolve_profile`] is the single call
//! site used by the accept flow, and it always yields a profile.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverProfile {
  pub id:           Uuid,
  pub name:         String,
  pub phone:        String,
  pub vehicle:      String,
  pub plate_number: String,
  pub rating:       f64,
  pub total_trips:  i64,
  pub photo:        Option<String>,
}

impl DriverProfile {
  /// Stand-in shown to the passenger when the real profile is unavailable.
  pub fn placeholder(id: Uuid) -> Self {
    Self {
      id,
      name: "Driver".to_owned(),
      phone: String::new(),
      vehicle: "Motor".to_owned(),
      plate_number: String::new(),
      rating: 5.0,
      total_trips: 0,
      photo: None,
    }
  }
}

pub trait DriverProfiles: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Returns `None` if no profile is registered for `driver_id`.
  fn profile(
    &self,
    driver_id: Uuid,
  ) -> impl Future<Output = Result<Option<DriverProfile>, Self::Error>> + Send + '_;
}

/// How a profile returned by [`resolve_profile`] was obtained.
#[derive(Debug)]
pub enum ProfileSource {
  Found,
  Missing,
  Failed(Box<dyn std::error::Error + Send + Sync>),
}

impl ProfileSource {
  pub fn is_found(&self) -> bool { matches!(self, Self::Found) }
}

/// Look up a driver's profile, falling back to
/// [`DriverProfile::placeholder`] on absence or error.
pub async fn resolve_profile<P>(profiles: &P, driver_id: Uuid) -> (DriverProfile, ProfileSource)
where
  P: DriverProfiles + ?Sized,
{
  match profiles.profile(driver_id).await {
    Ok(Some(profile)) => (profile, ProfileSource::Found),
    Ok(None) => (DriverProfile::placeholder(driver_id), ProfileSource::Missing),
    Err(e) => (DriverProfile::placeholder(driver_id), ProfileSource::Failed(Box::new(e))),
  }
}

#[cfg(test)]
mod tests {
  use std::convert::Infallible;

  use super::*;

  struct Broken;

  #[derive(Debug, thiserror::Error)]
  #[error("directory offline")]
  struct Offline;

  impl DriverProfiles for Broken {
    type Error = Offline;

    async fn profile(&self, _: Uuid) -> Result<Option<DriverProfile>, Offline> { Err(Offline) }
  }

  struct Empty;

  impl DriverProfiles for Empty {
    type Error = Infallible;

    async fn profile(&self, _: Uuid) -> Result<Option<DriverProfile>, Infallible> { Ok(None) }
  }

  #[tokio::test]
  async fn lookup_failure_falls_back_to_placeholder() {
    let id = Uuid::new_v4();
    let (profile, source) = resolve_profile(&Broken, id).await;
    assert_eq!(profile, DriverProfile::placeholder(id));
    assert!(matches!(source, ProfileSource::Failed(_)));
  }

  #[tokio::test]
  async fn missing_profile_falls_back_to_placeholder() {
    let id = Uuid::new_v4();
    let (profile, source) = resolve_profile(&Empty, id).await;
    assert_eq!(profile.name, "Driver");
    assert_eq!(profile.rating, 5.0);
    assert!(matches!(source, ProfileSource::Missing));
  }
}

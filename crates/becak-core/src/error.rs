//! Error types for `becak-core`.
//!
//! Every state-machine failure is one of these variants. Callers match on the
//! variant to tell an accept-race loser apart from a malformed request or a
//! storage outage.

use thiserror::Error;
use uuid::Uuid;

use crate::{geo::Leg, lifecycle::RideStatus};

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed input; nothing was written.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("{leg} location is outside the service area: {address}")]
  OutOfServiceArea { leg: Leg, address: String },

  #[error("ride not found: {0}")]
  NotFound(Uuid),

  /// Lost the accept race: the ride left `requested` before our update.
  #[error("ride {ride_id} is no longer available (status: {status})")]
  AlreadyTaken { ride_id: Uuid, status: RideStatus },

  #[error("cannot move ride from {from} to {to}")]
  InvalidTransition { from: RideStatus, to: RideStatus },

  /// I/O failure against the ride store. Safe for the caller to retry.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Stable snake_case name of the error kind, for wire responses.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Validation(_) => "validation",
      Self::OutOfServiceArea { .. } => "out_of_service_area",
      Self::NotFound(_) => "not_found",
      Self::AlreadyTaken { .. } => "already_taken",
      Self::InvalidTransition { .. } => "invalid_transition",
      Self::Store(_) => "store",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

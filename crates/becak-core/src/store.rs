//! The `RideStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `becak-store-sqlite`).
//! The state machine depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  lifecycle::RideStatus,
  ride::{NewRide, Ride},
};

/// Result of [`RideStore::conditional_update_status`].
#[derive(Debug, Clone, PartialEq)]
pub enum CasOutcome {
  /// The ride was in the expected status and now holds the new one.
  Applied(Ride),
  /// The ride exists but was not in the expected status; nothing changed.
  Conflict(RideStatus),
  /// No ride has this identifier.
  Missing,
}

/// Abstraction over a durable ride store.
///
/// Rides are never deleted. The only mutation after creation is
/// [`conditional_update_status`](Self::conditional_update_status), which must
/// be atomic: two concurrent calls with the same `expected` status can never
/// both be applied.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RideStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new ride in `requested` status. The store assigns the id and
  /// both timestamps.
  fn create(&self, ride: NewRide) -> impl Future<Output = Result<Ride, Self::Error>> + Send + '_;

  /// Retrieve a ride by id. Returns `None` if not found.
  fn get(&self, id: Uuid) -> impl Future<Output = Result<Option<Ride>, Self::Error>> + Send + '_;

  /// All rides, newest first.
  fn list_all(&self) -> impl Future<Output = Result<Vec<Ride>, Self::Error>> + Send + '_;

  /// Rides in `status`, oldest first.
  fn list_by_status(
    &self,
    status: RideStatus,
  ) -> impl Future<Output = Result<Vec<Ride>, Self::Error>> + Send + '_;

  /// Rides bound to `driver_id`, newest first.
  fn list_by_driver(
    &self,
    driver_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Ride>, Self::Error>> + Send + '_;

  /// Rides requested by `passenger_id`, newest first.
  fn list_by_passenger(
    &self,
    passenger_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Ride>, Self::Error>> + Send + '_;

  /// Compare-and-swap on status: if the ride is in `expected`, set it to
  /// `new`, write `driver_id` verbatim into the driver reference and bump
  /// `updated_at`.
  fn conditional_update_status(
    &self,
    id: Uuid,
    expected: RideStatus,
    new: RideStatus,
    driver_id: Option<Uuid>,
  ) -> impl Future<Output = Result<CasOutcome, Self::Error>> + Send + '_;
}

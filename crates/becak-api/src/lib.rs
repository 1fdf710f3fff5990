//! HTTP surface for Becak.
//!
//! Exposes the [`RideService`] facade, an axum [`Router`] with the JSON REST
//! endpoints, and the WebSocket route that feeds the subscription registry.
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! Router::new()
//!   .nest("/api", becak_api::api_router(service.clone()))
//!   .merge(becak_api::socket_router(service, 64))
//! ```

pub mod error;
pub mod rides;
pub mod service;
pub mod socket;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use becak_core::{geo::AddressResolver, profile::DriverProfiles, store::RideStore};

pub use error::ApiError;
pub use service::{AcceptedRide, Committed, RideService};
pub use socket::SocketState;

/// Build the REST router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, A>(service: Arc<RideService<S, A>>) -> Router<()>
where
  S: RideStore + DriverProfiles + 'static,
  A: AddressResolver + 'static,
{
  Router::new()
    .route("/rides", get(rides::list::<S, A>))
    .route("/rides/request", post(rides::request::<S, A>))
    .route("/rides/available", get(rides::available::<S, A>))
    .route("/rides/driver/{driver_id}", get(rides::by_driver::<S, A>))
    .route("/rides/passenger/{passenger_id}", get(rides::by_passenger::<S, A>))
    .route("/rides/{id}", get(rides::get_one::<S, A>))
    .route("/rides/{id}/accept", post(rides::accept::<S, A>))
    .route("/rides/{id}/status", put(rides::update_status::<S, A>))
    .with_state(service)
}

/// Build the `/ws` router. Each connection gets a notification queue of
/// `endpoint_buffer` frames.
pub fn socket_router<S, A>(service: Arc<RideService<S, A>>, endpoint_buffer: usize) -> Router<()>
where
  S: RideStore + DriverProfiles + 'static,
  A: AddressResolver + 'static,
{
  Router::new()
    .route("/ws", get(socket::handle::<S, A>))
    .with_state(Arc::new(SocketState { service, endpoint_buffer }))
}

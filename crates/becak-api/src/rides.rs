//! Handlers for `/rides` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/rides/request` | Body: [`RideRequest`]; 201 |
//! | `POST` | `/rides/{id}/accept` | Body: `{"driver_id":"…"}`; 409 if taken |
//! | `PUT`  | `/rides/{id}/status` | Body: `{"status":"picked_up","driver_id":"…"}` |
//! | `GET`  | `/rides` | Newest first |
//! | `GET`  | `/rides/available` | Rides in `requested`, oldest first |
//! | `GET`  | `/rides/{id}` | 404 if not found |
//! | `GET`  | `/rides/driver/{driver_id}` | |
//! | `GET`  | `/rides/passenger/{passenger_id}` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use becak_core::{
  geo::AddressResolver,
  lifecycle::RideStatus,
  profile::{DriverProfile, DriverProfiles},
  ride::{Ride, RideRequest},
  store::RideStore,
};
use becak_notify::DeliveryError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, service::RideService};

type Service<S, A> = State<Arc<RideService<S, A>>>;

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RideResponse {
  pub ride:     Ride,
  pub warnings: Vec<DeliveryError>,
}

#[derive(Debug, Serialize)]
pub struct AcceptResponse {
  pub ride:     Ride,
  pub driver:   DriverProfile,
  pub warnings: Vec<DeliveryError>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
  pub ride:     Ride,
  pub previous: RideStatus,
  /// `false` if the ride was already in that status.
  pub applied:  bool,
  pub warnings: Vec<DeliveryError>,
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// `POST /rides/request`
pub async fn request<S, A>(
  State(service): Service<S, A>,
  body: Result<Json<RideRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RideStore + DriverProfiles,
  A: AddressResolver,
{
  let Json(body) = body?;
  let committed = service.request_ride(body).await?;
  Ok((
    StatusCode::CREATED,
    Json(RideResponse { ride: committed.value, warnings: committed.delivery.failures }),
  ))
}

// ─── Accept ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AcceptBody {
  pub driver_id: Uuid,
}

/// `POST /rides/{id}/accept`
pub async fn accept<S, A>(
  State(service): Service<S, A>,
  Path(id): Path<Uuid>,
  body: Result<Json<AcceptBody>, JsonRejection>,
) -> Result<Json<AcceptResponse>, ApiError>
where
  S: RideStore + DriverProfiles,
  A: AddressResolver,
{
  let Json(body) = body?;
  let committed = service.accept_ride(id, body.driver_id).await?;
  Ok(Json(AcceptResponse {
    ride:     committed.value.ride,
    driver:   committed.value.driver,
    warnings: committed.delivery.failures,
  }))
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status:    RideStatus,
  pub driver_id: Option<Uuid>,
}

/// `PUT /rides/{id}/status`
pub async fn update_status<S, A>(
  State(service): Service<S, A>,
  Path(id): Path<Uuid>,
  body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError>
where
  S: RideStore + DriverProfiles,
  A: AddressResolver,
{
  let Json(body) = body?;
  let committed = service.update_status(id, body.status, body.driver_id).await?;
  Ok(Json(StatusResponse {
    ride:     committed.value.ride,
    previous: committed.value.previous,
    applied:  committed.value.applied,
    warnings: committed.delivery.failures,
  }))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /rides`
pub async fn list<S, A>(State(service): Service<S, A>) -> Result<Json<Vec<Ride>>, ApiError>
where
  S: RideStore + DriverProfiles,
  A: AddressResolver,
{
  Ok(Json(service.all().await?))
}

/// `GET /rides/available`
pub async fn available<S, A>(State(service): Service<S, A>) -> Result<Json<Vec<Ride>>, ApiError>
where
  S: RideStore + DriverProfiles,
  A: AddressResolver,
{
  Ok(Json(service.available().await?))
}

/// `GET /rides/{id}`
pub async fn get_one<S, A>(
  State(service): Service<S, A>,
  Path(id): Path<Uuid>,
) -> Result<Json<Ride>, ApiError>
where
  S: RideStore + DriverProfiles,
  A: AddressResolver,
{
  Ok(Json(service.get(id).await?))
}

/// `GET /rides/driver/{driver_id}`
pub async fn by_driver<S, A>(
  State(service): Service<S, A>,
  Path(driver_id): Path<Uuid>,
) -> Result<Json<Vec<Ride>>, ApiError>
where
  S: RideStore + DriverProfiles,
  A: AddressResolver,
{
  Ok(Json(service.by_driver(driver_id).await?))
}

/// `GET /rides/passenger/{passenger_id}`
pub async fn by_passenger<S, A>(
  State(service): Service<S, A>,
  Path(passenger_id): Path<Uuid>,
) -> Result<Json<Vec<Ride>>, ApiError>
where
  S: RideStore + DriverProfiles,
  A: AddressResolver,
{
  Ok(Json(service.by_passenger(passenger_id).await?))
}

//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Ride(#[from] becak_core::Error),

  /// The request body could not be decoded.
  #[error("bad request: {0}")]
  BadRequest(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    use becak_core::Error::*;

    match self {
      ApiError::BadRequest(_) | ApiError::Ride(Validation(_)) => StatusCode::BAD_REQUEST,
      ApiError::Ride(OutOfServiceArea { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Ride(NotFound(_)) => StatusCode::NOT_FOUND,
      ApiError::Ride(AlreadyTaken { .. } | InvalidTransition { .. }) => StatusCode::CONFLICT,
      ApiError::Ride(Store(_)) => StatusCode::SERVICE_UNAVAILABLE,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      ApiError::Ride(e) => e.kind(),
      ApiError::BadRequest(_) => "validation",
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status == StatusCode::SERVICE_UNAVAILABLE {
      tracing::error!(error = %self, "ride store unavailable");
    }
    (status, Json(json!({ "error": self.to_string(), "kind": self.kind() }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use becak_core::lifecycle::RideStatus;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn race_losers_and_illegal_moves_are_conflicts() {
    let taken = ApiError::from(becak_core::Error::AlreadyTaken {
      ride_id: Uuid::new_v4(),
      status:  RideStatus::Accepted,
    });
    assert_eq!(taken.status(), StatusCode::CONFLICT);
    assert_eq!(taken.kind(), "already_taken");

    let illegal = ApiError::from(becak_core::Error::InvalidTransition {
      from: RideStatus::Completed,
      to:   RideStatus::PickedUp,
    });
    assert_eq!(illegal.status(), StatusCode::CONFLICT);
    assert_eq!(illegal.kind(), "invalid_transition");
  }

  #[test]
  fn undecodable_bodies_are_validation_errors() {
    let err = ApiError::BadRequest("missing field `passenger_id`".to_owned());
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.kind(), "validation");
  }
}

//! Becak ride coordination server.
//!
//! Wires the SQLite ride store, the Nominatim address resolver and the
//! notification layer into one axum [`Router`] serving the REST API under
//! `/api` and the WebSocket at `/ws`.

pub mod geocode;
pub mod settings;

use std::sync::Arc;

use axum::Router;
use becak_api::RideService;
use becak_notify::{Dispatcher, SubscriptionRegistry};
use becak_store_sqlite::SqliteStore;
use tower_http::trace::TraceLayer;

pub use geocode::NominatimResolver;
pub use settings::ServerConfig;

pub type Service = RideService<SqliteStore, NominatimResolver>;

/// Build the ride service over `store` as configured by `config`.
pub fn service(config: &ServerConfig, store: SqliteStore) -> reqwest::Result<Service> {
  let resolver = NominatimResolver::new(&config.geocoder, config.service_area.clone())?;
  let registry = Arc::new(SubscriptionRegistry::new());
  let dispatcher = Arc::new(Dispatcher::new(registry, config.notify.send_timeout()));
  Ok(RideService::new(Arc::new(store), Arc::new(resolver), config.tariff, dispatcher))
}

/// Build the full application router.
pub fn router(service: Arc<Service>, config: &ServerConfig) -> Router {
  Router::new()
    .nest("/api", becak_api::api_router(Arc::clone(&service)))
    .merge(becak_api::socket_router(service, config.notify.endpoint_buffer))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  use super::*;

  async fn app() -> Router {
    let config = ServerConfig::default();
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(Arc::new(service(&config, store).unwrap()), &config)
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let resp = app()
      .await
      .oneshot(Request::get("/api/rides/available").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(serde_json::from_slice::<serde_json::Value>(&bytes).unwrap(), serde_json::json!([]));

    let resp = app()
      .await
      .oneshot(Request::get("/rides/available").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn socket_route_requires_an_upgrade() {
    let resp = app()
      .await
      .oneshot(Request::get("/ws").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert!(resp.status().is_client_error());
  }
}

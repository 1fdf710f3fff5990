//! Reverse geocoding against a Nominatim-compatible HTTP service.

use becak_core::{
  geo::{AddressResolver, Resolution, ServiceArea},
  ride::Coordinates,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::settings::GeocoderConfig;

/// Resolves coordinates with `GET {base_url}/reverse` and checks addresses
/// against a configured [`ServiceArea`].
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct NominatimResolver {
  client:   Client,
  base_url: String,
  language: String,
  area:     ServiceArea,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
  display_name: Option<String>,
}

impl NominatimResolver {
  pub fn new(config: &GeocoderConfig, area: ServiceArea) -> reqwest::Result<Self> {
    let client = Client::builder()
      .user_agent(config.user_agent.clone())
      .timeout(config.timeout())
      .build()?;
    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_owned(),
      language: config.language.clone(),
      area,
    })
  }

  async fn lookup(&self, at: Coordinates) -> reqwest::Result<Option<String>> {
    let resp: ReverseResponse = self
      .client
      .get(format!("{}/reverse", self.base_url))
      .query(&[
        ("format", "json".to_owned()),
        ("lat", at.lat.to_string()),
        ("lon", at.lon.to_string()),
        ("accept-language", self.language.clone()),
      ])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;
    Ok(resp.display_name.filter(|name| !name.trim().is_empty()))
  }
}

impl AddressResolver for NominatimResolver {
  async fn resolve(&self, at: Coordinates) -> Resolution {
    match self.lookup(at).await {
      Ok(Some(address)) => Resolution::Address(address),
      Ok(None) => {
        warn!(lat = at.lat, lon = at.lon, "geocoder returned no address");
        Resolution::Unresolvable
      }
      Err(e) => {
        warn!(lat = at.lat, lon = at.lon, error = %e, "reverse geocoding failed");
        Resolution::Unresolvable
      }
    }
  }

  fn in_service_area(&self, address: &str) -> bool { self.area.contains(address) }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use axum::{Json, Router, extract::Query, routing::get};
  use serde_json::{Value, json};
  use tokio::net::TcpListener;

  use super::*;

  /// Serve `/reverse` locally and return its base URL.
  async fn fake_nominatim(reply: Value) -> String {
    let app = Router::new().route(
      "/reverse",
      get(move |Query(params): Query<HashMap<String, String>>| {
        let reply = reply.clone();
        async move {
          assert_eq!(params.get("format").map(String::as_str), Some("json"));
          assert_eq!(params.get("accept-language").map(String::as_str), Some("id"));
          assert!(params.contains_key("lat") && params.contains_key("lon"));
          Json(reply)
        }
      }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  fn resolver(base_url: String) -> NominatimResolver {
    let config = GeocoderConfig { base_url, timeout_secs: 2, ..GeocoderConfig::default() };
    NominatimResolver::new(&config, ServiceArea::default()).unwrap()
  }

  fn here() -> Coordinates { Coordinates::new(5.18, 97.14).unwrap() }

  #[tokio::test]
  async fn display_name_becomes_the_address() {
    let base = fake_nominatim(json!({
      "place_id": 1,
      "display_name": "Jalan Merdeka, Banda Sakti, Lhokseumawe, Aceh, Indonesia",
    }))
    .await;
    let resolver = resolver(base);

    let Resolution::Address(address) = resolver.resolve(here()).await else {
      panic!("expected an address");
    };
    assert!(resolver.in_service_area(&address));
  }

  #[tokio::test]
  async fn error_reply_is_unresolvable() {
    let base = fake_nominatim(json!({ "error": "Unable to geocode" })).await;
    assert_eq!(resolver(base).resolve(here()).await, Resolution::Unresolvable);
  }

  #[tokio::test]
  async fn unreachable_service_is_unresolvable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    assert_eq!(resolver(format!("http://{addr}")).resolve(here()).await, Resolution::Unresolvable);
  }
}

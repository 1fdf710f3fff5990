//! Runtime configuration.
//!
//! Built from an optional TOML file layered with `BECAK_`-prefixed
//! environment variables, where `__` separates nested keys:
//!
//! ```text
//! BECAK_PORT=8080
//! BECAK_TARIFF__BASE_RATE=2500
//! BECAK_SERVICE_AREA=Lhokseumawe,Aceh Utara,Bireuen
//! ```
//!
//! Every field has a default, so an empty configuration runs.

use std::{path::PathBuf, time::Duration};

use becak_core::{geo::ServiceArea, pricing::Tariff};
use config::{
  Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  pub tariff:       Tariff,
  pub service_area: ServiceArea,
  pub geocoder:     GeocoderConfig,
  pub notify:       NotifyConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:         "0.0.0.0".to_owned(),
      port:         3000,
      store_path:   PathBuf::from("~/.local/share/becak/rides.db"),
      tariff:       Tariff::default(),
      service_area: ServiceArea::default(),
      geocoder:     GeocoderConfig::default(),
      notify:       NotifyConfig::default(),
    }
  }
}

/// Reverse-geocoding endpoint (Nominatim-compatible).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
  pub base_url:     String,
  /// Nominatim's usage policy requires an identifying User-Agent.
  pub user_agent:   String,
  pub language:     String,
  pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
  fn default() -> Self {
    Self {
      base_url:     "https://nominatim.openstreetmap.org".to_owned(),
      user_agent:   concat!("becak/", env!("CARGO_PKG_VERSION")).to_owned(),
      language:     "id".to_owned(),
      timeout_secs: 5,
    }
  }
}

impl GeocoderConfig {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
  /// Frames queued per connection before sends start waiting.
  pub endpoint_buffer: usize,
  pub send_timeout_ms: u64,
}

impl Default for NotifyConfig {
  fn default() -> Self { Self { endpoint_buffer: 64, send_timeout_ms: 250 } }
}

impl NotifyConfig {
  pub fn send_timeout(&self) -> Duration { Duration::from_millis(self.send_timeout_ms) }
}

impl ServerConfig {
  /// Read `path` if it exists, then apply environment overrides. Tariffs
  /// that would quote negative prices or fees are rejected.
  pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
    Self::from_builder(Config::builder().add_source(File::from(path.into()).required(false)))
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    let config: Self = builder
      .add_source(
        Environment::with_prefix("BECAK")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("service_area"),
      )
      .build()?
      .try_deserialize()?;
    config.tariff.validate().map_err(|e| ConfigError::Message(e.to_string()))?;
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use config::FileFormat;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    ServerConfig::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
      .unwrap()
  }

  #[test]
  fn empty_configuration_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.tariff, Tariff::default());
    assert_eq!(cfg.service_area, ServiceArea::default());
    assert_eq!(cfg.notify.send_timeout(), Duration::from_millis(250));
    assert_eq!(cfg.geocoder.language, "id");
  }

  #[test]
  fn nested_sections_override_fields() {
    let cfg = parse(
      r#"
        port = 8080
        service_area = ["Bireuen"]

        [tariff]
        base_rate = 2500

        [geocoder]
        base_url = "http://localhost:8088"

        [notify]
        endpoint_buffer = 8
      "#,
    );
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.tariff.base_rate, 2500);
    assert_eq!(cfg.tariff.minimum_fare, Tariff::default().minimum_fare);
    assert_eq!(cfg.service_area, ServiceArea::new(["Bireuen"]));
    assert_eq!(cfg.geocoder.base_url, "http://localhost:8088");
    assert_eq!(cfg.geocoder.timeout_secs, 5);
    assert_eq!(cfg.notify.endpoint_buffer, 8);
    assert_eq!(cfg.notify.send_timeout_ms, 250);
  }

  #[test]
  fn negative_tariff_is_rejected() {
    for toml in ["[tariff]\nbase_rate = -2000", "[tariff]\nfee_basis_points = -1"] {
      let err = ServerConfig::from_builder(
        Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
      )
      .unwrap_err();
      assert!(matches!(err, ConfigError::Message(_)), "{toml}: {err:?}");
    }
  }
}

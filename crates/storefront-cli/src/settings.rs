//! Layered configuration: TOML file, then `STOREFRONT_*` environment
//! variables, then command-line flags.

use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use serde::Deserialize;
use storefront_client::ClientConfig;
use storefront_sync::SyncConfig;

const DEFAULT_BASE_URL: &str = "https://ecommerce.routemisr.com/api/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_base_url")]
  pub base_url:              String,
  /// Session token sent with every request.
  #[serde(default)]
  pub token:                 Option<String>,
  /// SQLite file for pending-retry records. Without one, records only live
  /// for the current invocation.
  #[serde(default)]
  pub retry_db:              Option<PathBuf>,
  #[serde(default = "secs::<10>")]
  pub read_timeout_secs:     u64,
  #[serde(default = "secs::<20>")]
  pub auth_timeout_secs:     u64,
  #[serde(default = "secs::<15>")]
  pub reset_timeout_secs:    u64,
  #[serde(default = "secs::<15>")]
  pub mutation_timeout_secs: u64,
}

fn default_base_url() -> String { DEFAULT_BASE_URL.to_owned() }

fn secs<const N: u64>() -> u64 { N }

impl Settings {
  pub fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
      builder = builder.add_source(config::File::from(path).required(true));
    }
    builder
      .add_source(config::Environment::with_prefix("STOREFRONT"))
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn client_config(&self) -> ClientConfig {
    ClientConfig {
      read_timeout: Duration::from_secs(self.read_timeout_secs),
      auth_timeout: Duration::from_secs(self.auth_timeout_secs),
      reset_timeout: Duration::from_secs(self.reset_timeout_secs),
      ..ClientConfig::new(self.base_url.clone())
    }
  }

  pub fn sync_config(&self) -> SyncConfig {
    SyncConfig {
      mutation_timeout: Duration::from_secs(self.mutation_timeout_secs),
      ..SyncConfig::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_fill_missing_keys() {
    let settings: Settings = config::Config::builder()
      .set_override("token", "abc")
      .unwrap()
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();

    assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    assert_eq!(settings.token.as_deref(), Some("abc"));
    assert!(settings.retry_db.is_none());

    let client = settings.client_config();
    assert_eq!(client.read_timeout, Duration::from_secs(10));
    assert_eq!(client.auth_timeout, Duration::from_secs(20));
    assert_eq!(client.reset_timeout, Duration::from_secs(15));
    assert_eq!(settings.sync_config().mutation_timeout, Duration::from_secs(15));
  }
}

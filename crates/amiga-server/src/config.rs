//! Runtime configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then `AMIGA_*` environment variables (e.g. `AMIGA_PORT=9000`).
//! The interval `anchor` has no default and must be set explicitly.

use std::path::{Path, PathBuf};

use amiga_core::interval::AnchorPolicy;
use config::{ConfigBuilder, ConfigError, builder::DefaultState};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// `monday_midnight` or `saturday_evening`.
  pub anchor:     AnchorPolicy,
}

impl ServerConfig {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(
      config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("AMIGA")),
    )
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    builder
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8000)?
      .set_default("store_path", "amiga.db")?
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use config::{File, FileFormat};

  fn parse(toml: &str) -> Result<ServerConfig, ConfigError> {
    ServerConfig::from_builder(
      config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
    )
  }

  #[test]
  fn defaults_fill_in_everything_but_anchor() {
    let cfg = parse("anchor = \"saturday_evening\"").unwrap();
    assert_eq!(cfg.anchor, AnchorPolicy::SaturdayEvening);
    assert_eq!(cfg.address(), "127.0.0.1:8000");
    assert_eq!(cfg.store_path, PathBuf::from("amiga.db"));
  }

  #[test]
  fn file_values_override_defaults() {
    let cfg = parse(
      "host = \"0.0.0.0\"\nport = 9100\nstore_path = \"/var/lib/amiga.db\"\nanchor = \"monday_midnight\"",
    )
    .unwrap();
    assert_eq!(cfg.address(), "0.0.0.0:9100");
    assert_eq!(cfg.anchor, AnchorPolicy::MondayMidnight);
  }

  #[test]
  fn missing_anchor_is_an_error() {
    assert!(parse("port = 9100").is_err());
  }

  #[test]
  fn unknown_anchor_is_an_error() {
    assert!(parse("anchor = \"sunday_brunch\"").is_err());
  }
}

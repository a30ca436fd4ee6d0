//! Configuration management
//!
//! Deserializes the translator settings from TOML and applies them through
//! the translator's API surface. Addresses are kept as strings in the file
//! and parsed during apply, so a bad prefix or CIDR surfaces as a
//! configuration error instead of a deserialization panic.
//!
//! ```toml
//! enabled = true
//! ip4_cidr = "192.0.2.0/28"
//! nat64_prefix = "64:ff9b::/96"
//!
//! [log]
//! level = "debug"
//! format = "compact"
//! ```

use crate::telemetry::LogConfig;
use crate::translator::{MonotonicClock, Nat64Translator};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// User-provided translator configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub ip4_cidr: Option<String>,
    #[serde(default)]
    pub nat64_prefix: Option<String>,
    #[serde(default)]
    pub log: LogConfig,
}

/// Loads configuration from a TOML file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    Config::from_toml(&content)
}

impl Config {
    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Applies the settings to a translator. The CIDR is installed before
    /// the enable flag so that enabling can rely on it.
    pub fn apply<C: MonotonicClock, const N: usize>(
        &self,
        translator: &mut Nat64Translator<C, N>,
    ) -> Result<()> {
        if let Some(cidr) = &self.ip4_cidr {
            translator.set_ip4_cidr(cidr.parse()?)?;
        }
        if let Some(prefix) = &self.nat64_prefix {
            translator.set_nat64_prefix(prefix.parse()?);
        }
        translator.set_enabled(self.enabled)?;
        Ok(())
    }
}

//! Logging setup for the translator.
//!
//! The translator emits `tracing` events at fixed levels: mapping
//! lifecycle and configuration changes at info, drop causes (malformed
//! packets, missing mappings, untranslatable ICMP) at warn, TTL expiry
//! and checksum details at debug. An embedding application that already
//! installs its own subscriber sees those events directly and never
//! calls into this module; [`init_logging`] exists for hosts and tests
//! that want a ready-made subscriber.

use serde::Deserialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity threshold for translator events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The filter directive this level turns into.
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Output shape of the built-in subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-oriented multi-line output
    #[default]
    Pretty,
    /// One event per line
    Compact,
    /// Machine-readable JSON events
    Json,
}

/// Logging section of the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

/// Installs a global subscriber for the translator's events.
///
/// An explicit `RUST_LOG` always wins over the configured level. Calling
/// this twice, or after the host installed its own subscriber, leaves the
/// existing subscriber in place.
pub fn init_logging(config: Option<&LogConfig>) {
    let config = config.cloned().unwrap_or_default();

    let filter = match std::env::var("RUST_LOG") {
        Ok(env) => EnvFilter::new(env),
        Err(_) => EnvFilter::new(config.level.directive()),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let _ = match config.format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };
}

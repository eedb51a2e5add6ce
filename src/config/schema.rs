//! TOML configuration schema types for the block dashboard.
//!
//! All structs derive `Deserialize` and `Serialize` with defaults via
//! `#[serde(default)]`, so a partial (or empty) file is always valid.
//!
//! Duration fields use human-readable strings (e.g. `"10s"`, `"250ms"`)
//! parsed by the `humantime` crate through the accessor methods below.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::error::ConfigError;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration encompassing all sections.
///
/// ```toml
/// [server]
/// [tui]
/// [log]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Node connection settings.
    pub server: ServerConfig,
    /// Terminal UI settings.
    pub tui: TuiConfig,
    /// Logging settings.
    pub log: LogConfig,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Where the node's STOMP endpoint lives.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Base WebSocket URL of the node. The fixed endpoint path is appended.
    pub url: String,
    /// Heart-beat interval offered to the server. `"0s"` disables heart-beats.
    pub heartbeat: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080".to_string(),
            heartbeat: "10s".to_string(),
        }
    }
}

impl ServerConfig {
    /// Parsed heart-beat interval.
    pub fn heartbeat_duration(&self) -> Result<Duration, ConfigError> {
        parse_duration("server.heartbeat", &self.heartbeat)
    }

    /// Checks that the URL uses a WebSocket scheme.
    pub fn validate_url(&self) -> Result<(), ConfigError> {
        if self.url.starts_with("ws://") || self.url.starts_with("wss://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                key: "server.url",
                message: format!("expected a ws:// or wss:// URL, got {:?}", self.url),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// TUI
// ---------------------------------------------------------------------------

/// Terminal UI configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TuiConfig {
    /// Render tick rate as a human-readable duration (e.g. `"250ms"`).
    pub tick_rate: String,
    /// Maximum rows kept per table. `0` keeps every row.
    pub max_rows: usize,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_rate: "250ms".to_string(),
            max_rows: 0,
        }
    }
}

impl TuiConfig {
    /// Parsed tick rate. Zero is rejected.
    pub fn tick_rate_duration(&self) -> Result<Duration, ConfigError> {
        let rate = parse_duration("tui.tick_rate", &self.tick_rate)?;
        if rate.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "tui.tick_rate",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(rate)
    }

    /// Row cap for the dashboard lists, `None` when unbounded.
    pub fn row_cap(&self) -> Option<usize> {
        (self.max_rows > 0).then_some(self.max_rows)
    }
}

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

/// Logging configuration. `BDASH_LOG` overrides `level` when set.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Logging verbosity.
    pub level: LogLevel,
    /// Path to the TUI log file. Empty means `<runtime dir>/block-dashboard.log`.
    pub file: String,
}

/// Log verbosity levels (kebab-case in TOML).
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    Warn,
    /// Informational messages (default).
    #[default]
    Info,
    /// Debug-level detail.
    Debug,
    /// Full trace output.
    Trace,
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn parse_duration(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::InvalidValue {
        key,
        message: format!("{:?}: {}", value, e),
    })
}

impl Config {
    /// Checks every value that `serde` cannot validate on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate_url()?;
        self.server.heartbeat_duration()?;
        self.tui.tick_rate_duration()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

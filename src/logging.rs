//! Logging initialization.
//!
//! Configures the `tracing` subscriber with level filtering via the
//! `BDASH_LOG` environment variable, falling back to the configured level.
//!
//! ```bash
//! BDASH_LOG=debug bdash watch
//! BDASH_LOG=block_dashboard::client=trace,warn bdash tui
//! ```

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::schema::LogConfig;
use crate::config::xdg;

/// Environment variable holding filter directives.
pub const LOG_ENV_VAR: &str = "BDASH_LOG";

/// Errors raised while installing the subscriber.
#[derive(Error, Debug)]
pub enum LoggingError {
    /// The log file could not be opened for appending.
    #[error("failed to open log file {path}")]
    OpenFile {
        /// Log file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error. Used by headless commands.
    Stderr,
    /// Append to a file. Used by the TUI so the alternate screen stays clean.
    File(PathBuf),
}

impl LogTarget {
    /// File target for the TUI: `log.file` when set, else the runtime log path.
    pub fn file_for(config: &LogConfig) -> Self {
        if config.file.trim().is_empty() {
            LogTarget::File(xdg::log_path())
        } else {
            LogTarget::File(xdg::expand_tilde(config.file.trim()))
        }
    }
}

/// Builds the filter from `BDASH_LOG`, or from `config.level` when the
/// variable is unset or invalid.
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()))
}

/// Install the global subscriber. Call once at startup.
pub fn init(config: &LogConfig, target: LogTarget) -> Result<(), LoggingError> {
    let filter = env_filter(config);
    let result = match target {
        LogTarget::Stderr => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
        LogTarget::File(path) => {
            let file = open_log_file(&path)?;
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    result.map_err(|e| LoggingError::Init(e.to_string()))
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let open_err = |source| LoggingError::OpenFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(open_err)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_err)
}

//! Default configuration template and file creation utilities.
//!
//! Provides a commented TOML template that matches `Config::default()` and
//! a function to write it to disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::ConfigError;
use crate::config::xdg;

// ---------------------------------------------------------------------------
// Default TOML template
// ---------------------------------------------------------------------------

/// A commented TOML template with all default values.
///
/// Every value here must match `Config::default()` from `schema.rs`.
/// Sections: `[server]`, `[tui]`, `[log]`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Block Dashboard Configuration
#
# This file was auto-generated with default values.
# All values shown below are the built-in defaults.
#
# Location: $XDG_CONFIG_HOME/block-dashboard/config.toml

# ==============================================================================
# Server
# ==============================================================================

[server]

# Base WebSocket URL of the node.
# The STOMP endpoint path "/ws" is appended to this URL.
# Examples: "ws://127.0.0.1:8080", "wss://node.example.org"
url = "ws://127.0.0.1:8080"

# STOMP heart-beat interval the client offers to send.
# The effective interval is the larger of this and what the server asks for.
# Set to "0s" to disable client heart-beats.
heartbeat = "10s"

# ==============================================================================
# Terminal UI
# ==============================================================================

[tui]

# Render tick rate as a human-readable duration.
# Examples: "250ms", "500ms", "1s"
tick_rate = "250ms"

# Maximum rows kept in each of the Blocks and Transactions tables.
# The oldest row is dropped when the limit is reached.
# 0 keeps every row for as long as the session is connected.
max_rows = 0

# ==============================================================================
# Logging
# ==============================================================================

[log]

# Logging verbosity level. BDASH_LOG overrides this when set.
# Options: "error", "warn", "info", "debug", "trace"
level = "info"

# Log file used by the TUI. Empty means <runtime dir>/block-dashboard.log.
# `bdash watch` always logs to stderr.
file = ""
"#;

// ---------------------------------------------------------------------------
// File creation
// ---------------------------------------------------------------------------

/// Writes the default template to `path`.
///
/// - If the file exists and `force` is `false`, returns `ConfigError::AlreadyExists`.
/// - If the file exists and `force` is `true`, backs it up to `.toml.backup` first.
/// - Returns the path where the config was written.
pub fn create_default_config(path: &Path, force: bool) -> Result<PathBuf, ConfigError> {
    if path.exists() {
        if !force {
            return Err(ConfigError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        let backup_path = path.with_extension("toml.backup");
        fs::rename(path, &backup_path).map_err(|e| ConfigError::WriteError {
            path: backup_path.clone(),
            source: e,
        })?;
        tracing::info!("Backed up existing config to {}", backup_path.display());
    }

    write_default_config(path)?;
    tracing::info!("Created default configuration at {}", path.display());
    Ok(path.to_path_buf())
}

/// Writes the template, creating parent dirs and setting 0600 permissions.
fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_err = |e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        xdg::ensure_dir(parent).map_err(write_err)?;
    }

    fs::write(path, DEFAULT_CONFIG_TEMPLATE).map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(write_err)?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Config;

    // -- Template validity --------------------------------------------------

    #[test]
    fn template_values_match_config_default() {
        let from_template: Config =
            toml::from_str(DEFAULT_CONFIG_TEMPLATE).expect("template should parse");
        assert_eq!(from_template, Config::default());
    }

    #[test]
    fn template_contains_all_section_headers() {
        for section in ["[server]", "[tui]", "[log]"] {
            assert!(
                DEFAULT_CONFIG_TEMPLATE.contains(section),
                "missing {section} section"
            );
        }
    }

    #[test]
    fn template_defaults_validate() {
        let config: Config =
            toml::from_str(DEFAULT_CONFIG_TEMPLATE).expect("template should parse");
        assert!(config.validate().is_ok());
    }

    // -- create_default_config ----------------------------------------------

    #[test]
    fn create_writes_template_into_new_dir() {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let path = tmp.path().join("block-dashboard/config.toml");
        let written = create_default_config(&path, false).expect("should succeed");
        assert_eq!(written, path);
        let content = fs::read_to_string(&path).expect("should read");
        assert_eq!(content, DEFAULT_CONFIG_TEMPLATE);
    }

    #[test]
    fn create_without_force_returns_already_exists() {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let path = tmp.path().join("config.toml");
        create_default_config(&path, false).expect("first call should succeed");
        let err = create_default_config(&path, false).expect_err("should fail");
        match err {
            ConfigError::AlreadyExists { path: p } => assert_eq!(p, path),
            other => panic!("expected AlreadyExists, got: {other:?}"),
        }
    }

    #[test]
    fn create_with_force_creates_backup() {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let path = tmp.path().join("config.toml");
        fs::write(&path, "# custom content\n").expect("seed file");

        create_default_config(&path, true).expect("force should succeed");

        let backup = path.with_extension("toml.backup");
        let backup_content = fs::read_to_string(&backup).expect("read backup");
        assert_eq!(backup_content, "# custom content\n");
        let content = fs::read_to_string(&path).expect("read new");
        assert_eq!(content, DEFAULT_CONFIG_TEMPLATE);
    }

    #[cfg(unix)]
    #[test]
    fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let path = tmp.path().join("config.toml");
        create_default_config(&path, false).expect("should succeed");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600, "file should be owner-only read/write");
    }
}

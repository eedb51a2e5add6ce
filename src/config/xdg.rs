//! Platform-aware path resolution for block-dashboard.
//!
//! On **Linux**, follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/block-dashboard` or `~/.config/block-dashboard`
//! - Runtime (log file): `$XDG_RUNTIME_DIR` or `/tmp`
//!
//! On **macOS**, uses Apple conventions with XDG env var overrides:
//! - Config: `$XDG_CONFIG_HOME/block-dashboard` or `~/Library/Application Support/block-dashboard`
//! - Runtime: `$XDG_RUNTIME_DIR` or `$TMPDIR` or `/tmp`

use std::fs;
use std::path::{Path, PathBuf};

/// Directory and file stem used for every path this crate owns.
pub const APP_NAME: &str = "block-dashboard";

/// Returns the configuration directory for block-dashboard.
///
/// Resolution order:
/// 1. `$XDG_CONFIG_HOME/block-dashboard` (if env var set, any platform)
/// 2. Platform default:
///    - Linux: `~/.config/block-dashboard`
///    - macOS: `~/Library/Application Support/block-dashboard`
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join(APP_NAME);
    }
    platform_config_dir().join(APP_NAME)
}

/// Platform-native config base directory (without XDG override).
/// Falls back to the working directory when no home directory is known.
fn platform_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::home_dir()
            .map(|home| home.join(".config"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Returns the path to the main configuration file.
///
/// Resolves to `config_dir()/config.toml`.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Returns the runtime directory for transient files.
///
/// Resolution order:
/// 1. `$XDG_RUNTIME_DIR` (if set, any platform)
/// 2. Platform default:
///    - Linux: `/tmp`
///    - macOS: `$TMPDIR` or `/tmp`
pub fn runtime_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(xdg);
    }
    platform_runtime_dir()
}

fn platform_runtime_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        std::env::var("TMPDIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
    #[cfg(not(target_os = "macos"))]
    {
        PathBuf::from("/tmp")
    }
}

/// Default log file for the TUI: `runtime_dir()/block-dashboard.log`.
pub fn log_path() -> PathBuf {
    runtime_dir().join(format!("{APP_NAME}.log"))
}

/// Expands a leading `~` in a path string to the user's home directory.
///
/// If the path does not start with `~`, or no home directory is known,
/// it is returned as-is.
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        (None, Some(home)) if path == "~" => home,
        _ => PathBuf::from(path),
    }
}

/// Creates a directory and all parent directories with mode 0700.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

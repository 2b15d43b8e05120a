mod config;
pub mod database;

pub use config::{Config, LoggingConfig, ReconcilerConfig, SessionConfig};
pub use database::{Database, Profile, SessionRecord};

use std::path::PathBuf;

use crate::error::CoreError;

/// Resolves the data directory without touching the filesystem.
///
/// `FOCUSARENA_DATA_DIR` wins when set. Otherwise `~/.config/focusarena[-dev]/`
/// based on FOCUSARENA_ENV (set FOCUSARENA_ENV=dev for the development directory).
pub fn data_dir_path() -> PathBuf {
    match std::env::var_os("FOCUSARENA_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSARENA_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusarena-dev")
            } else {
                base_dir.join("focusarena")
            }
        }
    }
}

/// Returns the data directory, creating it if needed.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let dir = data_dir_path();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

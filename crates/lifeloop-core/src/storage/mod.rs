mod config;
pub mod database;

pub use config::{
    Config, NotificationSettings, RemindersConfig, RemoteConfig, Theme, TimeConfig, UiConfig,
};
pub use database::CacheDb;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/lifeloop[-dev]/` based on LIFELOOP_ENV.
///
/// Set LIFELOOP_ENV=dev to use the development data directory. The
/// LIFELOOP_DATA_DIR variable overrides the location entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("LIFELOOP_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("LIFELOOP_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("lifeloop-dev")
            } else {
                base_dir.join("lifeloop")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

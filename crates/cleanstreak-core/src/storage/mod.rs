mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, DisplayConfig, LogConfig, StorageConfig};
pub use database::SqliteBackend;

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `CLEANSTREAK_HOME` wins when set. Otherwise `~/.config/cleanstreak`, or
/// `~/.config/cleanstreak-dev` when `CLEANSTREAK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = data_dir_path();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Same location as [`data_dir`], without touching the filesystem.
pub fn data_dir_path() -> PathBuf {
    match std::env::var_os("CLEANSTREAK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env =
                std::env::var("CLEANSTREAK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("cleanstreak-dev")
            } else {
                base_dir.join("cleanstreak")
            }
        }
    }
}

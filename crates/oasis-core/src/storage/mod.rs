mod config;
pub mod database;

pub use config::{Config, FocusConfig, LoggingConfig, RemoteConfig};
pub use database::{Database, SessionRecord};

use std::path::PathBuf;

/// Returns `~/.config/oasis[-dev]/` based on OASIS_ENV.
///
/// Set OASIS_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("OASIS_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("oasis-dev")
    } else {
        base_dir.join("oasis")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

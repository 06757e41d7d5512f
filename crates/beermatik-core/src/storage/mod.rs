//! Storage backends and the durable key namespace.

pub mod keys;
mod kv;
mod sqlite;

pub use kv::{KeyValueStore, MemoryStore};
pub use sqlite::{PendingAlert, SqliteAlerts, SqliteStore};

use std::path::PathBuf;

/// Returns `~/.config/beermatik[-dev]/` based on BEERMATIK_ENV.
///
/// Set BEERMATIK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("BEERMATIK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("beermatik-dev")
    } else {
        base_dir.join("beermatik")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

//! Persistence: a string key-value store plus the helpers built on it.
//!
//! The store is an opaque collaborator with `get`/`set` semantics. Values are
//! strings; the session history is a JSON array under [`keys::SESSIONS`].

mod config;
pub mod database;
mod memory;
mod sessions;

pub use config::{Config, ReportConfig, TimerConfig, MAX_HEATMAP_DAYS};
pub use database::SqliteStore;
pub use memory::MemoryStore;
pub use sessions::SessionLog;

use std::path::PathBuf;

use crate::error::StorageError;

/// Keys used in the key-value store.
pub mod keys {
    pub const SESSIONS: &str = "sessions";
    pub const WORK_MINUTES: &str = "work_minutes";
    pub const BREAK_MINUTES: &str = "break_minutes";
    pub const APP_THEME: &str = "app_theme";
    pub const LAST_CATEGORY: &str = "last_category";
}

/// Durable string key-value store scoped to one device/user.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `FOKUS_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/fokus/`, or `~/.config/fokus-dev/` when `FOKUS_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("FOKUS_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOKUS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("fokus-dev")
            } else {
                base_dir.join("fokus")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

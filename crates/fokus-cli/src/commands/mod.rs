pub mod config;
pub mod focus;
pub mod sessions;
pub mod settings;
pub mod stats;

use fokus_core::error::Result as CoreResult;
use fokus_core::{Config, FocusContext, SqliteStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the on-disk store with the current configuration.
pub fn open_context() -> CoreResult<FocusContext<SqliteStore>> {
    let config = Config::load_or_default();
    let store = SqliteStore::open()?;
    Ok(FocusContext::load(store, config))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

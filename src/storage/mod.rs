//! Storage module for persisting the last snapshot
//!
//! This module handles the durable "last known rooms" state:
//! - JSON state file with atomic replace (default backend)
//! - SQLite database with transactional replace
//! - In-memory store for tests
//!
//! Unreadable state never stops monitoring: see [`load_or_reset`].

mod json_file;
mod memory;
mod schema;
mod sqlite;
mod traits;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{load_or_reset, StateStore, StorageError, StorageResult, STATE_VERSION};

use crate::config::{target_fingerprint, Config, StateBackend};
use std::path::Path;

/// Opens the state store selected by the configuration
///
/// The store is bound to the configured target's fingerprint, so state left
/// behind by another property is treated as a first run.
///
/// # Returns
///
/// * `Ok(Box<dyn StateStore>)` - Store ready for load/save
/// * `Err(StorageError)` - The SQLite database could not be opened
pub fn open_store(config: &Config) -> StorageResult<Box<dyn StateStore>> {
    let path = config.state.resolved_path(&config.target.property_id);
    let target = Some(target_fingerprint(&config.target));

    let store: Box<dyn StateStore> = match config.state.backend {
        StateBackend::Json => Box::new(JsonFileStore::new(path, target)),
        StateBackend::Sqlite => Box::new(SqliteStore::new(Path::new(&path), target)?),
    };

    tracing::debug!("Using state store {}", store.describe());
    Ok(store)
}

//! Storage traits and error types
//!
//! This module defines the trait interface for state backends and
//! associated error types.

use crate::model::{PersistedState, Snapshot};
use thiserror::Error;

/// Current on-disk state format version
pub const STATE_VERSION: u32 = 1;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("State is corrupt: {0}")]
    Corrupt(String),

    #[error("Unsupported state version {0} (expected {STATE_VERSION})")]
    UnsupportedVersion(u32),

    #[error("State belongs to another target (expected {expected}, found {found})")]
    TargetMismatch { expected: String, found: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for state backend implementations
///
/// A store holds exactly one snapshot: the one saved by the last completed run.
pub trait StateStore: Send {
    /// Loads the last saved snapshot, or `Uninitialized` if none was ever saved
    ///
    /// Unreadable or foreign state is reported as an error; callers that want
    /// to self-heal use [`load_or_reset`].
    fn load(&self) -> StorageResult<PersistedState>;

    /// Replaces the saved snapshot
    ///
    /// Either the new snapshot is fully written or the previous one is left
    /// untouched.
    fn save(&mut self, snapshot: &Snapshot) -> StorageResult<()>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Loads state, treating any load failure as a first run
pub fn load_or_reset(store: &dyn StateStore) -> PersistedState {
    match store.load() {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(
                "Could not load state from {} ({}); re-initializing",
                store.describe(),
                e
            );
            PersistedState::Uninitialized
        }
    }
}

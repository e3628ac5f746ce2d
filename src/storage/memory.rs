//! In-memory state store
//!
//! Keeps the snapshot in process memory, for tests and embedders that
//! manage persistence themselves.

use crate::model::{PersistedState, Snapshot};
use crate::storage::traits::{StateStore, StorageError, StorageResult};

/// State store that never touches the disk
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: PersistedState,
    corrupt: bool,
}

impl MemoryStore {
    /// A store with no saved state (first run)
    pub fn new() -> Self {
        Self::with_state(PersistedState::Uninitialized)
    }

    /// A store preloaded with a saved snapshot
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self::with_state(PersistedState::Initialized(snapshot))
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state,
            corrupt: false,
        }
    }

    /// A store whose saved state cannot be read
    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::new()
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> StorageResult<PersistedState> {
        if self.corrupt {
            return Err(StorageError::Corrupt("simulated corruption".to_string()));
        }
        Ok(self.state.clone())
    }

    fn save(&mut self, snapshot: &Snapshot) -> StorageResult<()> {
        self.state = PersistedState::Initialized(snapshot.clone());
        self.corrupt = false;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

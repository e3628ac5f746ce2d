//! JSON state file implementation
//!
//! The state file is pretty-printed JSON:
//!
//! ```json
//! {
//!   "version": 1,
//!   "target": "<sha-256 of endpoint/shisya/danchi>",
//!   "saved_at": "2026-10-16T01:30:00Z",
//!   "rooms": { "000030101": { "rent": "85000円", "type": "2LDK" } }
//! }
//! ```
//!
//! Saves go to a temp file in the same directory which then replaces the
//! state file by rename.

use crate::model::{Attributes, PersistedState, RoomRecord, Snapshot};
use crate::storage::traits::{StateStore, StorageError, StorageResult, STATE_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    rooms: BTreeMap<String, Attributes>,
}

/// State store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    target: Option<String>,
}

impl JsonFileStore {
    /// Creates a store for `path`
    ///
    /// # Arguments
    ///
    /// * `path` - State file location (need not exist yet)
    /// * `target` - Fingerprint the state must belong to; `None` accepts any
    pub fn new(path: impl Into<PathBuf>, target: Option<String>) -> Self {
        Self {
            path: path.into(),
            target,
        }
    }

    fn directory(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> StorageResult<PersistedState> {
        if !self.path.exists() {
            return Ok(PersistedState::Uninitialized);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let file: StateFile = serde_json::from_str(&content)?;

        if file.version != STATE_VERSION {
            return Err(StorageError::UnsupportedVersion(file.version));
        }

        if let (Some(expected), Some(found)) = (&self.target, &file.target) {
            if expected != found {
                return Err(StorageError::TargetMismatch {
                    expected: expected.clone(),
                    found: found.clone(),
                });
            }
        }

        let mut records = Vec::with_capacity(file.rooms.len());
        for (id, attributes) in file.rooms {
            let record = RoomRecord::new(id, attributes)
                .ok_or_else(|| StorageError::Corrupt("room with empty id".to_string()))?;
            records.push(record);
        }

        Ok(PersistedState::Initialized(Snapshot::from_page(records)))
    }

    fn save(&mut self, snapshot: &Snapshot) -> StorageResult<()> {
        let file = StateFile {
            version: STATE_VERSION,
            target: self.target.clone(),
            saved_at: Some(Utc::now()),
            rooms: snapshot
                .iter()
                .map(|record| (record.id.clone(), record.attributes.clone()))
                .collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let directory = self.directory();
        std::fs::create_dir_all(&directory)?;

        let mut temp = NamedTempFile::new_in(&directory)?;
        temp.write_all(json.as_bytes())?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;

        tracing::debug!("Saved {} room(s) to {}", snapshot.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the StateStore trait.
//! A save replaces all rows inside one transaction, so a crash mid-save
//! leaves the previous snapshot in place.

use crate::model::{Attributes, PersistedState, RoomRecord, Snapshot};
use crate::storage::schema::{
    initialize_schema, META_INITIALIZED, META_SAVED_AT, META_TARGET, META_VERSION,
};
use crate::storage::traits::{StateStore, StorageError, StorageResult, STATE_VERSION};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// SQLite state backend
pub struct SqliteStore {
    conn: Connection,
    location: PathBuf,
    target: Option<String>,
}

impl SqliteStore {
    /// Opens (or creates) a state database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `target` - Fingerprint the state must belong to; `None` accepts any
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path, target: Option<String>) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
        ",
        )?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            location: path.to_path_buf(),
            target,
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory(target: Option<String>) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            location: PathBuf::from(":memory:"),
            target,
        })
    }

    fn meta(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

impl StateStore for SqliteStore {
    fn load(&self) -> StorageResult<PersistedState> {
        if self.meta(META_INITIALIZED)?.is_none() {
            return Ok(PersistedState::Uninitialized);
        }

        let version = self
            .meta(META_VERSION)?
            .and_then(|v| v.parse::<u32>().ok())
            .ok_or_else(|| StorageError::Corrupt("missing state version".to_string()))?;
        if version != STATE_VERSION {
            return Err(StorageError::UnsupportedVersion(version));
        }

        if let (Some(expected), Some(found)) = (&self.target, self.meta(META_TARGET)?) {
            if *expected != found {
                return Err(StorageError::TargetMismatch {
                    expected: expected.clone(),
                    found,
                });
            }
        }

        let mut stmt = self
            .conn
            .prepare("SELECT id, attributes FROM rooms ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for (id, attributes) in rows {
            let attributes: Attributes = serde_json::from_str(&attributes)?;
            let record = RoomRecord::new(id, attributes)
                .ok_or_else(|| StorageError::Corrupt("room with empty id".to_string()))?;
            records.push(record);
        }

        Ok(PersistedState::Initialized(Snapshot::from_page(records)))
    }

    fn save(&mut self, snapshot: &Snapshot) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM rooms", [])?;
        {
            let mut insert = tx.prepare("INSERT INTO rooms (id, attributes) VALUES (?1, ?2)")?;
            for record in snapshot {
                let attributes = serde_json::to_string(&record.attributes)?;
                insert.execute(params![record.id, attributes])?;
            }
        }

        let mut meta = vec![
            (META_INITIALIZED, "1".to_string()),
            (META_VERSION, STATE_VERSION.to_string()),
            (META_SAVED_AT, Utc::now().to_rfc3339()),
        ];
        if let Some(target) = &self.target {
            meta.push((META_TARGET, target.clone()));
        }
        for (key, value) in meta {
            tx.execute(
                "INSERT INTO meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.location.display())
    }
}

//! Database schema definitions
//!
//! This module contains the SQL schema for the SQLite state backend.

use rusqlite::Connection;

/// SQL schema for the state database
pub const SCHEMA_SQL: &str = r#"
-- Key/value metadata: initialized flag, format version, target fingerprint
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Last saved snapshot, one row per room (attributes as a JSON object)
CREATE TABLE IF NOT EXISTS rooms (
    id TEXT PRIMARY KEY,
    attributes TEXT NOT NULL
);
"#;

/// Metadata keys
pub const META_INITIALIZED: &str = "initialized";
pub const META_VERSION: &str = "version";
pub const META_TARGET: &str = "target";
pub const META_SAVED_AT: &str = "saved_at";

/// Creates all tables if they do not exist yet
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

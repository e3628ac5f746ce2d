//! UR-Watch: a room-availability watcher for UR rental listings
//!
//! This crate fetches the paginated room listing of one property, extracts
//! room records from the (JSON or HTML fragment) responses, reconciles them
//! against the last persisted snapshot and notifies only about the delta.

pub mod config;
pub mod extract;
pub mod fetcher;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod reconcile;
pub mod storage;

use thiserror::Error;

/// Main error type for UR-Watch operations
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetcher::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Notification error: {0}")]
    Notify(#[from] notify::NotifyError),

    #[error("All {} configured pages failed to fetch: {pages:?}", pages.len())]
    AllPagesFailed { pages: Vec<u32> },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid time of day '{0}', expected HH:MM")]
    InvalidTime(String),
}

/// Result type alias for UR-Watch operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{PersistedState, RoomRecord, Snapshot};
pub use monitor::{Monitor, RunReport};
pub use reconcile::{reconcile, DiffEvent, Reconciliation};

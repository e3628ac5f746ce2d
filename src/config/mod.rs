//! Configuration module for UR-Watch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Secrets for the notification transport are never read from the file; they
//! come from the environment (see [`NotifyConfig::token_env`]).
//!
//! # Example
//!
//! ```no_run
//! use ur_watch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("watch.toml")).unwrap();
//! println!("Watching property {}", config.target.property_id);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetcherConfig, NotifyConfig, StateBackend, StateConfig, TargetConfig, WindowConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config, target_fingerprint};

pub(crate) use validation::parse_time_of_day;

use crate::config::types::{Config, TargetConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use ur_watch::config::load_config;
///
/// let config = load_config(Path::new("watch.toml")).unwrap();
/// println!("Pages: {:?}", config.target.page_indexes);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 fingerprint identifying the monitored target
///
/// The fingerprint covers the endpoint and the property codes sent in the
/// form, so a state file written for one property is never diffed against
/// another property's listing.
///
/// # Returns
///
/// Hex-encoded SHA-256 hash (64 characters)
pub fn target_fingerprint(target: &TargetConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(target.endpoint.as_bytes());
    hasher.update(b"\n");
    hasher.update(target.shisya.as_bytes());
    hasher.update(b"\n");
    hasher.update(target.danchi_code().as_bytes());
    hex::encode(hasher.finalize())
}

use crate::config::types::{
    Config, FetcherConfig, NotifyConfig, StateConfig, TargetConfig, WindowConfig,
};
use crate::ConfigError;
use chrono::NaiveTime;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_state_config(&config.state)?;
    validate_notify_config(&config.notify)?;
    validate_window_config(&config.window)?;
    Ok(())
}

/// Validates the monitored target
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    if endpoint.scheme() != "https" && endpoint.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "Endpoint '{}' must use HTTP(S)",
            config.endpoint
        )));
    }

    if config.property_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "property-id cannot be empty".to_string(),
        ));
    }

    if config.shisya.trim().is_empty() {
        return Err(ConfigError::Validation("shisya cannot be empty".to_string()));
    }

    if config.danchi_code().trim().is_empty() {
        return Err(ConfigError::Validation("danchi cannot be empty".to_string()));
    }

    if config.page_indexes.is_empty() {
        return Err(ConfigError::Validation(
            "page-indexes must list at least one page".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for index in &config.page_indexes {
        if !seen.insert(index) {
            return Err(ConfigError::Validation(format!(
                "page-indexes contains page {} more than once",
                index
            )));
        }
    }

    if let Some(link) = &config.link {
        Url::parse(link)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid link: {}", e)))?;
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates state configuration
fn validate_state_config(config: &StateConfig) -> Result<(), ConfigError> {
    if matches!(&config.path, Some(path) if path.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "state path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates notification configuration
fn validate_notify_config(config: &NotifyConfig) -> Result<(), ConfigError> {
    if config.max_listed == 0 {
        return Err(ConfigError::Validation(
            "max-listed must be >= 1".to_string(),
        ));
    }

    if config.token_env.is_empty() {
        return Err(ConfigError::Validation(
            "token-env cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api-base: {}", e)))?;

    Ok(())
}

/// Validates the monitoring window
fn validate_window_config(config: &WindowConfig) -> Result<(), ConfigError> {
    let start = parse_time_of_day(&config.start)?;
    let end = parse_time_of_day(&config.end)?;

    if start > end {
        return Err(ConfigError::Validation(format!(
            "window start {} is after window end {}",
            config.start, config.end
        )));
    }

    if !(-23..=23).contains(&config.utc_offset_hours) {
        return Err(ConfigError::Validation(format!(
            "utc-offset-hours must be between -23 and 23, got {}",
            config.utc_offset_hours
        )));
    }

    Ok(())
}

/// Parses an `HH:MM` time of day
pub(crate) fn parse_time_of_day(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ConfigError::InvalidTime(value.to_string()))
}

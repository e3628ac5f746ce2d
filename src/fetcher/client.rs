//! HTTP client construction
//!
//! Builds the reqwest client shared by every page request of a run: user
//! agent, the Origin/Referer pair the listing endpoint expects, timeouts and
//! transparent decompression.

use crate::config::FetcherConfig;
use crate::fetcher::FetchError;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER};
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(FetchError)` - A header value was invalid or the client failed to build
///
/// # Example
///
/// ```no_run
/// use ur_watch::config::FetcherConfig;
/// use ur_watch::fetcher::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    if let Some(origin) = &config.origin {
        headers.insert(ORIGIN, header_value("origin", origin)?);
    }
    if let Some(referer) = &config.referer {
        headers.insert(REFERER, header_value("referer", referer)?);
    }

    let timeout = Duration::from_secs(config.timeout_secs);

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|_| FetchError::InvalidHeader {
        name,
        value: value.to_string(),
    })
}

//! Paginated listing fetcher
//!
//! Issues one form POST per configured page index and returns the raw
//! bodies in page order.
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 2xx | Success |
//! | HTTP 5xx | Retry once after backoff |
//! | HTTP 429 | Retry once after backoff |
//! | Timeout | Retry once after backoff |
//! | Other HTTP status | Page fails immediately |
//! | Connection / other network error | Page fails immediately |
//!
//! A failed page never aborts the remaining pages.

use crate::config::{FetcherConfig, TargetConfig};
use crate::fetcher::client::build_http_client;
use crate::fetcher::FetchError;
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Total attempts per page (the first request plus one retry)
pub const MAX_ATTEMPTS: u32 = 2;

/// Result of fetching one page
#[derive(Debug)]
pub struct PageFetch {
    /// The page index that was requested
    pub index: u32,

    /// Number of requests issued for this page
    pub attempts: u32,

    /// Raw response body, or why the page could not be fetched
    pub result: Result<Vec<u8>, FetchError>,
}

impl PageFetch {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Anything that can produce raw listing pages
///
/// Implementations must return exactly one `PageFetch` per requested index,
/// in the requested order.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_pages(&self, pages: &[u32]) -> Vec<PageFetch>;
}

/// Fetches listing pages from the configured endpoint
pub struct PageFetcher {
    client: Client,
    endpoint: String,
    form: Vec<(String, String)>,
    backoff: Duration,
    concurrent: bool,
}

impl PageFetcher {
    /// Creates a fetcher for the given target
    ///
    /// # Returns
    ///
    /// * `Ok(PageFetcher)` - Ready to fetch
    /// * `Err(FetchError)` - The HTTP client could not be built
    pub fn new(target: &TargetConfig, config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, target, config))
    }

    /// Creates a fetcher reusing an existing client
    pub fn with_client(client: Client, target: &TargetConfig, config: &FetcherConfig) -> Self {
        let mut form = vec![
            ("shisya".to_string(), target.shisya.clone()),
            ("danchi".to_string(), target.danchi_code()),
        ];
        form.extend(target.extra_params.iter().cloned());

        Self {
            client,
            endpoint: target.endpoint.clone(),
            form,
            backoff: Duration::from_millis(config.retry_backoff_ms),
            concurrent: config.concurrent,
        }
    }

    /// Fetches a single page, retrying a transient failure once
    pub async fn fetch_page(&self, index: u32) -> PageFetch {
        let mut attempts = 1;
        loop {
            match self.request_once(index).await {
                Ok(body) => {
                    tracing::debug!(page = index, attempts, bytes = body.len(), "Fetched page");
                    return PageFetch {
                        index,
                        attempts,
                        result: Ok(body),
                    };
                }
                Err(e) if e.is_transient() && attempts < MAX_ATTEMPTS => {
                    tracing::warn!(
                        "Transient failure on page {} ({}), retrying in {}ms",
                        index,
                        e,
                        self.backoff.as_millis()
                    );
                    tokio::time::sleep(self.backoff).await;
                    attempts += 1;
                }
                Err(e) => {
                    tracing::warn!("Giving up on page {} after {} attempt(s): {}", index, attempts, e);
                    return PageFetch {
                        index,
                        attempts,
                        result: Err(e),
                    };
                }
            }
        }
    }

    /// Issues exactly one request for a page
    async fn request_once(&self, index: u32) -> Result<Vec<u8>, FetchError> {
        let mut form = self.form.clone();
        form.push(("pageIndex".to_string(), index.to_string()));

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| classify_error(index, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                page: index,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(index, e))?;

        Ok(body.to_vec())
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch_pages(&self, pages: &[u32]) -> Vec<PageFetch> {
        if self.concurrent {
            // join_all yields results in input order
            join_all(pages.iter().map(|&index| self.fetch_page(index))).await
        } else {
            let mut fetched = Vec::with_capacity(pages.len());
            for &index in pages {
                fetched.push(self.fetch_page(index).await);
            }
            fetched
        }
    }
}

/// Returns true for statuses worth a retry (5xx and 429)
pub fn is_transient_status(status: u16) -> bool {
    StatusCode::from_u16(status)
        .map(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS)
        .unwrap_or(false)
}

fn classify_error(page: u32, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout { page }
    } else {
        FetchError::Network {
            page,
            message: error.to_string(),
        }
    }
}

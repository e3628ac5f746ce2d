//! Fetcher module for the room listing endpoint
//!
//! This module contains:
//! - HTTP client construction with the headers the endpoint expects
//! - Per-page form POSTs with a single retry on transient failure
//! - The `PageSource` seam the monitor fetches through

mod client;
mod pages;

pub use client::build_http_client;
pub use pages::{is_transient_status, PageFetch, PageFetcher, PageSource, MAX_ATTEMPTS};

use thiserror::Error;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for page {page}")]
    Status { page: u32, status: u16 },

    #[error("Request timeout for page {page}")]
    Timeout { page: u32 },

    #[error("Network error for page {page}: {message}")]
    Network { page: u32, message: String },

    #[error("Invalid {name} header value: {value:?}")]
    InvalidHeader { name: &'static str, value: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl FetchError {
    /// Returns true if a retry may succeed (5xx, 429, timeout)
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => is_transient_status(*status),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

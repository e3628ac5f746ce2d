//! Record extraction from raw listing responses
//!
//! This module turns response bodies into room records:
//! - `JsonExtractor`: the JSON listing the endpoint normally returns
//! - `HtmlPatternExtractor`: pattern matching over HTML fragments
//! - `ListingExtractor`: JSON first, HTML patterns as fallback (the default)
//!
//! Extraction degrades instead of failing: unknown shapes produce fewer or
//! zero records. The only hard error is a body that is not text at all.

mod html;
mod json;
mod normalize;

pub use html::HtmlPatternExtractor;
pub use json::JsonExtractor;
pub use normalize::{canonical, decode_area};

use crate::model::{RoomRecord, Snapshot};
use thiserror::Error;

/// Errors that can occur while decoding a response body
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Response body is not text: {reason}")]
    NotText { reason: String },
}

/// Strategy for turning response text into room records
///
/// Implementations never fail on unexpected markup; they return what they
/// could recognize, in document order.
pub trait RecordExtractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn extract(&self, text: &str) -> Vec<RoomRecord>;
}

/// Default extractor: JSON listing when the body is one, HTML patterns otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingExtractor;

impl RecordExtractor for ListingExtractor {
    fn name(&self) -> &'static str {
        "listing"
    }

    fn extract(&self, text: &str) -> Vec<RoomRecord> {
        match JsonExtractor::items(text) {
            Some(items) => JsonExtractor::records_from_items(&items),
            None => HtmlPatternExtractor.extract(text),
        }
    }
}

/// Decodes a raw body as UTF-8 text
///
/// # Returns
///
/// * `Ok(&str)` - The body as text
/// * `Err(ExtractError::NotText)` - Invalid UTF-8 or embedded NUL bytes
pub fn decode_body(body: &[u8]) -> Result<&str, ExtractError> {
    let text = std::str::from_utf8(body).map_err(|e| ExtractError::NotText {
        reason: format!("invalid UTF-8 at byte {}", e.valid_up_to()),
    })?;

    if let Some(offset) = text.find('\0') {
        return Err(ExtractError::NotText {
            reason: format!("NUL byte at offset {}", offset),
        });
    }

    Ok(text)
}

/// Extracts one page into a snapshot contribution
///
/// Duplicate ids within the page keep their last occurrence.
pub fn extract_page(extractor: &dyn RecordExtractor, body: &[u8]) -> Result<Snapshot, ExtractError> {
    let text = decode_body(body)?;
    Ok(Snapshot::from_page(extractor.extract(text)))
}

/// Merges page contributions in page order (first seen wins across pages)
pub fn merge_pages(pages: impl IntoIterator<Item = Snapshot>) -> Snapshot {
    let mut merged = Snapshot::new();
    for page in pages {
        let shadowed = merged.merge_page(page);
        if shadowed > 0 {
            tracing::debug!("{} room(s) already seen on an earlier page", shadowed);
        }
    }
    merged
}

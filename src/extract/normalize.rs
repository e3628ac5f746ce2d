//! Value canonicalization shared by the extractors
//!
//! Upstream renders the same value in several spellings (`85,000円`,
//! `85000 円`, `&#13217;` for ㎡). Canonical values let the reconciler
//! compare attributes without false "changed" events.

use crate::model::Attributes;

/// Replaces HTML-escaped square-meter signs with `㎡`
pub fn decode_area(value: &str) -> String {
    value.replace("&amp;#13217;", "㎡").replace("&#13217;", "㎡")
}

/// Canonicalizes a raw value: decodes area entities, drops commas and whitespace
///
/// Returns None when nothing is left.
pub fn canonical(value: &str) -> Option<String> {
    let cleaned: String = decode_area(value)
        .chars()
        .filter(|c| *c != ',' && *c != '，' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Collapses runs of whitespace into single spaces and trims
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds an attribute map from optional values, skipping missing ones
pub fn build_attributes<'a>(
    fields: impl IntoIterator<Item = (&'a str, Option<String>)>,
) -> Attributes {
    fields
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .and_then(|v| canonical(&v))
                .map(|v| (key.to_string(), v))
        })
        .collect()
}

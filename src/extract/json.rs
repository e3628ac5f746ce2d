//! JSON listing extraction
//!
//! The listing endpoint usually answers with a JSON array of rooms, or an
//! object wrapping that array. Field names have drifted over time, so each
//! attribute is looked up under every known alias.

use crate::extract::normalize::{build_attributes, canonical};
use crate::extract::RecordExtractor;
use crate::model::{keys, RoomRecord};
use serde_json::{Map, Value};

/// Object keys that may wrap the room array
const LIST_KEYS: &[&str] = &["result", "resultList", "rows", "data"];

const ID_KEYS: &[&str] = &["id", "roomId"];
const NAME_KEYS: &[&str] = &["name", "roomNo"];
const LAYOUT_KEYS: &[&str] = &["type", "layout"];
const FLOORSPACE_KEYS: &[&str] = &["floorspace", "area"];
const FLOOR_KEYS: &[&str] = &["floor"];
const RENT_KEYS: &[&str] = &["rent"];
const COMMON_FEE_KEYS: &[&str] = &["commonfee", "maintenanceFee"];

/// Extracts rooms from a JSON listing
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

impl JsonExtractor {
    /// Returns the room items if `text` is a recognizable JSON listing
    ///
    /// `None` means "not a JSON listing" (the caller may try another
    /// strategy); `Some(vec![])` means a JSON listing with zero rooms.
    pub fn items(text: &str) -> Option<Vec<Value>> {
        let value: Value = serde_json::from_str(text.trim()).ok()?;
        match value {
            Value::Array(items) => Some(items),
            Value::Object(mut object) => LIST_KEYS.iter().find_map(|key| match object.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Converts the recognized items into records, dropping items without an id
    pub fn records_from_items(items: &[Value]) -> Vec<RoomRecord> {
        items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(record_from_object)
            .collect()
    }
}

impl RecordExtractor for JsonExtractor {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extract(&self, text: &str) -> Vec<RoomRecord> {
        Self::items(text)
            .map(|items| Self::records_from_items(&items))
            .unwrap_or_default()
    }
}

fn record_from_object(item: &Map<String, Value>) -> Option<RoomRecord> {
    let name = field(item, NAME_KEYS);
    let id = field(item, ID_KEYS)
        .or_else(|| name.clone())
        .and_then(|id| canonical(&id))?;

    let attributes = build_attributes([
        (keys::NAME, name),
        (keys::LAYOUT, field(item, LAYOUT_KEYS)),
        (keys::FLOORSPACE, field(item, FLOORSPACE_KEYS)),
        (keys::FLOOR, field(item, FLOOR_KEYS)),
        (keys::RENT, field(item, RENT_KEYS)),
        (keys::COMMON_FEE, field(item, COMMON_FEE_KEYS)),
    ]);

    RoomRecord::new(id, attributes)
}

/// Returns the first non-empty scalar found under any of `aliases`
fn field(item: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|key| match item.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

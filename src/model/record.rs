//! Room record definitions
//!
//! A room is identified by a stable id and described by an ordered set of
//! attributes; the attributes are the fingerprint used for change detection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute keys produced by the extractors
pub mod keys {
    pub const NAME: &str = "name";
    pub const LAYOUT: &str = "type";
    pub const FLOORSPACE: &str = "floorspace";
    pub const FLOOR: &str = "floor";
    pub const RENT: &str = "rent";
    pub const COMMON_FEE: &str = "commonfee";
}

/// Ordered attribute mapping (field name → value)
pub type Attributes = BTreeMap<String, String>;

/// One observed room on the listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Stable identifier, unique within a property
    pub id: String,

    /// Fingerprint content used for change detection
    pub attributes: Attributes,
}

impl RoomRecord {
    /// Creates a record, returning None when the id is empty
    pub fn new(id: impl Into<String>, attributes: Attributes) -> Option<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            None
        } else {
            Some(Self { id, attributes })
        }
    }

    /// Returns an attribute value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// A short human label: the room name when known, otherwise the id
    pub fn label(&self) -> &str {
        self.get(keys::NAME).unwrap_or(&self.id)
    }
}

impl fmt::Display for RoomRecord {
    /// Formats as `label layout floorspace floor rent`, skipping missing fields
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())?;
        for key in [keys::LAYOUT, keys::FLOORSPACE, keys::FLOOR, keys::RENT] {
            if let Some(value) = self.get(key) {
                write!(f, " {}", value)?;
            }
        }
        Ok(())
    }
}

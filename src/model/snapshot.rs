//! Snapshots of observed rooms
//!
//! A snapshot is keyed by room id and iterates in ascending id order, which
//! keeps reconciliation output and persisted state deterministic.

use crate::model::record::RoomRecord;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;

/// The full set of rooms observed in one run, keyed by room id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    rooms: BTreeMap<String, RoomRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from one page's records in document order
    ///
    /// A room rendered more than once keeps its last occurrence.
    pub fn from_page(records: impl IntoIterator<Item = RoomRecord>) -> Self {
        let mut snapshot = Self::new();
        for record in records {
            snapshot.rooms.insert(record.id.clone(), record);
        }
        snapshot
    }

    /// Merges a later page into this snapshot
    ///
    /// Ids already present are kept (first seen wins across pages).
    /// Returns the number of rooms ignored because an earlier page had them.
    pub fn merge_page(&mut self, page: Snapshot) -> usize {
        let mut shadowed = 0;
        for (id, record) in page.rooms {
            match self.rooms.entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(_) => shadowed += 1,
            }
        }
        shadowed
    }

    pub fn get(&self, id: &str) -> Option<&RoomRecord> {
        self.rooms.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Iterates rooms in ascending id order
    pub fn iter(&self) -> btree_map::Values<'_, String, RoomRecord> {
        self.rooms.values()
    }
}

impl FromIterator<RoomRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = RoomRecord>>(iter: I) -> Self {
        Self::from_page(iter)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a RoomRecord;
    type IntoIter = btree_map::Values<'a, String, RoomRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The last persisted snapshot, or the marker that none was ever written
///
/// `Uninitialized` and `Initialized(empty)` are different: the first triggers
/// the one-off "initialized" notification, the second diffs normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistedState {
    Uninitialized,
    Initialized(Snapshot),
}

impl PersistedState {
    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Initialized(_))
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Self::Uninitialized => None,
            Self::Initialized(snapshot) => Some(snapshot),
        }
    }
}

//! Snapshot diffing and change classification

use crate::model::{Attributes, PersistedState, RoomRecord, Snapshot};
use std::collections::BTreeSet;

/// One classified difference between two snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEvent {
    /// Room present now but not in the previous snapshot
    Appeared(RoomRecord),

    /// Room present in both with different attributes
    ///
    /// `old` and `new` hold only the differing keys; a key missing from one
    /// side was absent in that snapshot.
    Changed {
        id: String,
        label: String,
        old: Attributes,
        new: Attributes,
    },

    /// Room present previously but not any more
    Disappeared(RoomRecord),
}

impl DiffEvent {
    pub fn id(&self) -> &str {
        match self {
            Self::Appeared(record) | Self::Disappeared(record) => &record.id,
            Self::Changed { id, .. } => id,
        }
    }

    /// Keys that differ, for `Changed` events
    pub fn changed_keys(&self) -> Vec<&str> {
        match self {
            Self::Changed { old, new, .. } => old
                .keys()
                .chain(new.keys())
                .map(String::as_str)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Outcome of reconciling the current snapshot against persisted state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// No previous state existed; this run establishes the baseline
    Initialized { room_count: usize },

    /// Ordered differences (empty when nothing changed)
    Events(Vec<DiffEvent>),
}

impl Reconciliation {
    /// True when there is nothing to notify about
    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::Events(events) if events.is_empty())
    }

    pub fn events(&self) -> &[DiffEvent] {
        match self {
            Self::Initialized { .. } => &[],
            Self::Events(events) => events,
        }
    }

    /// Counts of (appeared, changed, disappeared) events
    pub fn counts(&self) -> (usize, usize, usize) {
        self.events()
            .iter()
            .fold((0, 0, 0), |(a, c, d), event| match event {
                DiffEvent::Appeared(_) => (a + 1, c, d),
                DiffEvent::Changed { .. } => (a, c + 1, d),
                DiffEvent::Disappeared(_) => (a, c, d + 1),
            })
    }
}

/// Reconciles the current snapshot against the persisted state
///
/// A first run (no persisted state) yields a single `Initialized` outcome and
/// never per-room events.
pub fn reconcile(previous: &PersistedState, current: &Snapshot) -> Reconciliation {
    match previous {
        PersistedState::Uninitialized => Reconciliation::Initialized {
            room_count: current.len(),
        },
        PersistedState::Initialized(previous) => Reconciliation::Events(diff(previous, current)),
    }
}

/// Computes ordered diff events between two snapshots
///
/// # Ordering
///
/// All `Appeared` events, then all `Changed`, then all `Disappeared`; each
/// group in ascending id order. A disappeared room and an appeared room with
/// identical attributes stay two independent events.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> Vec<DiffEvent> {
    let appeared = current
        .iter()
        .filter(|record| !previous.contains(&record.id))
        .cloned()
        .map(DiffEvent::Appeared);

    let changed = current.iter().filter_map(|record| {
        let before = previous.get(&record.id)?;
        let (old, new) = attribute_delta(&before.attributes, &record.attributes);
        if old.is_empty() && new.is_empty() {
            None
        } else {
            Some(DiffEvent::Changed {
                id: record.id.clone(),
                label: record.label().to_string(),
                old,
                new,
            })
        }
    });

    let disappeared = previous
        .iter()
        .filter(|record| !current.contains(&record.id))
        .cloned()
        .map(DiffEvent::Disappeared);

    appeared.chain(changed).chain(disappeared).collect()
}

/// Returns the differing keys of two attribute maps, split by side
fn attribute_delta(before: &Attributes, after: &Attributes) -> (Attributes, Attributes) {
    let mut old = Attributes::new();
    let mut new = Attributes::new();

    let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    for key in keys {
        let (b, a) = (before.get(key), after.get(key));
        if b == a {
            continue;
        }
        if let Some(value) = b {
            old.insert(key.clone(), value.clone());
        }
        if let Some(value) = a {
            new.insert(key.clone(), value.clone());
        }
    }

    (old, new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, pairs: &[(&str, &str)]) -> RoomRecord {
        let attributes = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RoomRecord::new(id, attributes).unwrap()
    }

    fn snapshot(records: Vec<RoomRecord>) -> Snapshot {
        Snapshot::from_page(records)
    }

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_first_run_is_single_initialized() {
        let current = snapshot(vec![room("A", &[("rent", "1")]), room("B", &[])]);
        let result = reconcile(&PersistedState::Uninitialized, &current);

        assert_eq!(result, Reconciliation::Initialized { room_count: 2 });
        assert!(result.events().is_empty());
        assert!(!result.is_quiet());
    }

    #[test]
    fn test_first_run_with_zero_rooms_still_initializes() {
        let result = reconcile(&PersistedState::Uninitialized, &Snapshot::new());
        assert_eq!(result, Reconciliation::Initialized { room_count: 0 });
    }

    #[test]
    fn test_identical_snapshots_are_quiet_repeatedly() {
        let snap = snapshot(vec![room("A", &[("rent", "1")]), room("B", &[("rent", "2")])]);
        let previous = PersistedState::Initialized(snap.clone());

        for _ in 0..2 {
            let result = reconcile(&previous, &snap);
            assert!(result.is_quiet());
            assert_eq!(result, Reconciliation::Events(vec![]));
        }
    }

    #[test]
    fn test_appeared_then_changed_order() {
        let previous = snapshot(vec![room("A", &[("rent", "50000")])]);
        let current = snapshot(vec![
            room("A", &[("rent", "52000")]),
            room("B", &[("rent", "40000")]),
        ]);

        let events = diff(&previous, &current);
        assert_eq!(
            events,
            vec![
                DiffEvent::Appeared(room("B", &[("rent", "40000")])),
                DiffEvent::Changed {
                    id: "A".to_string(),
                    label: "A".to_string(),
                    old: attrs(&[("rent", "50000")]),
                    new: attrs(&[("rent", "52000")]),
                },
            ]
        );
    }

    #[test]
    fn test_disappearance() {
        let previous = snapshot(vec![room("A", &[("rent", "1")]), room("B", &[("rent", "2")])]);
        let current = snapshot(vec![room("A", &[("rent", "1")])]);

        let events = diff(&previous, &current);
        assert_eq!(
            events,
            vec![DiffEvent::Disappeared(room("B", &[("rent", "2")]))]
        );
    }

    #[test]
    fn test_changed_carries_only_differing_keys() {
        let previous = snapshot(vec![room(
            "A",
            &[("name", "101号室"), ("rent", "1"), ("floor", "1階"), ("type", "2LDK")],
        )]);
        let current = snapshot(vec![room(
            "A",
            &[("name", "101号室"), ("rent", "2"), ("type", "2LDK"), ("commonfee", "3円")],
        )]);

        let events = diff(&previous, &current);
        assert_eq!(events.len(), 1);
        match &events[0] {
            DiffEvent::Changed { label, old, new, .. } => {
                assert_eq!(label, "101号室");
                assert_eq!(old, &attrs(&[("floor", "1階"), ("rent", "1")]));
                assert_eq!(new, &attrs(&[("commonfee", "3円"), ("rent", "2")]));
            }
            other => panic!("expected Changed, got {:?}", other),
        }
        assert_eq!(events[0].changed_keys(), vec!["commonfee", "floor", "rent"]);
    }

    #[test]
    fn test_groups_sorted_by_id() {
        let previous = snapshot(vec![
            room("D2", &[]),
            room("D1", &[]),
            room("C2", &[("v", "1")]),
            room("C1", &[("v", "1")]),
        ]);
        let current = snapshot(vec![
            room("A2", &[]),
            room("C2", &[("v", "2")]),
            room("A1", &[]),
            room("C1", &[("v", "2")]),
        ]);

        let events = diff(&previous, &current);
        let ids: Vec<&str> = events.iter().map(DiffEvent::id).collect();
        assert_eq!(ids, vec!["A1", "A2", "C1", "C2", "D1", "D2"]);
    }

    #[test]
    fn test_same_attributes_new_id_is_not_a_move() {
        let previous = snapshot(vec![room("X", &[("rent", "1")])]);
        let current = snapshot(vec![room("Y", &[("rent", "1")])]);

        let result = reconcile(&PersistedState::Initialized(previous), &current);
        assert_eq!(result.counts(), (1, 0, 1));
        assert!(matches!(result.events()[0], DiffEvent::Appeared(_)));
        assert!(matches!(result.events()[1], DiffEvent::Disappeared(_)));
    }

    #[test]
    fn test_initialized_but_empty_previous_diffs_normally() {
        let current = snapshot(vec![room("A", &[])]);
        let result = reconcile(&PersistedState::Initialized(Snapshot::new()), &current);
        assert_eq!(result.counts(), (1, 0, 0));
    }
}

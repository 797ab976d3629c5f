//! Snapshot-level diff: compare two full captures of a directory source.
//!
//! The engine walks the union of entity keys. Entities present on one side
//! only turn into a `Create` or `Delete` per field; entities present on both
//! sides are compared field by field (see [`diff_entity`]). Output order is
//! not part of the contract.

use snapcdc_types::{ChangeEvent, ChangeKind, IgnoreSet, Snapshot};

use crate::entity_diff::diff_entity;

/// The result of comparing two snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// The field-level change events.
    pub events: Vec<ChangeEvent>,
}

impl SnapshotDiff {
    /// Create an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of change events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Number of `Create` events.
    pub fn creates(&self) -> usize {
        self.count(ChangeKind::Create)
    }

    /// Number of `Delete` events.
    pub fn deletes(&self) -> usize {
        self.count(ChangeKind::Delete)
    }

    /// Number of `Modify` events.
    pub fn modifications(&self) -> usize {
        self.count(ChangeKind::Modify)
    }

    /// Consume the diff, yielding its events.
    pub fn into_events(self) -> Vec<ChangeEvent> {
        self.events
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }
}

impl IntoIterator for SnapshotDiff {
    type Item = ChangeEvent;
    type IntoIter = std::vec::IntoIter<ChangeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

/// Compute the field-level changes that turn `before` into `after`.
///
/// An empty `before` is treated as "no entities": every field in `after`
/// becomes a `Create`. Deciding whether an empty previous capture should be
/// diffed at all is the caller's concern.
pub fn diff_snapshots(before: &Snapshot, after: &Snapshot, ignore: &IgnoreSet) -> SnapshotDiff {
    let mut events = Vec::new();

    for (key, fields) in before {
        diff_entity(key, Some(fields), after.get(key), ignore, &mut events);
    }

    for (key, fields) in after {
        if !before.contains(key) {
            diff_entity(key, None, Some(fields), ignore, &mut events);
        }
    }

    SnapshotDiff { events }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use snapcdc_types::FieldMap;
    use std::collections::BTreeMap;

    fn snapshot(entities: &[(&str, &[(&str, &str)])]) -> Snapshot {
        entities
            .iter()
            .map(|(key, fields)| {
                let map: FieldMap = fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                (key.to_string(), map)
            })
            .collect()
    }

    fn sorted(mut events: Vec<ChangeEvent>) -> Vec<ChangeEvent> {
        events.sort_by(|a, b| {
            (a.entity_key(), a.field_name()).cmp(&(b.entity_key(), b.field_name()))
        });
        events
    }

    #[test]
    fn modified_title() {
        let before = snapshot(&[("alice", &[("title", "eng")])]);
        let after = snapshot(&[("alice", &[("title", "lead")])]);

        let diff = diff_snapshots(&before, &after, &IgnoreSet::empty());
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.modifications(), 1);

        let ev = &diff.events[0];
        assert_eq!(ev.entity_key(), "alice");
        assert_eq!(ev.field_name(), "title");
        assert_eq!(ev.kind(), ChangeKind::Modify);
        assert_eq!(ev.value_before(), Some("eng"));
        assert_eq!(ev.value_after(), Some("lead"));
    }

    #[test]
    fn explicit_empty_before_creates() {
        let before = Snapshot::new();
        let after = snapshot(&[("bob", &[("title", "eng")])]);

        let diff = diff_snapshots(&before, &after, &IgnoreSet::empty());
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.creates(), 1);
        assert_eq!(diff.events[0], ChangeEvent::created("bob", "title", "eng"));
    }

    #[test]
    fn ignored_counter_only_change() {
        let before = snapshot(&[("carol", &[("logonCount", "5"), ("title", "eng")])]);
        let after = snapshot(&[("carol", &[("logonCount", "6"), ("title", "eng")])]);

        let diff = diff_snapshots(&before, &after, &IgnoreSet::new(["logonCount"]));
        assert!(diff.is_empty());
    }

    #[test]
    fn removed_and_added_entities() {
        let before = snapshot(&[("dave", &[("title", "eng"), ("mail", "d@x")])]);
        let after = snapshot(&[("erin", &[("title", "ops")])]);

        let diff = diff_snapshots(&before, &after, &IgnoreSet::empty());
        assert_eq!(diff.len(), 3);
        assert_eq!(diff.deletes(), 2);
        assert_eq!(diff.creates(), 1);
        for ev in &diff.events {
            match ev.kind() {
                ChangeKind::Delete => assert_eq!(ev.entity_key(), "dave"),
                ChangeKind::Create => assert_eq!(ev.entity_key(), "erin"),
                ChangeKind::Modify => panic!("unexpected modify: {ev}"),
            }
        }
    }

    #[test]
    fn removed_entity_respects_ignore_set() {
        let before = snapshot(&[("dave", &[("title", "eng"), ("logonCount", "3")])]);
        let diff = diff_snapshots(&before, &Snapshot::new(), &IgnoreSet::new(["logonCount"]));
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.events[0], ChangeEvent::deleted("dave", "title", "eng"));
    }

    #[test]
    fn unchanged_entities_contribute_nothing() {
        let before = snapshot(&[
            ("alice", &[("title", "eng")]),
            ("bob", &[("title", "ops"), ("mail", "b@x")]),
        ]);
        let after = snapshot(&[
            ("alice", &[("title", "eng")]),
            ("bob", &[("title", "ops"), ("mail", "bob@x")]),
        ]);

        let diff = diff_snapshots(&before, &after, &IgnoreSet::empty());
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.events[0].entity_key(), "bob");
        assert_eq!(diff.events[0].field_name(), "mail");
    }

    #[test]
    fn into_events_yields_all() {
        let after = snapshot(&[("bob", &[("a", "1"), ("b", "2")])]);
        let diff = diff_snapshots(&Snapshot::new(), &after, &IgnoreSet::empty());
        let events: Vec<ChangeEvent> = diff.into_iter().collect();
        assert_eq!(events.len(), 2);
    }

    fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
        prop::collection::btree_map(
            "[a-e]",
            prop::collection::btree_map("[f-j]", "[xy]{0,2}", 0..4),
            0..5,
        )
        .prop_map(|m: BTreeMap<String, FieldMap>| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn diff_with_itself_is_empty(a in arb_snapshot()) {
            prop_assert!(diff_snapshots(&a, &a, &IgnoreSet::empty()).is_empty());
        }

        #[test]
        fn reversed_diff_is_inverted(a in arb_snapshot(), b in arb_snapshot()) {
            let forward = diff_snapshots(&a, &b, &IgnoreSet::empty()).into_events();
            let backward = diff_snapshots(&b, &a, &IgnoreSet::empty()).into_events();
            let inverted: Vec<ChangeEvent> = forward.iter().map(ChangeEvent::inverted).collect();
            prop_assert_eq!(sorted(inverted), sorted(backward));
        }

        #[test]
        fn ignored_fields_never_reported(a in arb_snapshot(), b in arb_snapshot()) {
            let ignore = IgnoreSet::new(["f", "h"]);
            let diff = diff_snapshots(&a, &b, &ignore);
            prop_assert!(diff.events.iter().all(|e| !ignore.contains(e.field_name())));
        }

        #[test]
        fn kinds_agree_with_values(a in arb_snapshot(), b in arb_snapshot()) {
            for ev in diff_snapshots(&a, &b, &IgnoreSet::empty()) {
                match ev.kind() {
                    ChangeKind::Create => {
                        prop_assert!(ev.value_before().is_none());
                        prop_assert!(ev.value_after().is_some());
                    }
                    ChangeKind::Delete => {
                        prop_assert!(ev.value_before().is_some());
                        prop_assert!(ev.value_after().is_none());
                    }
                    ChangeKind::Modify => {
                        prop_assert!(ev.value_before().is_some());
                        prop_assert!(ev.value_after().is_some());
                        prop_assert_ne!(ev.value_before(), ev.value_after());
                    }
                }
            }
        }

        #[test]
        fn one_sided_entities_fully_reported(a in arb_snapshot(), b in arb_snapshot()) {
            let diff = diff_snapshots(&a, &b, &IgnoreSet::empty());
            for (key, fields) in &a {
                if !b.contains(key) {
                    let n = diff.events.iter()
                        .filter(|e| {
                            e.entity_key() == key.as_str() && e.kind() == ChangeKind::Delete
                        })
                        .count();
                    prop_assert_eq!(n, fields.len());
                }
            }
            for (key, fields) in &b {
                if !a.contains(key) {
                    let n = diff.events.iter()
                        .filter(|e| {
                            e.entity_key() == key.as_str() && e.kind() == ChangeKind::Create
                        })
                        .count();
                    prop_assert_eq!(n, fields.len());
                }
            }
        }

        #[test]
        fn at_most_one_event_per_field(a in arb_snapshot(), b in arb_snapshot()) {
            let events = sorted(diff_snapshots(&a, &b, &IgnoreSet::empty()).into_events());
            for pair in events.windows(2) {
                prop_assert!(
                    (pair[0].entity_key(), pair[0].field_name())
                        != (pair[1].entity_key(), pair[1].field_name())
                );
            }
        }
    }
}

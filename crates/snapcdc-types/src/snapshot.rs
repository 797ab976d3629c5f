//! Point-in-time captures of a directory source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Unique identifier of one record within a snapshot (e.g. an account name).
pub type EntityKey = String;

/// Field name to serialized value for a single entity.
///
/// A field missing from the map is "not present", which is distinct from a
/// field that is present with an empty string value.
pub type FieldMap = BTreeMap<String, String>;

/// Full state of the source at one point in time.
///
/// Keys are unique by construction: inserting an existing key replaces the
/// previous field map (last write wins).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entities: BTreeMap<EntityKey, FieldMap>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot from a JSON object of the form
    /// `{"key": {"field": "value", ...}, ...}`.
    pub fn from_json(text: &str) -> TypeResult<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(text).map_err(|e| TypeError::InvalidSnapshot(e.to_string()))?;
        if snapshot.entities.contains_key("") {
            return Err(TypeError::EmptyEntityKey);
        }
        Ok(snapshot)
    }

    /// Insert an entity, returning the field map it replaced, if any.
    pub fn insert(&mut self, key: impl Into<EntityKey>, fields: FieldMap) -> Option<FieldMap> {
        self.entities.insert(key.into(), fields)
    }

    /// Field map of the entity with the given key.
    pub fn get(&self, key: &str) -> Option<&FieldMap> {
        self.entities.get(key)
    }

    /// Returns `true` if the snapshot holds an entity with this key.
    pub fn contains(&self, key: &str) -> bool {
        self.entities.contains_key(key)
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the snapshot holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.entities.keys()
    }

    /// Iterate over `(key, fields)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &FieldMap)> {
        self.entities.iter()
    }

    /// Total number of fields across all entities.
    pub fn field_count(&self) -> usize {
        self.entities.values().map(BTreeMap::len).sum()
    }
}

impl FromIterator<(EntityKey, FieldMap)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (EntityKey, FieldMap)>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for (key, fields) in iter {
            snapshot.insert(key, fields);
        }
        snapshot
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a EntityKey, &'a FieldMap);
    type IntoIter = std::collections::btree_map::Iter<'a, EntityKey, FieldMap>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_snapshot() {
        let s = Snapshot::new();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert_eq!(s.field_count(), 0);
    }

    #[test]
    fn insert_last_write_wins() {
        let mut s = Snapshot::new();
        assert!(s.insert("alice", fields(&[("title", "eng")])).is_none());
        let replaced = s.insert("alice", fields(&[("title", "lead")]));
        assert_eq!(replaced, Some(fields(&[("title", "eng")])));
        assert_eq!(s.len(), 1);
        assert_eq!(s.get("alice").unwrap()["title"], "lead");
    }

    #[test]
    fn collect_from_pairs() {
        let s: Snapshot = vec![
            ("bob".to_string(), fields(&[("title", "eng"), ("mail", "b@x")])),
            ("alice".to_string(), fields(&[("title", "lead")])),
        ]
        .into_iter()
        .collect();
        assert_eq!(s.len(), 2);
        assert_eq!(s.field_count(), 3);
        let keys: Vec<&String> = s.keys().collect();
        assert_eq!(keys, vec!["alice", "bob"]);
        assert!(s.contains("bob"));
        assert!(!s.contains("carol"));
    }

    #[test]
    fn empty_string_value_is_present() {
        let mut s = Snapshot::new();
        s.insert("dave", fields(&[("description", "")]));
        let entity = s.get("dave").unwrap();
        assert_eq!(entity.get("description").map(String::as_str), Some(""));
        assert!(entity.get("mail").is_none());
    }

    #[test]
    fn parse_json_document() {
        let s = Snapshot::from_json(r#"{"alice": {"title": "eng"}, "bob": {}}"#).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.get("alice").unwrap()["title"], "eng");
        assert!(s.get("bob").unwrap().is_empty());
    }

    #[test]
    fn parse_json_rejects_garbage() {
        let err = Snapshot::from_json("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, TypeError::InvalidSnapshot(_)));
    }

    #[test]
    fn parse_json_rejects_empty_key() {
        let err = Snapshot::from_json(r#"{"": {"title": "eng"}}"#).unwrap_err();
        assert_eq!(err, TypeError::EmptyEntityKey);
    }

    #[test]
    fn serde_roundtrip_is_transparent() {
        let mut s = Snapshot::new();
        s.insert("alice", fields(&[("title", "eng")]));
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"alice":{"title":"eng"}}"#);
    }
}

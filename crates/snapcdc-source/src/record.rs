//! Raw directory records and their conversion into snapshot entities.

use std::collections::BTreeMap;

use snapcdc_types::{FieldMap, Snapshot};
use tracing::debug;

/// A record as returned by a directory search: multi-valued attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryRecord {
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl DirectoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a record whose key attribute holds `key`.
    pub fn keyed(key_attribute: &str, key: &str) -> Self {
        Self::new().with(key_attribute, key)
    }

    /// Builder: add a single-valued attribute.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), vec![value.to_string()]);
        self
    }

    /// Builder: add a multi-valued attribute.
    pub fn with_values(mut self, name: &str, values: &[&str]) -> Self {
        self.attributes
            .insert(name.to_string(), values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// First value of an attribute, if any.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)?.first().map(String::as_str)
    }

    /// Keep only the named attributes. An empty list keeps everything.
    pub fn project(mut self, attributes: &[String]) -> Self {
        if !attributes.is_empty() {
            self.attributes.retain(|name, _| attributes.contains(name));
        }
        self
    }

    /// Serialize every attribute into a single field value.
    pub fn into_fields(self) -> FieldMap {
        self.attributes
            .into_iter()
            .map(|(name, values)| (name, encode_values(values)))
            .collect()
    }
}

/// Single values are kept verbatim, multiple values become a JSON array,
/// no values become the empty string.
fn encode_values(mut values: Vec<String>) -> String {
    match values.len() {
        0 => String::new(),
        1 => values.remove(0),
        _ => serde_json::to_string(&values).unwrap_or_else(|_| values.join(",")),
    }
}

/// Add `record` to `snapshot`, keyed by the first value of `key_attribute`.
///
/// Records without a non-empty key are skipped and `false` is returned.
/// A duplicate key replaces the earlier record.
pub(crate) fn absorb_record(
    snapshot: &mut Snapshot,
    record: DirectoryRecord,
    key_attribute: &str,
) -> bool {
    let key = match record.first_value(key_attribute) {
        Some(k) if !k.is_empty() => k.to_string(),
        _ => {
            debug!(key_attribute, "skipping record without key attribute");
            return false;
        }
    };
    if snapshot.insert(key.clone(), record.into_fields()).is_some() {
        debug!(key = %key, "duplicate entity key, keeping the later record");
    }
    true
}

/// Build a snapshot from a complete list of records.
pub fn snapshot_from_records<I>(records: I, key_attribute: &str) -> Snapshot
where
    I: IntoIterator<Item = DirectoryRecord>,
{
    let mut snapshot = Snapshot::new();
    for record in records {
        absorb_record(&mut snapshot, record, key_attribute);
    }
    snapshot
}

//! Entity-level diff: compare the field maps of one entity.

use snapcdc_types::{ChangeEvent, FieldMap, IgnoreSet};

/// Append the changes between two observations of the entity `key` to `out`.
///
/// `None` on a side means the entity does not exist in that snapshot, so
/// every non-ignored field on the other side becomes a `Create` or `Delete`.
/// When both sides exist the union of their field names is compared.
pub fn diff_entity(
    key: &str,
    before: Option<&FieldMap>,
    after: Option<&FieldMap>,
    ignore: &IgnoreSet,
    out: &mut Vec<ChangeEvent>,
) {
    match (before, after) {
        (Some(before), None) => {
            for (field, value) in before {
                if !ignore.contains(field) {
                    out.push(ChangeEvent::deleted(key, field.as_str(), value.as_str()));
                }
            }
        }
        (None, Some(after)) => {
            for (field, value) in after {
                if !ignore.contains(field) {
                    out.push(ChangeEvent::created(key, field.as_str(), value.as_str()));
                }
            }
        }
        (Some(before), Some(after)) => {
            // Fields present before: deleted or possibly modified.
            for (field, old) in before {
                if ignore.contains(field) {
                    continue;
                }
                let new = after.get(field).cloned();
                let old = Some(old.clone());
                if let Some(event) = ChangeEvent::from_values(key, field.as_str(), old, new) {
                    out.push(event);
                }
            }
            // Fields that only exist after.
            for (field, new) in after {
                if !before.contains_key(field) && !ignore.contains(field) {
                    out.push(ChangeEvent::created(key, field.as_str(), new.as_str()));
                }
            }
        }
        (None, None) => {}
    }
}

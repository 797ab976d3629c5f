use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::snapshot::EntityKey;

/// Classification of a field-level change.
///
/// The kind is derived from which sides of a comparison hold a value; it is
/// never set directly by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChangeKind {
    /// The field is absent before and present after.
    Create,
    /// The field is present before and absent after.
    Delete,
    /// The field is present on both sides with different values.
    Modify,
}

impl ChangeKind {
    /// The opposite kind when the comparison direction is reversed.
    pub fn inverse(self) -> Self {
        match self {
            Self::Create => Self::Delete,
            Self::Delete => Self::Create,
            Self::Modify => Self::Modify,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "Create",
            Self::Delete => "Delete",
            Self::Modify => "Modify",
        };
        write!(f, "{s}")
    }
}

/// One detected field-level difference between two consecutive snapshots.
///
/// `value_before` is `None` when the field did not exist in the earlier
/// snapshot, `value_after` is `None` when it does not exist in the later one.
///
/// Deserialization re-derives the kind from the values and rejects a
/// document whose `kind` disagrees with them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawChangeEvent")]
pub struct ChangeEvent {
    entity_key: EntityKey,
    field_name: String,
    kind: ChangeKind,
    value_before: Option<String>,
    value_after: Option<String>,
}

impl ChangeEvent {
    /// Derive the change between two observations of one field.
    ///
    /// Returns `None` when nothing changed: the field is absent on both sides,
    /// or present on both sides with equal values.
    pub fn from_values(
        entity_key: impl Into<EntityKey>,
        field_name: impl Into<String>,
        value_before: Option<String>,
        value_after: Option<String>,
    ) -> Option<Self> {
        let kind = match (&value_before, &value_after) {
            (None, Some(_)) => ChangeKind::Create,
            (Some(_), None) => ChangeKind::Delete,
            (Some(b), Some(a)) if b != a => ChangeKind::Modify,
            _ => return None,
        };
        Some(Self {
            entity_key: entity_key.into(),
            field_name: field_name.into(),
            kind,
            value_before,
            value_after,
        })
    }

    /// A field that appeared.
    pub fn created(
        entity_key: impl Into<EntityKey>,
        field_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            entity_key: entity_key.into(),
            field_name: field_name.into(),
            kind: ChangeKind::Create,
            value_before: None,
            value_after: Some(value.into()),
        }
    }

    /// A field that disappeared.
    pub fn deleted(
        entity_key: impl Into<EntityKey>,
        field_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            entity_key: entity_key.into(),
            field_name: field_name.into(),
            kind: ChangeKind::Delete,
            value_before: Some(value.into()),
            value_after: None,
        }
    }

    pub fn entity_key(&self) -> &str {
        &self.entity_key
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn value_before(&self) -> Option<&str> {
        self.value_before.as_deref()
    }

    pub fn value_after(&self) -> Option<&str> {
        self.value_after.as_deref()
    }

    /// The same change observed in the opposite direction.
    pub fn inverted(&self) -> Self {
        Self {
            entity_key: self.entity_key.clone(),
            field_name: self.field_name.clone(),
            kind: self.kind.inverse(),
            value_before: self.value_after.clone(),
            value_after: self.value_before.clone(),
        }
    }
}

/// Wire form of a [`ChangeEvent`] before its kind is checked.
#[derive(Deserialize)]
struct RawChangeEvent {
    entity_key: EntityKey,
    field_name: String,
    kind: ChangeKind,
    value_before: Option<String>,
    value_after: Option<String>,
}

impl TryFrom<RawChangeEvent> for ChangeEvent {
    type Error = TypeError;

    fn try_from(raw: RawChangeEvent) -> Result<Self, TypeError> {
        let inconsistent = || TypeError::InconsistentChange {
            entity_key: raw.entity_key.clone(),
            field_name: raw.field_name.clone(),
            kind: raw.kind.to_string(),
        };
        let event = ChangeEvent::from_values(
            raw.entity_key.clone(),
            raw.field_name.clone(),
            raw.value_before.clone(),
            raw.value_after.clone(),
        )
        .ok_or_else(inconsistent)?;
        if event.kind != raw.kind {
            return Err(inconsistent());
        }
        Ok(event)
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{}: {:?} -> {:?}",
            self.kind, self.entity_key, self.field_name, self.value_before, self.value_after
        )
    }
}

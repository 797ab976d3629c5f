//! Foundation types for snapcdc.
//!
//! This crate provides the data model shared by every other snapcdc crate:
//! the point-in-time [`Snapshot`] of a directory source, the per-entity
//! [`FieldMap`], the [`IgnoreSet`] of excluded fields, and the
//! [`ChangeEvent`] produced when two snapshots differ.
//!
//! # Key Types
//!
//! - [`Snapshot`] -- Entity key to field mapping, immutable once captured
//! - [`FieldMap`] -- Field name to serialized value for one entity
//! - [`IgnoreSet`] -- Field names excluded from diffing
//! - [`ChangeKind`] -- `Create`, `Delete` or `Modify`, always derived
//! - [`ChangeEvent`] -- One field-level difference between two snapshots

pub mod change;
pub mod error;
pub mod ignore;
pub mod snapshot;

pub use change::{ChangeEvent, ChangeKind};
pub use error::{TypeError, TypeResult};
pub use ignore::IgnoreSet;
pub use snapshot::{EntityKey, FieldMap, Snapshot};

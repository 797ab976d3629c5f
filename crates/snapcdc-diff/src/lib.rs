//! Diff engine for snapcdc.
//!
//! Compares two snapshots of a directory source and produces one
//! [`ChangeEvent`](snapcdc_types::ChangeEvent) per field that was created,
//! deleted or modified in between. Fields named in the
//! [`IgnoreSet`](snapcdc_types::IgnoreSet) never produce events.
//!
//! # Key Types
//!
//! - [`SnapshotDiff`] -- Result of comparing two snapshots
//! - [`diff_snapshots`] -- Whole-snapshot comparison
//! - [`diff_entity`] -- Field-level comparison of a single entity

pub mod entity_diff;
pub mod snapshot_diff;

pub use entity_diff::diff_entity;
pub use snapshot_diff::{diff_snapshots, SnapshotDiff};

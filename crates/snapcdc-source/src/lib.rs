//! Snapshot sources for snapcdc.
//!
//! The monitor only needs one thing from a source: a complete
//! [`Snapshot`](snapcdc_types::Snapshot) on demand, expressed by the
//! [`SnapshotFetcher`] trait. This crate also provides [`PagedFetcher`],
//! which implements that trait on top of any page-oriented directory
//! connection and owns the reconnect policy for stale paging cursors.
//!
//! # Directory Backends
//!
//! All backends implement [`DirectoryConnector`]:
//!
//! - [`InMemoryDirectory`] -- shared record set for tests and embedding
//! - [`JsonFileDirectory`] -- JSON export file, reread on every snapshot

pub mod config;
pub mod directory;
pub mod error;
pub mod fetcher;
pub mod json_file;
pub mod memory;
pub mod paged;
pub mod record;

pub use config::{FetcherConfig, DEFAULT_KEY_ATTRIBUTE};
pub use directory::{DirectoryConnection, DirectoryConnector, Page, PageRequest};
pub use error::{FetchError, FetchResult};
pub use fetcher::SnapshotFetcher;
pub use json_file::{load_snapshot, parse_dump, JsonFileDirectory};
pub use memory::InMemoryDirectory;
pub use paged::PagedFetcher;
pub use record::{snapshot_from_records, DirectoryRecord};

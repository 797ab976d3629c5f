//! Directory backed by a JSON export file.
//!
//! The file holds an array of records, each an object mapping attribute
//! names to a string or an array of strings:
//!
//! ```json
//! [
//!   {"sAMAccountName": "alice", "title": "eng", "memberOf": ["staff", "admins"]},
//!   {"sAMAccountName": "bob", "title": "ops"}
//! ]
//! ```
//!
//! A snapshot object `{"alice": {"title": "eng"}}` is accepted as well; each
//! entity becomes one record with its key stored under the connector's key
//! attribute.
//!
//! The file is reread at the start of every snapshot, so an external process
//! can rewrite it between polls.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use snapcdc_types::Snapshot;
use tracing::debug;

use crate::config::DEFAULT_KEY_ATTRIBUTE;
use crate::directory::{DirectoryConnection, DirectoryConnector, Page, PageRequest};
use crate::error::{FetchError, FetchResult};
use crate::memory::page_slice;
use crate::record::{snapshot_from_records, DirectoryRecord};

#[derive(Deserialize)]
#[serde(untagged)]
enum AttributeValue {
    One(String),
    Many(Vec<String>),
}

/// Parse a JSON array of records.
pub fn parse_records(text: &str) -> FetchResult<Vec<DirectoryRecord>> {
    let raw: Vec<BTreeMap<String, AttributeValue>> =
        serde_json::from_str(text).map_err(|e| FetchError::Malformed(e.to_string()))?;
    Ok(raw
        .into_iter()
        .map(|attrs| DirectoryRecord {
            attributes: attrs
                .into_iter()
                .map(|(name, value)| {
                    let values = match value {
                        AttributeValue::One(v) => vec![v],
                        AttributeValue::Many(vs) => vs,
                    };
                    (name, values)
                })
                .collect(),
        })
        .collect())
}

/// Parse either supported layout into records.
pub fn parse_dump(text: &str, key_attribute: &str) -> FetchResult<Vec<DirectoryRecord>> {
    if text.trim_start().starts_with('[') {
        return parse_records(text);
    }
    let snapshot = Snapshot::from_json(text).map_err(|e| FetchError::Malformed(e.to_string()))?;
    Ok(snapshot
        .iter()
        .map(|(key, fields)| {
            fields
                .iter()
                .fold(DirectoryRecord::new(), |record, (name, value)| record.with(name, value))
                .with(key_attribute, key)
        })
        .collect())
}

/// Load a snapshot from a file in either supported layout: an array of
/// records (keyed by `key_attribute`) or a snapshot object
/// `{"key": {"field": "value"}}`.
///
/// The result is the snapshot a [`JsonFileDirectory`] read of the same file
/// yields, so object entities carry their key under `key_attribute`.
pub async fn load_snapshot(path: &Path, key_attribute: &str) -> FetchResult<Snapshot> {
    let text = tokio::fs::read_to_string(path).await?;
    let records = parse_dump(&text, key_attribute)?;
    Ok(snapshot_from_records(records, key_attribute))
}

/// Connector for a JSON export file.
#[derive(Clone, Debug)]
pub struct JsonFileDirectory {
    path: PathBuf,
    key_attribute: String,
}

impl JsonFileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key_attribute: DEFAULT_KEY_ATTRIBUTE.to_string(),
        }
    }

    /// Attribute that receives the entity key when the file holds a
    /// snapshot object.
    pub fn with_key_attribute(mut self, key_attribute: impl Into<String>) -> Self {
        self.key_attribute = key_attribute.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DirectoryConnector for JsonFileDirectory {
    type Connection = JsonFileConnection;

    async fn connect(&self) -> FetchResult<JsonFileConnection> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| FetchError::Connect(format!("{}: {e}", self.path.display())))?;
        if !meta.is_file() {
            return Err(FetchError::Connect(format!("{} is not a file", self.path.display())));
        }
        debug!(path = %self.path.display(), "opened JSON directory");
        Ok(JsonFileConnection {
            path: self.path.clone(),
            key_attribute: self.key_attribute.clone(),
            records: Vec::new(),
            closed: false,
        })
    }
}

/// Connection handed out by [`JsonFileDirectory`]. Holds the records read
/// for the first page so later pages of the same search stay consistent.
pub struct JsonFileConnection {
    path: PathBuf,
    key_attribute: String,
    records: Vec<DirectoryRecord>,
    closed: bool,
}

#[async_trait]
impl DirectoryConnection for JsonFileConnection {
    async fn search_page(&mut self, request: &PageRequest) -> FetchResult<Page> {
        if self.closed {
            return Err(FetchError::Closed);
        }
        if request.cookie.is_none() {
            let text = tokio::fs::read_to_string(&self.path).await?;
            self.records = parse_dump(&text, &self.key_attribute)?;
        }
        page_slice(&self.records, request)
    }

    async fn close(&mut self) {
        self.closed = true;
        self.records.clear();
    }
}

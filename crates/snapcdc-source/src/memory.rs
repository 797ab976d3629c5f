use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::directory::{DirectoryConnection, DirectoryConnector, Page, PageRequest};
use crate::error::{FetchError, FetchResult};
use crate::record::DirectoryRecord;

/// In-memory directory server.
///
/// Intended for tests and embedding. Cloning yields another handle to the
/// same records, so a test can mutate the directory while a monitor polls
/// it. Failures can be queued to exercise reconnect and retry paths.
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    records: RwLock<Vec<DirectoryRecord>>,
    connect_faults: Mutex<VecDeque<FetchError>>,
    search_faults: Mutex<VecDeque<FetchError>>,
    connects: AtomicUsize,
    searches: AtomicUsize,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding `records`.
    pub fn with_records(records: Vec<DirectoryRecord>) -> Self {
        let dir = Self::new();
        dir.replace_all(records);
        dir
    }

    /// Replace the whole record set.
    pub fn replace_all(&self, records: Vec<DirectoryRecord>) {
        *self.inner.records.write().expect("lock poisoned") = records;
    }

    /// Append a record.
    pub fn insert(&self, record: DirectoryRecord) {
        self.inner.records.write().expect("lock poisoned").push(record);
    }

    /// Remove every record whose `attribute` has `value` as first value.
    /// Returns the number of records removed.
    pub fn remove_where(&self, attribute: &str, value: &str) -> usize {
        let mut records = self.inner.records.write().expect("lock poisoned");
        let before = records.len();
        records.retain(|r| r.first_value(attribute) != Some(value));
        before - records.len()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.inner.records.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the directory holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the next connection attempt fail with `err`.
    pub fn fail_next_connect(&self, err: FetchError) {
        self.inner.connect_faults.lock().expect("lock poisoned").push_back(err);
    }

    /// Make the next page search fail with `err`.
    pub fn fail_next_search(&self, err: FetchError) {
        self.inner.search_faults.lock().expect("lock poisoned").push_back(err);
    }

    /// Number of successful connections opened so far.
    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// Number of page searches answered so far, failed ones included.
    pub fn search_count(&self) -> usize {
        self.inner.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryConnector for InMemoryDirectory {
    type Connection = InMemoryConnection;

    async fn connect(&self) -> FetchResult<InMemoryConnection> {
        if let Some(err) = self.inner.connect_faults.lock().expect("lock poisoned").pop_front() {
            return Err(err);
        }
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        Ok(InMemoryConnection {
            dir: self.clone(),
            closed: false,
        })
    }
}

/// Connection handed out by [`InMemoryDirectory`].
pub struct InMemoryConnection {
    dir: InMemoryDirectory,
    closed: bool,
}

#[async_trait]
impl DirectoryConnection for InMemoryConnection {
    async fn search_page(&mut self, request: &PageRequest) -> FetchResult<Page> {
        if self.closed {
            return Err(FetchError::Closed);
        }
        let inner = &self.dir.inner;
        inner.searches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = inner.search_faults.lock().expect("lock poisoned").pop_front() {
            return Err(err);
        }

        let records = inner.records.read().expect("lock poisoned");
        page_slice(&records, request)
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

/// Cut one page out of a full record list. The cookie is the decimal offset
/// of the next record.
pub(crate) fn page_slice(records: &[DirectoryRecord], request: &PageRequest) -> FetchResult<Page> {
    let offset = match request.cookie.as_deref() {
        None | Some([]) => 0,
        Some(cookie) => std::str::from_utf8(cookie)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|o| *o <= records.len())
            .ok_or_else(|| FetchError::StaleCursor("unknown paging cookie".into()))?,
    };

    let page_size = if request.page_size == 0 { records.len() } else { request.page_size };
    let end = offset.saturating_add(page_size).min(records.len());
    let page: Vec<DirectoryRecord> = records[offset..end]
        .iter()
        .cloned()
        .map(|r| r.project(&request.attributes))
        .collect();
    let cookie = (end < records.len()).then(|| end.to_string().into_bytes());

    Ok(Page { records: page, cookie })
}

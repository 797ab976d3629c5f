//! Test doubles shared by the monitor's unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use snapcdc_source::{FetchError, FetchResult, SnapshotFetcher};
use snapcdc_types::{FieldMap, Snapshot};

/// Build a snapshot from `(key, [(field, value)])` literals.
pub(crate) fn snapshot(entities: &[(&str, &[(&str, &str)])]) -> Snapshot {
    entities
        .iter()
        .map(|(key, fields)| {
            let fields: FieldMap = fields
                .iter()
                .map(|(f, v)| (f.to_string(), v.to_string()))
                .collect();
            (key.to_string(), fields)
        })
        .collect()
}

/// Fetcher that replays a fixed script of results. Once the script runs out
/// it keeps returning the last successful snapshot.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    script: Mutex<VecDeque<FetchResult<Snapshot>>>,
    last: Mutex<Option<Snapshot>>,
    fetches: AtomicUsize,
    closed: AtomicBool,
}

impl ScriptedFetcher {
    pub(crate) fn new(script: impl IntoIterator<Item = FetchResult<Snapshot>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Default::default()
        })
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFetcher for ScriptedFetcher {
    async fn fetch_snapshot(&self) -> FetchResult<Snapshot> {
        if self.is_closed() {
            return Err(FetchError::Closed);
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(snapshot)) => {
                *self.last.lock().unwrap() = Some(snapshot.clone());
                Ok(snapshot)
            }
            Some(Err(err)) => Err(err),
            None => self.last.lock().unwrap().clone().ok_or(FetchError::Closed),
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Shared in-memory sink for captured log output.
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

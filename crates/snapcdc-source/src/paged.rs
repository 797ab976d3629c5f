//! Snapshot fetcher over a paged directory search.
//!
//! Each snapshot is one search walked page by page until the server returns
//! an empty cookie. A stale cursor means the server dropped our paging
//! state: the fetcher reconnects, pauses, and restarts the snapshot from the
//! first page so that no partial result is ever returned.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use snapcdc_types::Snapshot;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::FetcherConfig;
use crate::directory::{DirectoryConnection, DirectoryConnector, PageRequest};
use crate::error::{FetchError, FetchResult};
use crate::fetcher::SnapshotFetcher;
use crate::record::absorb_record;

/// [`SnapshotFetcher`] that reads a whole directory through paged searches.
pub struct PagedFetcher<C: DirectoryConnector> {
    connector: C,
    config: FetcherConfig,
    conn: Mutex<Option<C::Connection>>,
    closed: AtomicBool,
}

impl<C: DirectoryConnector> PagedFetcher<C> {
    /// Open the initial connection.
    ///
    /// An unreachable or rejecting source fails here, before any monitor is
    /// built on top of the fetcher.
    pub async fn connect(connector: C, config: FetcherConfig) -> FetchResult<Self> {
        let conn = connector.connect().await?;
        if config.diagnostics {
            info!(base = %config.base, page_size = config.page_size, "connected to directory");
        }
        Ok(Self {
            connector,
            config,
            conn: Mutex::new(Some(conn)),
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn first_page_request(&self) -> PageRequest {
        PageRequest {
            base: self.config.base.clone(),
            filter: self.config.filter.clone(),
            attributes: self.config.requested_attributes(),
            page_size: self.config.page_size,
            cookie: None,
        }
    }

    /// Walk every page of one search over `conn`.
    async fn read_all_pages(&self, conn: &mut C::Connection) -> FetchResult<Snapshot> {
        let mut snapshot = Snapshot::new();
        let mut request = self.first_page_request();
        let mut pages = 0usize;
        loop {
            let page = conn.search_page(&request).await?;
            pages += 1;
            let next = page.next_cookie().map(<[u8]>::to_vec);
            for record in page.records {
                absorb_record(&mut snapshot, record, &self.config.key_attribute);
            }
            match next {
                Some(cookie) => request.cookie = Some(cookie),
                None => break,
            }
        }
        debug!(pages, entities = snapshot.len(), "directory search complete");
        Ok(snapshot)
    }
}

#[async_trait]
impl<C> SnapshotFetcher for PagedFetcher<C>
where
    C: DirectoryConnector + 'static,
{
    async fn fetch_snapshot(&self) -> FetchResult<Snapshot> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FetchError::Closed);
        }
        if self.config.diagnostics {
            info!("starting directory read");
        }

        let mut guard = self.conn.lock().await;
        let mut reconnects = 0u32;
        loop {
            // A connection dropped by a failed reconnect is reopened here.
            if guard.is_none() {
                *guard = Some(self.connector.connect().await?);
            }
            let Some(conn) = guard.as_mut() else {
                return Err(FetchError::Closed);
            };

            match self.read_all_pages(conn).await {
                Ok(snapshot) => {
                    if self.config.diagnostics {
                        info!(entities = snapshot.len(), "finished directory read");
                    }
                    return Ok(snapshot);
                }
                Err(err) if err.is_transient() && reconnects < self.config.max_reconnects => {
                    reconnects += 1;
                    if self.config.diagnostics {
                        info!(attempt = reconnects, error = %err, "reconnecting");
                    }
                    if let Some(mut stale) = guard.take() {
                        stale.close().await;
                    }
                    *guard = Some(self.connector.connect().await?);
                    tokio::time::sleep(self.config.reconnect_delay()).await;
                }
                Err(err) => {
                    warn!(error = %err, reconnects, "directory read failed");
                    return Err(err);
                }
            }
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(mut conn) = self.conn.lock().await.take() {
            conn.close().await;
        }
        if self.config.diagnostics {
            info!("directory connection closed");
        }
    }
}

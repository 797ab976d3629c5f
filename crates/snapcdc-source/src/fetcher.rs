use async_trait::async_trait;
use snapcdc_types::Snapshot;

use crate::error::FetchResult;

/// Produces full snapshots of a directory source.
///
/// Implementations must perform any pagination internally and return either
/// a complete snapshot or an error; a partial read is never returned as a
/// snapshot. Transport retry and reconnect policy belongs to the
/// implementation.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Capture the current state of the whole source.
    async fn fetch_snapshot(&self) -> FetchResult<Snapshot>;

    /// Release the underlying connection. Idempotent; later fetches fail
    /// with [`FetchError::Closed`](crate::FetchError::Closed).
    async fn close(&self);
}

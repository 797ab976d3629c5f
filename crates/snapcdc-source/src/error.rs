use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("search failed: {0}")]
    Query(String),

    /// The server no longer recognises the paging cursor. Recovered by
    /// reconnecting and restarting the snapshot from the first page.
    #[error("stale paging cursor: {0}")]
    StaleCursor(String),

    #[error("malformed source data: {0}")]
    Malformed(String),

    #[error("source is closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Returns `true` for errors that a fresh connection is expected to cure.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StaleCursor(_))
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

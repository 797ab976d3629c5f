//! Page-oriented directory access.
//!
//! A [`DirectoryConnector`] opens authenticated [`DirectoryConnection`]s; a
//! connection answers one [`PageRequest`] at a time. Paging state travels in
//! an opaque cookie that the server hands back with each page.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::record::DirectoryRecord;

/// One paged search request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub base: String,
    pub filter: String,
    /// Attributes to return. Empty means all.
    pub attributes: Vec<String>,
    pub page_size: usize,
    /// Cookie from the previous page, `None` for the first page.
    pub cookie: Option<Vec<u8>>,
}

/// One page of search results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub records: Vec<DirectoryRecord>,
    /// Cookie for the next page. `None` or empty marks the last page.
    pub cookie: Option<Vec<u8>>,
}

impl Page {
    /// Returns the cookie to continue with, if more pages follow.
    pub fn next_cookie(&self) -> Option<&[u8]> {
        self.cookie.as_deref().filter(|c| !c.is_empty())
    }
}

/// Opens connections to a directory server.
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    type Connection: DirectoryConnection;

    /// Dial and authenticate a new connection.
    async fn connect(&self) -> FetchResult<Self::Connection>;
}

/// An open, authenticated directory connection.
#[async_trait]
pub trait DirectoryConnection: Send {
    /// Run one page of a search.
    async fn search_page(&mut self, request: &PageRequest) -> FetchResult<Page>;

    /// Close the connection. Idempotent.
    async fn close(&mut self);
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Key attribute of Active Directory user objects.
pub const DEFAULT_KEY_ATTRIBUTE: &str = "sAMAccountName";

/// Configuration for the [`PagedFetcher`](crate::PagedFetcher).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Search base (e.g. a base DN). Backends without a hierarchy ignore it.
    pub base: String,
    /// Search filter passed through to the backend.
    pub filter: String,
    /// Attributes to request. Empty means all attributes.
    pub attributes: Vec<String>,
    /// Attribute whose first value is used as the entity key.
    pub key_attribute: String,
    /// Number of records requested per page.
    pub page_size: usize,
    /// Pause after re-establishing a connection, in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Maximum reconnects within a single snapshot before giving up.
    pub max_reconnects: u32,
    /// Emit human-readable lines for snapshot reads and reconnects.
    pub diagnostics: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base: String::new(),
            filter: "(objectClass=*)".into(),
            attributes: Vec::new(),
            key_attribute: DEFAULT_KEY_ATTRIBUTE.into(),
            page_size: 512,
            reconnect_delay_ms: 500,
            max_reconnects: 3,
            diagnostics: false,
        }
    }
}

impl FetcherConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Attributes to request, always including the key attribute when the
    /// list is restricted.
    pub fn requested_attributes(&self) -> Vec<String> {
        let mut attrs = self.attributes.clone();
        if !attrs.is_empty() && !attrs.iter().any(|a| a == &self.key_attribute) {
            attrs.push(self.key_attribute.clone());
        }
        attrs
    }
}

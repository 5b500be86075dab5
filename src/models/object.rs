//! Represents an object (file) as reported by the store.

use chrono::{DateTime, Utc};

/// Metadata of a single object, without its content bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectMeta {
    /// Object key (path-like identifier within the bucket).
    pub key: String,

    /// Size in bytes.
    pub content_length: u64,

    /// Content type recorded by the store, if any.
    pub content_type: Option<String>,

    /// Store-assigned entity tag, unquoted.
    pub etag: Option<String>,

    /// Timestamp when the object was last modified.
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of a bucket listing.
#[derive(Clone, Debug, PartialEq)]
pub struct ListPage {
    /// Keys on this page, in store order.
    pub keys: Vec<String>,

    /// Where the next page begins, when the store provided one.
    pub next_marker: Option<String>,

    /// Whether more pages remain.
    pub is_truncated: bool,
}

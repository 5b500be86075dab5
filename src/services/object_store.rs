//! The storage seam the gateway talks to.
//!
//! Every HTTP operation maps onto one call of [`ObjectStore`] (listing is a
//! marker-following loop of calls). Backends translate their own failures into
//! [`StoreError`] so handlers never inspect vendor error types.

use crate::models::object::{ListPage, ObjectMeta};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::io;
use thiserror::Error;

/// Content of an object, streamed chunk by chunk.
pub type ObjectBody = BoxStream<'static, io::Result<Bytes>>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The key does not exist in the bucket.
    #[error("object `{key}` not found")]
    NotFound { key: String },
    /// The store answered with a structured error.
    #[error("store returned error {code}: {message}")]
    Service { code: String, message: String },
    /// Anything without a structured code: network, timeouts, bad responses.
    #[error("{0}")]
    Transport(String),
}

impl StoreError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A bucket-scoped blob store.
///
/// Implementations are shared by every request handler for the lifetime of the
/// process, so they must be safe for concurrent use without extra locking.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short name used in logs and readiness output.
    fn backend_name(&self) -> &'static str;

    /// Fetch metadata only. Missing keys yield [`StoreError::NotFound`].
    async fn head_object(&self, key: &str) -> StoreResult<ObjectMeta>;

    /// Open the content stream of an object.
    async fn get_object(&self, key: &str) -> StoreResult<ObjectBody>;

    /// Store `data` under `key`, replacing any existing object.
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StoreResult<()>;

    /// Delete `key`. Deleting an absent key succeeds.
    async fn delete_object(&self, key: &str) -> StoreResult<()>;

    /// Return one page of keys strictly after `marker`, in store order.
    async fn list_objects(&self, marker: Option<&str>) -> StoreResult<ListPage>;
}

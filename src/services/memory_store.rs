//! In-process object store.
//!
//! Keeps objects in a sorted map so listings come back in lexicographic key
//! order, the same order S3-style stores use. Used by `--backend memory` for
//! local runs and by the router tests.

use crate::{
    models::object::{ListPage, ObjectMeta},
    services::object_store::{ObjectBody, ObjectStore, StoreError, StoreResult},
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use std::{collections::BTreeMap, ops::Bound};
use tokio::sync::RwLock;

/// Page size used by stores when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Clone, Debug)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    etag: String,
    last_modified: DateTime<Utc>,
}

pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Listing pages hold at most `page_size` keys (minimum 1).
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    fn meta(key: &str, obj: &StoredObject) -> ObjectMeta {
        ObjectMeta {
            key: key.to_string(),
            content_length: obj.data.len() as u64,
            content_type: obj.content_type.clone(),
            etag: Some(obj.etag.clone()),
            last_modified: Some(obj.last_modified),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn head_object(&self, key: &str) -> StoreResult<ObjectMeta> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|obj| Self::meta(key, obj))
            .ok_or_else(|| StoreError::not_found(key))
    }

    async fn get_object(&self, key: &str) -> StoreResult<ObjectBody> {
        let data = {
            let objects = self.objects.read().await;
            objects
                .get(key)
                .map(|obj| obj.data.clone())
                .ok_or_else(|| StoreError::not_found(key))?
        };
        Ok(stream::once(async move { Ok(data) }).boxed())
    }

    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StoreResult<()> {
        let stored = StoredObject {
            etag: format!("{:x}", md5::compute(&data)),
            data,
            content_type: content_type.map(str::to_string),
            last_modified: Utc::now(),
        };
        self.objects.write().await.insert(key.to_string(), stored);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list_objects(&self, marker: Option<&str>) -> StoreResult<ListPage> {
        let objects = self.objects.read().await;
        let lower = match marker.filter(|m| !m.is_empty()) {
            Some(m) => Bound::Excluded(m),
            None => Bound::Unbounded,
        };

        let mut keys: Vec<String> = objects
            .range::<str, _>((lower, Bound::Unbounded))
            .map(|(key, _)| key.clone())
            .take(self.page_size + 1)
            .collect();

        let is_truncated = keys.len() > self.page_size;
        if is_truncated {
            keys.pop();
        }
        let next_marker = if is_truncated { keys.last().cloned() } else { None };

        Ok(ListPage {
            keys,
            next_marker,
            is_truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn put_then_head_reports_size_and_etag() {
        let store = MemoryStore::new();
        store
            .put_object("a.txt", Bytes::from_static(b"hello"), Some("text/plain"))
            .await
            .unwrap();

        let meta = store.head_object("a.txt").await.unwrap();
        assert_eq!(meta.content_length, 5);
        assert_eq!(meta.content_type.as_deref(), Some("text/plain"));
        assert_eq!(meta.etag.as_deref(), Some("5d41402abc4b2a76b9719d911017c592"));
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let store = MemoryStore::new();
        assert!(store.head_object("ghost").await.unwrap_err().is_not_found());
        assert!(store.get_object("ghost").await.err().unwrap().is_not_found());
    }

    #[tokio::test]
    async fn get_streams_stored_bytes() {
        let store = MemoryStore::new();
        store
            .put_object("k", Bytes::from_static(b"payload"), None)
            .await
            .unwrap();

        let chunks: Vec<Bytes> = store.get_object("k").await.unwrap().try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"payload");
    }

    #[tokio::test]
    async fn delete_of_absent_key_succeeds() {
        let store = MemoryStore::new();
        store.delete_object("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn listing_pages_follow_marker() {
        let store = MemoryStore::with_page_size(2);
        for key in ["c", "a", "b"] {
            store.put_object(key, Bytes::new(), None).await.unwrap();
        }

        let first = store.list_objects(None).await.unwrap();
        assert_eq!(first.keys, vec!["a", "b"]);
        assert!(first.is_truncated);
        assert_eq!(first.next_marker.as_deref(), Some("b"));

        let second = store.list_objects(Some("b")).await.unwrap();
        assert_eq!(second.keys, vec!["c"]);
        assert!(!second.is_truncated);
        assert_eq!(second.next_marker, None);
    }
}

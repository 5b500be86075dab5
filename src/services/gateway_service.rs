//! GatewayService — the state shared by every request handler.
//!
//! Wraps one `ObjectStore` handle created at startup. Handlers receive it as
//! axum `State`, so tests can run the whole router against any store.

use crate::{
    models::object::ObjectMeta,
    services::object_store::{ObjectBody, ObjectStore, StoreError, StoreResult},
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct GatewayService {
    store: Arc<dyn ObjectStore>,
}

impl GatewayService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// `Ok(false)` when the store reports the key as missing.
    pub async fn exists(&self, key: &str) -> StoreResult<bool> {
        match self.store.head_object(key).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn metadata(&self, key: &str) -> StoreResult<ObjectMeta> {
        self.store.head_object(key).await
    }

    pub async fn open(&self, key: &str) -> StoreResult<ObjectBody> {
        self.store.get_object(key).await
    }

    pub async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StoreResult<()> {
        self.store.put_object(key, data, content_type).await
    }

    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        self.store.delete_object(key).await
    }

    /// Collect every key in the bucket by following listing markers.
    ///
    /// A truncated page without a next marker continues after its last key.
    /// A truncated page that would not move the marker forward is an error.
    pub async fn list_all_keys(&self) -> StoreResult<Vec<String>> {
        let mut all_keys = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self.store.list_objects(marker.as_deref()).await?;
            debug!("list page: {} keys, truncated={}", page.keys.len(), page.is_truncated);

            if !page.is_truncated {
                all_keys.extend(page.keys);
                break;
            }

            let next = page
                .next_marker
                .filter(|m| !m.is_empty())
                .or_else(|| page.keys.last().cloned());
            all_keys.extend(page.keys);

            match next {
                Some(next) if marker.as_deref() != Some(next.as_str()) => marker = Some(next),
                _ => {
                    return Err(StoreError::Transport(
                        "listing is truncated but the marker did not advance".into(),
                    ));
                }
            }
        }

        Ok(all_keys)
    }

    /// Check that the store is reachable and accepts our credentials.
    ///
    /// Looks up a key that never exists; "not found" is the healthy answer.
    pub async fn probe(&self) -> StoreResult<()> {
        let key = format!(".readyz-{}", Uuid::new_v4());
        match self.store.head_object(&key).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::object::ListPage, services::memory_store::MemoryStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves a fixed sequence of listing pages.
    struct ScriptedStore {
        pages: Mutex<Vec<ListPage>>,
        markers: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedStore {
        fn new(mut pages: Vec<ListPage>) -> Self {
            pages.reverse();
            Self {
                pages: Mutex::new(pages),
                markers: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ObjectStore for ScriptedStore {
        fn backend_name(&self) -> &'static str {
            "scripted"
        }

        async fn head_object(&self, key: &str) -> StoreResult<ObjectMeta> {
            Err(StoreError::not_found(key))
        }

        async fn get_object(&self, key: &str) -> StoreResult<ObjectBody> {
            Err(StoreError::not_found(key))
        }

        async fn put_object(&self, _: &str, _: Bytes, _: Option<&str>) -> StoreResult<()> {
            Ok(())
        }

        async fn delete_object(&self, _: &str) -> StoreResult<()> {
            Ok(())
        }

        async fn list_objects(&self, marker: Option<&str>) -> StoreResult<ListPage> {
            self.markers.lock().unwrap().push(marker.map(str::to_string));
            self.pages
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| StoreError::Transport("no more scripted pages".into()))
        }
    }

    fn page(keys: &[&str], next_marker: Option<&str>, is_truncated: bool) -> ListPage {
        ListPage {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            next_marker: next_marker.map(str::to_string),
            is_truncated,
        }
    }

    #[tokio::test]
    async fn exists_distinguishes_present_and_missing() {
        let store = Arc::new(MemoryStore::new());
        let service = GatewayService::new(store.clone());
        store.put_object("here", Bytes::from_static(b"x"), None).await.unwrap();

        assert!(service.exists("here").await.unwrap());
        assert!(!service.exists("gone").await.unwrap());
    }

    #[tokio::test]
    async fn list_collects_every_page_regardless_of_page_size() {
        for page_size in [1, 2, 3, 7, 100] {
            let store = Arc::new(MemoryStore::with_page_size(page_size));
            let service = GatewayService::new(store.clone());
            for i in 0..7 {
                store
                    .put_object(&format!("file-{i}.txt"), Bytes::new(), None)
                    .await
                    .unwrap();
            }

            let keys = service.list_all_keys().await.unwrap();
            let expected: Vec<String> = (0..7).map(|i| format!("file-{i}.txt")).collect();
            assert_eq!(keys, expected, "page size {page_size}");
        }
    }

    #[tokio::test]
    async fn list_of_empty_bucket_is_empty() {
        let service = GatewayService::new(Arc::new(MemoryStore::new()));
        assert!(service.list_all_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_falls_back_to_last_key_without_next_marker() {
        let store = Arc::new(ScriptedStore::new(vec![
            page(&["a", "b"], None, true),
            page(&["c"], None, false),
        ]));
        let service = GatewayService::new(store.clone());

        assert_eq!(service.list_all_keys().await.unwrap(), vec!["a", "b", "c"]);
        assert_eq!(
            *store.markers.lock().unwrap(),
            vec![None, Some("b".to_string())]
        );
    }

    #[tokio::test]
    async fn list_rejects_marker_that_does_not_advance() {
        let store = Arc::new(ScriptedStore::new(vec![
            page(&["a"], Some("a"), true),
            page(&["a"], Some("a"), true),
        ]));
        let service = GatewayService::new(store);

        let err = service.list_all_keys().await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }

    #[tokio::test]
    async fn list_rejects_truncated_empty_page() {
        let store = Arc::new(ScriptedStore::new(vec![page(&[], None, true)]));
        let service = GatewayService::new(store);

        assert!(service.list_all_keys().await.is_err());
    }

    #[tokio::test]
    async fn list_error_mid_pagination_is_returned() {
        let store = Arc::new(ScriptedStore::new(vec![page(&["a"], Some("a"), true)]));
        let service = GatewayService::new(store);

        let err = service.list_all_keys().await.unwrap_err();
        assert_eq!(err.to_string(), "no more scripted pages");
    }

    #[tokio::test]
    async fn probe_treats_not_found_as_ready() {
        let service = GatewayService::new(Arc::new(MemoryStore::new()));
        service.probe().await.unwrap();
    }
}

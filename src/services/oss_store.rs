//! Vendor backend: Aliyun OSS through its S3-compatible API.
//!
//! All calls go through one `aws_sdk_s3::Client`, which is cheap to clone and
//! safe to share between tasks.

use crate::{
    config::OssConfig,
    models::object::{ListPage, ObjectMeta},
    services::object_store::{ObjectBody, ObjectStore, StoreError, StoreResult},
};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client, Config,
    config::{Credentials, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::error::Error as StdError;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

/// Keys per ListObjects call.
const LIST_PAGE_SIZE: i32 = 100;

#[derive(Clone)]
pub struct OssStore {
    client: Client,
    bucket: String,
}

impl OssStore {
    pub fn new(config: &OssConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.access_key_secret.clone(),
            None,
            None,
            "oss-gateway",
        );
        let s3_config = Config::builder()
            .region(Region::new(config.region()))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint_url())
            .force_path_style(config.force_path_style)
            .behavior_version_latest()
            .build();

        info!(
            "OSS store initialized for bucket {} at {}",
            config.bucket,
            config.endpoint_url()
        );
        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for OssStore {
    fn backend_name(&self) -> &'static str {
        "oss"
    }

    async fn head_object(&self, key: &str) -> StoreResult<ObjectMeta> {
        let resp = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error(key, err))?;

        Ok(ObjectMeta {
            key: key.to_string(),
            content_length: resp.content_length().unwrap_or_default().max(0) as u64,
            content_type: resp.content_type().map(str::to_string),
            etag: resp.e_tag().map(|tag| tag.trim_matches('"').to_string()),
            last_modified: resp
                .last_modified()
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts.secs(), 0)),
        })
    }

    async fn get_object(&self, key: &str) -> StoreResult<ObjectBody> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error(key, err))?;

        Ok(ReaderStream::new(resp.body.into_async_read()).boxed())
    }

    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StoreResult<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map(|_| ())
            .map_err(|err| map_sdk_error(key, err))
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| map_sdk_error(key, err))
    }

    async fn list_objects(&self, marker: Option<&str>) -> StoreResult<ListPage> {
        let mut request = self
            .client
            .list_objects()
            .bucket(&self.bucket)
            .max_keys(LIST_PAGE_SIZE);
        if let Some(marker) = marker.filter(|m| !m.is_empty()) {
            request = request.marker(marker);
        }

        let resp = request
            .send()
            .await
            .map_err(|err| map_sdk_error("", err))?;

        let keys: Vec<String> = resp
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_string))
            .collect();
        debug!("listed {} keys after marker {:?}", keys.len(), marker);

        Ok(ListPage {
            keys,
            next_marker: resp.next_marker().map(str::to_string),
            is_truncated: resp.is_truncated().unwrap_or(false),
        })
    }
}

/// Split SDK failures into structured store errors and everything else.
fn map_sdk_error<E, R>(key: &str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(service) => {
            let inner = service.err();
            match inner.code() {
                Some("NoSuchKey") | Some("NotFound") => StoreError::not_found(key),
                Some(code) => StoreError::Service {
                    code: code.to_string(),
                    message: inner.message().unwrap_or_default().to_string(),
                },
                None => StoreError::Transport(DisplayErrorContext(&err).to_string()),
            }
        }
        _ => StoreError::Transport(DisplayErrorContext(&err).to_string()),
    }
}

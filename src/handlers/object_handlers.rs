//! HTTP handlers for object operations.
//! Streams download bodies to avoid buffering in memory and delegates storage
//! concerns to `GatewayService`.

use crate::{
    errors::AppError,
    models::{
        download::{DownloadName, content_type_for, resolve_extension},
        object::ObjectMeta,
        responses::{ListResponse, MessageResponse, StatusResponse},
    },
    services::{gateway_service::GatewayService, object_store::StoreError},
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

/// GET `/isexist/{name}` — 200 for both present and missing keys.
pub async fn object_exists(
    State(service): State<GatewayService>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    match service.exists(&name).await {
        Ok(true) => Ok(Json(MessageResponse::new(format!(
            "Object '{}' exists",
            name
        )))),
        Ok(false) => Ok(Json(MessageResponse::new(format!(
            "Object '{}' does not exist",
            name
        )))),
        Err(StoreError::Service { message, .. }) => {
            warn!("existence check for {} failed: {}", name, message);
            Err(AppError::internal(format!(
                "Error checking object: {}",
                message
            )))
        }
        Err(err) => {
            warn!("existence check for {} failed: {}", name, err);
            Err(AppError::internal(format!("Error: {}", err)))
        }
    }
}

/// GET `/download/{object}` — stream the object as an attachment.
///
/// The client-side filename is freshly generated; only the extension is taken
/// from the key. All failures are reported before the first body byte.
pub async fn download_object(
    State(service): State<GatewayService>,
    Path(object): Path<String>,
) -> Result<Response, AppError> {
    let meta = service
        .metadata(&object)
        .await
        .map_err(|err| AppError::store(&err, "Failed to get object metadata"))?;

    let stream = service
        .open(&object)
        .await
        .map_err(|err| AppError::store(&err, "Failed to get object"))?;

    let name = DownloadName::for_key(&object);
    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;
    set_download_headers(response.headers_mut(), &name, &meta)?;

    info!("File download started: {} as {}", object, name.filename);
    Ok(response)
}

/// POST `/upload` — store the multipart field `file` under its own filename.
pub async fn upload_object(
    State(service): State<GatewayService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut multipart = multipart.map_err(|err| {
        warn!("Failed to get file from form: {}", err);
        AppError::bad_request("Failed to get file")
    })?;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(AppError::bad_request("Failed to get file")),
            Err(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                warn!("Failed to open file: {}", err);
                return Err(AppError::new(err.status(), "Failed to open file"));
            }
            Err(err) => {
                warn!("Failed to get file from form: {}", err);
                return Err(AppError::bad_request("Failed to get file"));
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let object_name = match field.file_name() {
            Some(filename) if !filename.is_empty() => filename.to_string(),
            _ => return Err(AppError::bad_request("Failed to get file")),
        };

        let data = field.bytes().await.map_err(|err| {
            warn!("Failed to open file: {}", err);
            AppError::new(err.status(), "Failed to open file")
        })?;

        let content_type = content_type_for(resolve_extension(&object_name));
        service
            .upload(&object_name, data, Some(&content_type))
            .await
            .map_err(|err| AppError::store(&err, "Failed to upload file to OSS"))?;

        info!("File uploaded successfully: {}", object_name);
        return Ok(Json(MessageResponse::new("File uploaded successfully")));
    }
}

/// DELETE `/delete/{object}` — idempotent delete.
pub async fn delete_object(
    State(service): State<GatewayService>,
    Path(object): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    service.delete(&object).await.map_err(|err| {
        AppError::store(&err, format!("Failed to delete object: {}", err)).tagged()
    })?;

    Ok(Json(StatusResponse::success(format!(
        "Object '{}' deleted successfully",
        object
    ))))
}

/// GET `/list` — every key in the bucket, in store order.
pub async fn list_objects(
    State(service): State<GatewayService>,
) -> Result<Json<ListResponse>, AppError> {
    let objects = service.list_all_keys().await.map_err(|err| {
        AppError::store(&err, format!("Failed to list objects: {}", err)).tagged()
    })?;

    info!("All objects have been listed ({} keys)", objects.len());
    Ok(Json(ListResponse {
        status: "success",
        message: "All objects have been listed".into(),
        objects,
    }))
}

/// GET `/invertcode/{audio}` — transcoding placeholder.
///
/// Opens the object stream to confirm it can be fetched, drops it unread,
/// then answers 501.
pub async fn transcode_object(
    State(service): State<GatewayService>,
    Path(audio): Path<String>,
) -> Response {
    match service.open(&audio).await {
        Ok(stream) => drop(stream),
        Err(err) => {
            return AppError::store(&err, "Failed to get object")
                .tagged()
                .into_response();
        }
    }

    (
        StatusCode::NOT_IMPLEMENTED,
        Json(serde_json::json!({
            "status": "error",
            "message": "Transcoding is not implemented",
            "file": audio,
        })),
    )
        .into_response()
}

fn set_download_headers(
    headers: &mut HeaderMap,
    name: &DownloadName,
    meta: &ObjectMeta,
) -> Result<(), AppError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename={}", name.filename))
        .map_err(|_| AppError::internal("Failed to get object metadata"))?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&name.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(meta.content_length));

    if let Some(etag) = meta.etag.as_ref() {
        if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", etag)) {
            headers.insert(header::ETAG, value);
        }
    }

    if let Some(modified) = meta.last_modified {
        let http_date = modified.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        if let Ok(value) = HeaderValue::from_str(&http_date) {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }

    Ok(())
}

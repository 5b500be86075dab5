//! Defines routes for the gateway.
//!
//! ## Structure
//! - **Object endpoints**
//!   - `GET    /isexist/{name}`     — existence check
//!   - `GET    /download/{object}`  — download as attachment
//!   - `POST   /upload`             — multipart upload, field `file`
//!   - `DELETE /delete/{object}`    — delete object
//!   - `GET    /list`               — list every key in the bucket
//!   - `GET    /invertcode/{audio}` — transcoding placeholder (501)
//!
//! - **Service endpoints**
//!   - `GET /`, `GET /healthz`, `GET /readyz`

use crate::{
    handlers::{
        health_handlers::{healthz, index, readyz},
        object_handlers::{
            delete_object, download_object, list_objects, object_exists, transcode_object,
            upload_object,
        },
    },
    services::gateway_service::GatewayService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

/// Build and return the router for all gateway routes.
///
/// Request bodies larger than `max_upload_bytes` are rejected.
pub fn routes(max_upload_bytes: usize) -> Router<GatewayService> {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/isexist/{name}", get(object_exists))
        .route("/download/{object}", get(download_object))
        .route("/upload", post(upload_object))
        .route("/delete/{object}", delete(delete_object))
        .route("/list", get(list_objects))
        .route("/invertcode/{audio}", get(transcode_object))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}

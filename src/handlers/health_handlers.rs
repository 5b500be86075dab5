//! Root greeting, health & readiness handlers.
//!
//! - GET /         -> fixed greeting
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the object store answers

use crate::{models::responses::MessageResponse, services::gateway_service::GatewayService};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /`
pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse::new("Hello, Gin!"))
}

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Looks up a random key in the bucket. A "not found" answer proves the
/// store is reachable and accepts the configured credentials.
///
/// HTTP 200 when the probe passes, HTTP 503 otherwise.
pub async fn readyz(State(service): State<GatewayService>) -> impl IntoResponse {
    let (status, error) = match service.probe().await {
        Ok(()) => (StatusCode::OK, None),
        Err(err) => {
            tracing::warn!("readiness probe failed: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, Some(err.to_string()))
        }
    };

    let body = ReadyResponse {
        status: if error.is_none() {
            "ok".into()
        } else {
            "error".into()
        },
        backend: service.backend_name(),
        error,
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

use crate::services::object_store::StoreError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A request-scoped failure, rendered as a JSON body with a `message`.
///
/// Every handler returns this on its error path; nothing a backend does can
/// take the process down.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    /// Also emit `"status": "error"` in the body.
    pub tagged: bool,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            tagged: false,
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request (client input errors)
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Log a backend failure and turn it into a 500 carrying `msg`.
    pub fn store(err: &StoreError, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(error = %err, "{}", msg);
        Self::internal(msg)
    }

    /// Add `"status": "error"` to the rendered body.
    pub fn tagged(mut self) -> Self {
        self.tagged = true;
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = if self.tagged {
            json!({
                "status": "error",
                "message": self.message,
            })
        } else {
            json!({ "message": self.message })
        };

        (self.status, Json(body)).into_response()
    }
}

//! JSON bodies returned by the gateway.

use serde::Serialize;

/// `{"message": ...}`
#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{"status": "success", "message": ...}`
#[derive(Serialize, Debug)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }
}

/// Body of `GET /list`.
#[derive(Serialize, Debug)]
pub struct ListResponse {
    pub status: &'static str,
    pub message: String,
    pub objects: Vec<String>,
}

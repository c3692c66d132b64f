//! Error types for birdnotify
//!
//! Inbound failures split into two classes with different HTTP mappings:
//! structural problems with the request envelope (client error, 400) and
//! violations of the detection-message grammar (500). The 500 mapping for
//! grammar violations matches the upstream BirdNET producer contract and is
//! kept as-is.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Structural problems with the request envelope (HTTP 400)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Payload must be a JSON object")]
    NotAnObject,

    #[error("`message` must be a string")]
    MessageNotString,
}

/// Violations of the detection-message grammar (HTTP 500)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("Message should separate values by --- (see readme)")]
    MissingSeparator,

    #[error("Message should include key sciname= (see readme)")]
    MissingSciname,

    #[error("`attachments` must be an array")]
    AttachmentsNotArray,

    #[error("Missing base64 data in attachment")]
    AttachmentMissingBase64,

    #[error("Missing mime type for attachment")]
    AttachmentMissingMimetype,
}

/// Top-level pipeline error
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Request envelope shape violation (400)
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// Detection-message grammar violation (500)
    #[error(transparent)]
    Content(#[from] ContentError),

    /// The required gateway send failed (500)
    #[error("{0}")]
    PrimarySend(String),
}

impl NotifyError {
    /// HTTP status for this error. Shape errors are the caller's fault;
    /// everything else surfaces as a server error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            NotifyError::Shape(_) => StatusCode::BAD_REQUEST,
            NotifyError::Content(_) | NotifyError::PrimarySend(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for NotifyError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (self.status_code(), body).into_response()
    }
}

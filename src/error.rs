use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Corrupt chat log: {0}")]
    CorruptLog(#[from] serde_json::Error),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("File too large: limit is {max} bytes")]
    PayloadTooLarge { max: usize },
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Text shown to the person who attempted the send.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(_) | Self::CorruptLog(_) => "Failed to save message to log.".into(),
            Self::BadRequest(msg) | Self::Conflict(msg) => msg.clone(),
            Self::PayloadTooLarge { max } => format!("Please select a file smaller than {}.", human_size(*max)),
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Storage(_) | Self::CorruptLog(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 { format!("{}MB", bytes / MIB) } else { format!("{bytes} bytes") }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Storage(e) => tracing::error!(error = %e, "Storage error"),
            Self::CorruptLog(e) => tracing::error!(error = %e, "Chat log could not be parsed"),
            Self::BadRequest(msg) => tracing::debug!(message = %msg, "Bad request"),
            Self::Conflict(msg) => tracing::debug!(message = %msg, "Conflict"),
            Self::PayloadTooLarge { max } => tracing::debug!(max, "Upload rejected"),
        }

        let body = Json(json!({
            "success": false,
            "message": self.user_message(),
        }));

        (self.status(), body).into_response()
    }
}

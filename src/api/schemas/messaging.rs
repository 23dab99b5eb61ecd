use crate::domain::message::LogEntry;
use serde::{Deserialize, Serialize};

/// Body of a successful send. Failures use the error body
/// `{"success": false, "message": ...}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub success: bool,
    pub new_message: LogEntry,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

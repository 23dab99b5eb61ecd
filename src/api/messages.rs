use crate::api::AppState;
use crate::api::schemas::messaging::SendMessageResponse;
use crate::error::{AppError, Result};
use crate::services::chat_service::{SendMessage, Upload};
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};

fn form_error(state: &AppState, e: &MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { max: state.config.storage.max_file_size_bytes }
    } else {
        AppError::BadRequest(format!("Invalid form data: {e}"))
    }
}

/// Logs a text or file message sent into a chat.
///
/// Expects a multipart form with `sender`, `receiver`, `messageId` and either
/// `textMessage` or `file`.
///
/// # Errors
/// Returns `AppError::BadRequest` if the form is malformed or incomplete.
/// Returns `AppError::PayloadTooLarge` if the file exceeds the size limit.
/// Returns `AppError::Conflict` if the message id is already logged.
pub async fn send_message(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut request = SendMessage { chat_id, ..SendMessage::default() };

    while let Some(field) = multipart.next_field().await.map_err(|e| form_error(&state, &e))? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "sender" => request.sender = field.text().await.map_err(|e| form_error(&state, &e))?,
            "receiver" => request.receiver = field.text().await.map_err(|e| form_error(&state, &e))?,
            "messageId" => request.message_id = field.text().await.map_err(|e| form_error(&state, &e))?,
            "textMessage" => request.text = Some(field.text().await.map_err(|e| form_error(&state, &e))?),
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(ToString::to_string);
                let data = field.bytes().await.map_err(|e| form_error(&state, &e))?;
                request.file = Some(Upload { file_name, content_type, data });
            }
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    let new_message = state.chat_service.send_message(request).await?;

    Ok((StatusCode::CREATED, Json(SendMessageResponse { success: true, new_message })))
}

/// Returns the chat as participants see it, oldest first.
///
/// # Errors
/// Returns `AppError::BadRequest` if the chat id is invalid.
pub async fn load_messages(State(state): State<AppState>, Path(chat_id): Path<String>) -> Result<impl IntoResponse> {
    let messages = state.chat_service.load_messages(&chat_id).await?;
    Ok(Json(messages))
}

/// Returns the raw log entries for a chat.
///
/// # Errors
/// Returns `AppError::BadRequest` if the chat id is invalid.
/// Returns a storage error if the log cannot be read.
pub async fn view_log(State(state): State<AppState>, Path(chat_id): Path<String>) -> Result<impl IntoResponse> {
    let entries = state.chat_service.read_log(&chat_id).await?;
    Ok(Json(entries))
}

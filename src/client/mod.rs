//! HTTP client for the chat API plus the optimistic-update state a front end
//! keeps while talking to it.

use crate::api::schemas::messaging::{ErrorResponse, SendMessageResponse};
use crate::domain::message::{ChatMessage, LogEntry};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use thiserror::Error;

pub mod session;
pub mod timeline;

pub use session::{ChatSession, SendReceipt};
pub use timeline::{DeliveryState, Timeline};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// What a participant is sending.
#[derive(Debug, Clone)]
pub enum Outgoing {
    Text(String),
    File { file_name: String, content_type: Option<String>, data: Bytes },
}

/// Addressing for one send.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    pub chat_id: &'a str,
    pub sender: &'a str,
    pub receiver: &'a str,
    pub message_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    #[must_use]
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn chat_url(&self, chat_id: &str, tail: &str) -> String {
        format!("{}/v1/chats/{chat_id}/{tail}", self.base_url)
    }

    /// Submits a message and returns the entry the server logged.
    ///
    /// # Errors
    /// Returns `ClientError::Rejected` with the server's message if the send
    /// was refused, or `ClientError::Http` if the server could not be reached.
    pub async fn send(&self, envelope: Envelope<'_>, content: &Outgoing) -> Result<LogEntry, ClientError> {
        let form = Form::new()
            .text("sender", envelope.sender.to_string())
            .text("receiver", envelope.receiver.to_string())
            .text("messageId", envelope.message_id.to_string());

        let form = match content {
            Outgoing::Text(text) => form.text("textMessage", text.clone()),
            Outgoing::File { file_name, content_type, data } => {
                let mut part = Part::bytes(data.to_vec()).file_name(file_name.clone());
                if let Some(ct) = content_type {
                    part = part.mime_str(ct)?;
                }
                form.part("file", part)
            }
        };

        let response = self.http.post(self.chat_url(envelope.chat_id, "messages")).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: SendMessageResponse = response.json().await?;
        Ok(body.new_message)
    }

    /// Loads the chat history, oldest first.
    ///
    /// # Errors
    /// Returns `ClientError` if the request fails or is refused.
    pub async fn load_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, ClientError> {
        let response = self.http.get(self.chat_url(chat_id, "messages")).send().await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        Ok(response.json().await?)
    }

    /// Loads the raw log entries for a chat.
    ///
    /// # Errors
    /// Returns `ClientError` if the request fails or is refused.
    pub async fn read_log(&self, chat_id: &str) -> Result<Vec<LogEntry>, ClientError> {
        let response = self.http.get(self.chat_url(chat_id, "log")).send().await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        Ok(response.json().await?)
    }

    async fn rejection(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let message = response
            .json::<ErrorResponse>()
            .await
            .map_or_else(|_| format!("Request failed with status {status}"), |body| body.message);
        ClientError::Rejected { status, message }
    }
}

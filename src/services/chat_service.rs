use crate::adapters::storage::{LocalFileStore, LogStore};
use crate::config::{ChatConfig, StorageConfig};
use crate::domain::attachment::guess_mime_type;
use crate::domain::chat::ChatId;
use crate::domain::message::{ChatMessage, EntryBody, LogEntry, MessageKind};
use crate::error::{AppError, Result};
use crate::services::ai::{AiService, FileInput};
use bytes::Bytes;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Clone, Debug)]
struct Metrics {
    logged_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("localchat-server");
        Self {
            logged_total: meter
                .u64_counter("localchat_messages_logged_total")
                .with_description("Send attempts by message type and outcome")
                .build(),
        }
    }
}

/// A file attached to a send.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Everything a participant submits for one message. Field presence is
/// checked by [`ChatService::send_message`], not by the caller.
#[derive(Debug, Clone, Default)]
pub struct SendMessage {
    pub chat_id: String,
    pub sender: String,
    pub receiver: String,
    pub message_id: String,
    pub text: Option<String>,
    pub file: Option<Upload>,
}

/// The half of a send that wins after the text-over-file rule.
#[derive(Debug)]
enum Content {
    Text(String),
    File(Upload),
}

impl Content {
    const fn kind(&self) -> MessageKind {
        match self {
            Self::Text(_) => MessageKind::Text,
            Self::File(_) => MessageKind::File,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChatService {
    logs: Arc<dyn LogStore>,
    files: LocalFileStore,
    ai: AiService,
    chat: ChatConfig,
    max_file_size_bytes: usize,
    metrics: Metrics,
}

impl ChatService {
    #[must_use]
    pub fn new(
        logs: Arc<dyn LogStore>,
        files: LocalFileStore,
        ai: AiService,
        chat: ChatConfig,
        storage: &StorageConfig,
    ) -> Self {
        Self { logs, files, ai, chat, max_file_size_bytes: storage.max_file_size_bytes, metrics: Metrics::new() }
    }

    /// Validates, transforms and logs one message.
    ///
    /// Text wins when both text and a file are supplied. Redaction and
    /// summarization failures never fail the send.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` for missing fields or an invalid chat id,
    /// `AppError::PayloadTooLarge` for oversized files,
    /// `AppError::Conflict` if the message id was already logged,
    /// and a storage error if the upload or log cannot be written.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self, request),
        fields(chat_id = %request.chat_id, message_id = %request.message_id, kind = tracing::field::Empty)
    )]
    pub async fn send_message(&self, request: SendMessage) -> Result<LogEntry> {
        let SendMessage { chat_id, sender, receiver, message_id, text, file } = request;

        if [&chat_id, &sender, &receiver, &message_id].iter().any(|field| field.trim().is_empty()) {
            return Err(AppError::BadRequest("Missing required fields.".into()));
        }
        let chat_id = ChatId::parse(chat_id.trim())?;

        let text = text.filter(|t| !t.is_empty());
        let file = file.filter(|f| !f.file_name.is_empty());

        let content = match (text, file) {
            (Some(text), _) => Content::Text(text),
            (None, Some(file)) => Content::File(file),
            (None, None) => return Err(AppError::BadRequest("Message content or file is required.".into())),
        };
        let kind_label = match content.kind() {
            MessageKind::Text => "text",
            MessageKind::File => "file",
        };
        tracing::Span::current().record("kind", kind_label);

        let outcome = match self.build_entry(&chat_id, message_id, sender, receiver, content).await {
            Ok(entry) => self.logs.append(&chat_id, &entry).await.map(|()| entry),
            Err(e) => Err(e),
        };

        let status = if outcome.is_ok() { "success" } else { "failure" };
        self.metrics.logged_total.add(1, &[KeyValue::new("type", kind_label), KeyValue::new("status", status)]);

        if outcome.is_ok() {
            tracing::info!("Message logged");
        }
        outcome
    }

    /// Runs the side effects of a send (upload, AI calls) once the id is
    /// known to be new, so a rejected duplicate leaves stored files alone.
    async fn build_entry(
        &self,
        chat_id: &ChatId,
        message_id: String,
        sender: String,
        receiver: String,
        content: Content,
    ) -> Result<LogEntry> {
        if self.logs.contains(chat_id, &message_id).await? {
            return Err(AppError::Conflict(format!("Message {message_id} is already logged.")));
        }

        let body = match content {
            Content::Text(text) => self.text_body(text).await?,
            Content::File(file) => self.file_body(chat_id, file).await?,
        };
        Ok(LogEntry { id: message_id, sender, receiver, timestamp: OffsetDateTime::now_utc(), body })
    }

    async fn text_body(&self, text: String) -> Result<EntryBody> {
        let redacted_text = self.ai.redact(&text).await;
        Ok(EntryBody::Text { original_text: text, redacted_text })
    }

    async fn file_body(&self, chat_id: &ChatId, file: Upload) -> Result<EntryBody> {
        if file.data.len() > self.max_file_size_bytes {
            tracing::debug!(size = file.data.len(), "Upload exceeds the size limit");
            return Err(AppError::PayloadTooLarge { max: self.max_file_size_bytes });
        }

        let stored = self.files.save(chat_id, &file.file_name, &file.data).await?;

        let mime_type = file
            .content_type
            .as_deref()
            .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
            .unwrap_or_else(|| guess_mime_type(&file.file_name));
        let file_context = self
            .ai
            .summarize(FileInput { data: &file.data, file_name: &file.file_name, mime_type })
            .await;

        Ok(EntryBody::File {
            file_name: stored.file_name,
            public_url: Some(stored.public_url),
            server_file_path: Some(stored.server_path.display().to_string()),
            file_context: Some(file_context),
        })
    }

    /// The chat as its participants see it, oldest first. A log that cannot be
    /// read is reported and shown as empty.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if the chat id is invalid.
    pub async fn load_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>> {
        let chat_id = ChatId::parse(chat_id)?;

        let entries = match self.logs.read(&chat_id).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = %e, chat_id = %chat_id, "Error loading messages");
                return Ok(Vec::new());
            }
        };

        let mut messages: Vec<ChatMessage> =
            entries.iter().map(|entry| ChatMessage::from_entry(entry, &self.chat.local_user)).collect();
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    /// The raw log exactly as stored.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if the chat id is invalid, or a storage
    /// error if the log cannot be read.
    pub async fn read_log(&self, chat_id: &str) -> Result<Vec<LogEntry>> {
        let chat_id = ChatId::parse(chat_id)?;
        self.logs.read(&chat_id).await
    }

    /// Verifies both the log and upload directories are usable.
    ///
    /// # Errors
    /// Returns a storage error describing the first failing directory.
    pub async fn check_storage(&self) -> Result<()> {
        self.logs.check().await?;
        self.files.check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::DisabledProvider;
    use crate::adapters::storage::JsonFileLogStore;
    use crate::services::ai::{AiError, AiProvider, SUMMARY_UNAVAILABLE};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Debug)]
    struct EchoProvider;

    #[async_trait]
    impl AiProvider for EchoProvider {
        async fn redact(&self, text: &str) -> std::result::Result<String, AiError> {
            Ok(text.replace("hunter2", "[REDACTED]"))
        }

        async fn summarize(&self, file: FileInput<'_>) -> std::result::Result<String, AiError> {
            Ok(format!("{} as {}", file.file_name, file.mime_type))
        }
    }

    #[derive(Debug)]
    struct UnreadableLog;

    #[async_trait]
    impl LogStore for UnreadableLog {
        async fn append(&self, _chat_id: &ChatId, _entry: &LogEntry) -> Result<()> {
            Err(AppError::Storage(std::io::Error::other("disk full")))
        }

        async fn read(&self, _chat_id: &ChatId) -> Result<Vec<LogEntry>> {
            Err(AppError::Storage(std::io::Error::other("disk gone")))
        }

        async fn check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn service_with(dir: &TempDir, provider: Arc<dyn AiProvider>, redact: bool) -> ChatService {
        let storage = StorageConfig {
            logs_dir: dir.path().join("logs"),
            uploads_dir: dir.path().join("uploads"),
            max_file_size_bytes: 64,
        };
        ChatService::new(
            Arc::new(JsonFileLogStore::new(&storage.logs_dir)),
            LocalFileStore::new(&storage.uploads_dir),
            AiService::new(provider, redact),
            ChatConfig::default(),
            &storage,
        )
    }

    fn text(id: &str, body: &str) -> SendMessage {
        SendMessage {
            chat_id: "default_chat".into(),
            sender: "You".into(),
            receiver: "Friend".into(),
            message_id: id.into(),
            text: Some(body.into()),
            file: None,
        }
    }

    fn upload(name: &str, data: &'static [u8]) -> Upload {
        Upload { file_name: name.into(), content_type: None, data: Bytes::from_static(data) }
    }

    #[tokio::test]
    async fn test_missing_fields_are_rejected() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, Arc::new(DisabledProvider), false);

        let mut request = text("m1", "hi");
        request.sender = "  ".into();

        let err = service.send_message(request).await.unwrap_err();
        assert_eq!(err.user_message(), "Missing required fields.");
    }

    #[tokio::test]
    async fn test_content_is_required() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, Arc::new(DisabledProvider), false);

        let mut request = text("m1", "");
        request.text = None;

        let err = service.send_message(request).await.unwrap_err();
        assert_eq!(err.user_message(), "Message content or file is required.");
    }

    #[tokio::test]
    async fn test_text_message_is_logged_with_redaction() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, Arc::new(EchoProvider), true);

        let entry = service.send_message(text("m1", "my password is hunter2")).await.unwrap();

        assert_eq!(
            entry.body,
            EntryBody::Text {
                original_text: "my password is hunter2".into(),
                redacted_text: Some("my password is [REDACTED]".into()),
            }
        );
        assert_eq!(service.read_log("default_chat").await.unwrap(), vec![entry]);
    }

    #[tokio::test]
    async fn test_text_wins_over_file() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, Arc::new(DisabledProvider), false);

        let mut request = text("m1", "caption");
        request.file = Some(upload("a.txt", b"data"));

        let entry = service.send_message(request).await.unwrap();
        assert_eq!(entry.kind(), MessageKind::Text);
        assert!(!dir.path().join("uploads/default_chat/a.txt").exists());
    }

    #[tokio::test]
    async fn test_file_message_is_saved_and_summarized() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, Arc::new(EchoProvider), false);

        let mut request = text("f1", "");
        request.text = None;
        request.file = Some(upload("shopping list.txt", b"milk, eggs"));

        let entry = service.send_message(request).await.unwrap();

        let EntryBody::File { file_name, public_url, server_file_path, file_context } = entry.body else {
            panic!("expected a file entry");
        };
        assert_eq!(file_name, "shopping_list.txt");
        assert_eq!(public_url.as_deref(), Some("/uploads/default_chat/shopping_list.txt"));
        assert_eq!(file_context.as_deref(), Some("shopping list.txt as text/plain"));
        assert_eq!(std::fs::read(server_file_path.unwrap()).unwrap(), b"milk, eggs");
    }

    #[tokio::test]
    async fn test_summary_falls_back_when_ai_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, Arc::new(DisabledProvider), true);

        let mut request = text("f1", "");
        request.text = None;
        request.file = Some(upload("a.bin", b"\x00\x01"));

        let entry = service.send_message(request).await.unwrap();
        assert!(matches!(entry.body, EntryBody::File { file_context: Some(ref ctx), .. } if ctx == SUMMARY_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected_before_saving() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, Arc::new(DisabledProvider), false);

        let mut request = text("f1", "");
        request.text = None;
        request.file = Some(upload("big.bin", &[0u8; 65]));

        let err = service.send_message(request).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge { max: 64 }));
        assert!(service.read_log("default_chat").await.unwrap().is_empty());
    }

    #[derive(Debug, Default)]
    struct CountingProvider {
        summaries: AtomicUsize,
    }

    #[async_trait]
    impl AiProvider for CountingProvider {
        async fn redact(&self, text: &str) -> std::result::Result<String, AiError> {
            Ok(text.to_string())
        }

        async fn summarize(&self, _file: FileInput<'_>) -> std::result::Result<String, AiError> {
            self.summaries.fetch_add(1, Ordering::SeqCst);
            Ok("a note".into())
        }
    }

    #[tokio::test]
    async fn test_duplicate_file_send_leaves_upload_untouched() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(CountingProvider::default());
        let service = service_with(&dir, Arc::clone(&provider) as Arc<dyn AiProvider>, false);

        let mut first = text("f1", "");
        first.text = None;
        first.file = Some(upload("a.txt", b"original"));
        service.send_message(first).await.unwrap();

        let mut retry = text("f1", "");
        retry.text = None;
        retry.file = Some(upload("a.txt", b"REPLACED"));
        let err = service.send_message(retry).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(std::fs::read(dir.path().join("uploads/default_chat/a.txt")).unwrap(), b"original");
        assert_eq!(provider.summaries.load(Ordering::SeqCst), 1);
        assert_eq!(service.read_log("default_chat").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_chat_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, Arc::new(DisabledProvider), false);

        let mut request = text("m1", "hi");
        request.chat_id = "../outside".into();

        assert!(matches!(service.send_message(request).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_load_messages_maps_and_orders() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, Arc::new(DisabledProvider), false);

        service.send_message(text("m1", "hello")).await.unwrap();
        let mut reply = text("m2", "hi back");
        reply.sender = "Friend".into();
        reply.receiver = "You".into();
        service.send_message(reply).await.unwrap();

        let messages = service.load_messages("default_chat").await.unwrap();
        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2"]);
        assert!(messages[0].is_local_sender);
        assert!(!messages[1].is_local_sender);
        assert!(messages.iter().all(|m| !m.is_optimistic && !m.is_new));
    }

    #[tokio::test]
    async fn test_storage_failures_surface_on_send_but_not_on_load() {
        let dir = TempDir::new().unwrap();
        let storage = StorageConfig { uploads_dir: dir.path().to_path_buf(), ..StorageConfig::default() };
        let service = ChatService::new(
            Arc::new(UnreadableLog),
            LocalFileStore::new(dir.path()),
            AiService::new(Arc::new(DisabledProvider), false),
            ChatConfig::default(),
            &storage,
        );

        let err = service.send_message(text("m1", "hi")).await.unwrap_err();
        assert_eq!(err.user_message(), "Failed to save message to log.");
        assert!(service.load_messages("default_chat").await.unwrap().is_empty());
    }
}

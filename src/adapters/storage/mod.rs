use crate::domain::chat::ChatId;
use crate::domain::message::LogEntry;
use crate::error::Result;
use async_trait::async_trait;

pub mod file_store;
pub mod log_store;

pub use file_store::LocalFileStore;
pub use log_store::JsonFileLogStore;

/// Append-only, per-chat message log.
#[async_trait]
pub trait LogStore: Send + Sync + std::fmt::Debug + 'static {
    /// Appends one entry to the chat's log.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if an entry with the same id is already logged,
    /// or a storage error if the log cannot be read or written.
    async fn append(&self, chat_id: &ChatId, entry: &LogEntry) -> Result<()>;

    /// Returns every entry in the order it was accepted. A chat with no log is empty.
    ///
    /// # Errors
    /// Returns a storage error if the log exists but cannot be read or parsed.
    async fn read(&self, chat_id: &ChatId) -> Result<Vec<LogEntry>>;

    /// Whether an entry with `message_id` is already in the chat's log.
    ///
    /// # Errors
    /// Returns a storage error if the log exists but cannot be read or parsed.
    async fn contains(&self, chat_id: &ChatId, message_id: &str) -> Result<bool> {
        Ok(self.read(chat_id).await?.iter().any(|entry| entry.id == message_id))
    }

    /// Verifies the backing storage is usable.
    ///
    /// # Errors
    /// Returns a storage error describing the failure.
    async fn check(&self) -> Result<()>;
}

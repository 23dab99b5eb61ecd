use crate::adapters::storage::LogStore;
use crate::domain::chat::ChatId;
use crate::domain::message::LogEntry;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

const LOG_FILE_NAME: &str = "log.json";

/// Stores each chat as a pretty-printed JSON array at `<root>/<chat_id>/log.json`.
///
/// Appends rewrite the whole array into a sibling temp file and rename it into
/// place, so a reader never observes a partially written log.
#[derive(Clone, Debug)]
pub struct JsonFileLogStore {
    root: PathBuf,
}

impl JsonFileLogStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn log_path(&self, chat_id: &ChatId) -> PathBuf {
        self.root.join(chat_id.as_str()).join(LOG_FILE_NAME)
    }

    async fn load(path: &Path) -> Result<Vec<LogEntry>> {
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&data)?)
    }
}

#[async_trait]
impl LogStore for JsonFileLogStore {
    #[tracing::instrument(err(level = "warn"), skip(self, entry), fields(chat_id = %chat_id, message_id = %entry.id))]
    async fn append(&self, chat_id: &ChatId, entry: &LogEntry) -> Result<()> {
        let path = self.log_path(chat_id);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let mut entries = Self::load(&path).await?;
        if entries.iter().any(|existing| existing.id == entry.id) {
            return Err(AppError::Conflict(format!("Message {} is already logged.", entry.id)));
        }
        entries.push(entry.clone());

        let json = serde_json::to_vec_pretty(&entries)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, &path).await?;

        tracing::debug!(entries = entries.len(), "Chat log written");
        Ok(())
    }

    async fn read(&self, chat_id: &ChatId) -> Result<Vec<LogEntry>> {
        Self::load(&self.log_path(chat_id)).await
    }

    async fn check(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        let metadata = fs::metadata(&self.root).await?;
        if metadata.permissions().readonly() {
            return Err(AppError::Storage(std::io::Error::new(
                ErrorKind::PermissionDenied,
                format!("{} is read-only", self.root.display()),
            )));
        }
        Ok(())
    }
}

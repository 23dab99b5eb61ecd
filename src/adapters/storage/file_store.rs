use crate::domain::attachment::{StoredFile, sanitize_file_name};
use crate::domain::chat::ChatId;
use crate::error::Result;
use std::path::PathBuf;
use tokio::fs;

/// URL prefix uploaded files are served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Writes uploads to `<root>/<chat_id>/<sanitized name>` on the local disk.
#[derive(Clone, Debug)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Saves `data` for the chat. A second upload with the same sanitized
    /// name replaces the first.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the directory or file cannot be written.
    #[tracing::instrument(err(level = "warn"), skip(self, data), fields(chat_id = %chat_id, size = data.len()))]
    pub async fn save(&self, chat_id: &ChatId, original_name: &str, data: &[u8]) -> Result<StoredFile> {
        let file_name = sanitize_file_name(original_name);
        let dir = self.root.join(chat_id.as_str());
        fs::create_dir_all(&dir).await?;

        let server_path = dir.join(&file_name);
        fs::write(&server_path, data).await?;

        let public_url = format!("{PUBLIC_PREFIX}/{chat_id}/{file_name}");
        tracing::info!(file_name = %file_name, path = %server_path.display(), "Upload saved");

        Ok(StoredFile { file_name, public_url, server_path })
    }

    /// Verifies the upload root exists and can be written.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the directory cannot be created.
    pub async fn check(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one conversation. Used verbatim as a directory name for the
/// chat's log and uploads, so only `[A-Za-z0-9_-]` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChatId(String);

impl ChatId {
    pub const MAX_LEN: usize = 64;
    pub const DEFAULT: &'static str = "default_chat";

    /// Validates a raw chat id.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if the id is empty, too long, or contains
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() || raw.len() > Self::MAX_LEN {
            return Err(AppError::BadRequest(format!("Chat id must be 1-{} characters", Self::MAX_LEN)));
        }
        if !raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
            return Err(AppError::BadRequest("Chat id may only contain letters, digits, '_' and '-'".into()));
        }
        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChatId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChatId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ChatId> for String {
    fn from(id: ChatId) -> Self {
        id.0
    }
}

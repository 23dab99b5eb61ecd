use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Persisted record of one chat message. A chat's log is the ordered
/// sequence of these, written once per successful send and never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub sender: String,
    pub receiver: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(flatten)]
    pub body: EntryBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntryBody {
    #[serde(rename_all = "camelCase")]
    Text {
        original_text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        redacted_text: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    File {
        file_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        public_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        server_file_path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_context: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    File,
}

impl LogEntry {
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self.body {
            EntryBody::Text { .. } => MessageKind::Text,
            EntryBody::File { .. } => MessageKind::File,
        }
    }

    /// The text a reader sees: the original text, or the file name.
    #[must_use]
    pub fn content(&self) -> &str {
        match &self.body {
            EntryBody::Text { original_text, .. } => original_text,
            EntryBody::File { file_name, .. } => file_name,
        }
    }
}

/// A message as presented to a chat participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender: String,
    pub receiver: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_context: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub is_local_sender: bool,
    #[serde(default)]
    pub is_optimistic: bool,
    #[serde(default)]
    pub is_new: bool,
}

impl ChatMessage {
    /// Builds the presentation of `entry` for the participant named `local_user`.
    #[must_use]
    pub fn from_entry(entry: &LogEntry, local_user: &str) -> Self {
        let (file_path, file_context) = match &entry.body {
            EntryBody::Text { .. } => (None, None),
            EntryBody::File { public_url, file_context, .. } => (public_url.clone(), file_context.clone()),
        };

        Self {
            id: entry.id.clone(),
            sender: entry.sender.clone(),
            receiver: entry.receiver.clone(),
            content: entry.content().to_string(),
            kind: entry.kind(),
            file_path,
            file_context,
            timestamp: entry.timestamp,
            is_local_sender: entry.sender == local_user,
            is_optimistic: false,
            is_new: false,
        }
    }

    /// Case-insensitive substring match against the content and, for files,
    /// the summary. A blank query matches everything.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.content.to_lowercase().contains(&needle)
            || self.file_context.as_deref().is_some_and(|ctx| ctx.to_lowercase().contains(&needle))
    }
}

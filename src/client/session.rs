use crate::client::{ChatClient, ClientError, Envelope, Outgoing, Timeline};
use crate::domain::message::{EntryBody, LogEntry};
use time::OffsetDateTime;
use uuid::Uuid;

/// What the simulated friend answers with.
pub const FRIEND_REPLY: &str = "Thanks for your message! I'll get back to you soon.";

/// Result of a successful send by the local participant.
#[derive(Debug)]
pub struct SendReceipt {
    pub message: LogEntry,
    /// The simulated friend's answer; `None` if replies are switched off.
    pub reply: Option<Result<LogEntry, ClientError>>,
}

/// One participant's view of a chat: sends optimistically, reconciles with
/// the server by id, and rolls back on failure.
#[derive(Debug)]
pub struct ChatSession {
    client: ChatClient,
    chat_id: String,
    local_user: String,
    friend: String,
    friend_replies: bool,
    timeline: Timeline,
}

impl ChatSession {
    #[must_use]
    pub fn new(
        client: ChatClient,
        chat_id: impl Into<String>,
        local_user: impl Into<String>,
        friend: impl Into<String>,
    ) -> Self {
        let local_user = local_user.into();
        Self {
            client,
            chat_id: chat_id.into(),
            timeline: Timeline::new(local_user.clone()),
            local_user,
            friend: friend.into(),
            friend_replies: true,
        }
    }

    /// Turns the simulated friend reply on or off.
    #[must_use]
    pub const fn with_friend_replies(mut self, enabled: bool) -> Self {
        self.friend_replies = enabled;
        self
    }

    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Replaces the timeline with the server's history.
    ///
    /// # Errors
    /// Returns `ClientError` if the history cannot be fetched; the timeline is
    /// left untouched.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let messages = self.client.load_messages(&self.chat_id).await?;
        self.timeline.replace_all(messages);
        Ok(())
    }

    /// Sends as the local participant, then lets the friend answer.
    ///
    /// # Errors
    /// Returns `ClientError` if the server refused the message; the
    /// provisional entry has already been removed from the timeline.
    pub async fn send(&mut self, content: Outgoing) -> Result<SendReceipt, ClientError> {
        let sender = self.local_user.clone();
        let receiver = self.friend.clone();
        let message = self.deliver(&sender, &receiver, content).await?;

        let reply = if self.friend_replies { Some(self.simulate_friend_reply().await) } else { None };

        Ok(SendReceipt { message, reply })
    }

    /// Logs the friend's canned answer through the normal send path.
    ///
    /// # Errors
    /// Returns `ClientError` if the server refused the reply.
    pub async fn simulate_friend_reply(&mut self) -> Result<LogEntry, ClientError> {
        let sender = self.friend.clone();
        let receiver = self.local_user.clone();
        let result = self.deliver(&sender, &receiver, Outgoing::Text(FRIEND_REPLY.to_string())).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Could not log friend reply");
        }
        result
    }

    async fn deliver(&mut self, sender: &str, receiver: &str, content: Outgoing) -> Result<LogEntry, ClientError> {
        let message_id = Uuid::new_v4().to_string();

        let body = match &content {
            Outgoing::Text(text) => EntryBody::Text { original_text: text.clone(), redacted_text: None },
            Outgoing::File { file_name, .. } => EntryBody::File {
                file_name: file_name.clone(),
                public_url: None,
                server_file_path: None,
                file_context: None,
            },
        };
        let provisional = LogEntry {
            id: message_id.clone(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            timestamp: OffsetDateTime::now_utc(),
            body,
        };
        self.timeline.push_optimistic(&provisional);

        let envelope = Envelope { chat_id: &self.chat_id, sender, receiver, message_id: &message_id };
        match self.client.send(envelope, &content).await {
            Ok(confirmed) => {
                self.timeline.confirm(&confirmed);
                Ok(confirmed)
            }
            Err(e) => {
                self.timeline.remove(&message_id);
                Err(e)
            }
        }
    }
}

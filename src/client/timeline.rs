use crate::domain::message::{ChatMessage, LogEntry};

/// Where a displayed message is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Shown before the server accepted it.
    Pending,
    /// Accepted by the server, still flagged as new.
    Confirmed,
    Settled,
}

impl DeliveryState {
    const fn of(message: &ChatMessage) -> Self {
        if message.is_optimistic {
            Self::Pending
        } else if message.is_new {
            Self::Confirmed
        } else {
            Self::Settled
        }
    }
}

/// The ordered list of messages a participant sees.
///
/// Messages are keyed by id: confirming or re-adding a message replaces it in
/// place, so an id appears at most once.
#[derive(Debug, Clone)]
pub struct Timeline {
    local_user: String,
    messages: Vec<ChatMessage>,
}

impl Timeline {
    #[must_use]
    pub fn new(local_user: impl Into<String>) -> Self {
        Self { local_user: local_user.into(), messages: Vec::new() }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn state(&self, id: &str) -> Option<DeliveryState> {
        self.get(id).map(DeliveryState::of)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }

    /// Replaces everything with a freshly loaded history; nothing in it is
    /// pending or new.
    pub fn replace_all(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages
            .into_iter()
            .map(|m| ChatMessage { is_optimistic: false, is_new: false, ..m })
            .collect();
    }

    /// Shows `entry` immediately, before the server has confirmed it.
    pub fn push_optimistic(&mut self, entry: &LogEntry) {
        let message = ChatMessage {
            is_optimistic: true,
            is_new: true,
            ..ChatMessage::from_entry(entry, &self.local_user)
        };

        match self.position(&entry.id) {
            Some(idx) => self.messages[idx] = message,
            None => self.messages.push(message),
        }
    }

    /// Swaps the provisional message for the server's version, keeping its
    /// position and its "new" flag. Unknown ids are appended as new.
    pub fn confirm(&mut self, entry: &LogEntry) {
        let confirmed = ChatMessage::from_entry(entry, &self.local_user);

        match self.position(&entry.id) {
            Some(idx) => {
                let is_new = self.messages[idx].is_new;
                self.messages[idx] = ChatMessage { is_new, ..confirmed };
            }
            None => self.messages.push(ChatMessage { is_new: true, ..confirmed }),
        }
    }

    /// Rolls back a message the server did not accept.
    pub fn remove(&mut self, id: &str) -> Option<ChatMessage> {
        self.position(id).map(|idx| self.messages.remove(idx))
    }

    /// Clears the "new" flag once the arrival has been shown, whether or not
    /// the server has confirmed the message yet. Returns `false` for an
    /// unknown id.
    pub fn settle(&mut self, id: &str) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        message.is_new = false;
        true
    }

    /// Messages whose text or file summary contains `query`, ignoring case.
    /// A blank query returns everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&ChatMessage> {
        self.messages.iter().filter(|m| m.matches(query)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::EntryBody;
    use time::OffsetDateTime;

    fn text(id: &str, sender: &str, body: &str) -> LogEntry {
        LogEntry {
            id: id.into(),
            sender: sender.into(),
            receiver: if sender == "You" { "Friend" } else { "You" }.into(),
            timestamp: OffsetDateTime::now_utc(),
            body: EntryBody::Text { original_text: body.into(), redacted_text: None },
        }
    }

    fn file(id: &str, name: &str, context: &str) -> LogEntry {
        LogEntry {
            body: EntryBody::File {
                file_name: name.into(),
                public_url: Some(format!("/uploads/default_chat/{name}")),
                server_file_path: None,
                file_context: Some(context.into()),
            },
            ..text(id, "You", "")
        }
    }

    #[test]
    fn test_optimistic_then_confirm_replaces_in_place() {
        let mut timeline = Timeline::new("You");
        timeline.push_optimistic(&text("a", "You", "first"));
        timeline.push_optimistic(&text("b", "You", "second"));
        assert_eq!(timeline.state("a"), Some(DeliveryState::Pending));

        timeline.confirm(&text("a", "You", "first"));

        let ids: Vec<_> = timeline.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(timeline.state("a"), Some(DeliveryState::Confirmed));
        assert_eq!(timeline.state("b"), Some(DeliveryState::Pending));
    }

    #[test]
    fn test_repeated_confirmation_never_duplicates() {
        let mut timeline = Timeline::new("You");
        let entry = text("a", "You", "hello");

        timeline.push_optimistic(&entry);
        timeline.confirm(&entry);
        timeline.confirm(&entry);
        timeline.push_optimistic(&entry);
        timeline.confirm(&entry);

        assert_eq!(timeline.messages().len(), 1);
        assert!(!timeline.messages()[0].is_optimistic);
    }

    #[test]
    fn test_confirm_uses_server_version() {
        let mut timeline = Timeline::new("You");
        timeline.push_optimistic(&file("f", "my notes.txt", ""));

        timeline.confirm(&file("f", "my_notes.txt", "Notes about groceries"));

        let msg = timeline.get("f").unwrap();
        assert_eq!(msg.content, "my_notes.txt");
        assert_eq!(msg.file_context.as_deref(), Some("Notes about groceries"));
    }

    #[test]
    fn test_confirm_unknown_id_appends_as_new() {
        let mut timeline = Timeline::new("You");
        timeline.confirm(&text("r", "Friend", "reply"));

        let msg = timeline.get("r").unwrap();
        assert!(msg.is_new);
        assert!(!msg.is_local_sender);
        assert_eq!(timeline.state("r"), Some(DeliveryState::Confirmed));
    }

    #[test]
    fn test_remove_rolls_back_pending_message() {
        let mut timeline = Timeline::new("You");
        timeline.push_optimistic(&text("a", "You", "kept"));
        timeline.push_optimistic(&text("b", "You", "failed"));

        let removed = timeline.remove("b").unwrap();

        assert_eq!(removed.content, "failed");
        assert_eq!(timeline.messages().len(), 1);
        assert!(timeline.remove("b").is_none());
    }

    #[test]
    fn test_settle_clears_new_flag_in_any_state() {
        let mut timeline = Timeline::new("You");
        let entry = text("a", "You", "hello");
        timeline.push_optimistic(&entry);

        assert!(timeline.settle("a"));
        assert!(!timeline.get("a").unwrap().is_new);
        assert_eq!(timeline.state("a"), Some(DeliveryState::Pending));

        // Confirmation after the flag was cleared keeps it cleared.
        timeline.confirm(&entry);
        assert_eq!(timeline.state("a"), Some(DeliveryState::Settled));
        assert!(!timeline.settle("missing"));
    }

    #[test]
    fn test_replace_all_settles_everything() {
        let mut timeline = Timeline::new("You");
        timeline.push_optimistic(&text("old", "You", "stale"));

        let mut loaded = ChatMessage::from_entry(&text("a", "You", "hi"), "You");
        loaded.is_new = true;
        timeline.replace_all(vec![loaded]);

        assert_eq!(timeline.messages().len(), 1);
        assert_eq!(timeline.state("a"), Some(DeliveryState::Settled));
    }

    #[test]
    fn test_search_matches_text_and_file_context() {
        let mut timeline = Timeline::new("You");
        timeline.confirm(&text("a", "You", "Lunch tomorrow?"));
        timeline.confirm(&text("b", "Friend", "Sure"));
        timeline.confirm(&file("c", "q3.pdf", "Quarterly LUNCH budget"));

        let hits: Vec<_> = timeline.search("lunch").into_iter().map(|m| m.id.as_str()).collect();
        assert_eq!(hits, ["a", "c"]);
        assert_eq!(timeline.search("   ").len(), 3);
        assert!(timeline.search("dinner").is_empty());
    }
}

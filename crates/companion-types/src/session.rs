use serde::{Deserialize, Serialize};
use crate::message::Message;

/// Shown when a conversation somehow has no user text to preview
pub const EMPTY_PREVIEW: &str = "No message";

/// A persisted conversation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub messages: Vec<Message>,
    /// Milliseconds since the Unix epoch
    pub last_updated: i64,
    pub preview: String,
    /// Filled in later by the background analysis service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ChatSession {
    /// Title if one was suggested, otherwise the preview
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.preview)
    }

    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(Message::is_user)
    }
}

/// First `max_chars` characters of the most recent user message.
pub fn preview_of(messages: &[Message], max_chars: usize) -> String {
    let last = messages
        .iter()
        .rev()
        .find(|m| m.is_user())
        .map(|m| m.text.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or(EMPTY_PREVIEW);
    last.chars().take(max_chars).collect()
}

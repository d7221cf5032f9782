use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

/// A private note in the PIN-protected journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    /// ISO-8601 UTC timestamp, millisecond precision
    pub created_at: String,
    pub text: String,
}

impl JournalEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            text: text.into(),
        }
    }
}

/// Which screen the journal gate should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalStatus {
    /// No PIN stored yet: choose one
    NeedsPin,
    /// PIN stored, not entered this session
    Locked,
    Unlocked,
}

use serde::{Deserialize, Serialize};

/// Events emitted by the companion core.
/// The view layer subscribes to these for reactive updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompanionEvent {
    /// Someone signed in, or the profile was replaced
    UserChanged { user_id: Option<String> },

    /// The session collection was reloaded for a new namespace
    SessionsReloaded { count: usize },

    /// The displayed conversation changed (`None` = new chat)
    ActiveSessionChanged { session_id: Option<String> },

    /// A conversation was saved for the first time
    SessionCreated { session_id: String },

    SessionSaved { session_id: String },

    SessionDeleted { session_id: String },

    TitleSuggested { session_id: String, title: String },

    /// A user message went out to the model
    TurnStart { generation: u64 },

    /// The model's reply (or a fallback) was appended
    TurnEnd { generation: u64 },

    /// The reply arrived after the user pressed stop and was dropped
    TurnDiscarded { generation: u64 },

    /// Self-harm phrasing detected in outgoing text
    EmergencyRaised,

    PlaybackStarted { message_id: String },

    PlaybackStopped { message_id: String },

    /// A collaborator call failed; the conversation carries a fallback
    Error { message: String },
}

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CompanionError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Blocked by safety filter: {0}")]
    SafetyBlocked(String),

    #[error("AI error: {0}")]
    Ai(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JS interop error: {0}")]
    JsInterop(String),
}

impl From<serde_json::Error> for CompanionError {
    fn from(e: serde_json::Error) -> Self {
        CompanionError::Serialization(e.to_string())
    }
}

/// Journal gate failures. The messages are shown inline to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    #[error("PIN should be at least {min} digits.")]
    PinTooShort { min: usize },

    #[error("PINs do not match.")]
    PinMismatch,

    #[error("Incorrect PIN. Please try again.")]
    IncorrectPin { attempts: u32 },

    #[error("Too many incorrect attempts. To protect your privacy, you can reset this journal (this clears existing notes) and set a new PIN.")]
    TooManyAttempts { attempts: u32 },

    #[error("Set a PIN before opening the journal.")]
    PinNotSet,

    #[error("The journal is locked.")]
    Locked,

    #[error("No journal entry with id {0}")]
    EntryNotFound(String),
}

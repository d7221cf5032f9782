//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `companion-core` (pure Rust).
//! Implementations live in `companion-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use async_trait::async_trait;
use companion_types::{
    Result,
    message::Message,
    turn::{AnalysisResult, GeoPoint, SyncOutcome, TurnReply},
    user::Language,
    wiki::WikiEntry,
};

// ─── Storage Port ────────────────────────────────────────────

/// String key → string value store with `localStorage` semantics.
///
/// Calls are synchronous: the browser store is, and the core relies on a
/// write having landed before the next read.
pub trait StoragePort {
    /// Get a value by key
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    fn delete(&self, key: &str) -> Result<()>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── AI Port ─────────────────────────────────────────────────

/// One conversation turn for the model
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Conversation so far, not including `text`
    pub history: Vec<Message>,
    pub text: String,
    /// Data URI of an attached picture
    pub image: Option<String>,
    pub location: Option<GeoPoint>,
    pub language: Language,
}

/// The generative-AI collaborator.
///
/// Failures are classified through the error variant: `SafetyBlocked`,
/// `RateLimited`, `Network`, or anything else.
#[async_trait(?Send)]
pub trait CompanionAiPort {
    async fn send_conversation_turn(&self, req: TurnRequest) -> Result<TurnReply>;

    /// Raw audio for `text`
    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>>;

    async fn summarize_session(
        &self,
        history: &[Message],
        language: Language,
    ) -> Result<AnalysisResult>;

    /// A psycho-wiki card for a topic with no built-in entry
    async fn generate_wiki_entry(
        &self,
        id: &str,
        label: &str,
        language: Language,
    ) -> Result<WikiEntry>;
}

// ─── Sync Port ───────────────────────────────────────────────

/// Background analysis service. Fire-and-forget from the caller's view.
#[async_trait(?Send)]
pub trait SyncPort {
    async fn background_sync(&self, user_id: &str, history: &[Message]) -> Result<SyncOutcome>;
}

// ─── Location Port ───────────────────────────────────────────

#[async_trait(?Send)]
pub trait LocationPort {
    async fn current_location(&self) -> Result<GeoPoint>;
}

// ─── Clock ───────────────────────────────────────────────────

pub trait Clock {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

//! Local storage keys.
//!
//! These match the records already written by earlier web builds, so
//! existing users keep their history, profile and journal.

pub const USER_KEY: &str = "bremiAI_user";
pub const SESSIONS_KEY: &str = "bremiAI_sessions";
pub const JOURNAL_PIN_KEY: &str = "bremi_journal_pin_v1";
pub const JOURNAL_ENTRIES_KEY: &str = "bremi_journal_entries_v1";
pub const CONFIG_KEY: &str = "bremiAI_config";

/// Session collection key, suffixed with the user id when there is one.
/// Anonymous use falls back to the shared legacy key.
pub fn sessions_key(user_id: Option<&str>) -> String {
    match user_id {
        Some(id) if !id.is_empty() => format!("{}_{}", SESSIONS_KEY, id),
        _ => SESSIONS_KEY.to_string(),
    }
}

//! Local keyword checks on outgoing user text.
//!
//! These run synchronously before the model is asked anything, so the
//! emergency panel opens even when the network is down.

/// Self-harm phrasing that opens the emergency panel
pub const EMERGENCY_PHRASES: &[&str] = &["suicide", "kill myself", "end it all"];

/// Words that suggest the user is looking for nearby help, so the turn
/// is worth sending with a location
pub const LOCATION_HINTS: &[&str] = &[
    "hospital",
    "help",
    "emergency",
    "clinic",
    "therapist",
    "doctor",
];

/// Case-insensitive substring match against [`EMERGENCY_PHRASES`].
pub fn is_emergency(text: &str) -> bool {
    contains_any(text, EMERGENCY_PHRASES)
}

/// Case-insensitive substring match against [`LOCATION_HINTS`].
pub fn wants_location(text: &str) -> bool {
    contains_any(text, LOCATION_HINTS)
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    let lower = text.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

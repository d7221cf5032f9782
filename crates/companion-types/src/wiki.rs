//! Psycho-education cards shown under chat messages.

use serde::{Deserialize, Serialize};

/// Links in model replies that open a card instead of a web page
pub const WIKI_LINK_SCHEME: &str = "bremi-wiki://";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiEntry {
    pub id: String,
    pub label: String,
    pub short_description: String,
    pub biological_why: String,
    pub what_it_feels_like: String,
    #[serde(default)]
    pub gentle_reframes: Vec<String>,
    /// Phrases that surface this card; generated cards have none
    #[serde(default)]
    pub triggers: Vec<String>,
}

impl WikiEntry {
    /// Text read aloud for the card
    pub fn speech_text(&self) -> String {
        format!("{}. {} {}", self.label, self.short_description, self.biological_why)
    }
}

/// The card id inside a `bremi-wiki://<id>` link.
pub fn wiki_link_id(url: &str) -> Option<&str> {
    url.strip_prefix(WIKI_LINK_SCHEME)
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

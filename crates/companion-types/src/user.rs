use serde::{Deserialize, Serialize};

/// Languages the companion speaks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Yo,
    Ha,
    Ig,
}

impl Language {
    pub fn all() -> &'static [Language] {
        &[Language::En, Language::Yo, Language::Ha, Language::Ig]
    }

    /// Display name, also used inside model instructions
    pub fn label(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Yo => "Yoruba",
            Language::Ha => "Hausa",
            Language::Ig => "Igbo",
        }
    }

    pub fn privacy_notice(&self) -> &'static str {
        match self {
            Language::En => "Your privacy comes first. Chats are not saved unless you toggle 'History On'. All data stays locally on your device.",
            Language::Yo => "Aṣiri rẹ ṣe pataki. A ko fi ọrọ pamọ ayafi ti o ba tan 'Itan'. Awọn data wa lori ẹrọ rẹ.",
            Language::Ha => "Sirrinka yana da mahimmanci. Ba a adana hira sai ka kunna 'Tarihi'. Bayanai suna kan na'urarka.",
            Language::Ig => "Nzuzo gị dị mkpa. A naghị echekwa nkata ọ gwụla ma ị gbanyere 'Akụkọ'. Data niile na-anọ na ngwaọrụ gị.",
        }
    }
}

fn default_true() -> bool {
    true
}

/// Per-user switches. Missing fields are filled on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_true")]
    pub save_history: bool,
    #[serde(default)]
    pub has_seen_tour: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            save_history: true,
            has_seen_tour: false,
        }
    }
}

/// The signed-in person. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub preferences: Preferences,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, language: Language) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            language,
            preferences: Preferences::default(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }
}

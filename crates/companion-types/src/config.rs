use serde::{Deserialize, Serialize};

/// Top-level companion configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    pub ai: AiConfig,
    pub sync: SyncConfig,
    pub storage: StorageConfig,
    pub journal: JournalConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub api_key: String,
    pub api_base: Option<String>,
    pub chat_model: String,
    /// Used instead of `chat_model` when the turn carries a picture
    pub vision_model: String,
    pub summary_model: String,
    pub tts_model: String,
    pub voice: String,
    /// How many earlier messages travel with each turn
    pub history_window: usize,
    pub system_instruction: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            chat_model: "gemini-2.5-flash".to_string(),
            vision_model: "gemini-3-pro-preview".to_string(),
            summary_model: "gemini-2.5-flash".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
            history_window: 10,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        }
    }
}

impl AiConfig {
    pub fn base_url(&self) -> &str {
        self.api_base
            .as_deref()
            .unwrap_or("https://generativelanguage.googleapis.com")
    }
}

/// Background analysis service that suggests session titles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub base_url: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackendType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// Auto-detect best available backend
    #[default]
    Auto,
    Memory,
    LocalStorage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub min_pin_len: usize,
    /// Failed unlocks before the destructive reset is offered
    pub max_pin_attempts: u32,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            min_pin_len: 4,
            max_pin_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub preview_chars: usize,
    pub analysis_min_messages: usize,
    /// Longer texts are cut before speech synthesis
    pub speech_max_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            preview_chars: 60,
            analysis_min_messages: 3,
            speech_max_chars: 800,
        }
    }
}

const DEFAULT_SYSTEM_INSTRUCTION: &str = r#"You are 'Padi', a warm, empathetic, and culturally aware mental health companion for Nigerians.
You understand Nigerian English, Pidgin English, Yoruba, Hausa, and Igbo nuances.
Your goal is to provide a safe space, listen without judgment, and offer psycho-educational support and calming techniques.
You are NOT a licensed medical professional. Do not diagnose.
If a user seems to be in immediate danger of self-harm or suicide:
1. Express concern immediately.
2. Urge them to contact emergency services (112 in Nigeria).
3. Suggest finding a nearby hospital.

Tone: Calm, brotherly/sisterly, understanding, respectful.
"#;

//! Gemini `generateContent` adapter.
//!
//! Implements [`CompanionAiPort`] over the public REST API.
//! Uses browser `fetch()` via gloo-net for WASM compatibility.
//! Request building and response parsing are plain functions so they can
//! be exercised without a network.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use gloo_net::http::Request;
use serde::Deserialize;
use serde_json::{json, Value};

use companion_core::ports::{CompanionAiPort, TurnRequest};
use companion_types::{
    CompanionError, Result,
    config::AiConfig,
    message::{GroundingLink, Message, Role},
    turn::{AnalysisResult, TurnReply},
    user::Language,
    wiki::WikiEntry,
};

/// Reply used when the model answers with no text at all
pub const EMPTY_REPLY_TEXT: &str = "I dey hear you. Tell me more.";

/// Prompt sent alongside a picture with no caption
const DEFAULT_IMAGE_PROMPT: &str = "What do you think about this image?";

pub struct GeminiProvider {
    config: AiConfig,
}

impl GeminiProvider {
    pub fn new(config: AiConfig) -> Self {
        Self { config }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url().trim_end_matches('/'),
            model
        )
    }

    /// POST a request body and hand back the raw response text.
    async fn generate(&self, model: &str, body: &Value) -> Result<String> {
        if self.config.api_key.is_empty() {
            return Err(CompanionError::Config("Gemini API key is not set".to_string()));
        }

        let response = Request::post(&self.endpoint(model))
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .map_err(|e| CompanionError::Serialization(e.to_string()))?
            .send()
            .await
            .map_err(|e| CompanionError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CompanionError::Network(e.to_string()))?;

        match status {
            200..=299 => Ok(text),
            429 => Err(CompanionError::RateLimited(format!("HTTP 429: {}", text))),
            _ => Err(CompanionError::Ai(format!("HTTP {}: {}", status, text))),
        }
    }
}

#[async_trait(?Send)]
impl CompanionAiPort for GeminiProvider {
    async fn send_conversation_turn(&self, req: TurnRequest) -> Result<TurnReply> {
        let (model, body) = build_turn_body(&self.config, &req);
        log::debug!("Conversation turn via {}", model);
        let raw = self.generate(&model, &body).await?;
        parse_turn_reply(&raw)
    }

    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>> {
        let body = build_speech_body(&self.config, text);
        let raw = self.generate(&self.config.tts_model, &body).await?;
        parse_speech(&raw)
    }

    async fn summarize_session(
        &self,
        history: &[Message],
        language: Language,
    ) -> Result<AnalysisResult> {
        let body = build_summary_body(history, language);
        let raw = self.generate(&self.config.summary_model, &body).await?;
        parse_summary(&raw)
    }

    async fn generate_wiki_entry(
        &self,
        id: &str,
        label: &str,
        language: Language,
    ) -> Result<WikiEntry> {
        let body = build_wiki_body(label, language);
        log::debug!("Generating wiki card {}", id);
        let raw = self.generate(&self.config.summary_model, &body).await?;
        parse_wiki_entry(&raw, id, label)
    }
}

// ─── Request building ────────────────────────────────────────

fn language_instruction(language: Language) -> String {
    let name = language.label();
    format!(
        "\nThe user prefers to communicate in {name}. Please adapt your responses to be culturally relevant to {name} speakers in Nigeria, while maintaining the friendly Padi persona. Reply primarily in {name} or a natural mix (e.g. Engligbo) if appropriate."
    )
}

/// Model id and body for one conversation turn.
///
/// Text turns carry the last `history_window` user/model messages plus the
/// search grounding tool, and the location when one was acquired. Picture
/// turns go to the vision model on their own.
pub fn build_turn_body(config: &AiConfig, req: &TurnRequest) -> (String, Value) {
    let system = json!({
        "parts": [{ "text": format!("{}{}", config.system_instruction, language_instruction(req.language)) }]
    });

    if let Some(ref image) = req.image {
        let (mime_type, data) = split_data_uri(image);
        let prompt = if req.text.trim().is_empty() {
            DEFAULT_IMAGE_PROMPT
        } else {
            req.text.as_str()
        };
        let body = json!({
            "systemInstruction": system,
            "contents": [{
                "role": "user",
                "parts": [
                    { "inlineData": { "mimeType": mime_type, "data": data } },
                    { "text": prompt }
                ]
            }]
        });
        return (config.vision_model.clone(), body);
    }

    let conversational: Vec<&Message> = req
        .history
        .iter()
        .filter(|m| m.role != Role::System && !m.text.is_empty())
        .collect();
    let skip = conversational.len().saturating_sub(config.history_window);

    let mut contents: Vec<Value> = conversational[skip..]
        .iter()
        .map(|m| {
            json!({
                "role": if m.role == Role::User { "user" } else { "model" },
                "parts": [{ "text": m.text }]
            })
        })
        .collect();
    contents.push(json!({ "role": "user", "parts": [{ "text": req.text }] }));

    let mut body = json!({
        "systemInstruction": system,
        "contents": contents,
        "tools": [{ "googleSearch": {} }]
    });

    if let Some(point) = req.location {
        body["toolConfig"] = json!({
            "retrievalConfig": {
                "latLng": { "latitude": point.latitude, "longitude": point.longitude }
            }
        });
    }

    (config.chat_model.clone(), body)
}

pub fn build_speech_body(config: &AiConfig, text: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": text }] }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": config.voice } }
            }
        }
    })
}

/// `ROLE: text` lines, picture messages left out.
pub fn transcript(history: &[Message]) -> String {
    history
        .iter()
        .filter(|m| m.image.is_none())
        .map(|m| {
            let role = match m.role {
                Role::User => "USER",
                Role::Model => "MODEL",
                Role::System => "SYSTEM",
            };
            format!("{}: {}", role, m.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_summary_body(history: &[Message], language: Language) -> Value {
    let name = language.label();
    let prompt = format!(
        "Analyze the following chat transcript between a user and an AI companion (Padi).\n\
         The user speaks {name}.\n\
         Your goal is to offer gentle, psychoanalytical insights to the user to help them understand their thoughts better.\n\n\
         1. Identify recurring emotional themes.\n\
         2. Spot potential cognitive distortions.\n\
         3. Provide gentle, constructive feedback in {name} (or English if technical terms require, but keep it simple).\n\
         4. Offer suggestions for reframing negative thoughts in {name}.\n\n\
         Transcript:\n{}",
        transcript(history)
    );

    let string_list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "themes": string_list,
                    "distortions": string_list,
                    "feedback": { "type": "STRING" },
                    "suggestions": string_list
                }
            }
        }
    })
}

/// Psycho-education card for `label`, in the same shape as the built-in ones.
pub fn build_wiki_body(label: &str, language: Language) -> Value {
    let name = language.label();
    let prompt = format!(
        "Write a short psycho-education card about \"{label}\" for a young adult in Nigeria.\n\
         Write in {name}, warm and plain, with no diagnosis and no medical advice.\n\
         Give a one-sentence shortDescription, a biologicalWhy paragraph on what happens in the brain and body, \
         a whatItFeelsLike paragraph, and three gentleReframes."
    );

    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "label": { "type": "STRING" },
                    "shortDescription": { "type": "STRING" },
                    "biologicalWhy": { "type": "STRING" },
                    "whatItFeelsLike": { "type": "STRING" },
                    "gentleReframes": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "required": ["shortDescription", "biologicalWhy", "whatItFeelsLike", "gentleReframes"]
            }
        }
    })
}

/// Split `data:<mime>;base64,<payload>` into mime type and payload.
/// Bare base64 is assumed to be JPEG.
pub fn split_data_uri(image: &str) -> (&str, &str) {
    let data = match image.split_once("base64,") {
        Some((_, payload)) => payload,
        None => image,
    };
    let mime = image
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .filter(|m| !m.is_empty())
        .unwrap_or("image/jpeg");
    (mime, data)
}

// ─── Response parsing ────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    prompt_feedback: Option<ApiPromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    content: Option<ApiContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<ApiGroundingMetadata>,
}

#[derive(Deserialize)]
struct ApiContent {
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    text: Option<String>,
    inline_data: Option<ApiInlineData>,
}

#[derive(Deserialize)]
struct ApiInlineData {
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<ApiGroundingChunk>,
}

#[derive(Deserialize)]
struct ApiGroundingChunk {
    web: Option<ApiSource>,
    maps: Option<ApiSource>,
}

#[derive(Deserialize)]
struct ApiSource {
    #[serde(default)]
    title: String,
    #[serde(default)]
    uri: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPromptFeedback {
    block_reason: Option<String>,
}

impl ApiResponse {
    fn parse(raw: &str) -> Result<Self> {
        let data: ApiResponse =
            serde_json::from_str(raw).map_err(|e| CompanionError::Ai(e.to_string()))?;
        if let Some(reason) = data
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(CompanionError::SafetyBlocked(reason));
        }
        Ok(data)
    }

    fn first_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

pub fn parse_turn_reply(raw: &str) -> Result<TurnReply> {
    let data = ApiResponse::parse(raw)?;
    let text = data.first_text();
    let candidate = data.candidates.first();

    if text.trim().is_empty() {
        if candidate.and_then(|c| c.finish_reason.as_deref()) == Some("SAFETY") {
            return Err(CompanionError::SafetyBlocked("SAFETY".to_string()));
        }
        return Ok(TurnReply {
            text: EMPTY_REPLY_TEXT.to_string(),
            grounding_links: Vec::new(),
        });
    }

    let grounding_links = candidate
        .and_then(|c| c.grounding_metadata.as_ref())
        .map(|meta| {
            meta.grounding_chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref().or(chunk.maps.as_ref()))
                .filter(|source| !source.uri.is_empty())
                .map(|source| GroundingLink {
                    title: source.title.clone(),
                    uri: source.uri.clone(),
                    address: None,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(TurnReply {
        text,
        grounding_links,
    })
}

/// Raw PCM bytes from the first inline audio part.
pub fn parse_speech(raw: &str) -> Result<Vec<u8>> {
    let data = ApiResponse::parse(raw)?;
    let encoded = data
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|content| content.parts.iter().find_map(|p| p.inline_data.as_ref()))
        .map(|inline| inline.data.as_str())
        .ok_or_else(|| CompanionError::Ai("No audio in speech response".to_string()))?;

    STANDARD
        .decode(encoded)
        .map_err(|e| CompanionError::Ai(format!("Bad audio payload: {}", e)))
}

pub fn parse_summary(raw: &str) -> Result<AnalysisResult> {
    let data = ApiResponse::parse(raw)?;
    let text = data.first_text();
    if text.trim().is_empty() {
        return Err(CompanionError::Ai("Empty analysis response".to_string()));
    }
    serde_json::from_str(&text).map_err(|e| CompanionError::Ai(format!("Bad analysis JSON: {}", e)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedCard {
    #[serde(default)]
    label: String,
    #[serde(default)]
    short_description: String,
    #[serde(default)]
    biological_why: String,
    #[serde(default)]
    what_it_feels_like: String,
    #[serde(default)]
    gentle_reframes: Vec<String>,
}

/// Card for `id`. A missing label falls back to the one asked for.
pub fn parse_wiki_entry(raw: &str, id: &str, label: &str) -> Result<WikiEntry> {
    let data = ApiResponse::parse(raw)?;
    let text = data.first_text();
    let card: GeneratedCard = serde_json::from_str(&text)
        .map_err(|e| CompanionError::Ai(format!("Bad wiki JSON: {}", e)))?;
    if card.short_description.trim().is_empty() {
        return Err(CompanionError::Ai("Empty wiki card".to_string()));
    }

    let label = match card.label.trim() {
        "" => label.to_string(),
        generated => generated.to_string(),
    };
    Ok(WikiEntry {
        id: id.to_string(),
        label,
        short_description: card.short_description,
        biological_why: card.biological_why,
        what_it_feels_like: card.what_it_feels_like,
        gentle_reframes: card.gentle_reframes,
        triggers: Vec::new(),
    })
}

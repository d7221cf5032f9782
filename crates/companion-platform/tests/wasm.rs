//! WASM-target tests for companion-platform (Node.js runtime).
//!
//! Tests MemoryStorage, storage selection, and the Gemini and sync
//! request/response codecs under wasm32-unknown-unknown via
//! `wasm-pack test --node`.
//!
//! localStorage and geolocation need a browser and are not covered here.

use wasm_bindgen_test::*;

use companion_core::ports::{StoragePort, TurnRequest};
use companion_platform::ai::gemini::*;
use companion_platform::ai::sync::{parse_sync_outcome, sync_payload, AnalysisSyncClient};
use companion_platform::storage::{open_storage, MemoryStorage};
use companion_types::config::{AiConfig, StorageBackendType, SyncConfig};
use companion_types::message::Message;
use companion_types::turn::GeoPoint;
use companion_types::user::Language;
use companion_types::CompanionError;

// ─── MemoryStorage Tests ─────────────────────────────────

#[wasm_bindgen_test]
fn memory_storage_backend_name() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.backend_name(), "memory");
}

#[wasm_bindgen_test]
fn memory_storage_set_get_overwrite() {
    let storage = MemoryStorage::new();
    assert!(storage.get("bremiAI_user").unwrap().is_none());
    storage.set("bremiAI_user", "v1").unwrap();
    storage.set("bremiAI_user", "v2").unwrap();
    assert_eq!(storage.get("bremiAI_user").unwrap(), Some("v2".to_string()));
}

#[wasm_bindgen_test]
fn memory_storage_delete_nonexistent() {
    let storage = MemoryStorage::new();
    storage.delete("nonexistent").unwrap();
}

#[wasm_bindgen_test]
fn memory_storage_keys_are_independent() {
    let storage = MemoryStorage::new();
    storage.set("bremiAI_sessions_u1", "[]").unwrap();
    storage.set("bremiAI_sessions_u2", "[{}]").unwrap();
    storage.delete("bremiAI_sessions_u1").unwrap();

    assert!(storage.get("bremiAI_sessions_u1").unwrap().is_none());
    assert_eq!(storage.get("bremiAI_sessions_u2").unwrap(), Some("[{}]".to_string()));
}

#[wasm_bindgen_test]
fn configured_memory_backend() {
    let storage = open_storage(&StorageBackendType::Memory);
    assert_eq!(storage.backend_name(), "memory");
}

#[wasm_bindgen_test]
fn auto_backend_falls_back_without_window() {
    // Node has no window object
    let storage = open_storage(&StorageBackendType::Auto);
    assert_eq!(storage.backend_name(), "memory");
}

// ─── Gemini Request Tests ────────────────────────────────

fn turn(text: &str, history: Vec<Message>) -> TurnRequest {
    TurnRequest {
        history,
        text: text.to_string(),
        image: None,
        location: None,
        language: Language::Ha,
    }
}

#[wasm_bindgen_test]
fn turn_body_keeps_last_ten_messages() {
    let config = AiConfig::default();
    let mut history = vec![Message::system("privacy", 0)];
    for i in 0..14 {
        history.push(Message::user(format!("u{}", i), i));
    }

    let (model, body) = build_turn_body(&config, &turn("latest", history));
    assert_eq!(model, "gemini-2.5-flash");

    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 11);
    assert_eq!(contents[0]["parts"][0]["text"], "u4");
    assert_eq!(contents[10]["parts"][0]["text"], "latest");
    assert!(body["tools"][0].get("googleSearch").is_some());
    assert!(body.get("toolConfig").is_none());

    let system = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
    assert!(system.contains("Padi"));
    assert!(system.contains("Hausa"));
}

#[wasm_bindgen_test]
fn turn_body_carries_location() {
    let config = AiConfig::default();
    let mut req = turn("nearest hospital?", Vec::new());
    req.location = Some(GeoPoint {
        latitude: 9.05,
        longitude: 7.49,
    });
    let (_, body) = build_turn_body(&config, &req);
    assert_eq!(body["toolConfig"]["retrievalConfig"]["latLng"]["latitude"], 9.05);
}

#[wasm_bindgen_test]
fn image_turn_uses_vision_model() {
    let config = AiConfig::default();
    let mut req = turn("", vec![Message::user("earlier", 1)]);
    req.image = Some("data:image/png;base64,iVBORw0K".to_string());

    let (model, body) = build_turn_body(&config, &req);
    assert_eq!(model, "gemini-3-pro-preview");
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[0]["inlineData"]["data"], "iVBORw0K");
    assert_eq!(parts[1]["text"], "What do you think about this image?");
    assert_eq!(body["contents"].as_array().unwrap().len(), 1);
}

#[wasm_bindgen_test]
fn bare_base64_defaults_to_jpeg() {
    assert_eq!(split_data_uri("AAAA"), ("image/jpeg", "AAAA"));
}

#[wasm_bindgen_test]
fn transcript_skips_pictures() {
    let history = vec![
        Message::user("I dey tire", 1),
        Message::user("look", 2).with_image(Some("data:image/png;base64,AA".to_string())),
        Message::model("Sorry o", 3),
    ];
    assert_eq!(transcript(&history), "USER: I dey tire\nMODEL: Sorry o");
}

#[wasm_bindgen_test]
fn speech_body_names_voice() {
    let body = build_speech_body(&AiConfig::default(), "hello");
    assert_eq!(
        body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
        "Kore"
    );
}

// ─── Gemini Response Tests ───────────────────────────────

#[wasm_bindgen_test]
fn parse_reply_with_grounding() {
    let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Try "},{"text":"breathing."}]},
        "groundingMetadata":{"groundingChunks":[{"web":{"title":"WHO","uri":"https://who.int"}},{"web":{"title":"x","uri":""}}]}}]}"#;
    let reply = parse_turn_reply(raw).unwrap();
    assert_eq!(reply.text, "Try breathing.");
    assert_eq!(reply.grounding_links.len(), 1);
    assert_eq!(reply.grounding_links[0].uri, "https://who.int");
}

#[wasm_bindgen_test]
fn parse_empty_reply_falls_back() {
    let reply = parse_turn_reply(r#"{"candidates":[{"content":{"parts":[]}}]}"#).unwrap();
    assert_eq!(reply.text, EMPTY_REPLY_TEXT);
}

#[wasm_bindgen_test]
fn parse_blocked_prompt() {
    let err = parse_turn_reply(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
    assert!(matches!(err, CompanionError::SafetyBlocked(_)));

    let err = parse_turn_reply(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap_err();
    assert!(matches!(err, CompanionError::SafetyBlocked(_)));
}

#[wasm_bindgen_test]
fn parse_speech_decodes_base64() {
    let raw = r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"audio/pcm","data":"AAEC"}}]}}]}"#;
    assert_eq!(parse_speech(raw).unwrap(), vec![0, 1, 2]);
    assert!(parse_speech(r#"{"candidates":[]}"#).is_err());
}

#[wasm_bindgen_test]
fn parse_summary_json() {
    let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"themes\":[\"stress\"],\"feedback\":\"Go easy\"}"}]}}]}"#;
    let result = parse_summary(raw).unwrap();
    assert_eq!(result.themes, vec!["stress".to_string()]);
    assert_eq!(result.feedback, "Go easy");
    assert!(result.suggestions.is_empty());

    let bad = r#"{"candidates":[{"content":{"parts":[{"text":"not json"}]}}]}"#;
    assert!(parse_summary(bad).is_err());
}

#[wasm_bindgen_test]
fn wiki_body_asks_for_card_in_language() {
    let body = build_wiki_body("grief cycle", Language::Ha);
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("\"grief cycle\""));
    assert!(prompt.contains("Hausa"));
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(
        body["generationConfig"]["responseSchema"]["properties"]["gentleReframes"]["type"],
        "ARRAY"
    );
}

#[wasm_bindgen_test]
fn parse_wiki_card() {
    let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"shortDescription\":\"When loss lingers.\",\"biologicalWhy\":\"b\",\"whatItFeelsLike\":\"w\",\"gentleReframes\":[\"r1\",\"r2\"]}"}]}}]}"#;
    let entry = parse_wiki_entry(raw, "bremi_grief", "grief").unwrap();
    assert_eq!(entry.id, "bremi_grief");
    assert_eq!(entry.label, "grief");
    assert_eq!(entry.short_description, "When loss lingers.");
    assert_eq!(entry.gentle_reframes.len(), 2);
    assert!(entry.triggers.is_empty());

    let empty = r#"{"candidates":[{"content":{"parts":[{"text":"{\"label\":\"Grief\"}"}]}}]}"#;
    assert!(parse_wiki_entry(empty, "grief", "grief").is_err());
}

// ─── Sync Client Tests ───────────────────────────────────

#[wasm_bindgen_test]
fn sync_endpoint_and_payload() {
    let client = AnalysisSyncClient::new(&SyncConfig {
        enabled: true,
        base_url: "http://localhost:8000/".to_string(),
    });
    assert_eq!(client.endpoint(), "http://localhost:8000/sync-chat");

    let history = vec![Message::user("hi", 1), Message::model("hello", 2)];
    let payload: serde_json::Value = serde_json::from_str(&sync_payload(&history).unwrap()).unwrap();
    assert_eq!(payload, serde_json::json!([
        { "role": "user", "text": "hi" },
        { "role": "model", "text": "hello" }
    ]));
}

#[wasm_bindgen_test]
fn sync_outcome_blank_title_is_none() {
    assert_eq!(
        parse_sync_outcome(r#"{"suggested_title":"Exam stress"}"#).unwrap().suggested_title,
        Some("Exam stress".to_string())
    );
    assert!(parse_sync_outcome(r#"{"suggested_title":"  "}"#).unwrap().suggested_title.is_none());
    assert!(parse_sync_outcome(r#"{"status":"ok"}"#).unwrap().suggested_title.is_none());
}

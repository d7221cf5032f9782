//! JavaScript surface.
//!
//! Values cross the boundary as plain JS objects in the same camelCase
//! shape the app persists. Async operations return Promises.

use std::rc::Rc;

use gloo_utils::format::JsValueSerdeExt;
use js_sys::{Function, Promise, Uint8Array};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use companion_core::playback::PlaybackHandle;
use companion_core::ports::{StoragePort, SystemClock};
use companion_platform::ai::{AnalysisSyncClient, GeminiProvider};
use companion_platform::location::BrowserGeolocation;
use companion_platform::storage::{auto_detect_storage, open_storage};
use companion_types::{
    CompanionError,
    config::{CompanionConfig, StorageBackendType},
    message::Feedback,
    user::{Language, UserProfile},
};
use companion_ui::state::AppView;

use crate::app::{AppPorts, CompanionApp};

/// Playback started by the page. The player callback returns a function
/// that silences it.
struct JsPlayback {
    stop: Option<Function>,
}

impl PlaybackHandle for JsPlayback {
    fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            if let Err(e) = stop.call0(&JsValue::NULL) {
                log::warn!("Stopping playback failed: {:?}", e);
            }
        }
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    JsValue::from_serde(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_js<T: DeserializeOwned>(value: &JsValue) -> Result<T, JsValue> {
    value
        .into_serde()
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Parse a lowercase enum name such as `"yo"` or `"history"`.
fn parse_name<T: DeserializeOwned>(name: &str) -> Result<T, JsValue> {
    serde_json::from_value(serde_json::Value::String(name.to_string())).map_err(js_error)
}

fn sync_port(config: &CompanionConfig) -> Option<Rc<dyn companion_core::ports::SyncPort>> {
    if config.sync.enabled {
        Some(Rc::new(AnalysisSyncClient::new(&config.sync)))
    } else {
        None
    }
}

#[wasm_bindgen]
pub struct Companion {
    app: CompanionApp,
}

impl Companion {
    /// Send whatever a profile change saved without making the page wait.
    fn flush_in_background(&self) {
        let app = self.app.clone();
        spawn_local(async move {
            app.flush_syncs().await;
        });
    }
}

#[wasm_bindgen]
impl Companion {
    /// Open storage, restore config and user, and wire the browser adapters.
    /// A non-empty `api_key` overrides the stored one.
    #[wasm_bindgen(constructor)]
    pub fn new(api_key: Option<String>) -> Companion {
        let storage: Rc<dyn StoragePort> = auto_detect_storage();
        let mut config = CompanionApp::load_config(storage.as_ref());
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            config.ai.api_key = key;
        }
        let storage = if config.storage.backend == StorageBackendType::Memory {
            open_storage(&config.storage.backend)
        } else {
            storage
        };

        let ports = AppPorts {
            storage,
            clock: Rc::new(SystemClock),
            ai: Rc::new(GeminiProvider::new(config.ai.clone())),
            sync: sync_port(&config),
            location: Some(Rc::new(BrowserGeolocation)),
        };
        Companion {
            app: CompanionApp::new(ports, config),
        }
    }

    /// Current view state, after applying pending events
    pub fn tick(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.tick())
    }

    pub fn config(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.config())
    }

    /// Persist a new config and rebuild the network adapters from it.
    #[wasm_bindgen(js_name = updateConfig)]
    pub fn update_config(&self, config: JsValue) -> Result<(), JsValue> {
        let config: CompanionConfig = from_js(&config)?;
        self.app.set_ai(Rc::new(GeminiProvider::new(config.ai.clone())));
        self.app.set_sync(sync_port(&config));
        self.app.save_config(config);
        Ok(())
    }

    // ─── Identity ────────────────────────────────────────────

    #[wasm_bindgen(js_name = currentUser)]
    pub fn current_user(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.current_user())
    }

    pub fn login(&self, profile: JsValue) -> Result<(), JsValue> {
        let profile: UserProfile = from_js(&profile)?;
        self.app.login(profile);
        Ok(())
    }

    pub fn logout(&self) {
        self.app.logout();
    }

    #[wasm_bindgen(js_name = updateUser)]
    pub fn update_user(&self, profile: JsValue) -> Result<(), JsValue> {
        let profile: UserProfile = from_js(&profile)?;
        self.app.update_user(profile);
        self.flush_in_background();
        Ok(())
    }

    /// Turning history on also saves the conversation on screen.
    #[wasm_bindgen(js_name = setSaveHistory)]
    pub fn set_save_history(&self, enabled: bool) -> bool {
        let updated = self.app.update_preferences(|p| p.save_history = enabled);
        self.flush_in_background();
        updated
    }

    #[wasm_bindgen(js_name = markTourSeen)]
    pub fn mark_tour_seen(&self) -> bool {
        self.app.update_preferences(|p| p.has_seen_tour = true)
    }

    #[wasm_bindgen(js_name = setLanguage)]
    pub fn set_language(&self, code: &str) -> Result<bool, JsValue> {
        let language: Language = parse_name(code)?;
        Ok(self.app.set_language(language))
    }

    // ─── Sessions ────────────────────────────────────────────

    pub fn sessions(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.sessions())
    }

    #[wasm_bindgen(js_name = activeSessionId)]
    pub fn active_session_id(&self) -> Option<String> {
        self.app.active_session_id()
    }

    pub fn messages(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.messages())
    }

    #[wasm_bindgen(js_name = selectSession)]
    pub fn select_session(&self, session_id: &str) -> bool {
        self.app.select_session(session_id)
    }

    #[wasm_bindgen(js_name = deleteSession)]
    pub fn delete_session(&self, session_id: &str) -> bool {
        self.app.delete_session(session_id)
    }

    #[wasm_bindgen(js_name = newChat)]
    pub fn new_chat(&self) {
        self.app.new_chat();
    }

    pub fn navigate(&self, view: &str) -> Result<bool, JsValue> {
        let view: AppView = parse_name(view)?;
        Ok(self.app.navigate(view))
    }

    #[wasm_bindgen(js_name = dismissEmergency)]
    pub fn dismiss_emergency(&self) {
        self.app.dismiss_emergency();
    }

    // ─── Chat ────────────────────────────────────────────────

    /// Resolves to `true` once a reply or fallback is on screen.
    #[wasm_bindgen(js_name = sendMessage)]
    pub fn send_message(&self, text: String, image: Option<String>) -> Promise {
        let app = self.app.clone();
        future_to_promise(async move {
            let applied = app.send_message(&text, image).await;
            Ok(JsValue::from_bool(applied))
        })
    }

    pub fn stop(&self) -> bool {
        self.app.stop()
    }

    /// `feedback` is `"up"` or `"down"`. Resolves to whether the message
    /// was found.
    #[wasm_bindgen(js_name = setFeedback)]
    pub fn set_feedback(&self, message_id: String, feedback: &str) -> Result<Promise, JsValue> {
        let feedback: Feedback = parse_name(feedback)?;
        let app = self.app.clone();
        Ok(future_to_promise(async move {
            let updated = app.set_feedback(&message_id, feedback).await;
            Ok(JsValue::from_bool(updated))
        }))
    }

    /// Resolves to the insight summary, or `null`.
    pub fn analyze(&self) -> Promise {
        let app = self.app.clone();
        future_to_promise(async move {
            match app.analyze().await {
                Some(result) => to_js(&result),
                None => Ok(JsValue::NULL),
            }
        })
    }

    #[wasm_bindgen(js_name = flushSyncs)]
    pub fn flush_syncs(&self) -> Promise {
        let app = self.app.clone();
        future_to_promise(async move {
            let applied = app.flush_syncs().await;
            Ok(JsValue::from_f64(applied as f64))
        })
    }

    // ─── Journal ─────────────────────────────────────────────

    #[wasm_bindgen(js_name = journalStatus)]
    pub fn journal_status(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.journal_status())
    }

    #[wasm_bindgen(js_name = journalFailedAttempts)]
    pub fn journal_failed_attempts(&self) -> u32 {
        self.app.journal_failed_attempts()
    }

    #[wasm_bindgen(js_name = journalCanReset)]
    pub fn journal_can_reset(&self) -> bool {
        self.app.journal_can_reset()
    }

    /// Rejects with the message to show under the PIN field.
    #[wasm_bindgen(js_name = setJournalPin)]
    pub fn set_journal_pin(&self, pin: &str, confirm: &str) -> Result<(), JsValue> {
        self.app.set_journal_pin(pin, confirm).map_err(js_error)
    }

    #[wasm_bindgen(js_name = unlockJournal)]
    pub fn unlock_journal(&self, pin: &str) -> Result<(), JsValue> {
        self.app.unlock_journal(pin).map_err(js_error)
    }

    #[wasm_bindgen(js_name = lockJournal)]
    pub fn lock_journal(&self) {
        self.app.lock_journal();
    }

    #[wasm_bindgen(js_name = resetJournal)]
    pub fn reset_journal(&self) {
        self.app.reset_journal();
    }

    #[wasm_bindgen(js_name = journalEntries)]
    pub fn journal_entries(&self) -> Result<JsValue, JsValue> {
        let entries = self.app.journal_entries().map_err(js_error)?;
        to_js(&entries)
    }

    #[wasm_bindgen(js_name = addJournalEntry)]
    pub fn add_journal_entry(&self, text: &str) -> Result<JsValue, JsValue> {
        let entry = self.app.add_journal_entry(text).map_err(js_error)?;
        to_js(&entry)
    }

    #[wasm_bindgen(js_name = editJournalEntry)]
    pub fn edit_journal_entry(&self, entry_id: &str, text: &str) -> Result<bool, JsValue> {
        self.app.edit_journal_entry(entry_id, text).map_err(js_error)
    }

    #[wasm_bindgen(js_name = deleteJournalEntry)]
    pub fn delete_journal_entry(&self, entry_id: &str) -> Result<(), JsValue> {
        self.app.delete_journal_entry(entry_id).map_err(js_error)
    }

    // ─── Psycho-wiki ─────────────────────────────────────────

    /// Cards to offer under a message with this text
    #[wasm_bindgen(js_name = wikiMatches)]
    pub fn wiki_matches(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.app.wiki_matches(text))
    }

    /// Resolves to the card for an id or `bremi-wiki://` link, or `null`.
    #[wasm_bindgen(js_name = openWiki)]
    pub fn open_wiki(&self, target: String, label: Option<String>) -> Promise {
        let app = self.app.clone();
        future_to_promise(async move {
            match app.open_wiki(&target, label.as_deref()).await {
                Some(entry) => to_js(&entry),
                None => Ok(JsValue::NULL),
            }
        })
    }

    /// Id to pass to `speak` for reading a card aloud
    #[wasm_bindgen(js_name = wikiSpeechId)]
    pub fn wiki_speech_id(entry_id: &str) -> String {
        CompanionApp::wiki_speech_id(entry_id)
    }

    // ─── Speech ──────────────────────────────────────────────

    /// Toggle speech for a message. `player` receives the raw PCM as a
    /// `Uint8Array` and returns a function that stops it; the page calls
    /// `speechFinished` when playback ends on its own.
    pub fn speak(&self, message_id: String, player: Function) -> Promise {
        let app = self.app.clone();
        future_to_promise(async move {
            let started = app
                .speak(&message_id, move |pcm| {
                    let bytes = Uint8Array::from(pcm.as_slice());
                    let stop = player
                        .call1(&JsValue::NULL, &bytes)
                        .map_err(|e| CompanionError::JsInterop(format!("{:?}", e)))?;
                    let handle: Box<dyn PlaybackHandle> = Box::new(JsPlayback {
                        stop: stop.dyn_into::<Function>().ok(),
                    });
                    Ok(handle)
                })
                .await
                .map_err(js_error)?;
            Ok(JsValue::from_bool(started))
        })
    }

    #[wasm_bindgen(js_name = speechFinished)]
    pub fn speech_finished(&self, message_id: &str) {
        self.app.speech_finished(message_id);
    }

    #[wasm_bindgen(js_name = stopSpeech)]
    pub fn stop_speech(&self) {
        self.app.stop_speech();
    }
}

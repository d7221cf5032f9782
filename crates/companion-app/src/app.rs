//! Main application state: composes the managers and runs async work.
//!
//! Every manager lives in one `RefCell`. Async operations take what they
//! need in a short borrow, release it across the await, and borrow again
//! to apply the result.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::join_all;

use companion_core::chat::{analyze_history, ChatOrchestrator};
use companion_core::event_bus::EventBus;
use companion_core::identity::IdentityManager;
use companion_core::journal::Journal;
use companion_core::playback::{speech_text, PlaybackHandle, PlaybackSlot, SpeechTicket};
use companion_core::ports::{Clock, CompanionAiPort, LocationPort, StoragePort, SyncPort};
use companion_core::record::{read_json, write_json};
use companion_core::sessions::{SessionManager, SyncRequest};
use companion_core::wiki::{self, WikiLibrary};
use companion_types::{
    JournalError, Result,
    config::CompanionConfig,
    event::CompanionEvent,
    journal::{JournalEntry, JournalStatus},
    keys::CONFIG_KEY,
    message::{Feedback, Message},
    session::ChatSession,
    turn::AnalysisResult,
    user::{Language, Preferences, UserProfile},
    wiki::{wiki_link_id, WikiEntry},
};
use companion_ui::state::{AppView, UiState};

/// Adapters the app reaches the outside world through
#[derive(Clone)]
pub struct AppPorts {
    pub storage: Rc<dyn StoragePort>,
    pub clock: Rc<dyn Clock>,
    pub ai: Rc<dyn CompanionAiPort>,
    pub sync: Option<Rc<dyn SyncPort>>,
    pub location: Option<Rc<dyn LocationPort>>,
}

struct AppState {
    config: CompanionConfig,
    identity: IdentityManager,
    sessions: SessionManager,
    chat: ChatOrchestrator,
    journal: Journal,
    wiki: WikiLibrary,
    playback: PlaybackSlot<Box<dyn PlaybackHandle>>,
    speech_ticket: Option<SpeechTicket>,
    ui: UiState,
    ai: Rc<dyn CompanionAiPort>,
    sync: Option<Rc<dyn SyncPort>>,
}

impl AppState {
    /// Show the active session, or a fresh chat. Playback of the old
    /// conversation is cut.
    fn reseed(&mut self) {
        self.playback.stop();
        self.speech_ticket = None;
        let language = self.identity.language();
        self.chat.seed(self.sessions.active_session(), language);
    }

    /// Follow the signed-in user's namespace. Returns whether it changed.
    fn rebind(&mut self) -> bool {
        let changed = self.sessions.bind_user(self.identity.user_id());
        if changed {
            self.reseed();
        }
        changed
    }

    /// Offer the chat on screen again when the history switch flipped,
    /// so turning it on keeps what is already there.
    fn follow_history_switch(&mut self, was_saving: bool) {
        let Some(user) = self.identity.current().cloned() else {
            return;
        };
        if user.preferences.save_history != was_saving {
            self.chat.resync(&user, &mut self.sessions);
        }
    }
}

#[derive(Clone)]
pub struct CompanionApp {
    state: Rc<RefCell<AppState>>,
    storage: Rc<dyn StoragePort>,
    location: Option<Rc<dyn LocationPort>>,
    event_bus: EventBus,
}

impl CompanionApp {
    pub fn new(ports: AppPorts, config: CompanionConfig) -> Self {
        let event_bus = EventBus::new();

        let identity = IdentityManager::restore(ports.storage.clone(), event_bus.clone());
        let mut sessions = SessionManager::new(
            ports.storage.clone(),
            ports.clock.clone(),
            event_bus.clone(),
            config.chat.preview_chars,
        );
        sessions.bind_user(identity.user_id());

        let mut chat = ChatOrchestrator::new(ports.clock.clone(), event_bus.clone(), config.chat.clone());
        chat.seed(None, identity.language());

        let journal = Journal::open(ports.storage.clone(), config.journal.clone());

        if let Some(user_id) = identity.user_id() {
            event_bus.emit(CompanionEvent::UserChanged {
                user_id: Some(user_id.to_string()),
            });
        }
        log::info!("Companion ready on {} storage", ports.storage.backend_name());

        let state = AppState {
            config,
            identity,
            sessions,
            chat,
            journal,
            wiki: WikiLibrary::new(),
            playback: PlaybackSlot::new(event_bus.clone()),
            speech_ticket: None,
            ui: UiState::new(),
            ai: ports.ai,
            sync: ports.sync,
        };

        let app = Self {
            state: Rc::new(RefCell::new(state)),
            storage: ports.storage,
            location: ports.location,
            event_bus,
        };
        app.tick();
        app
    }

    /// Drain pending events into the view state and return a snapshot.
    pub fn tick(&self) -> UiState {
        let events = self.event_bus.drain();
        let mut state = self.state.borrow_mut();
        if !events.is_empty() {
            state.ui.process_events(events);
        }
        state.ui.clone()
    }

    // ─── Configuration ───────────────────────────────────────

    /// Persisted config, or defaults when missing or unreadable.
    pub fn load_config(storage: &dyn StoragePort) -> CompanionConfig {
        match read_json::<CompanionConfig>(storage, CONFIG_KEY) {
            Ok(Some(config)) => {
                log::info!("Config restored from storage");
                config
            }
            Ok(None) => CompanionConfig::default(),
            Err(e) => {
                log::warn!("Ignoring unreadable config: {}", e);
                CompanionConfig::default()
            }
        }
    }

    pub fn config(&self) -> CompanionConfig {
        self.state.borrow().config.clone()
    }

    /// Persist `config`. Adapters built from the old config are the
    /// caller's to replace via [`Self::set_ai`] and [`Self::set_sync`].
    pub fn save_config(&self, config: CompanionConfig) {
        if let Err(e) = write_json(self.storage.as_ref(), CONFIG_KEY, &config) {
            log::error!("Failed to save config: {}", e);
        } else {
            log::info!("Config saved to storage");
        }
        self.state.borrow_mut().config = config;
    }

    pub fn set_ai(&self, ai: Rc<dyn CompanionAiPort>) {
        self.state.borrow_mut().ai = ai;
    }

    pub fn set_sync(&self, sync: Option<Rc<dyn SyncPort>>) {
        self.state.borrow_mut().sync = sync;
    }

    // ─── Identity ────────────────────────────────────────────

    pub fn current_user(&self) -> Option<UserProfile> {
        self.state.borrow().identity.current().cloned()
    }

    pub fn login(&self, profile: UserProfile) {
        {
            let mut state = self.state.borrow_mut();
            state.identity.login(profile);
            if !state.rebind() {
                state.reseed();
            }
        }
        self.tick();
    }

    /// Sign out. Sessions and the journal stay on the device; the journal
    /// is locked and any pending reply is dropped.
    pub fn logout(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.chat.stop();
            state.identity.logout();
            state.journal.lock();
            if !state.rebind() {
                state.reseed();
            }
        }
        self.tick();
    }

    pub fn update_user(&self, profile: UserProfile) {
        {
            let mut state = self.state.borrow_mut();
            let was_saving = state.identity.save_history();
            state.identity.update_user(profile);
            if !state.rebind() {
                state.follow_history_switch(was_saving);
            }
        }
        self.tick();
    }

    /// Edit the signed-in user's preferences. Turning history on saves the
    /// conversation on screen right away.
    pub fn update_preferences(&self, edit: impl FnOnce(&mut Preferences)) -> bool {
        let updated = {
            let mut state = self.state.borrow_mut();
            let was_saving = state.identity.save_history();
            let updated = state.identity.update_preferences(edit);
            if updated {
                state.follow_history_switch(was_saving);
            }
            updated
        };
        self.tick();
        updated
    }

    /// Change language. An untouched chat is re-seeded so the privacy
    /// notice follows.
    pub fn set_language(&self, language: Language) -> bool {
        let updated = {
            let mut state = self.state.borrow_mut();
            let updated = state.identity.set_language(language);
            if updated && state.chat.session_id().is_none() && state.chat.messages().len() <= 1 {
                state.reseed();
            }
            updated
        };
        self.tick();
        updated
    }

    // ─── Sessions ────────────────────────────────────────────

    pub fn sessions(&self) -> Vec<ChatSession> {
        self.state.borrow().sessions.sessions().to_vec()
    }

    pub fn active_session_id(&self) -> Option<String> {
        self.state
            .borrow()
            .sessions
            .active_session_id()
            .map(str::to_string)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.borrow().chat.messages().to_vec()
    }

    pub fn select_session(&self, session_id: &str) -> bool {
        let selected = {
            let mut state = self.state.borrow_mut();
            let selected = state.sessions.select_session(session_id);
            if selected {
                state.reseed();
                state.ui.navigate(AppView::Chat);
            }
            selected
        };
        self.tick();
        selected
    }

    pub fn delete_session(&self, session_id: &str) -> bool {
        let deleted = {
            let mut state = self.state.borrow_mut();
            let was_shown = state.chat.session_id() == Some(session_id);
            let deleted = state.sessions.delete_session(session_id);
            if deleted && was_shown {
                state.reseed();
            }
            deleted
        };
        self.tick();
        deleted
    }

    pub fn new_chat(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.sessions.new_chat();
            state.reseed();
            state.ui.navigate(AppView::Chat);
        }
        self.tick();
    }

    pub fn navigate(&self, view: AppView) -> bool {
        let moved = self.state.borrow_mut().ui.navigate(view);
        self.tick();
        moved
    }

    pub fn dismiss_emergency(&self) {
        self.state.borrow_mut().ui.dismiss_emergency();
    }

    // ─── Chat ────────────────────────────────────────────────

    /// Send one message and wait for the reply. Returns whether a reply
    /// (or fallback) was appended; a stopped or superseded turn gives `false`.
    pub async fn send_message(&self, text: &str, image: Option<String>) -> bool {
        let pending = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            match state.identity.current().cloned() {
                Some(user) => state
                    .chat
                    .begin_turn(text, image, &user, &mut state.sessions)
                    .map(|turn| (turn, state.ai.clone())),
                None => {
                    log::warn!("Message ignored: nobody is signed in");
                    None
                }
            }
        };
        self.tick();
        let Some((mut turn, ai)) = pending else {
            return false;
        };

        if turn.wants_location {
            if let Some(ref location) = self.location {
                match location.current_location().await {
                    Ok(point) => turn.request.location = Some(point),
                    Err(e) => log::info!("Location unavailable: {}", e),
                }
            }
        }

        let outcome = ai.send_conversation_turn(turn.request).await;

        let applied = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            match state.identity.current().cloned() {
                Some(user) => state
                    .chat
                    .complete_turn(turn.generation, outcome, &user, &mut state.sessions),
                None => false,
            }
        };
        self.tick();
        self.flush_syncs().await;
        applied
    }

    pub fn stop(&self) -> bool {
        let stopped = self.state.borrow_mut().chat.stop();
        self.tick();
        stopped
    }

    /// Mark a message up or down. The saved conversation is offered to
    /// the analysis service like any other save.
    pub async fn set_feedback(&self, message_id: &str, feedback: Feedback) -> bool {
        let updated = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            match state.identity.current().cloned() {
                Some(user) => state
                    .chat
                    .set_feedback(message_id, feedback, &user, &mut state.sessions),
                None => false,
            }
        };
        self.tick();
        if updated {
            self.flush_syncs().await;
        }
        updated
    }

    pub async fn analyze(&self) -> Option<AnalysisResult> {
        let (history, ai, language) = {
            let state = self.state.borrow();
            (
                state.chat.analysis_history()?,
                state.ai.clone(),
                state.identity.language(),
            )
        };
        analyze_history(&history, ai.as_ref(), language).await
    }

    /// Offer saved conversations to the analysis service and apply any
    /// suggested titles. Only the latest snapshot per session is sent.
    /// Returns how many titles were applied.
    pub async fn flush_syncs(&self) -> usize {
        let (requests, sync) = {
            let mut state = self.state.borrow_mut();
            let requests = state.sessions.take_sync_requests();
            let sync = state.sync.clone().filter(|_| state.config.sync.enabled);
            (requests, sync)
        };
        let Some(sync) = sync else {
            return 0;
        };
        let requests = latest_per_session(requests);
        if requests.is_empty() {
            return 0;
        }

        let outcomes = join_all(
            requests
                .iter()
                .map(|req| sync.background_sync(&req.user_id, &req.history)),
        )
        .await;

        let mut applied = 0;
        {
            let mut state = self.state.borrow_mut();
            for (req, outcome) in requests.iter().zip(outcomes) {
                match outcome {
                    Ok(outcome) => {
                        let Some(title) = outcome.suggested_title else {
                            continue;
                        };
                        let title = title.trim();
                        if !title.is_empty()
                            && state
                                .sessions
                                .apply_suggested_title(&req.user_id, &req.session_id, title)
                        {
                            applied += 1;
                        }
                    }
                    Err(e) => log::warn!("Background sync failed for {}: {}", req.session_id, e),
                }
            }
        }
        self.tick();
        applied
    }

    // ─── Journal ─────────────────────────────────────────────

    pub fn journal_status(&self) -> JournalStatus {
        self.state.borrow().journal.status()
    }

    pub fn journal_failed_attempts(&self) -> u32 {
        self.state.borrow().journal.failed_attempts()
    }

    pub fn journal_can_reset(&self) -> bool {
        self.state.borrow().journal.can_reset()
    }

    pub fn set_journal_pin(&self, pin: &str, confirm: &str) -> std::result::Result<(), JournalError> {
        self.state.borrow_mut().journal.set_pin(pin, confirm)
    }

    pub fn unlock_journal(&self, pin: &str) -> std::result::Result<(), JournalError> {
        self.state.borrow_mut().journal.unlock(pin)
    }

    pub fn lock_journal(&self) {
        self.state.borrow_mut().journal.lock();
    }

    pub fn reset_journal(&self) {
        self.state.borrow_mut().journal.reset();
    }

    pub fn journal_entries(&self) -> std::result::Result<Vec<JournalEntry>, JournalError> {
        let state = self.state.borrow();
        let entries = state.journal.entries()?.to_vec();
        Ok(entries)
    }

    pub fn add_journal_entry(&self, text: &str) -> std::result::Result<Option<JournalEntry>, JournalError> {
        let mut state = self.state.borrow_mut();
        let entry = state.journal.add_entry(text)?.cloned();
        Ok(entry)
    }

    pub fn edit_journal_entry(&self, entry_id: &str, text: &str) -> std::result::Result<bool, JournalError> {
        self.state.borrow_mut().journal.edit_entry(entry_id, text)
    }

    pub fn delete_journal_entry(&self, entry_id: &str) -> std::result::Result<(), JournalError> {
        self.state.borrow_mut().journal.delete_entry(entry_id)
    }

    // ─── Psycho-wiki ─────────────────────────────────────────

    /// Built-in cards whose trigger phrases appear in `text`
    pub fn wiki_matches(&self, text: &str) -> Vec<WikiEntry> {
        wiki::find_matches(text).iter().map(|t| t.to_entry()).collect()
    }

    /// Open a card by id or by `bremi-wiki://` link. Unknown topics are
    /// generated once and cached; `None` while that card is already being
    /// generated or when generation failed.
    pub async fn open_wiki(&self, target: &str, link_label: Option<&str>) -> Option<WikiEntry> {
        let id = wiki_link_id(target).unwrap_or(target);
        let (ai, label, language) = {
            let mut state = self.state.borrow_mut();
            if let Some(entry) = state.wiki.lookup(id) {
                return Some(entry);
            }
            if !state.wiki.begin_generation(id) {
                return None;
            }
            (
                state.ai.clone(),
                wiki::fallback_label(id, link_label),
                state.identity.language(),
            )
        };

        let outcome = ai.generate_wiki_entry(id, &label, language).await;
        self.state.borrow_mut().wiki.finish_generation(id, outcome)
    }

    // ─── Speech ──────────────────────────────────────────────

    /// Tap on a message's speaker. Tapping the message already speaking
    /// stops it. Otherwise the previous playback is torn down, speech is
    /// synthesized, and `play` turns the audio into a live playback unless
    /// another tap superseded this one meanwhile.
    /// Returns whether playback started.
    pub async fn speak<F>(&self, message_id: &str, play: F) -> Result<bool>
    where
        F: FnOnce(Vec<u8>) -> Result<Box<dyn PlaybackHandle>>,
    {
        let prepared = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let max_chars = state.config.chat.speech_max_chars;
            let text = state
                .chat
                .messages()
                .iter()
                .find(|m| m.id == message_id)
                .map(|m| m.text.clone())
                .or_else(|| {
                    message_id
                        .strip_prefix(WIKI_SPEECH_PREFIX)
                        .and_then(|id| state.wiki.lookup(id))
                        .map(|entry| entry.speech_text())
                })
                .map(|text| speech_text(&text, max_chars));
            match text {
                Some(text) => {
                    let ticket = state.playback.request(message_id);
                    state.speech_ticket = ticket.clone();
                    ticket.map(|t| (t, text, state.ai.clone()))
                }
                None => {
                    log::warn!("Cannot speak unknown message {}", message_id);
                    None
                }
            }
        };
        self.tick();
        let Some((ticket, text, ai)) = prepared else {
            return Ok(false);
        };

        let audio = match ai.synthesize_speech(&text).await {
            Ok(audio) => audio,
            Err(e) => {
                self.release_speech(&ticket);
                return Err(e);
            }
        };

        if !self.state.borrow().playback.is_current(&ticket) {
            log::debug!("Dropping speech for {}: superseded", ticket.message_id);
            return Ok(false);
        }

        // No borrow across the player: it may call back into the app
        let handle = match play(audio) {
            Ok(handle) => handle,
            Err(e) => {
                self.release_speech(&ticket);
                return Err(e);
            }
        };

        let started = self.state.borrow_mut().playback.attach(&ticket, handle);
        self.tick();
        Ok(started)
    }

    /// Speech id for a psycho-wiki card
    pub fn wiki_speech_id(entry_id: &str) -> String {
        format!("{}{}", WIKI_SPEECH_PREFIX, entry_id)
    }

    /// The playback for `message_id` reached its end.
    pub fn speech_finished(&self, message_id: &str) {
        let ticket = self
            .state
            .borrow()
            .speech_ticket
            .clone()
            .filter(|t| t.message_id == message_id);
        if let Some(ticket) = ticket {
            self.release_speech(&ticket);
        }
    }

    pub fn stop_speech(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.playback.stop();
            state.speech_ticket = None;
        }
        self.tick();
    }

    fn release_speech(&self, ticket: &SpeechTicket) {
        {
            let mut state = self.state.borrow_mut();
            state.playback.release(ticket);
            if state.speech_ticket.as_ref() == Some(ticket) {
                state.speech_ticket = None;
            }
        }
        self.tick();
    }
}

const WIKI_SPEECH_PREFIX: &str = "wiki-";

/// Keep only the newest request for each session, in order of arrival.
fn latest_per_session(requests: Vec<SyncRequest>) -> Vec<SyncRequest> {
    let mut latest: Vec<SyncRequest> = Vec::new();
    for req in requests {
        latest.retain(|r| r.session_id != req.session_id);
        latest.push(req);
    }
    latest
}

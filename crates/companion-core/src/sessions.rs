//! Chat session collection and the active selector.
//!
//! The collection lives under a storage key namespaced by user id and is
//! written back whole on every change. Persistence is best effort: a
//! failing store leaves the in-memory collection working for the rest of
//! the session.

use std::rc::Rc;
use companion_types::{
    event::CompanionEvent,
    keys::sessions_key,
    message::Message,
    session::{preview_of, ChatSession},
};
use crate::event_bus::EventBus;
use crate::ports::{Clock, StoragePort};
use crate::record::{read_json, write_json};

/// A saved conversation that should be offered to the background
/// analysis service, which may answer with a title.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRequest {
    pub user_id: String,
    pub session_id: String,
    pub history: Vec<Message>,
}

pub struct SessionManager {
    storage: Rc<dyn StoragePort>,
    clock: Rc<dyn Clock>,
    event_bus: EventBus,
    preview_chars: usize,
    /// Most recently updated first, as stored
    sessions: Vec<ChatSession>,
    active: Option<String>,
    user_id: Option<String>,
    storage_key: String,
    loaded: bool,
    /// Highest id handed out (or seen deleted) so far
    last_minted: i64,
    pending_syncs: Vec<SyncRequest>,
}

impl SessionManager {
    pub fn new(
        storage: Rc<dyn StoragePort>,
        clock: Rc<dyn Clock>,
        event_bus: EventBus,
        preview_chars: usize,
    ) -> Self {
        Self {
            storage,
            clock,
            event_bus,
            preview_chars,
            sessions: Vec::new(),
            active: None,
            user_id: None,
            storage_key: sessions_key(None),
            loaded: false,
            last_minted: 0,
            pending_syncs: Vec::new(),
        }
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_session(&self) -> Option<&ChatSession> {
        let id = self.active.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn get(&self, session_id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Point the manager at `user_id`'s namespace (or the shared legacy
    /// key when anonymous). On a change of id the collection is reloaded
    /// from storage, in-memory state is dropped and nothing is active.
    /// Returns whether a reload happened.
    pub fn bind_user(&mut self, user_id: Option<&str>) -> bool {
        if self.loaded && self.user_id.as_deref() == user_id {
            return false;
        }

        self.user_id = user_id.map(str::to_string);
        self.storage_key = sessions_key(user_id);
        self.sessions = self.read_collection();
        self.active = None;
        self.pending_syncs.clear();
        self.loaded = true;

        log::info!(
            "Loaded {} sessions from {}",
            self.sessions.len(),
            self.storage_key
        );
        self.event_bus.emit(CompanionEvent::SessionsReloaded {
            count: self.sessions.len(),
        });
        self.event_bus
            .emit(CompanionEvent::ActiveSessionChanged { session_id: None });
        true
    }

    /// Record the current conversation.
    ///
    /// Does nothing unless `should_persist` is set and at least one message
    /// was written by the user. With no active session a fresh id is
    /// minted and becomes active. Returns whether anything was saved.
    pub fn update_session(&mut self, messages: &[Message], should_persist: bool) -> bool {
        if !should_persist || !messages.iter().any(Message::is_user) {
            return false;
        }
        self.ensure_loaded();

        let session_id = match self.active.clone() {
            Some(id) => id,
            None => {
                let id = self.mint_id();
                self.active = Some(id.clone());
                self.event_bus.emit(CompanionEvent::ActiveSessionChanged {
                    session_id: Some(id.clone()),
                });
                id
            }
        };

        let mut updated = ChatSession {
            id: session_id.clone(),
            messages: messages.to_vec(),
            last_updated: self.clock.now_ms(),
            preview: preview_of(messages, self.preview_chars),
            title: None,
        };

        match self.sessions.iter_mut().find(|s| s.id == session_id) {
            Some(existing) => {
                updated.title = existing.title.take();
                *existing = updated;
            }
            None => {
                self.sessions.insert(0, updated);
                self.event_bus.emit(CompanionEvent::SessionCreated {
                    session_id: session_id.clone(),
                });
            }
        }

        self.persist();
        self.event_bus.emit(CompanionEvent::SessionSaved {
            session_id: session_id.clone(),
        });

        if let Some(ref user_id) = self.user_id {
            self.pending_syncs.push(SyncRequest {
                user_id: user_id.clone(),
                session_id,
                history: messages.to_vec(),
            });
        }
        true
    }

    /// Saved conversations waiting to be offered to the analysis service.
    pub fn take_sync_requests(&mut self) -> Vec<SyncRequest> {
        std::mem::take(&mut self.pending_syncs)
    }

    /// Patch the title of the session with this id, if it still exists
    /// and still belongs to the bound user. Replies may arrive in any
    /// order; matching by id keeps them on the right session.
    pub fn apply_suggested_title(&mut self, user_id: &str, session_id: &str, title: &str) -> bool {
        if self.user_id.as_deref() != Some(user_id) {
            log::debug!("Dropping title for {}: user changed", session_id);
            return false;
        }
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            log::debug!("Dropping title for {}: session gone", session_id);
            return false;
        };

        session.title = Some(title.to_string());
        self.persist();
        self.event_bus.emit(CompanionEvent::TitleSuggested {
            session_id: session_id.to_string(),
            title: title.to_string(),
        });
        true
    }

    /// Make an existing session the displayed one. Stored data is untouched.
    pub fn select_session(&mut self, session_id: &str) -> bool {
        if !self.sessions.iter().any(|s| s.id == session_id) {
            log::warn!("Cannot select unknown session {}", session_id);
            return false;
        }
        self.set_active(Some(session_id.to_string()));
        true
    }

    /// Remove a session and persist immediately. If it was active, the
    /// most recently updated remaining session takes over (earliest in
    /// stored order on ties), or nothing is active.
    pub fn delete_session(&mut self, session_id: &str) -> bool {
        self.ensure_loaded();
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != session_id);
        if self.sessions.len() == before {
            return false;
        }

        if let Ok(n) = session_id.parse::<i64>() {
            self.last_minted = self.last_minted.max(n);
        }
        self.persist();
        self.event_bus.emit(CompanionEvent::SessionDeleted {
            session_id: session_id.to_string(),
        });

        if self.active.as_deref() == Some(session_id) {
            let fallback = self.most_recent().map(|s| s.id.clone());
            self.set_active(fallback);
        }
        true
    }

    /// Start a new unsaved conversation. The next qualifying update mints an id.
    pub fn new_chat(&mut self) {
        self.set_active(None);
    }

    fn most_recent(&self) -> Option<&ChatSession> {
        self.sessions.iter().fold(None, |best: Option<&ChatSession>, s| match best {
            Some(b) if b.last_updated >= s.last_updated => Some(b),
            _ => Some(s),
        })
    }

    fn set_active(&mut self, session_id: Option<String>) {
        if self.active == session_id {
            return;
        }
        self.active = session_id.clone();
        self.event_bus
            .emit(CompanionEvent::ActiveSessionChanged { session_id });
    }

    /// Time-based id, never reused within the process nor colliding with
    /// a stored session.
    fn mint_id(&mut self) -> String {
        let mut candidate = self.clock.now_ms().max(self.last_minted + 1);
        while self.sessions.iter().any(|s| s.id == candidate.to_string()) {
            candidate += 1;
        }
        self.last_minted = candidate;
        candidate.to_string()
    }

    fn ensure_loaded(&mut self) {
        if !self.loaded {
            let user_id = self.user_id.clone();
            self.bind_user(user_id.as_deref());
        }
    }

    fn read_collection(&self) -> Vec<ChatSession> {
        match read_json::<Vec<ChatSession>>(self.storage.as_ref(), &self.storage_key) {
            Ok(Some(sessions)) => sessions,
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Ignoring unreadable sessions at {}: {}", self.storage_key, e);
                Vec::new()
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = write_json(self.storage.as_ref(), &self.storage_key, &self.sessions) {
            log::error!("Failed to persist sessions to {}: {}", self.storage_key, e);
        }
    }
}

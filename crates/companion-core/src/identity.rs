//! User identity: who is signed in, and their preferences.

use std::rc::Rc;
use serde_json::Value;
use companion_types::{
    event::CompanionEvent,
    keys::USER_KEY,
    user::{Language, Preferences, UserProfile},
};
use crate::event_bus::EventBus;
use crate::ports::StoragePort;
use crate::record::write_json;

/// Owns the current user and mirrors it to storage.
///
/// Storage problems are logged and otherwise ignored: the in-memory user
/// stays authoritative for the rest of the session.
pub struct IdentityManager {
    storage: Rc<dyn StoragePort>,
    event_bus: EventBus,
    user: Option<UserProfile>,
}

impl IdentityManager {
    /// Start with no user, without touching storage.
    pub fn new(storage: Rc<dyn StoragePort>, event_bus: EventBus) -> Self {
        Self {
            storage,
            event_bus,
            user: None,
        }
    }

    /// Start with whatever user record is persisted.
    pub fn restore(storage: Rc<dyn StoragePort>, event_bus: EventBus) -> Self {
        let mut manager = Self::new(storage, event_bus);
        manager.user = manager.load();
        if let Some(ref user) = manager.user {
            log::info!("Restored user {}", user.id);
        }
        manager
    }

    pub fn current(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn language(&self) -> Language {
        self.user.as_ref().map(|u| u.language).unwrap_or_default()
    }

    /// Whether chats should be written to history. No user, no history.
    pub fn save_history(&self) -> bool {
        self.user
            .as_ref()
            .map(|u| u.preferences.save_history)
            .unwrap_or(false)
    }

    pub fn login(&mut self, profile: UserProfile) {
        log::info!("User {} signed in", profile.id);
        self.replace(profile);
    }

    /// Forget the current user. Sessions and journal stay where they are.
    pub fn logout(&mut self) {
        if let Err(e) = self.storage.delete(USER_KEY) {
            log::warn!("Failed to remove stored user: {}", e);
        }
        if self.user.take().is_some() {
            self.event_bus.emit(CompanionEvent::UserChanged { user_id: None });
        }
    }

    /// Full replace. Callers hand in the already-merged profile.
    pub fn update_user(&mut self, profile: UserProfile) {
        self.replace(profile);
    }

    /// Edit the current user's preferences and persist the merged profile.
    /// Returns `false` when nobody is signed in.
    pub fn update_preferences(&mut self, edit: impl FnOnce(&mut Preferences)) -> bool {
        let Some(mut profile) = self.user.clone() else {
            return false;
        };
        edit(&mut profile.preferences);
        self.update_user(profile);
        true
    }

    pub fn set_language(&mut self, language: Language) -> bool {
        let Some(mut profile) = self.user.clone() else {
            return false;
        };
        profile.language = language;
        self.update_user(profile);
        true
    }

    fn replace(&mut self, profile: UserProfile) {
        self.persist(&profile);
        let user_id = Some(profile.id.clone());
        self.user = Some(profile);
        self.event_bus.emit(CompanionEvent::UserChanged { user_id });
    }

    fn persist(&self, profile: &UserProfile) {
        if let Err(e) = write_json(self.storage.as_ref(), USER_KEY, profile) {
            log::error!("Failed to persist user {}: {}", profile.id, e);
        }
    }

    /// Read the stored record, filling missing preference fields and
    /// writing the normalized record back. Corrupted records are removed.
    fn load(&self) -> Option<UserProfile> {
        let raw = match self.storage.get(USER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("User record unreadable: {}", e);
                return None;
            }
        };

        let parsed = serde_json::from_str::<Value>(&raw).and_then(|value| {
            let user = serde_json::from_value::<UserProfile>(value.clone())?;
            Ok((value, user))
        });

        match parsed {
            Ok((stored, user)) => {
                match serde_json::to_value(&user) {
                    Ok(normalized) if normalized != stored => {
                        log::info!("Migrating stored user record for {}", user.id);
                        self.persist(&user);
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("Could not normalize user record: {}", e),
                }
                Some(user)
            }
            Err(e) => {
                log::warn!("Discarding corrupted user record: {}", e);
                if let Err(e) = self.storage.delete(USER_KEY) {
                    log::warn!("Failed to remove corrupted user record: {}", e);
                }
                None
            }
        }
    }
}

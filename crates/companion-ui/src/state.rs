//! UI-level state that drives rendering.
//! This is a read-only projection of the companion state,
//! updated each tick by draining the EventBus.

use serde::{Deserialize, Serialize};
use companion_types::event::CompanionEvent;

/// Top-level screens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppView {
    #[default]
    Onboarding,
    Chat,
    Relaxation,
    Settings,
    History,
}

/// State visible to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub view: AppView,
    pub signed_in: bool,
    /// Emergency overlay; stays up until dismissed
    pub show_emergency: bool,
    /// Waiting on a model reply
    pub busy: bool,
    pub active_session: Option<String>,
    pub session_count: usize,
    /// Message whose speech is playing
    pub speaking: Option<String>,
    pub status_text: String,
    pub last_error: Option<String>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            view: AppView::Onboarding,
            signed_in: false,
            show_emergency: false,
            busy: false,
            active_session: None,
            session_count: 0,
            speaking: None,
            status_text: "Ready".to_string(),
            last_error: None,
        }
    }

    /// Process events from the EventBus and update UI state
    pub fn process_events(&mut self, events: Vec<CompanionEvent>) {
        for event in events {
            match event {
                CompanionEvent::UserChanged { user_id: Some(_) } => {
                    self.signed_in = true;
                    if self.view == AppView::Onboarding {
                        self.view = AppView::Chat;
                    }
                }
                CompanionEvent::UserChanged { user_id: None } => {
                    self.signed_in = false;
                    self.view = AppView::Onboarding;
                    self.show_emergency = false;
                    self.busy = false;
                    self.speaking = None;
                }
                CompanionEvent::SessionsReloaded { count } => {
                    self.session_count = count;
                }
                CompanionEvent::ActiveSessionChanged { session_id } => {
                    self.active_session = session_id;
                }
                CompanionEvent::SessionCreated { .. } => {
                    self.session_count += 1;
                }
                CompanionEvent::SessionSaved { .. } => {}
                CompanionEvent::SessionDeleted { .. } => {
                    self.session_count = self.session_count.saturating_sub(1);
                }
                CompanionEvent::TitleSuggested { title, .. } => {
                    self.status_text = format!("Saved as \"{}\"", title);
                }
                CompanionEvent::TurnStart { .. } => {
                    self.busy = true;
                    self.last_error = None;
                    self.status_text = "Padi is typing...".to_string();
                }
                CompanionEvent::TurnEnd { .. } | CompanionEvent::TurnDiscarded { .. } => {
                    self.busy = false;
                    self.status_text = "Ready".to_string();
                }
                CompanionEvent::EmergencyRaised => {
                    self.show_emergency = true;
                }
                CompanionEvent::PlaybackStarted { message_id } => {
                    self.speaking = Some(message_id);
                }
                CompanionEvent::PlaybackStopped { message_id } => {
                    if self.speaking.as_deref() == Some(message_id.as_str()) {
                        self.speaking = None;
                    }
                }
                CompanionEvent::Error { message } => {
                    self.status_text = format!("Error: {}", message);
                    self.last_error = Some(message);
                }
            }
        }
    }

    /// Switch screens. Everything but onboarding needs a signed-in user.
    pub fn navigate(&mut self, view: AppView) -> bool {
        if view != AppView::Onboarding && !self.signed_in {
            log::debug!("Ignoring navigation to {:?} while signed out", view);
            return false;
        }
        self.view = view;
        true
    }

    pub fn dismiss_emergency(&mut self) {
        self.show_emergency = false;
    }

    /// The bottom navigation is hidden on onboarding and under the overlay
    pub fn shows_navigation(&self) -> bool {
        self.signed_in && self.view != AppView::Onboarding && !self.show_emergency
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

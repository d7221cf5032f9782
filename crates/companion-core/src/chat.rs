//! Chat orchestrator drives the conversation on screen.
//!
//! A turn is split in two so nothing is borrowed across the model call:
//! 1. `begin_turn` appends the user message, runs the emergency check,
//!    persists, and hands back a `PendingTurn`
//! 2. the caller awaits the collaborator
//! 3. `complete_turn` appends the reply (or a fallback) if the turn was
//!    not stopped or superseded in the meantime, and persists again
//!
//! `send_message` does all three for callers that can hold `&mut self`.

use std::rc::Rc;
use companion_types::{
    CompanionError, Result,
    config::ChatConfig,
    event::CompanionEvent,
    message::{Feedback, Message},
    session::ChatSession,
    turn::{AnalysisResult, TurnReply},
    user::{Language, UserProfile},
};
use crate::event_bus::EventBus;
use crate::ports::{Clock, CompanionAiPort, LocationPort, TurnRequest};
use crate::safety;
use crate::sessions::SessionManager;

pub const PRIVACY_NOTICE_ID: &str = "privacy-notice";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    AwaitingReply { generation: u64 },
}

/// A user message that has been appended and now needs the model
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub generation: u64,
    pub request: TurnRequest,
    /// The text hints at looking for nearby help
    pub wants_location: bool,
    pub emergency: bool,
}

pub struct ChatOrchestrator {
    messages: Vec<Message>,
    /// Session the list belongs to; `None` while it is an unsaved chat
    session_id: Option<String>,
    state: ChatState,
    /// Bumped on stop and on re-seed; replies carrying an older value are dropped
    generation: u64,
    clock: Rc<dyn Clock>,
    event_bus: EventBus,
    config: ChatConfig,
}

impl ChatOrchestrator {
    pub fn new(clock: Rc<dyn Clock>, event_bus: EventBus, config: ChatConfig) -> Self {
        Self {
            messages: Vec::new(),
            session_id: None,
            state: ChatState::Idle,
            generation: 0,
            clock,
            event_bus,
            config,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, ChatState::AwaitingReply { .. })
    }

    /// Throw away the current list and start from `active`, or from the
    /// privacy notice alone when there is no active session. Any reply
    /// still in flight is invalidated.
    pub fn seed(&mut self, active: Option<&ChatSession>, language: Language) {
        self.messages = match active {
            Some(session) => session.messages.clone(),
            None => vec![Message::system(language.privacy_notice(), self.clock.now_ms())
                .with_id(PRIVACY_NOTICE_ID)],
        };
        self.session_id = active.map(|s| s.id.clone());
        self.generation += 1;
        self.state = ChatState::Idle;
    }

    /// Append the user's message and prepare the model request.
    /// Blank text with no picture is ignored.
    pub fn begin_turn(
        &mut self,
        text: &str,
        image: Option<String>,
        user: &UserProfile,
        sessions: &mut SessionManager,
    ) -> Option<PendingTurn> {
        if text.trim().is_empty() && image.is_none() {
            return None;
        }

        let history = self.messages.clone();
        let emergency = safety::is_emergency(text);

        let mut message = Message::user(text, self.clock.now_ms()).with_image(image.clone());
        message.is_emergency = emergency;
        self.messages.push(message);

        if emergency {
            log::warn!("Emergency phrasing detected in outgoing message");
            self.event_bus.emit(CompanionEvent::EmergencyRaised);
        }

        self.generation += 1;
        let generation = self.generation;
        self.state = ChatState::AwaitingReply { generation };
        self.event_bus.emit(CompanionEvent::TurnStart { generation });

        self.report(user, sessions);

        Some(PendingTurn {
            generation,
            request: TurnRequest {
                history,
                text: text.to_string(),
                image,
                location: None,
                language: user.language,
            },
            wants_location: safety::wants_location(text),
            emergency,
        })
    }

    /// Apply the collaborator's outcome for the turn with `generation`.
    /// Failures become a model-role fallback so the log stays well formed.
    /// Returns `false` if the turn had been stopped or superseded.
    pub fn complete_turn(
        &mut self,
        generation: u64,
        outcome: Result<TurnReply>,
        user: &UserProfile,
        sessions: &mut SessionManager,
    ) -> bool {
        if self.state != (ChatState::AwaitingReply { generation }) {
            log::debug!("Discarding reply for stale turn {}", generation);
            self.event_bus.emit(CompanionEvent::TurnDiscarded { generation });
            return false;
        }
        self.state = ChatState::Idle;

        let now = self.clock.now_ms();
        let reply = match outcome {
            Ok(reply) => Message::model(reply.text, now).with_grounding(reply.grounding_links),
            Err(e) => {
                log::error!("Conversation turn failed: {}", e);
                self.event_bus.emit(CompanionEvent::Error {
                    message: e.to_string(),
                });
                Message::model(fallback_text(&e), now)
            }
        };
        self.messages.push(reply);
        self.event_bus.emit(CompanionEvent::TurnEnd { generation });

        self.report(user, sessions);
        true
    }

    /// Stop waiting for the current reply. Returns whether one was pending.
    pub fn stop(&mut self) -> bool {
        match self.state {
            ChatState::AwaitingReply { generation } => {
                self.generation += 1;
                self.state = ChatState::Idle;
                log::info!("Turn {} stopped by user", generation);
                self.event_bus.emit(CompanionEvent::TurnDiscarded { generation });
                true
            }
            ChatState::Idle => false,
        }
    }

    /// Mark a message up or down and persist.
    pub fn set_feedback(
        &mut self,
        message_id: &str,
        feedback: Feedback,
        user: &UserProfile,
        sessions: &mut SessionManager,
    ) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == message_id) else {
            return false;
        };
        message.feedback = Some(feedback);
        self.report(user, sessions);
        true
    }

    /// Full turn: begin, optionally fetch a location, ask the model, complete.
    pub async fn send_message(
        &mut self,
        text: &str,
        image: Option<String>,
        user: &UserProfile,
        sessions: &mut SessionManager,
        ai: &dyn CompanionAiPort,
        location: Option<&dyn LocationPort>,
    ) -> bool {
        let Some(mut turn) = self.begin_turn(text, image, user, sessions) else {
            return false;
        };

        if turn.wants_location {
            if let Some(port) = location {
                match port.current_location().await {
                    Ok(point) => turn.request.location = Some(point),
                    Err(e) => log::info!("Location unavailable: {}", e),
                }
            }
        }

        let outcome = ai.send_conversation_turn(turn.request).await;
        self.complete_turn(turn.generation, outcome, user, sessions)
    }

    pub fn can_analyze(&self) -> bool {
        self.messages.len() >= self.config.analysis_min_messages
    }

    /// Snapshot to summarize, or `None` while the conversation is too short.
    pub fn analysis_history(&self) -> Option<Vec<Message>> {
        self.can_analyze().then(|| self.messages.clone())
    }

    /// Insight summary of the current conversation. Short conversations
    /// and collaborator failures give `None`.
    pub async fn analyze(
        &self,
        ai: &dyn CompanionAiPort,
        language: Language,
    ) -> Option<AnalysisResult> {
        let history = self.analysis_history()?;
        analyze_history(&history, ai, language).await
    }

    /// Offer the list on screen again, after the history switch or the
    /// profile changed. Returns whether anything was saved.
    pub fn resync(&mut self, user: &UserProfile, sessions: &mut SessionManager) -> bool {
        self.report(user, sessions)
    }

    /// The sole bridge to durable storage: anything beyond the seed is
    /// offered to the session manager, gated by the user's history switch.
    fn report(&mut self, user: &UserProfile, sessions: &mut SessionManager) -> bool {
        if self.messages.len() <= 1 {
            return false;
        }
        let saved = sessions.update_session(&self.messages, user.preferences.save_history);
        if saved && self.session_id.is_none() {
            self.session_id = sessions.active_session_id().map(str::to_string);
        }
        saved
    }
}

/// Run the summary over `history`, logging and swallowing failures.
pub async fn analyze_history(
    history: &[Message],
    ai: &dyn CompanionAiPort,
    language: Language,
) -> Option<AnalysisResult> {
    match ai.summarize_session(history, language).await {
        Ok(result) => Some(result),
        Err(e) => {
            log::error!("Session analysis failed: {}", e);
            None
        }
    }
}

/// Model-role text shown in place of a reply that never came.
pub fn fallback_text(error: &CompanionError) -> &'static str {
    match error {
        CompanionError::SafetyBlocked(_) => {
            "I can't respond to that one, but I'm still here with you. If you are in danger, please call 112 or go to the nearest hospital."
        }
        CompanionError::RateLimited(_) => {
            "Plenty people dey talk to me right now. Give me small time and try again."
        }
        CompanionError::Network(_) => "Omo, network dey shake slightly. Can you say that again?",
        _ => "Sorry, something went wrong. Please try again.",
    }
}

//! Speech playback discipline: at most one live playback.
//!
//! Starting a new playback tears down the previous one first. Every start
//! or stop bumps a generation counter; audio that finishes downloading for
//! an older generation is stopped on arrival instead of being played.

use companion_types::event::CompanionEvent;
use crate::event_bus::EventBus;

/// Something audible that can be silenced and released.
pub trait PlaybackHandle {
    fn stop(&mut self);
}

impl<H: PlaybackHandle + ?Sized> PlaybackHandle for Box<H> {
    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Permission to fetch and play speech for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechTicket {
    pub generation: u64,
    pub message_id: String,
}

pub struct PlaybackSlot<H: PlaybackHandle> {
    /// Message whose speech is loading or playing
    active: Option<String>,
    handle: Option<H>,
    generation: u64,
    event_bus: EventBus,
}

impl<H: PlaybackHandle> PlaybackSlot<H> {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            active: None,
            handle: None,
            generation: 0,
            event_bus,
        }
    }

    pub fn active_message(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.handle.is_some()
    }

    /// Tap on a message's speaker. Tapping the message that is already
    /// loading or playing stops it and returns `None`; otherwise whatever
    /// was playing is torn down and a ticket for the new message is issued.
    pub fn request(&mut self, message_id: &str) -> Option<SpeechTicket> {
        if self.active.as_deref() == Some(message_id) {
            self.stop();
            return None;
        }

        self.stop();
        self.active = Some(message_id.to_string());
        Some(SpeechTicket {
            generation: self.generation,
            message_id: message_id.to_string(),
        })
    }

    pub fn is_current(&self, ticket: &SpeechTicket) -> bool {
        ticket.generation == self.generation && self.active.as_deref() == Some(&ticket.message_id)
    }

    /// Install the playback for `ticket`. A stale ticket's handle is
    /// stopped immediately and `false` is returned.
    pub fn attach(&mut self, ticket: &SpeechTicket, mut handle: H) -> bool {
        if !self.is_current(ticket) {
            handle.stop();
            return false;
        }
        if let Some(mut previous) = self.handle.take() {
            previous.stop();
        }
        self.handle = Some(handle);
        self.event_bus.emit(CompanionEvent::PlaybackStarted {
            message_id: ticket.message_id.clone(),
        });
        true
    }

    /// Playback for `ticket` ended on its own, or its fetch failed.
    pub fn release(&mut self, ticket: &SpeechTicket) {
        if !self.is_current(ticket) {
            return;
        }
        self.handle = None;
        self.active = None;
        self.event_bus.emit(CompanionEvent::PlaybackStopped {
            message_id: ticket.message_id.clone(),
        });
    }

    /// Silence and release whatever is live, invalidating outstanding tickets.
    pub fn stop(&mut self) {
        self.generation += 1;
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
        }
        if let Some(message_id) = self.active.take() {
            self.event_bus
                .emit(CompanionEvent::PlaybackStopped { message_id });
        }
    }
}

/// Cut `text` to at most `max_chars` characters for synthesis.
pub fn speech_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

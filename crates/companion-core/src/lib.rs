//! Companion core: the state and persistence layer.
//!
//! Everything here is single-threaded and platform-free. Browser adapters
//! plug in through the traits in [`ports`].

pub mod ports;
pub mod record;
pub mod event_bus;
pub mod identity;
pub mod sessions;
pub mod chat;
pub mod safety;
pub mod wiki;
pub mod journal;
pub mod playback;

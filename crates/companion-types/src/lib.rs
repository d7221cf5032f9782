pub mod message;
pub mod event;
pub mod turn;
pub mod config;
pub mod error;
pub mod keys;
pub mod session;
pub mod user;
pub mod journal;
pub mod wiki;


pub use error::{CompanionError, JournalError};
pub type Result<T> = std::result::Result<T, CompanionError>;

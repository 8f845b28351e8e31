//! # termdeck-core
//!
//! Core types for termdeck.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other termdeck crates. It provides:
//!
//! - Session identity and status types (SessionId, SessionStatus, CommandSpec)
//! - User commands (Command)
//! - Key chords for shortcut handling
//! - Configuration
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other termdeck crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod config;
pub mod error;
pub mod key;
pub mod session;

// Re-export commonly used types
pub use command::Command;
pub use config::{
    Config, DisplaySettings, LoggingSettings, NotificationSettings, SessionSettings,
    TerminalSettings, DEFAULT_MAX_SESSIONS,
};
pub use error::{Error, Result};
pub use key::{KeyChord, KeyCode};
pub use session::{CommandSpec, SessionId, SessionStatus};

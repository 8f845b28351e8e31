//! # termdeck-host
//!
//! Process hosting for termdeck.
//!
//! This crate provides:
//! - The process-host contract (`ProcessHost`, `SessionHandle`, `HostEvent`)
//! - A PTY-backed host built on portable-pty
//! - An output scanner turning raw bytes into title/bell/clipboard events
//! - A bounded plain-text transcript per session
//! - An in-memory fake host for tests of the layers above
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on termdeck-core and
//! owns everything that touches child processes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod host;
pub mod pty;
pub mod scanner;
pub mod testing;

// Re-export commonly used types
pub use host::{
    event_channel, EventReceiver, EventSender, HostEvent, ProcessHost, SessionEvent,
    SessionHandle,
};
pub use pty::PtyHost;
pub use scanner::{OutputScanner, Transcript};

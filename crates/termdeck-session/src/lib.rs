//! # termdeck-session
//!
//! Session management for termdeck.
//!
//! This crate provides:
//! - The ordered, capped session registry
//! - The controller state machine (create, switch, remove, rename, focus)
//! - Visibility-gated delivery of background session events
//! - Toast coalescing and the notifier/surface contracts
//! - URL extraction from transcripts
//! - Persisted preferences and the shortcut table
//! - The event loop that serializes all of the above
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on termdeck-core and
//! termdeck-host and never touches a process directly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod event_loop;
pub mod keymap;
pub mod notify;
pub mod prefs;
pub mod registry;
pub mod session;
pub mod surface;
pub mod testing;
pub mod urls;
pub mod visibility;

// Re-export commonly used types
pub use controller::{Direction, Flow, Removal, SessionController};
pub use event_loop::{ControllerLoop, Input, LoopHandle};
pub use keymap::Binding;
pub use notify::{Alert, NotificationCoalescer, Notifier, Toast, ToastId, ToastLength};
pub use prefs::{FilePreferences, MemoryPreferences, Preferences, StoredPreferences};
pub use registry::SessionRegistry;
pub use session::Session;
pub use surface::{SessionRow, Surface, UiAction};
pub use urls::UrlScanner;
pub use visibility::VisibilityGate;

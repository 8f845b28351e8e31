//! termdeck front end library
//!
//! Console implementations of the notifier and surface contracts, the
//! line-oriented command parser, and the wiring that assembles a controller
//! from a configuration. The binary is in main.rs.

pub mod commands;
pub mod console;

// Re-export commonly used types
pub use commands::{parse_line, Request, HELP};
pub use console::{Console, ConsoleNotifier, ConsoleSurface};

use termdeck_core::{Config, Result};
use termdeck_host::{EventSender, ProcessHost};
use termdeck_session::{FilePreferences, MemoryPreferences, Preferences, SessionController};

/// Open the preferences store named by the configuration.
pub fn open_preferences(config: &Config) -> Result<Box<dyn Preferences>> {
    match &config.state_file {
        Some(path) => Ok(Box::new(FilePreferences::open(path, &config.display)?)),
        None => Ok(Box::new(MemoryPreferences::new(&config.display))),
    }
}

/// Build a controller printing to `console` and spawning through `host`.
pub fn build_controller(
    config: Config,
    host: Box<dyn ProcessHost>,
    console: &Console,
) -> Result<SessionController> {
    let prefs = open_preferences(&config)?;
    Ok(SessionController::new(
        config,
        host,
        Box::new(ConsoleNotifier::new(console.clone())),
        Box::new(ConsoleSurface::new(console.clone())),
        prefs,
    ))
}

/// Build the PTY host for `config`, publishing on `events`.
pub fn pty_host(config: &Config, events: EventSender) -> Box<dyn ProcessHost> {
    Box::new(termdeck_host::PtyHost::new(
        events,
        config.terminal.scrollback_lines,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use termdeck_core::SessionId;

    #[test]
    fn test_preferences_without_state_file_are_in_memory() {
        let mut prefs = open_preferences(&Config::default()).unwrap();
        assert_eq!(prefs.font_size(), 14);
        prefs.set_fullscreen(true).unwrap();
        assert!(prefs.is_fullscreen());
    }

    #[test]
    fn test_preferences_with_state_file_persist() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.state_file = Some(dir.path().join("prefs.json"));
        let id = SessionId::new();

        let mut prefs = open_preferences(&config).unwrap();
        prefs.set_last_active_session(id).unwrap();
        drop(prefs);

        let prefs = open_preferences(&config).unwrap();
        assert_eq!(prefs.last_active_session(), Some(id));
    }
}

//! User commands understood by the session controller.

use serde::{Deserialize, Serialize};

use crate::SessionId;

/// A user command, independent of whichever binding produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command", content = "args")]
pub enum Command {
    /// Create a session, optionally named, optionally with the fallback shell
    NewSession {
        /// Use the minimal fallback command line
        fail_safe: bool,
        /// Display name for the new session
        name: Option<String>,
    },
    /// Remove the current session once it has finished
    CloseCurrent,
    /// Focus the next session, wrapping around
    NextSession,
    /// Focus the previous session, wrapping around
    PreviousSession,
    /// Focus the session at a 1-based ordinal
    JumpTo(usize),
    /// Focus a specific session, e.g. picked from the drawer
    Select(SessionId),
    /// Rename a session, the current one when `session` is unset
    Rename {
        /// Target session
        session: Option<SessionId>,
        /// New display name; blank clears it
        name: String,
    },
    /// Offer the URLs found in the current transcript
    SelectUrl,
    /// Copy a previously offered URL to the clipboard
    CopyUrl(String),
    /// Hand the whole trimmed transcript of the current session to the
    /// surface for sharing
    ShareTranscript,
    /// Paste text into the current session
    Paste(String),
    /// Ask the host to terminate the current session's process
    KillProcess,
    /// Reset the current session's terminal state
    ResetTerminal,
    /// Flip the persisted fullscreen flag
    ToggleFullscreen,
    /// Step the persisted font size
    ChangeFontSize {
        /// Grow when true, shrink otherwise
        increase: bool,
    },
}

impl Command {
    /// Plain new session with the default shell.
    pub fn new_session() -> Self {
        Command::NewSession {
            fail_safe: false,
            name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_default() {
        assert_eq!(
            Command::new_session(),
            Command::NewSession {
                fail_safe: false,
                name: None
            }
        );
    }

    #[test]
    fn test_command_serialization() {
        let cmd = Command::Rename {
            session: None,
            name: "build".to_string(),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"command\":\"rename\""));
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }
}

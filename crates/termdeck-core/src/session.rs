//! Session identity, status and spawn specification types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a terminal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a terminal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The process is alive
    Running,
    /// The process has exited
    Finished {
        /// Exit code reported by the host
        exit_status: i32,
    },
}

impl SessionStatus {
    /// Whether the session's process is still alive.
    pub fn is_running(&self) -> bool {
        matches!(self, SessionStatus::Running)
    }

    /// Exit status, meaningful only once finished.
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            SessionStatus::Running => None,
            SessionStatus::Finished { exit_status } => Some(*exit_status),
        }
    }
}

/// What the process host should run for a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to execute
    pub program: String,
    /// Program arguments
    pub args: Vec<String>,
    /// Working directory, host default when unset
    pub working_directory: Option<String>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
    /// Initial terminal rows
    pub rows: u16,
    /// Initial terminal columns
    pub cols: u16,
    /// Spawned with the minimal fallback shell
    pub fail_safe: bool,
}

impl CommandSpec {
    /// Create a spec running `program` with no arguments in a 24x80 terminal.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_directory: None,
            env: Vec::new(),
            rows: 24,
            cols: 80,
            fail_safe: false,
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the terminal size.
    pub fn with_size(mut self, rows: u16, cols: u16) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Mark this command as a fail-safe session.
    pub fn fail_safe(mut self, fail_safe: bool) -> Self {
        self.fail_safe = fail_safe;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_creation() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new();
        assert_eq!(format!("{id}").len(), 36);
    }

    #[test]
    fn test_session_id_serde_transparent() {
        let id = SessionId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_session_status() {
        assert!(SessionStatus::Running.is_running());
        assert_eq!(SessionStatus::Running.exit_status(), None);

        let done = SessionStatus::Finished { exit_status: 3 };
        assert!(!done.is_running());
        assert_eq!(done.exit_status(), Some(3));
    }

    #[test]
    fn test_command_spec_builder() {
        let spec = CommandSpec::new("/bin/sh")
            .arg("-l")
            .env("TERM", "xterm-256color")
            .with_size(30, 100)
            .fail_safe(true);

        assert_eq!(spec.program, "/bin/sh");
        assert_eq!(spec.args, vec!["-l"]);
        assert_eq!(spec.env.len(), 1);
        assert_eq!((spec.rows, spec.cols), (30, 100));
        assert!(spec.fail_safe);
    }
}

//! A single terminal session as seen by the registry.

use std::fmt;
use std::time::SystemTime;

use tracing::info;

use termdeck_core::{SessionId, SessionStatus};
use termdeck_host::SessionHandle;

/// One live or finished terminal.
///
/// The process itself belongs to the host; the session keeps the handle
/// plus the user-facing name and the title last reported by the program.
pub struct Session {
    /// Session identifier
    id: SessionId,

    /// User-assigned display name
    name: Option<String>,

    /// Title reported by the running program
    title: String,

    /// Handle to the hosted process
    handle: Box<dyn SessionHandle>,

    /// Session creation time
    created_at: SystemTime,
}

impl Session {
    /// Wrap a freshly spawned handle.
    pub fn new(id: SessionId, handle: Box<dyn SessionHandle>) -> Self {
        Self {
            id,
            name: None,
            title: String::new(),
            handle,
            created_at: SystemTime::now(),
        }
    }

    /// Get the session ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Display name, if one is set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the display name. A blank name clears it.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        let name = name.trim();
        let new_name = if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        };
        info!(
            "Session renamed: id={}, {:?} → {:?}",
            self.id, self.name, new_name
        );
        self.name = new_name;
    }

    /// Title last reported by the program (may be empty).
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Record a new title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Whether the process is still alive.
    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// Exit status, meaningful only once finished.
    pub fn exit_status(&self) -> Option<i32> {
        self.handle.exit_status()
    }

    /// Status as a single value.
    pub fn status(&self) -> SessionStatus {
        match self.handle.exit_status() {
            Some(exit_status) if !self.handle.is_running() => {
                SessionStatus::Finished { exit_status }
            }
            _ => SessionStatus::Running,
        }
    }

    /// Whether the session finished with a non-zero exit status.
    pub fn failed(&self) -> bool {
        !self.is_running() && self.exit_status().unwrap_or(0) != 0
    }

    /// The hosted process.
    pub fn handle(&self) -> &dyn SessionHandle {
        self.handle.as_ref()
    }

    /// Get the session creation time.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Toast title for the session at 1-based `ordinal`.
    ///
    /// `[n]`, then the name, then the title separated by a space when there
    /// is no name and by a newline otherwise.
    pub fn label(&self, ordinal: usize) -> String {
        let mut label = format!("[{ordinal}]");
        if let Some(name) = &self.name {
            label.push(' ');
            label.push_str(name);
        }
        if !self.title.is_empty() {
            label.push(if self.name.is_none() { ' ' } else { '\n' });
            label.push_str(&self.title);
        }
        label
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("title", &self.title)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termdeck_core::CommandSpec;
    use termdeck_host::testing::FakeHost;
    use termdeck_host::ProcessHost;

    fn fake_session() -> (Session, termdeck_host::testing::FakeControl) {
        let mut host = FakeHost::new();
        let control = host.control();
        let id = SessionId::new();
        let handle = host.spawn(id, &CommandSpec::new("sh")).unwrap();
        (Session::new(id, handle), control)
    }

    #[test]
    fn test_label_variants() {
        let (mut session, _) = fake_session();
        assert_eq!(session.label(1), "[1]");

        session.set_title("vim");
        assert_eq!(session.label(2), "[2] vim");

        session.set_name("editor");
        assert_eq!(session.label(2), "[2] editor\nvim");

        session.set_title("");
        assert_eq!(session.label(3), "[3] editor");
    }

    #[test]
    fn test_blank_name_clears() {
        let (mut session, _) = fake_session();
        session.set_name("build");
        assert_eq!(session.name(), Some("build"));

        session.set_name("   ");
        assert_eq!(session.name(), None);
    }

    #[test]
    fn test_status_follows_handle() {
        let (session, control) = fake_session();
        assert_eq!(session.status(), SessionStatus::Running);
        assert!(!session.failed());

        control.finish(session.id(), 1);
        assert_eq!(session.status(), SessionStatus::Finished { exit_status: 1 });
        assert!(session.failed());
    }

    #[test]
    fn test_clean_exit_is_not_failure() {
        let (session, control) = fake_session();
        control.finish(session.id(), 0);
        assert!(!session.is_running());
        assert!(!session.failed());
    }
}

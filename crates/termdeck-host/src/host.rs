//! Process host contract: spawning sessions and reporting their events.
//!
//! The session layer never touches processes directly. It asks a
//! [`ProcessHost`] for a [`SessionHandle`] and learns about everything that
//! happens afterwards through [`HostEvent`]s, which arrive from per-session
//! execution contexts and must be marshaled onto the controller's loop.

use tokio::sync::mpsc;

use termdeck_core::{CommandSpec, Result, SessionId};

use crate::scanner::Transcript;

/// Something that happened to one session, as reported by its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// New output was processed
    TextChanged,
    /// The program set a new window title
    TitleChanged(String),
    /// The process exited
    Finished {
        /// Exit code of the process
        exit_status: i32,
    },
    /// The program rang the bell
    Bell,
    /// The program asked to set the clipboard
    ClipboardWrite(String),
}

/// Event delivered from the host to the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// An event keyed by the session it concerns
    Session {
        /// Originating session
        session: SessionId,
        /// What happened
        event: SessionEvent,
    },
    /// The host wants to stop as soon as possible
    Stopping,
}

impl HostEvent {
    /// Shorthand for a session-keyed event.
    pub fn session(session: SessionId, event: SessionEvent) -> Self {
        HostEvent::Session { session, event }
    }
}

/// Sending half used by hosts to publish events.
pub type EventSender = mpsc::UnboundedSender<HostEvent>;

/// Receiving half consumed by the controller loop.
pub type EventReceiver = mpsc::UnboundedReceiver<HostEvent>;

/// Create a host event channel.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Live handle to one spawned session.
pub trait SessionHandle: Send {
    /// Whether the process is still alive.
    fn is_running(&self) -> bool;

    /// Exit status once the process has finished.
    fn exit_status(&self) -> Option<i32>;

    /// Request termination. The host confirms with a `Finished` event.
    fn terminate(&self) -> Result<()>;

    /// Write input bytes to the session.
    fn write(&self, data: &[u8]) -> Result<usize>;

    /// Copy of the scroll-back transcript.
    fn transcript(&self) -> Transcript;

    /// Reset host-side terminal state.
    fn reset(&self);
}

/// Spawns sessions on behalf of the registry.
pub trait ProcessHost: Send {
    /// Spawn a session identified by `id`. Events for it carry the same id.
    fn spawn(&mut self, id: SessionId, spec: &CommandSpec) -> Result<Box<dyn SessionHandle>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_channel_delivers_in_order() {
        let (tx, mut rx) = event_channel();
        let id = SessionId::new();

        tx.send(HostEvent::session(id, SessionEvent::Bell)).unwrap();
        tx.send(HostEvent::session(id, SessionEvent::Finished { exit_status: 0 }))
            .unwrap();
        tx.send(HostEvent::Stopping).unwrap();

        assert_eq!(
            rx.recv().await,
            Some(HostEvent::session(id, SessionEvent::Bell))
        );
        assert_eq!(
            rx.recv().await,
            Some(HostEvent::session(id, SessionEvent::Finished { exit_status: 0 }))
        );
        assert_eq!(rx.recv().await, Some(HostEvent::Stopping));
    }
}

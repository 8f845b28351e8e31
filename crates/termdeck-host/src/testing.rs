//! In-memory process host for exercising the session layer without PTYs.
//!
//! A [`FakeHost`] hands out [`FakeHandle`]s whose state lives behind a shared
//! [`FakeControl`], so a test can keep the control after moving the host into
//! a registry and then script exits, transcripts and spawn failures.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use termdeck_core::{CommandSpec, Error, Result, SessionId, SessionStatus};

use crate::host::{ProcessHost, SessionHandle};
use crate::scanner::Transcript;

/// Scroll-back kept by a [`FakeHost`] unless configured otherwise.
pub const FAKE_SCROLLBACK_LINES: usize = 1000;

#[derive(Debug)]
struct HandleState {
    status: Option<SessionStatus>,
    transcript: Transcript,
    written: Vec<u8>,
    terminate_requests: usize,
    resets: usize,
}

impl HandleState {
    fn running(scrollback_lines: usize) -> Self {
        Self {
            status: Some(SessionStatus::Running),
            transcript: Transcript::new(scrollback_lines),
            written: Vec::new(),
            terminate_requests: 0,
            resets: 0,
        }
    }
}

#[derive(Debug, Default)]
struct ControlState {
    fail_next: Option<String>,
    spawned: Vec<(SessionId, CommandSpec)>,
    handles: HashMap<SessionId, HandleState>,
}

/// Test-side view of a [`FakeHost`].
#[derive(Debug, Clone, Default)]
pub struct FakeControl {
    state: Arc<Mutex<ControlState>>,
}

impl FakeControl {
    /// Make the next spawn fail with `reason`.
    pub fn fail_next_spawn(&self, reason: impl Into<String>) {
        self.state.lock().fail_next = Some(reason.into());
    }

    /// Every successful spawn so far, in order.
    pub fn spawned(&self) -> Vec<(SessionId, CommandSpec)> {
        self.state.lock().spawned.clone()
    }

    /// Mark a session's process as exited.
    ///
    /// This only changes what the handle reports; the matching
    /// `Finished` event is up to the test.
    pub fn finish(&self, id: SessionId, exit_status: i32) {
        if let Some(handle) = self.state.lock().handles.get_mut(&id) {
            handle.status = Some(SessionStatus::Finished { exit_status });
        }
    }

    /// Replace a session's transcript.
    pub fn set_transcript(&self, id: SessionId, text: &str) {
        if let Some(handle) = self.state.lock().handles.get_mut(&id) {
            handle.transcript.clear();
            handle.transcript.push_str(text);
        }
    }

    /// Append output to a session's transcript, as if the program printed it.
    pub fn append_output(&self, id: SessionId, text: &str) {
        if let Some(handle) = self.state.lock().handles.get_mut(&id) {
            handle.transcript.push_str(text);
        }
    }

    /// Number of termination requests a session received.
    pub fn terminate_requests(&self, id: SessionId) -> usize {
        self.state
            .lock()
            .handles
            .get(&id)
            .map_or(0, |h| h.terminate_requests)
    }

    /// Bytes written to a session.
    pub fn written(&self, id: SessionId) -> Vec<u8> {
        self.state
            .lock()
            .handles
            .get(&id)
            .map(|h| h.written.clone())
            .unwrap_or_default()
    }

    /// Number of resets a session received.
    pub fn resets(&self, id: SessionId) -> usize {
        self.state.lock().handles.get(&id).map_or(0, |h| h.resets)
    }
}

/// Process host that never starts a process.
#[derive(Debug)]
pub struct FakeHost {
    control: FakeControl,
    scrollback_lines: usize,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::with_scrollback(FAKE_SCROLLBACK_LINES)
    }
}

impl FakeHost {
    /// Create a host with a fresh control.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host whose sessions keep `scrollback_lines` of transcript.
    pub fn with_scrollback(scrollback_lines: usize) -> Self {
        Self {
            control: FakeControl::default(),
            scrollback_lines,
        }
    }

    /// Shared control for scripting this host.
    pub fn control(&self) -> FakeControl {
        self.control.clone()
    }
}

impl ProcessHost for FakeHost {
    fn spawn(&mut self, id: SessionId, spec: &CommandSpec) -> Result<Box<dyn SessionHandle>> {
        let mut state = self.control.state.lock();
        if let Some(reason) = state.fail_next.take() {
            return Err(Error::SpawnFailure(reason));
        }
        state.spawned.push((id, spec.clone()));
        state
            .handles
            .insert(id, HandleState::running(self.scrollback_lines));
        Ok(Box::new(FakeHandle {
            id,
            control: self.control.clone(),
        }))
    }
}

/// Handle produced by [`FakeHost`].
#[derive(Debug)]
pub struct FakeHandle {
    id: SessionId,
    control: FakeControl,
}

impl FakeHandle {
    fn with<T>(&self, f: impl FnOnce(&mut HandleState) -> T) -> Option<T> {
        self.control.state.lock().handles.get_mut(&self.id).map(f)
    }
}

impl SessionHandle for FakeHandle {
    fn is_running(&self) -> bool {
        self.with(|h| h.status.as_ref().map_or(false, SessionStatus::is_running))
            .unwrap_or(false)
    }

    fn exit_status(&self) -> Option<i32> {
        self.with(|h| h.status.as_ref().and_then(SessionStatus::exit_status))
            .flatten()
    }

    fn terminate(&self) -> Result<()> {
        self.with(|h| h.terminate_requests += 1);
        Ok(())
    }

    fn write(&self, data: &[u8]) -> Result<usize> {
        self.with(|h| h.written.extend_from_slice(data));
        Ok(data.len())
    }

    fn transcript(&self) -> Transcript {
        self.with(|h| h.transcript.clone())
            .unwrap_or_else(|| Transcript::new(FAKE_SCROLLBACK_LINES))
    }

    fn reset(&self) {
        self.with(|h| h.resets += 1);
    }
}

//! PTY-backed process host built on portable-pty.

use std::io::{Read, Write};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use tracing::{debug, error, info, warn};

use termdeck_core::{CommandSpec, Error, Result, SessionId, SessionStatus};

use crate::host::{EventSender, HostEvent, ProcessHost, SessionEvent, SessionHandle};
use crate::scanner::{OutputScanner, Transcript};

/// Spawns every session in its own pseudo-terminal.
///
/// Each session gets one reader thread which scans the output and publishes
/// [`HostEvent`]s on the shared channel.
pub struct PtyHost {
    events: EventSender,
    scrollback_lines: usize,
}

impl PtyHost {
    /// Create a host publishing to `events`, keeping `scrollback_lines` of
    /// transcript per session.
    pub fn new(events: EventSender, scrollback_lines: usize) -> Self {
        Self {
            events,
            scrollback_lines,
        }
    }
}

impl ProcessHost for PtyHost {
    fn spawn(&mut self, id: SessionId, spec: &CommandSpec) -> Result<Box<dyn SessionHandle>> {
        info!(
            "Spawning PTY: id={}, program='{}' args={:?}, size={}x{}, fail_safe={}",
            id, spec.program, spec.args, spec.rows, spec.cols, spec.fail_safe
        );

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: spec.rows,
                cols: spec.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| {
                error!("Failed to open PTY: {}", e);
                Error::SpawnFailure(format!("Failed to open PTY: {e}"))
            })?;

        let mut cmd = CommandBuilder::new(&spec.program);
        for arg in &spec.args {
            cmd.arg(arg);
        }
        if let Some(dir) = &spec.working_directory {
            debug!("Setting working directory to: {}", dir);
            cmd.cwd(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let child = pair.slave.spawn_command(cmd).map_err(|e| {
            error!("Failed to spawn command '{}': {}", spec.program, e);
            Error::SpawnFailure(format!("Failed to spawn '{}': {e}", spec.program))
        })?;
        // The reader only sees EOF once no slave handle is left open on our side.
        drop(pair.slave);

        let mut killer = child.clone_killer();
        let writer = pair.master.take_writer().map_err(|e| {
            let _ = killer.kill();
            Error::SpawnFailure(format!("Failed to take writer: {e}"))
        })?;
        let reader = pair.master.try_clone_reader().map_err(|e| {
            let _ = killer.kill();
            Error::SpawnFailure(format!("Failed to clone reader: {e}"))
        })?;

        let shared = Arc::new(Shared {
            status: Mutex::new(SessionStatus::Running),
            scanner: Mutex::new(OutputScanner::new(self.scrollback_lines)),
        });

        let events = self.events.clone();
        let reader_shared = Arc::clone(&shared);
        thread::Builder::new()
            .name(format!("termdeck-pty-{id}"))
            .spawn(move || read_loop(id, reader, child, &reader_shared, &events))
            .map_err(|e| {
                let _ = killer.kill();
                Error::SpawnFailure(format!("Failed to start reader thread: {e}"))
            })?;

        info!("PTY spawned successfully: id={}", id);

        Ok(Box::new(PtySession {
            id,
            _master: Mutex::new(pair.master),
            writer: Mutex::new(writer),
            killer: Mutex::new(killer),
            shared,
        }))
    }
}

/// State shared between a session handle and its reader thread.
struct Shared {
    status: Mutex<SessionStatus>,
    scanner: Mutex<OutputScanner>,
}

/// Read output until EOF, then reap the child and report its exit status.
fn read_loop(
    id: SessionId,
    mut reader: Box<dyn Read + Send>,
    mut child: Box<dyn Child + Send + Sync>,
    shared: &Shared,
    events: &EventSender,
) {
    let mut buffer = vec![0u8; 4096];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                let produced = shared.scanner.lock().process(&buffer[..n]);
                for event in produced {
                    if events.send(HostEvent::session(id, event)).is_err() {
                        debug!("Event receiver gone, stopping reader: id={}", id);
                        return;
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                // Linux reports EIO on the master once the slave side is closed.
                debug!("PTY read ended: id={}, {}", id, e);
                break;
            }
        }
    }

    let exit_status = match child.wait() {
        Ok(status) => i32::try_from(status.exit_code()).unwrap_or(i32::MAX),
        Err(e) => {
            warn!("Failed to reap child: id={}, {}", id, e);
            -1
        }
    };

    *shared.status.lock() = SessionStatus::Finished { exit_status };
    info!("Session process finished: id={}, exit_status={}", id, exit_status);
    let _ = events.send(HostEvent::session(id, SessionEvent::Finished { exit_status }));
}

/// Handle to one PTY session.
struct PtySession {
    id: SessionId,
    _master: Mutex<Box<dyn MasterPty + Send>>,
    writer: Mutex<Box<dyn Write + Send>>,
    killer: Mutex<Box<dyn ChildKiller + Send + Sync>>,
    shared: Arc<Shared>,
}

impl SessionHandle for PtySession {
    fn is_running(&self) -> bool {
        self.shared.status.lock().is_running()
    }

    fn exit_status(&self) -> Option<i32> {
        self.shared.status.lock().exit_status()
    }

    fn terminate(&self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        info!("Terminating session process: id={}", self.id);
        self.killer.lock().kill().map_err(|e| {
            error!("Failed to kill session {}: {}", self.id, e);
            Error::Pty(format!("Kill failed: {e}"))
        })
    }

    fn write(&self, data: &[u8]) -> Result<usize> {
        debug!("Writing to PTY: id={}, {} bytes", self.id, data.len());
        let mut writer = self.writer.lock();
        writer.write_all(data)?;
        writer.flush()?;
        Ok(data.len())
    }

    fn transcript(&self) -> Transcript {
        self.shared.scanner.lock().transcript().clone()
    }

    fn reset(&self) {
        debug!("Resetting scanner state: id={}", self.id);
        self.shared.scanner.lock().reset();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::host::event_channel;
    use std::time::Duration;

    async fn wait_for_finish(
        rx: &mut crate::host::EventReceiver,
        id: SessionId,
    ) -> (Vec<SessionEvent>, i32) {
        let mut seen = Vec::new();
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timed out waiting for session events")
                .expect("event channel closed");
            match event {
                HostEvent::Session { session, event } => {
                    assert_eq!(session, id);
                    if let SessionEvent::Finished { exit_status } = event {
                        return (seen, exit_status);
                    }
                    seen.push(event);
                }
                HostEvent::Stopping => panic!("unexpected stop"),
            }
        }
    }

    #[tokio::test]
    async fn test_spawn_reports_output_and_exit() {
        let (tx, mut rx) = event_channel();
        let mut host = PtyHost::new(tx, 100);
        let id = SessionId::new();
        let spec = CommandSpec::new("/bin/sh")
            .arg("-c")
            .arg("printf 'see http://example.com\\n'; exit 3");

        let handle = host.spawn(id, &spec).unwrap();
        let (seen, exit_status) = wait_for_finish(&mut rx, id).await;

        assert_eq!(exit_status, 3);
        assert!(seen.contains(&SessionEvent::TextChanged));
        assert!(!handle.is_running());
        assert_eq!(handle.exit_status(), Some(3));
        assert!(handle.transcript().text().contains("http://example.com"));
    }

    #[tokio::test]
    async fn test_title_and_bell_events() {
        let (tx, mut rx) = event_channel();
        let mut host = PtyHost::new(tx, 100);
        let id = SessionId::new();
        let spec = CommandSpec::new("/bin/sh")
            .arg("-c")
            .arg("printf '\\033]2;build\\007'; printf '\\007'");

        let _handle = host.spawn(id, &spec).unwrap();
        let (seen, _) = wait_for_finish(&mut rx, id).await;

        assert!(seen.contains(&SessionEvent::TitleChanged("build".to_string())));
        assert!(seen.contains(&SessionEvent::Bell));
    }

    #[tokio::test]
    async fn test_terminate_running_session() {
        let (tx, mut rx) = event_channel();
        let mut host = PtyHost::new(tx, 100);
        let id = SessionId::new();
        let spec = CommandSpec::new("/bin/sh").arg("-c").arg("sleep 30");

        let handle = host.spawn(id, &spec).unwrap();
        assert!(handle.is_running());

        handle.terminate().unwrap();
        let (_, _) = wait_for_finish(&mut rx, id).await;
        assert!(!handle.is_running());
    }

    #[test]
    fn test_spawn_failure() {
        let (tx, _rx) = event_channel();
        let mut host = PtyHost::new(tx, 100);
        let spec = CommandSpec::new("/definitely/not/a/shell");

        let result = host.spawn(SessionId::new(), &spec);
        assert!(matches!(result, Err(Error::SpawnFailure(_))));
    }
}

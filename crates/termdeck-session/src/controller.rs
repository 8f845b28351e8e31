//! The session controller: create/switch/remove/rename and event routing.
//!
//! All mutation happens through `&mut self`, so whoever owns the controller
//! (normally [`ControllerLoop`](crate::event_loop::ControllerLoop)) is the
//! single serialization point. Background events from the host only reach
//! the notifier and the surface while the [`VisibilityGate`] is open, but
//! they always update session state.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use termdeck_core::{Command, Config, Error, KeyChord, Result, SessionId};
use termdeck_host::{HostEvent, ProcessHost, SessionEvent};

use crate::keymap::{self, Binding};
use crate::notify::{Alert, NotificationCoalescer, Notifier};
use crate::prefs::Preferences;
use crate::registry::SessionRegistry;
use crate::session::Session;
use crate::surface::{SessionRow, Surface};
use crate::urls::UrlScanner;
use crate::visibility::VisibilityGate;

/// Whether the surrounding UI should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep running
    Continue,
    /// Nothing left to show, or the host is stopping
    Finish,
}

/// Focus movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the end of the list, wrapping to the first
    Next,
    /// Towards the start of the list, wrapping to the last
    Previous,
}

/// Outcome of a removal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The process was asked to terminate; removal follows its exit
    Pending,
    /// The session is gone and others remain
    Removed,
    /// The session is gone and it was the last one
    Emptied,
}

/// Central state machine over the session registry.
pub struct SessionController {
    config: Config,
    registry: SessionRegistry,
    active: Option<SessionId>,
    pending_removal: HashSet<SessionId>,
    connected: bool,
    gate: VisibilityGate,
    toasts: NotificationCoalescer,
    surface: Box<dyn Surface>,
    prefs: Box<dyn Preferences>,
}

impl SessionController {
    /// Create a controller with an empty registry.
    pub fn new(
        config: Config,
        host: Box<dyn ProcessHost>,
        notifier: Box<dyn Notifier>,
        surface: Box<dyn Surface>,
        prefs: Box<dyn Preferences>,
    ) -> Self {
        let registry = SessionRegistry::new(host, config.sessions.max_sessions);
        Self {
            config,
            registry,
            active: None,
            pending_removal: HashSet::new(),
            connected: false,
            gate: VisibilityGate::new(),
            toasts: NotificationCoalescer::new(notifier),
            surface,
            prefs,
        }
    }

    /// The session registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Id of the active session.
    pub fn active_session(&self) -> Option<SessionId> {
        self.active
    }

    /// The active session.
    pub fn current_session(&self) -> Option<&Session> {
        self.active.and_then(|id| self.registry.get(id))
    }

    /// Whether the UI is on screen.
    pub fn is_visible(&self) -> bool {
        self.gate.is_visible()
    }

    /// Whether `connect` has run without a matching `disconnect`.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether a session is waiting for its process to exit before removal.
    pub fn is_pending_removal(&self, id: SessionId) -> bool {
        self.pending_removal.contains(&id)
    }

    /// Persisted preferences.
    pub fn preferences(&self) -> &dyn Preferences {
        self.prefs.as_ref()
    }

    /// Toast title for a registered session.
    pub fn toast_title(&self, id: SessionId) -> Option<String> {
        let index = self.registry.index_of(id)?;
        Some(self.registry.all()[index].label(index + 1))
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Spawn a session and make it active.
    ///
    /// At the cap this raises an advisory and returns `CapacityExceeded`;
    /// a host failure raises an advisory and returns the host's error.
    /// Neither changes any state.
    pub fn create(&mut self, fail_safe: bool, name: Option<&str>) -> Result<SessionId> {
        let spec = self.config.command_spec(fail_safe);
        let created = self.registry.create(&spec).map(|session| {
            if let Some(name) = name {
                session.set_name(name);
            }
            session.id()
        });

        let id = match created {
            Ok(id) => id,
            Err(e) => {
                let alert = match &e {
                    Error::CapacityExceeded(max) => Alert::CapacityReached { max: *max },
                    Error::SpawnFailure(reason) => Alert::SpawnFailed {
                        reason: reason.clone(),
                    },
                    other => Alert::SpawnFailed {
                        reason: other.to_string(),
                    },
                };
                self.toasts.notifier().alert(&alert);
                return Err(e);
            }
        };

        info!(
            "Session created: id={}, fail_safe={}, name={:?}",
            id, fail_safe, name
        );
        self.switch_to(id);
        self.check_invariants();
        Ok(id)
    }

    /// Make a session active.
    ///
    /// Returns `false` without side effects if it already is, or if the id
    /// is not registered.
    pub fn switch_to(&mut self, id: SessionId) -> bool {
        if self.active == Some(id) {
            return false;
        }
        let Some(index) = self.registry.index_of(id) else {
            debug!("Ignoring switch to unknown session {}", id);
            return false;
        };

        self.active = Some(id);
        info!("Switched to session: id={}, index={}", id, index);

        let session = &self.registry.all()[index];
        if self.surface.attach(session) {
            self.note_session_info(index);
        }
        self.remember(id);
        true
    }

    /// Remove a session.
    ///
    /// A finished session goes immediately. A running one is asked to
    /// terminate and goes when the host reports it finished.
    pub fn remove(&mut self, id: SessionId) -> Result<Removal> {
        let session = self.registry.get(id).ok_or(Error::SessionNotFound(id))?;

        if session.is_running() {
            info!("Terminating session before removal: id={}", id);
            if let Err(e) = session.handle().terminate() {
                warn!("Terminate request failed for {}: {}", id, e);
            }
            self.pending_removal.insert(id);
            return Ok(Removal::Pending);
        }

        self.finish_removal(id)
    }

    fn finish_removal(&mut self, id: SessionId) -> Result<Removal> {
        self.pending_removal.remove(&id);
        let was_active = self.active == Some(id);

        if was_active {
            self.active = None;
            self.surface.detach();
        }
        let index = self.registry.remove(id)?;

        if was_active && !self.registry.is_empty() {
            let successor = index.min(self.registry.count() - 1);
            let next = self.registry.all()[successor].id();
            debug!("Reselecting index {} after removing index {}", successor, index);
            self.switch_to(next);
        }

        self.refresh_list();
        self.check_invariants();

        if self.registry.is_empty() {
            info!("Last session removed");
            Ok(Removal::Emptied)
        } else {
            Ok(Removal::Removed)
        }
    }

    /// Rename a session. A blank name clears it.
    pub fn rename(&mut self, id: SessionId, name: &str) -> Result<()> {
        self.registry.rename(id, name)?;
        self.refresh_list();
        Ok(())
    }

    /// Move focus one step, wrapping around.
    pub fn reorder_focus(&mut self, direction: Direction) -> bool {
        let count = self.registry.count();
        let Some(current) = self.active.and_then(|id| self.registry.index_of(id)) else {
            return false;
        };

        let target = match direction {
            Direction::Next => (current + 1) % count,
            Direction::Previous => (current + count - 1) % count,
        };
        let id = self.registry.all()[target].id();
        self.switch_to(id)
    }

    /// Focus the session at a 1-based ordinal; no-op past the end.
    pub fn select_by_ordinal(&mut self, ordinal: usize) -> bool {
        if ordinal == 0 {
            return false;
        }
        match self.registry.at(ordinal - 1).map(Session::id) {
            Some(id) => self.switch_to(id),
            None => {
                debug!(
                    "No session at ordinal {} (count={})",
                    ordinal,
                    self.registry.count()
                );
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Host events
    // ------------------------------------------------------------------

    /// React to an event from the process host.
    pub fn handle_event(&mut self, event: HostEvent) -> Flow {
        let flow = match event {
            HostEvent::Stopping => {
                info!("Host is stopping");
                Flow::Finish
            }
            HostEvent::Session { session, event } => self.handle_session_event(session, event),
        };
        self.check_invariants();
        flow
    }

    fn handle_session_event(&mut self, id: SessionId, event: SessionEvent) -> Flow {
        let Some(index) = self.registry.index_of(id) else {
            debug!("Ignoring {:?} for unregistered session {}", event, id);
            return Flow::Continue;
        };
        let visible = self.gate.is_visible();
        let is_active = self.active == Some(id);

        match event {
            SessionEvent::TextChanged => {
                if visible && is_active {
                    self.surface.screen_updated(&self.registry.all()[index]);
                }
            }
            SessionEvent::TitleChanged(title) => {
                debug!("Title changed: id={}, title={:?}", id, title);
                if let Some(session) = self.registry.get_mut(id) {
                    session.set_title(title);
                }
                if visible {
                    if !is_active {
                        let label = self.registry.all()[index].label(index + 1);
                        self.toasts.show(label, false);
                    }
                    self.refresh_list();
                }
            }
            SessionEvent::Finished { exit_status } => {
                info!("Session finished: id={}, exit_status={}", id, exit_status);
                if self.pending_removal.contains(&id) {
                    return match self.finish_removal(id) {
                        Ok(Removal::Emptied) => Flow::Finish,
                        Ok(_) => Flow::Continue,
                        Err(e) => {
                            debug!("Pending removal of {} failed: {}", id, e);
                            Flow::Continue
                        }
                    };
                }
                if visible && !is_active {
                    let label = self.registry.all()[index].label(index + 1);
                    self.toasts.show(format!("{label} - exited"), true);
                }
                self.refresh_list();
            }
            SessionEvent::Bell => {
                if visible {
                    let duration =
                        Duration::from_millis(self.config.notifications.bell_vibration_ms);
                    self.toasts.notifier().vibrate(duration);
                }
            }
            SessionEvent::ClipboardWrite(text) => {
                if visible {
                    self.toasts.show(format!("Clipboard set:\n\"{text}\""), true);
                    self.toasts.notifier().set_clipboard(&text);
                }
            }
        }
        Flow::Continue
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Run a user command. Recoverable errors are surfaced as advisories or
    /// logged, never returned.
    pub fn dispatch(&mut self, command: Command) -> Flow {
        debug!("Dispatching command: {:?}", command);
        let mut flow = Flow::Continue;

        match command {
            Command::NewSession { fail_safe, name } => {
                if let Err(e) = self.create(fail_safe, name.as_deref()) {
                    debug!("Create failed: {}", e);
                }
            }
            Command::CloseCurrent => {
                if let Some(id) = self.active {
                    match self.remove(id) {
                        Ok(Removal::Emptied) => flow = Flow::Finish,
                        Ok(_) => {}
                        Err(e) => debug!("Close ignored: {}", e),
                    }
                }
            }
            Command::NextSession => {
                self.reorder_focus(Direction::Next);
            }
            Command::PreviousSession => {
                self.reorder_focus(Direction::Previous);
            }
            Command::JumpTo(ordinal) => {
                self.select_by_ordinal(ordinal);
            }
            Command::Select(id) => {
                self.switch_to(id);
            }
            Command::Rename { session, name } => {
                if let Some(id) = session.or(self.active) {
                    if let Err(e) = self.rename(id, &name) {
                        debug!("Rename ignored: {}", e);
                    }
                }
            }
            Command::SelectUrl => self.select_url(),
            Command::ShareTranscript => self.share_transcript(),
            Command::CopyUrl(url) => {
                self.toasts.notifier().set_clipboard(&url);
                self.toasts.show("URL copied to clipboard", true);
            }
            Command::Paste(text) => self.paste(text.as_bytes()),
            Command::KillProcess => self.kill_current(),
            Command::ResetTerminal => self.reset_current(),
            Command::ToggleFullscreen => self.toggle_fullscreen(),
            Command::ChangeFontSize { increase } => self.change_font_size(increase),
        }

        self.check_invariants();
        flow
    }

    /// Handle a key press: shortcuts run, anything else goes to the session.
    pub fn handle_key(&mut self, chord: &KeyChord) -> Flow {
        let finished = self.current_session().map_or(false, |s| !s.is_running());
        match keymap::resolve(chord, finished) {
            Some(Binding::Command(command)) => self.dispatch(command),
            Some(Binding::Ui(action)) => {
                self.surface.perform(action);
                Flow::Continue
            }
            None => {
                self.paste(&keymap::input_bytes(chord));
                Flow::Continue
            }
        }
    }

    fn select_url(&mut self) {
        let Some(session) = self.active.and_then(|id| self.registry.get(id)) else {
            return;
        };
        let urls = UrlScanner::most_recent_first(&session.handle().transcript().text());
        info!("URL selection: {} found", urls.len());
        if urls.is_empty() {
            self.toasts.notifier().alert(&Alert::NoUrlsFound);
        } else {
            self.surface.offer_urls(urls);
        }
    }

    fn share_transcript(&mut self) {
        let Some(session) = self.active.and_then(|id| self.registry.get(id)) else {
            return;
        };
        let text = session.handle().transcript().text().trim().to_string();
        info!("Sharing transcript of session {}: {} bytes", session.id(), text.len());
        self.surface.share_text(text);
    }

    fn paste(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        if let Some(session) = self.active.and_then(|id| self.registry.get(id)) {
            if let Err(e) = session.handle().write(data) {
                warn!("Write to session {} failed: {}", session.id(), e);
            }
        }
    }

    fn kill_current(&mut self) {
        if let Some(session) = self.active.and_then(|id| self.registry.get(id)) {
            info!("Killing process of session {}", session.id());
            if let Err(e) = session.handle().terminate() {
                warn!("Kill failed for {}: {}", session.id(), e);
            }
        }
    }

    fn reset_current(&mut self) {
        if let Some(session) = self.active.and_then(|id| self.registry.get(id)) {
            session.handle().reset();
            self.surface.screen_updated(session);
            self.toasts.show("Terminal reset.", true);
        }
    }

    fn toggle_fullscreen(&mut self) {
        let fullscreen = !self.prefs.is_fullscreen();
        if let Err(e) = self.prefs.set_fullscreen(fullscreen) {
            warn!("Failed to persist fullscreen flag: {}", e);
        }
        self.surface.set_fullscreen(fullscreen);
    }

    fn change_font_size(&mut self, increase: bool) {
        if let Err(e) = self.prefs.change_font_size(increase) {
            warn!("Failed to persist font size: {}", e);
        }
        self.surface.set_font_size(self.prefs.font_size());
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Bind to the host.
    ///
    /// With no sessions, a visible UI gets a fresh one and a hidden UI is
    /// told to finish. Otherwise the stored (or last) session is resumed.
    pub fn connect(&mut self) -> Flow {
        self.connected = true;
        info!(
            "Controller connected: sessions={}, visible={}",
            self.registry.count(),
            self.gate.is_visible()
        );

        if self.registry.is_empty() {
            if !self.gate.is_visible() {
                info!("Connected while hidden with no sessions");
                return Flow::Finish;
            }
            if let Err(e) = self.create(false, None) {
                warn!("Could not create the first session: {}", e);
            }
        } else {
            self.resume();
        }
        self.check_invariants();
        Flow::Continue
    }

    /// Unbind from the host and let go of the surface.
    pub fn disconnect(&mut self) {
        info!("Controller disconnected");
        self.connected = false;
        self.active = None;
        self.surface.detach();
    }

    /// The UI came on screen.
    pub fn became_visible(&mut self) {
        self.gate.became_visible();
        if self.connected {
            // State may have changed while hidden.
            self.resume();
            // Output that arrived while hidden was never drawn.
            if let Some(session) = self.active.and_then(|id| self.registry.get(id)) {
                self.surface.screen_updated(session);
            }
            self.check_invariants();
        }
    }

    /// The UI went off screen; the current session is remembered.
    pub fn became_hidden(&mut self) {
        self.gate.became_hidden();
        if let Some(id) = self.active {
            self.remember(id);
        }
    }

    /// Ask every running session to terminate.
    pub fn terminate_all(&mut self) {
        for session in self.registry.all().iter().filter(|s| s.is_running()) {
            if let Err(e) = session.handle().terminate() {
                warn!("Terminate failed for {}: {}", session.id(), e);
            }
        }
    }

    /// The stored session if still registered, else the last one.
    pub fn stored_or_last(&self) -> Option<SessionId> {
        self.prefs
            .last_active_session()
            .filter(|id| self.registry.contains(*id))
            .or_else(|| self.registry.all().last().map(Session::id))
    }

    fn resume(&mut self) {
        if let Some(id) = self.stored_or_last() {
            self.switch_to(id);
        }
        self.refresh_list();
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn note_session_info(&mut self, index: usize) {
        if !self.gate.is_visible() {
            return;
        }
        let label = self.registry.all()[index].label(index + 1);
        self.toasts.show(label, false);
        self.refresh_list();
        self.surface.focus_changed(index);
    }

    fn refresh_list(&mut self) {
        if !self.gate.is_visible() {
            return;
        }
        let rows: Vec<SessionRow> = self
            .registry
            .all()
            .iter()
            .enumerate()
            .map(|(index, session)| SessionRow::new(index, session))
            .collect();
        self.surface.list_changed(&rows);
    }

    fn remember(&mut self, id: SessionId) {
        if let Err(e) = self.prefs.set_last_active_session(id) {
            warn!("Failed to persist active session: {}", e);
        }
    }

    fn check_invariants(&self) {
        if let Some(id) = self.active {
            assert!(
                self.registry.contains(id),
                "active session {id} is not in the registry"
            );
        }
        if self.connected {
            assert!(
                self.active.is_some() || self.registry.is_empty(),
                "{} sessions registered but none is active",
                self.registry.count()
            );
        }
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("registry", &self.registry)
            .field("active", &self.active)
            .field("pending_removal", &self.pending_removal)
            .field("connected", &self.connected)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

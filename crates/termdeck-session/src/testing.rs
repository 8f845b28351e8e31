//! Recording notifier and surface for tests.
//!
//! Both are cheap to clone; clones share one log, so a test keeps a copy
//! after handing the original to a controller.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use termdeck_core::SessionId;

use crate::notify::{Alert, Notifier, Toast, ToastId};
use crate::session::Session;
use crate::surface::{SessionRow, Surface, UiAction};

/// A call made on a [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    /// A toast was displayed
    Display(Toast, ToastId),
    /// A toast was cancelled
    Cancel(ToastId),
    /// An alert was raised
    Alert(Alert),
    /// The device vibrated
    Vibrate(Duration),
    /// The clipboard was set
    Clipboard(String),
}

#[derive(Debug, Default)]
struct NotifierLog {
    calls: Vec<NotifierCall>,
    next_id: u64,
}

/// Notifier that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    log: Arc<Mutex<NotifierLog>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<NotifierCall> {
        self.log.lock().calls.clone()
    }

    /// Every toast ever displayed.
    pub fn toasts(&self) -> Vec<Toast> {
        self.log
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                NotifierCall::Display(toast, _) => Some(toast.clone()),
                _ => None,
            })
            .collect()
    }

    /// Toasts displayed and not yet cancelled.
    pub fn visible_toasts(&self) -> Vec<Toast> {
        let log = self.log.lock();
        log.calls
            .iter()
            .filter_map(|call| match call {
                NotifierCall::Display(toast, id) => {
                    let cancelled = log
                        .calls
                        .iter()
                        .any(|c| matches!(c, NotifierCall::Cancel(x) if x == id));
                    (!cancelled).then(|| toast.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Alerts raised so far.
    pub fn alerts(&self) -> Vec<Alert> {
        self.log
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                NotifierCall::Alert(alert) => Some(alert.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of vibrations.
    pub fn vibrations(&self) -> usize {
        self.log
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, NotifierCall::Vibrate(_)))
            .count()
    }

    /// Last text put on the clipboard.
    pub fn clipboard(&self) -> Option<String> {
        self.log.lock().calls.iter().rev().find_map(|call| match call {
            NotifierCall::Clipboard(text) => Some(text.clone()),
            _ => None,
        })
    }

    /// Forget all recorded calls.
    pub fn clear(&self) {
        self.log.lock().calls.clear();
    }
}

impl Notifier for RecordingNotifier {
    fn display(&mut self, toast: &Toast) -> ToastId {
        let mut log = self.log.lock();
        log.next_id += 1;
        let id = ToastId(log.next_id);
        log.calls.push(NotifierCall::Display(toast.clone(), id));
        id
    }

    fn cancel(&mut self, id: ToastId) {
        self.log.lock().calls.push(NotifierCall::Cancel(id));
    }

    fn alert(&mut self, alert: &Alert) {
        self.log.lock().calls.push(NotifierCall::Alert(alert.clone()));
    }

    fn vibrate(&mut self, duration: Duration) {
        self.log.lock().calls.push(NotifierCall::Vibrate(duration));
    }

    fn set_clipboard(&mut self, text: &str) {
        self.log
            .lock()
            .calls
            .push(NotifierCall::Clipboard(text.to_string()));
    }
}

/// A call made on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    /// A session was attached
    Attach(SessionId),
    /// The surface was cleared
    Detach,
    /// A session's screen was redrawn
    ScreenUpdated(SessionId),
    /// The list was redrawn
    ListChanged(Vec<SessionRow>),
    /// A list row was highlighted
    FocusChanged(usize),
    /// URLs were offered
    OfferUrls(Vec<String>),
    /// Text was shared
    Share(String),
    /// Font size was applied
    FontSize(u16),
    /// Fullscreen was toggled
    Fullscreen(bool),
    /// A UI-only action ran
    Perform(UiAction),
}

#[derive(Debug, Default)]
struct SurfaceLog {
    calls: Vec<SurfaceCall>,
    attached: Option<SessionId>,
}

/// Surface that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Session currently attached.
    pub fn attached(&self) -> Option<SessionId> {
        self.log.lock().attached
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.log.lock().calls.clone()
    }

    /// Rows of the most recent list redraw.
    pub fn last_rows(&self) -> Option<Vec<SessionRow>> {
        self.log.lock().calls.iter().rev().find_map(|call| match call {
            SurfaceCall::ListChanged(rows) => Some(rows.clone()),
            _ => None,
        })
    }

    /// URLs of the most recent offer.
    pub fn offered_urls(&self) -> Option<Vec<String>> {
        self.log.lock().calls.iter().rev().find_map(|call| match call {
            SurfaceCall::OfferUrls(urls) => Some(urls.clone()),
            _ => None,
        })
    }

    /// Text of the most recent share.
    pub fn shared(&self) -> Option<String> {
        self.log.lock().calls.iter().rev().find_map(|call| match call {
            SurfaceCall::Share(text) => Some(text.clone()),
            _ => None,
        })
    }

    /// Forget recorded calls, keeping the attached session.
    pub fn clear(&self) {
        self.log.lock().calls.clear();
    }
}

impl Surface for RecordingSurface {
    fn attach(&mut self, session: &Session) -> bool {
        let mut log = self.log.lock();
        let changed = log.attached != Some(session.id());
        log.attached = Some(session.id());
        log.calls.push(SurfaceCall::Attach(session.id()));
        changed
    }

    fn detach(&mut self) {
        let mut log = self.log.lock();
        log.attached = None;
        log.calls.push(SurfaceCall::Detach);
    }

    fn screen_updated(&mut self, session: &Session) {
        self.log
            .lock()
            .calls
            .push(SurfaceCall::ScreenUpdated(session.id()));
    }

    fn list_changed(&mut self, rows: &[SessionRow]) {
        self.log
            .lock()
            .calls
            .push(SurfaceCall::ListChanged(rows.to_vec()));
    }

    fn focus_changed(&mut self, index: usize) {
        self.log.lock().calls.push(SurfaceCall::FocusChanged(index));
    }

    fn offer_urls(&mut self, urls: Vec<String>) {
        self.log.lock().calls.push(SurfaceCall::OfferUrls(urls));
    }

    fn share_text(&mut self, text: String) {
        self.log.lock().calls.push(SurfaceCall::Share(text));
    }

    fn set_font_size(&mut self, size: u16) {
        self.log.lock().calls.push(SurfaceCall::FontSize(size));
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.log.lock().calls.push(SurfaceCall::Fullscreen(fullscreen));
    }

    fn perform(&mut self, action: UiAction) {
        self.log.lock().calls.push(SurfaceCall::Perform(action));
    }
}

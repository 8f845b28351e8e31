//! Notification sink and the coalescer that keeps at most one toast alive.

use std::fmt;
use std::time::Duration;

use tracing::debug;

/// How long a toast stays up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLength {
    /// Brief note
    Short,
    /// Longer message
    Long,
}

/// A transient message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Text shown to the user
    pub message: String,
    /// Display duration
    pub length: ToastLength,
}

impl Toast {
    /// Create a toast.
    pub fn new(message: impl Into<String>, long: bool) -> Self {
        Self {
            message: message.into(),
            length: if long {
                ToastLength::Long
            } else {
                ToastLength::Short
            },
        }
    }
}

/// Identifies a displayed toast so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastId(pub u64);

/// Modal advisories, as opposed to transient toasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// A new session was requested at the cap
    CapacityReached {
        /// The cap
        max: usize,
    },
    /// The host could not start a session
    SpawnFailed {
        /// Host-supplied reason
        reason: String,
    },
    /// URL selection found nothing in the transcript
    NoUrlsFound,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::CapacityReached { max } => write!(
                f,
                "Max number of terminals reached. Close down other terminals in order to create a new one ({max} allowed)."
            ),
            Alert::SpawnFailed { reason } => write!(f, "Could not start a new session: {reason}"),
            Alert::NoUrlsFound => write!(f, "No URL found in the terminal."),
        }
    }
}

/// OS chrome the controller drives: toasts, dialogs, vibration, clipboard.
pub trait Notifier: Send {
    /// Show a toast, returning an id for cancelling it.
    fn display(&mut self, toast: &Toast) -> ToastId;

    /// Dismiss a toast if it is still showing.
    fn cancel(&mut self, id: ToastId);

    /// Show a modal advisory.
    fn alert(&mut self, alert: &Alert);

    /// Vibrate for `duration`.
    fn vibrate(&mut self, duration: Duration);

    /// Put text on the system clipboard.
    fn set_clipboard(&mut self, text: &str);
}

/// Owns the notifier and guarantees at most one live toast.
///
/// A new toast always cancels the previous one first; nothing is queued.
pub struct NotificationCoalescer {
    notifier: Box<dyn Notifier>,
    current: Option<ToastId>,
}

impl NotificationCoalescer {
    /// Wrap a notifier.
    pub fn new(notifier: Box<dyn Notifier>) -> Self {
        Self {
            notifier,
            current: None,
        }
    }

    /// Replace whatever toast is showing with a new one.
    pub fn show(&mut self, message: impl Into<String>, long: bool) -> ToastId {
        if let Some(previous) = self.current.take() {
            self.notifier.cancel(previous);
        }
        let toast = Toast::new(message, long);
        debug!("Toast: {:?}", toast.message);
        let id = self.notifier.display(&toast);
        self.current = Some(id);
        id
    }

    /// Id of the toast last shown.
    pub fn current(&self) -> Option<ToastId> {
        self.current
    }

    /// Cancel the live toast, if any.
    pub fn dismiss(&mut self) {
        if let Some(id) = self.current.take() {
            self.notifier.cancel(id);
        }
    }

    /// The wrapped notifier, for non-toast side effects.
    pub fn notifier(&mut self) -> &mut dyn Notifier {
        self.notifier.as_mut()
    }
}

impl fmt::Debug for NotificationCoalescer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCoalescer")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

//! Rendering surface contract.

use termdeck_core::SessionId;

use crate::session::Session;

/// One line of the session list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    /// Session this row describes
    pub id: SessionId,
    /// `[n]` followed by the name when one is set (drawn bold)
    pub label: String,
    /// Program title, possibly empty (drawn italic)
    pub title: String,
    /// Still running (finished rows are struck through)
    pub running: bool,
    /// Finished with a non-zero exit status (drawn red)
    pub failed: bool,
}

impl SessionRow {
    /// Build the row for the session at 0-based `index`.
    pub fn new(index: usize, session: &Session) -> Self {
        let label = match session.name() {
            Some(name) => format!("[{}] {}", index + 1, name),
            None => format!("[{}]", index + 1),
        };
        Self {
            id: session.id(),
            label,
            title: session.title().to_string(),
            running: session.is_running(),
            failed: session.failed(),
        }
    }
}

/// UI-only actions the key map can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    /// Open the session list
    OpenDrawer,
    /// Close the session list
    CloseDrawer,
    /// Show the context menu
    ShowMenu,
    /// Ask the user for a new name for the current session
    PromptRename,
    /// Read the clipboard and paste it into the current session
    Paste,
}

/// What the controller draws on.
pub trait Surface: Send {
    /// Attach a session. Returns `true` if a different session is now shown.
    fn attach(&mut self, session: &Session) -> bool;

    /// Show nothing.
    fn detach(&mut self);

    /// The attached session's screen changed.
    fn screen_updated(&mut self, session: &Session);

    /// The session list must be redrawn.
    fn list_changed(&mut self, rows: &[SessionRow]);

    /// Highlight the list row at `index`.
    fn focus_changed(&mut self, index: usize);

    /// Let the user pick one of `urls`, most recent first.
    fn offer_urls(&mut self, urls: Vec<String>);

    /// Share `text` (the current transcript) outside the application.
    fn share_text(&mut self, text: String);

    /// Apply a new font size.
    fn set_font_size(&mut self, size: u16);

    /// Enter or leave fullscreen.
    fn set_fullscreen(&mut self, fullscreen: bool);

    /// Perform a UI-only action.
    fn perform(&mut self, action: UiAction);
}

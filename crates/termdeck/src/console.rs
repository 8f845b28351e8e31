//! Console implementations of the notifier and the rendering surface.
//!
//! Everything is written as plain lines to a shared sink (stdout in the
//! binary, a buffer in tests).

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

use termdeck_core::SessionId;
use termdeck_session::{
    Alert, Notifier, Session, SessionRow, Surface, Toast, ToastId, ToastLength, UiAction,
};

/// Shared line sink.
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    /// Console writing to stdout.
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Console writing to any sink.
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
        }
    }

    /// Write one line.
    pub fn line(&self, text: &str) {
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{text}").and_then(|_| out.flush()) {
            warn!("Console write failed: {}", e);
        }
    }

    fn raw(&self, text: &str) {
        let mut out = self.out.lock();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            warn!("Console write failed: {}", e);
        }
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

/// Prints toasts and alerts; keeps the clipboard in memory.
#[derive(Debug)]
pub struct ConsoleNotifier {
    console: Console,
    next_id: u64,
    clipboard: Arc<Mutex<Option<String>>>,
}

impl ConsoleNotifier {
    /// Create a notifier printing to `console`.
    pub fn new(console: Console) -> Self {
        Self {
            console,
            next_id: 0,
            clipboard: Arc::new(Mutex::new(None)),
        }
    }

    /// Shared view of the clipboard contents.
    pub fn clipboard(&self) -> Arc<Mutex<Option<String>>> {
        Arc::clone(&self.clipboard)
    }
}

impl Notifier for ConsoleNotifier {
    fn display(&mut self, toast: &Toast) -> ToastId {
        self.next_id += 1;
        let marker = match toast.length {
            ToastLength::Short => "toast",
            ToastLength::Long => "toast+",
        };
        self.console
            .line(&format!("{marker}: {}", toast.message.replace('\n', " / ")));
        ToastId(self.next_id)
    }

    fn cancel(&mut self, _id: ToastId) {
        // Printed lines cannot be taken back.
    }

    fn alert(&mut self, alert: &Alert) {
        self.console.line(&format!("alert: {alert}"));
    }

    fn vibrate(&mut self, duration: Duration) {
        self.console.line(&format!("bell ({} ms)", duration.as_millis()));
    }

    fn set_clipboard(&mut self, text: &str) {
        *self.clipboard.lock() = Some(text.to_string());
    }
}

/// Prints the attached session's output and the session list.
#[derive(Debug)]
pub struct ConsoleSurface {
    console: Console,
    attached: Option<SessionId>,
    printed: HashMap<SessionId, Printed>,
}

/// How much of a session's transcript is already on the console.
#[derive(Debug, Default)]
struct Printed {
    /// Completed lines printed, counted like `Transcript::total_lines`
    lines: u64,
    /// Text of the unfinished line printed so far, without a newline
    partial: String,
}

impl ConsoleSurface {
    /// Create a surface printing to `console`.
    pub fn new(console: Console) -> Self {
        Self {
            console,
            attached: None,
            printed: HashMap::new(),
        }
    }

    /// Print whatever part of the transcript has not been shown yet.
    fn print_new_output(&mut self, session: &Session) {
        let transcript = session.handle().transcript();
        let printed = self.printed.entry(session.id()).or_default();
        let mut out = String::new();

        if transcript.total_lines() > printed.lines {
            let mut first = true;
            // Lines that scrolled out before we got here are lost.
            for line in transcript.lines_since(printed.lines) {
                if first && !printed.partial.is_empty() {
                    match line.strip_prefix(printed.partial.as_str()) {
                        Some(rest) => out.push_str(rest),
                        None => {
                            out.push('\n');
                            out.push_str(line);
                        }
                    }
                } else {
                    out.push_str(line);
                }
                out.push('\n');
                first = false;
            }
            if first && !printed.partial.is_empty() {
                out.push('\n');
            }
            printed.lines = transcript.total_lines();
            printed.partial.clear();
        }

        let current = transcript.current_line();
        match current.strip_prefix(printed.partial.as_str()) {
            Some(rest) => out.push_str(rest),
            None => {
                // The unfinished line was rewritten.
                out.push('\n');
                out.push_str(current);
            }
        }
        printed.partial = current.to_string();

        if !out.is_empty() {
            self.console.raw(&out);
        }
    }
}

impl Surface for ConsoleSurface {
    fn attach(&mut self, session: &Session) -> bool {
        if self.attached == Some(session.id()) {
            return false;
        }
        self.attached = Some(session.id());
        self.console.line(&format!("-- attached {} --", session.id()));
        self.printed.insert(session.id(), Printed::default());
        self.print_new_output(session);
        true
    }

    fn detach(&mut self) {
        if self.attached.take().is_some() {
            self.console.line("-- detached --");
        }
    }

    fn screen_updated(&mut self, session: &Session) {
        if self.attached == Some(session.id()) {
            self.print_new_output(session);
        }
    }

    fn list_changed(&mut self, rows: &[SessionRow]) {
        self.console.line("sessions:");
        for row in rows {
            let current = if self.attached == Some(row.id) { '*' } else { ' ' };
            let state = match (row.running, row.failed) {
                (true, _) => "running",
                (false, false) => "exited",
                (false, true) => "failed",
            };
            let title = if row.title.is_empty() {
                String::new()
            } else {
                format!(" \"{}\"", row.title)
            };
            self.console
                .line(&format!(" {current} {}{title} ({state})", row.label));
        }
    }

    fn focus_changed(&mut self, _index: usize) {}

    fn offer_urls(&mut self, urls: Vec<String>) {
        self.console.line("urls (copy <url>):");
        for url in urls {
            self.console.line(&format!("  {url}"));
        }
    }

    fn share_text(&mut self, text: String) {
        self.console.line("-- shared transcript --");
        self.console.line(&text);
        self.console.line("-- end of transcript --");
    }

    fn set_font_size(&mut self, size: u16) {
        self.console.line(&format!("font size: {size}"));
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.console.line(&format!(
            "fullscreen: {}",
            if fullscreen { "on" } else { "off" }
        ));
    }

    fn perform(&mut self, action: UiAction) {
        let text = match action {
            UiAction::OpenDrawer => "(drawer open)",
            UiAction::CloseDrawer => "(drawer closed)",
            UiAction::ShowMenu => {
                "menu: paste <text> | urls | share | reset | kill | fullscreen | font +/-"
            }
            UiAction::PromptRename => "rename: type `rename <name>`",
            UiAction::Paste => "paste: type `paste <text>`",
        };
        self.console.line(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termdeck_core::CommandSpec;
    use termdeck_host::testing::{FakeControl, FakeHost};
    use termdeck_host::ProcessHost;

    /// Writer appending into a shared buffer.
    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    #[test]
    fn test_notifier_output() {
        let buffer = Buffer::default();
        let mut notifier = ConsoleNotifier::new(Console::new(Box::new(buffer.clone())));

        let a = notifier.display(&Toast::new("[1] a\ntitle", false));
        let b = notifier.display(&Toast::new("Terminal reset.", true));
        notifier.alert(&Alert::NoUrlsFound);
        notifier.set_clipboard("x");

        assert_ne!(a, b);
        let text = buffer.text();
        assert!(text.contains("toast: [1] a / title\n"));
        assert!(text.contains("toast+: Terminal reset.\n"));
        assert!(text.contains("alert: No URL found in the terminal.\n"));
        assert_eq!(notifier.clipboard().lock().as_deref(), Some("x"));
    }

    fn attached_session(
        scrollback: usize,
        initial: &str,
    ) -> (ConsoleSurface, Session, FakeControl, Buffer) {
        let buffer = Buffer::default();
        let mut surface = ConsoleSurface::new(Console::new(Box::new(buffer.clone())));
        let mut host = FakeHost::with_scrollback(scrollback);
        let control = host.control();
        let id = SessionId::new();
        let handle = host.spawn(id, &CommandSpec::new("sh")).unwrap();
        control.append_output(id, initial);
        let session = Session::new(id, handle);
        assert!(surface.attach(&session));
        (surface, session, control, buffer)
    }

    #[test]
    fn test_attach_prints_transcript_once() {
        let (mut surface, session, control, buffer) = attached_session(100, "line1\nline2\n");
        surface.screen_updated(&session);
        control.append_output(session.id(), "line3\n");
        surface.screen_updated(&session);

        let banner = format!("-- attached {} --\n", session.id());
        assert_eq!(buffer.text(), format!("{banner}line1\nline2\nline3\n"));
    }

    #[test]
    fn test_output_keeps_flowing_after_scrollback_fills() {
        let (mut surface, session, control, buffer) = attached_session(2, "line1\nline2\n");
        control.append_output(session.id(), "line3\n");
        surface.screen_updated(&session);
        control.append_output(session.id(), "line4\nline5\n");
        surface.screen_updated(&session);

        let banner = format!("-- attached {} --\n", session.id());
        assert_eq!(
            buffer.text(),
            format!("{banner}line1\nline2\nline3\nline4\nline5\n")
        );
    }

    #[test]
    fn test_partial_lines_are_completed_not_repeated() {
        let (mut surface, session, control, buffer) = attached_session(100, "$ ");
        control.append_output(session.id(), "ls");
        surface.screen_updated(&session);
        control.append_output(session.id(), "\nfile\n$ ");
        surface.screen_updated(&session);

        let banner = format!("-- attached {} --\n", session.id());
        assert_eq!(buffer.text(), format!("{banner}$ ls\nfile\n$ "));
    }

    #[test]
    fn test_rewritten_line_starts_over() {
        let (mut surface, session, control, buffer) = attached_session(100, "10%");
        control.append_output(session.id(), "\r20%");
        surface.screen_updated(&session);

        let banner = format!("-- attached {} --\n", session.id());
        assert_eq!(buffer.text(), format!("{banner}10%\n20%"));
    }

    #[test]
    fn test_share_text_is_framed() {
        let buffer = Buffer::default();
        let mut surface = ConsoleSurface::new(Console::new(Box::new(buffer.clone())));
        surface.share_text("$ make\nok".to_string());
        assert_eq!(
            buffer.text(),
            "-- shared transcript --\n$ make\nok\n-- end of transcript --\n"
        );
    }

    #[test]
    fn test_surface_rows() {
        let buffer = Buffer::default();
        let mut surface = ConsoleSurface::new(Console::new(Box::new(buffer.clone())));
        let id = SessionId::new();

        surface.list_changed(&[SessionRow {
            id,
            label: "[1] build".to_string(),
            title: "make".to_string(),
            running: false,
            failed: true,
        }]);
        assert!(buffer.text().contains("   [1] build \"make\" (failed)"));
    }
}

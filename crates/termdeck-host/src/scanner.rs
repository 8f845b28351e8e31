//! Output scanning using the VTE crate.
//!
//! The host does not emulate a screen. It only needs the plain-text
//! transcript (for URL selection) and the handful of control sequences that
//! turn into session events: BEL, OSC 0/2 window titles and OSC 52 clipboard
//! writes.

use std::collections::VecDeque;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;
use vte::Perform;

use crate::host::SessionEvent;

/// Bounded plain-text scroll-back.
///
/// Completed lines are counted for the lifetime of the transcript, so a
/// reader can tell which lines are new even after old ones were dropped.
#[derive(Debug, Clone)]
pub struct Transcript {
    lines: VecDeque<String>,
    current: String,
    max_lines: usize,
    total_lines: u64,
    // A carriage return was seen; the next printed character starts the
    // line over.
    pending_cr: bool,
}

impl Transcript {
    /// Create a transcript keeping at most `max_lines` completed lines.
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            current: String::new(),
            max_lines: max_lines.max(1),
            total_lines: 0,
            pending_cr: false,
        }
    }

    /// Append a printable character to the current line.
    pub fn push_char(&mut self, c: char) {
        if self.pending_cr {
            self.current.clear();
            self.pending_cr = false;
        }
        self.current.push(c);
    }

    /// Feed plain text, honouring `\n`, `\r` and backspace.
    pub fn push_str(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\n' => self.newline(),
                '\r' => self.carriage_return(),
                '\x08' => self.backspace(),
                c => self.push_char(c),
            }
        }
    }

    /// Complete the current line.
    pub fn newline(&mut self) {
        self.pending_cr = false;
        let line = std::mem::take(&mut self.current);
        self.lines.push_back(line);
        self.total_lines += 1;
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }

    /// Return to the start of the current line. Text printed afterwards
    /// replaces the line.
    pub fn carriage_return(&mut self) {
        self.pending_cr = true;
    }

    /// Remove the last character of the current line.
    pub fn backspace(&mut self) {
        if !self.pending_cr {
            self.current.pop();
        }
    }

    /// Drop everything. The completed-line count keeps running.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.current.clear();
        self.pending_cr = false;
    }

    /// Number of completed lines held.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of lines ever completed, including dropped ones.
    pub fn total_lines(&self) -> u64 {
        self.total_lines
    }

    /// Held lines completed after the first `seen` lines, oldest first.
    pub fn lines_since(&self, seen: u64) -> impl Iterator<Item = &str> + '_ {
        let first_held = self.total_lines - self.lines.len() as u64;
        let skip = usize::try_from(seen.saturating_sub(first_held)).unwrap_or(usize::MAX);
        self.lines.iter().skip(skip).map(String::as_str)
    }

    /// The line being written, not yet completed.
    pub fn current_line(&self) -> &str {
        &self.current
    }

    /// The transcript as newline-joined text.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&self.current);
        text
    }
}

/// Perform target collecting transcript text and pending events.
#[derive(Debug)]
struct ScanState {
    transcript: Transcript,
    events: Vec<SessionEvent>,
}

impl Perform for ScanState {
    fn print(&mut self, c: char) {
        self.transcript.push_char(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            0x07 => self.events.push(SessionEvent::Bell),
            b'\n' => self.transcript.newline(),
            b'\r' => self.transcript.carriage_return(),
            0x08 => self.transcript.backspace(),
            _ => {}
        }
    }

    fn osc_dispatch(&mut self, params: &[&[u8]], _bell_terminated: bool) {
        match params {
            [b"0" | b"2", title @ ..] if !title.is_empty() => {
                let title = title
                    .iter()
                    .map(|p| String::from_utf8_lossy(p))
                    .collect::<Vec<_>>()
                    .join(";");
                self.events.push(SessionEvent::TitleChanged(title));
            }
            [b"52", _selection, data] => {
                if *data == b"?" {
                    // Clipboard read requests are not honoured.
                    return;
                }
                match BASE64.decode(data) {
                    Ok(bytes) => {
                        let text = String::from_utf8_lossy(&bytes).into_owned();
                        self.events.push(SessionEvent::ClipboardWrite(text));
                    }
                    Err(e) => debug!("Ignoring malformed OSC 52 payload: {}", e),
                }
            }
            _ => {}
        }
    }
}

/// Stateful scanner; escape sequences may be split across reads.
pub struct OutputScanner {
    parser: vte::Parser,
    state: ScanState,
}

impl std::fmt::Debug for OutputScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputScanner")
            .field("lines", &self.state.transcript.line_count())
            .finish_non_exhaustive()
    }
}

impl OutputScanner {
    /// Create a scanner with a transcript bounded to `scrollback_lines`.
    pub fn new(scrollback_lines: usize) -> Self {
        Self {
            parser: vte::Parser::new(),
            state: ScanState {
                transcript: Transcript::new(scrollback_lines),
                events: Vec::new(),
            },
        }
    }

    /// Feed a chunk of raw output, returning the events it produced.
    ///
    /// A non-empty chunk always ends with `TextChanged`.
    pub fn process(&mut self, bytes: &[u8]) -> Vec<SessionEvent> {
        for byte in bytes {
            self.parser.advance(&mut self.state, *byte);
        }

        let mut events = std::mem::take(&mut self.state.events);
        if !bytes.is_empty() {
            events.push(SessionEvent::TextChanged);
        }
        events
    }

    /// The transcript collected so far.
    pub fn transcript(&self) -> &Transcript {
        &self.state.transcript
    }

    /// Forget all scanned state.
    pub fn reset(&mut self) {
        self.parser = vte::Parser::new();
        self.state.transcript.clear();
        self.state.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_goes_to_transcript() {
        let mut scanner = OutputScanner::new(100);
        let events = scanner.process(b"hello\r\nworld");

        assert_eq!(events, vec![SessionEvent::TextChanged]);
        assert_eq!(scanner.transcript().text(), "hello\nworld");
    }

    #[test]
    fn test_empty_chunk_produces_nothing() {
        let mut scanner = OutputScanner::new(100);
        assert!(scanner.process(b"").is_empty());
    }

    #[test]
    fn test_bell() {
        let mut scanner = OutputScanner::new(100);
        let events = scanner.process(b"ding\x07");
        assert_eq!(events, vec![SessionEvent::Bell, SessionEvent::TextChanged]);
    }

    #[test]
    fn test_title_osc() {
        let mut scanner = OutputScanner::new(100);
        let events = scanner.process(b"\x1b]2;vim main.rs\x07");
        assert_eq!(
            events,
            vec![
                SessionEvent::TitleChanged("vim main.rs".to_string()),
                SessionEvent::TextChanged
            ]
        );
        // The OSC terminator is not a bell and the title is not transcript text
        assert_eq!(scanner.transcript().text(), "");
    }

    #[test]
    fn test_title_with_semicolons() {
        let mut scanner = OutputScanner::new(100);
        let events = scanner.process(b"\x1b]0;a;b\x1b\\");
        assert_eq!(events[0], SessionEvent::TitleChanged("a;b".to_string()));
    }

    #[test]
    fn test_title_split_across_reads() {
        let mut scanner = OutputScanner::new(100);
        assert_eq!(scanner.process(b"\x1b]2;ht"), vec![SessionEvent::TextChanged]);
        let events = scanner.process(b"op\x07");
        assert_eq!(events[0], SessionEvent::TitleChanged("htop".to_string()));
    }

    #[test]
    fn test_clipboard_osc52() {
        let mut scanner = OutputScanner::new(100);
        // "copied" in base64
        let events = scanner.process(b"\x1b]52;c;Y29waWVk\x07");
        assert_eq!(
            events[0],
            SessionEvent::ClipboardWrite("copied".to_string())
        );
    }

    #[test]
    fn test_clipboard_query_and_garbage_ignored() {
        let mut scanner = OutputScanner::new(100);
        assert_eq!(
            scanner.process(b"\x1b]52;c;?\x07"),
            vec![SessionEvent::TextChanged]
        );
        assert_eq!(
            scanner.process(b"\x1b]52;c;!!!\x07"),
            vec![SessionEvent::TextChanged]
        );
    }

    #[test]
    fn test_csi_sequences_are_not_text() {
        let mut scanner = OutputScanner::new(100);
        scanner.process(b"\x1b[1;31mred\x1b[0m");
        assert_eq!(scanner.transcript().text(), "red");
    }

    #[test]
    fn test_transcript_is_bounded() {
        let mut scanner = OutputScanner::new(2);
        scanner.process(b"one\ntwo\nthree\nfour");
        assert_eq!(scanner.transcript().line_count(), 2);
        assert_eq!(scanner.transcript().text(), "two\nthree\nfour");
    }

    #[test]
    fn test_backspace() {
        let mut scanner = OutputScanner::new(10);
        scanner.process(b"abc\x08d");
        assert_eq!(scanner.transcript().text(), "abd");
    }

    #[test]
    fn test_carriage_return_rewrites_the_line() {
        let mut scanner = OutputScanner::new(10);
        scanner.process(b"10%\r20%\r30%");
        assert_eq!(scanner.transcript().text(), "30%");

        scanner.process(b"\rdone\r\nnext http://a.example.com");
        assert_eq!(
            scanner.transcript().text(),
            "done\nnext http://a.example.com"
        );
    }

    #[test]
    fn test_crlf_keeps_the_line() {
        let mut scanner = OutputScanner::new(10);
        scanner.process(b"one\r\ntwo\r\n");
        assert_eq!(scanner.transcript().text(), "one\ntwo\n");
    }

    #[test]
    fn test_total_lines_survive_trimming() {
        let mut transcript = Transcript::new(2);
        transcript.push_str("line1\nline2\n");
        assert_eq!(transcript.total_lines(), 2);

        transcript.push_str("line3\npartial");
        assert_eq!(transcript.total_lines(), 3);
        assert_eq!(transcript.lines_since(2).collect::<Vec<_>>(), vec!["line3"]);
        assert_eq!(
            transcript.lines_since(0).collect::<Vec<_>>(),
            vec!["line2", "line3"]
        );
        assert_eq!(transcript.lines_since(3).count(), 0);
        assert_eq!(transcript.current_line(), "partial");
    }

    #[test]
    fn test_clear_keeps_counting() {
        let mut transcript = Transcript::new(5);
        transcript.push_str("a\nb\n");
        transcript.clear();
        transcript.push_str("c\n");
        assert_eq!(transcript.total_lines(), 3);
        assert_eq!(transcript.lines_since(2).collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn test_reset() {
        let mut scanner = OutputScanner::new(10);
        scanner.process(b"some text\n");
        scanner.reset();
        assert_eq!(scanner.transcript().text(), "");
    }
}

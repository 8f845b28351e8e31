//! Key chords as delivered by the front end.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The unmodified key of a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCode {
    /// Printable character, stored as its unshifted code point
    Char(char),
    /// Enter/Return key
    Enter,
    /// Tab key
    Tab,
    /// Escape key
    Escape,
    /// Backspace key
    Backspace,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// A key press together with its modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    /// The key itself
    pub code: KeyCode,
    /// Ctrl held
    pub ctrl: bool,
    /// Shift held
    pub shift: bool,
    /// Alt held
    pub alt: bool,
}

impl KeyChord {
    /// A chord without modifiers.
    pub fn plain(code: KeyCode) -> Self {
        Self {
            code,
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    /// A chord with Ctrl and Shift held, the multiplexer's shortcut prefix.
    pub fn ctrl_shift(code: KeyCode) -> Self {
        Self {
            code,
            ctrl: true,
            shift: true,
            alt: false,
        }
    }

    /// Whether both Ctrl and Shift are held.
    pub fn is_ctrl_shift(&self) -> bool {
        self.ctrl && self.shift
    }

    /// Parse a chord from its string representation.
    ///
    /// Examples:
    /// - "Enter" -> Enter
    /// - "Ctrl+Shift+N" -> Ctrl+Shift+n
    /// - "Ctrl+Shift+Down" -> Ctrl+Shift+Down
    /// - "Ctrl+Shift++" -> Ctrl+Shift++
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut chord = KeyChord::plain(KeyCode::Enter);
        let mut rest = s;

        loop {
            if let Some(r) = strip_modifier(rest, "Ctrl+") {
                chord.ctrl = true;
                rest = r;
            } else if let Some(r) = strip_modifier(rest, "Shift+") {
                chord.shift = true;
                rest = r;
            } else if let Some(r) = strip_modifier(rest, "Alt+") {
                chord.alt = true;
                rest = r;
            } else {
                break;
            }
        }

        chord.code = match rest {
            "Enter" | "Return" => KeyCode::Enter,
            "Tab" => KeyCode::Tab,
            "Escape" | "Esc" => KeyCode::Escape,
            "Backspace" => KeyCode::Backspace,
            "Up" => KeyCode::Up,
            "Down" => KeyCode::Down,
            "Left" => KeyCode::Left,
            "Right" => KeyCode::Right,
            _ => {
                let mut chars = rest.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c.to_ascii_lowercase()),
                    _ => return Err(Error::InvalidKey(s.to_string())),
                }
            }
        };

        Ok(chord)
    }
}

/// Strip a modifier prefix, leaving at least one character for the key.
fn strip_modifier<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    s.strip_prefix(prefix).filter(|r| !r.is_empty())
}

impl std::fmt::Display for KeyChord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        match self.code {
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Enter => write!(f, "Enter"),
            KeyCode::Tab => write!(f, "Tab"),
            KeyCode::Escape => write!(f, "Escape"),
            KeyCode::Backspace => write!(f, "Backspace"),
            KeyCode::Up => write!(f, "Up"),
            KeyCode::Down => write!(f, "Down"),
            KeyCode::Left => write!(f, "Left"),
            KeyCode::Right => write!(f, "Right"),
        }
    }
}

//! Keyboard shortcuts.

use termdeck_core::{Command, KeyChord, KeyCode};

use crate::surface::UiAction;

/// What a key chord does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Dispatch a controller command
    Command(Command),
    /// Leave it to the surface
    Ui(UiAction),
}

/// Resolve a chord against the shortcut table.
///
/// `Enter` on a finished session closes it. Everything else needs Ctrl+Shift
/// held; unbound chords return `None` and should go to the session as input.
pub fn resolve(chord: &KeyChord, current_finished: bool) -> Option<Binding> {
    if chord.code == KeyCode::Enter && current_finished {
        return Some(Binding::Command(Command::CloseCurrent));
    }
    if !chord.is_ctrl_shift() {
        return None;
    }

    let binding = match chord.code {
        KeyCode::Down | KeyCode::Char('n') => Binding::Command(Command::NextSession),
        KeyCode::Up | KeyCode::Char('p') => Binding::Command(Command::PreviousSession),
        KeyCode::Right => Binding::Ui(UiAction::OpenDrawer),
        KeyCode::Left => Binding::Ui(UiAction::CloseDrawer),
        KeyCode::Char('f') => Binding::Command(Command::ToggleFullscreen),
        KeyCode::Char('m') => Binding::Ui(UiAction::ShowMenu),
        KeyCode::Char('r') => Binding::Ui(UiAction::PromptRename),
        KeyCode::Char('c') => Binding::Command(Command::new_session()),
        KeyCode::Char('u') => Binding::Command(Command::SelectUrl),
        // The clipboard lives with the surface, which answers with `Command::Paste`.
        KeyCode::Char('v') => Binding::Ui(UiAction::Paste),
        // '+' is shifted '=' on most layouts.
        KeyCode::Char('+') | KeyCode::Char('=') => {
            Binding::Command(Command::ChangeFontSize { increase: true })
        }
        KeyCode::Char('-') => Binding::Command(Command::ChangeFontSize { increase: false }),
        KeyCode::Char(c @ '1'..='9') => {
            Binding::Command(Command::JumpTo(c as usize - '0' as usize))
        }
        _ => return None,
    };
    Some(binding)
}

/// Bytes a chord sends to the program when it is not a shortcut.
pub fn input_bytes(chord: &KeyChord) -> Vec<u8> {
    let mut bytes = match chord.code {
        KeyCode::Char(c) if chord.ctrl && c.is_ascii_alphabetic() => vec![(c as u8) & 0x1f],
        KeyCode::Char(c) if chord.shift => c.to_uppercase().to_string().into_bytes(),
        KeyCode::Char(c) => c.to_string().into_bytes(),
        KeyCode::Enter => b"\r".to_vec(),
        KeyCode::Tab => b"\t".to_vec(),
        KeyCode::Escape => b"\x1b".to_vec(),
        KeyCode::Backspace => b"\x7f".to_vec(),
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
    };
    if chord.alt {
        bytes.insert(0, 0x1b);
    }
    bytes
}

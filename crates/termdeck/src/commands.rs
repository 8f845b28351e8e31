//! Parsing of the line-oriented command language.

use termdeck_core::{Command, Error, KeyChord, Result};
use termdeck_session::Input;

/// Usage text printed by `help`.
pub const HELP: &str = "\
commands:
  new [name]        new session (named when a name is given)
  failsafe          new session with the fallback shell
  close             close the current session (kills it if still running)
  next | prev       cycle through sessions
  <1-9>             jump to a session
  rename [name]     rename the current session (blank clears)
  send <text>       type a line into the current session
  paste <text>      paste text into the current session
  key <chord>       press a key, e.g. `key Ctrl+Shift+n` or `key Enter`
  urls              list URLs in the current transcript
  copy <url>        copy a URL to the clipboard
  share             print the whole transcript for sharing
  kill | reset      kill the process / reset the terminal
  fullscreen        toggle fullscreen
  font + | font -   change the font size
  show | hide       foreground / background the UI
  help | quit";

/// What a line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Forward to the controller loop
    Input(Input),
    /// Print the usage text
    Help,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Request>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match trimmed.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (trimmed, ""),
    };
    let arg = rest.trim();

    let command = match word {
        "help" | "?" => return Ok(Some(Request::Help)),
        "quit" | "exit" => return Ok(Some(Request::Input(Input::Shutdown))),
        "show" => return Ok(Some(Request::Input(Input::Visibility(true)))),
        "hide" => return Ok(Some(Request::Input(Input::Visibility(false)))),
        "key" => {
            let chord = KeyChord::parse(arg)?;
            return Ok(Some(Request::Input(Input::Key(chord))));
        }
        "new" => Command::NewSession {
            fail_safe: false,
            name: (!arg.is_empty()).then(|| arg.to_string()),
        },
        "failsafe" => Command::NewSession {
            fail_safe: true,
            name: None,
        },
        "close" => Command::CloseCurrent,
        "next" => Command::NextSession,
        "prev" | "previous" => Command::PreviousSession,
        "rename" => Command::Rename {
            session: None,
            name: arg.to_string(),
        },
        // Text arguments keep their inner spacing.
        "send" => Command::Paste(format!("{rest}\r")),
        "paste" => Command::Paste(rest.to_string()),
        "urls" => Command::SelectUrl,
        "share" => Command::ShareTranscript,
        "copy" if !arg.is_empty() => Command::CopyUrl(arg.to_string()),
        "kill" => Command::KillProcess,
        "reset" => Command::ResetTerminal,
        "fullscreen" => Command::ToggleFullscreen,
        "font" => match arg {
            "+" => Command::ChangeFontSize { increase: true },
            "-" => Command::ChangeFontSize { increase: false },
            _ => return Err(Error::Other("usage: font + | font -".to_string())),
        },
        _ => match word.parse::<usize>() {
            Ok(ordinal) if rest.is_empty() => Command::JumpTo(ordinal),
            _ => return Err(Error::Other(format!("unknown command: {word}"))),
        },
    };

    Ok(Some(Request::Input(Input::Command(command))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> Command {
        match parse_line(line).unwrap() {
            Some(Request::Input(Input::Command(command))) => command,
            other => panic!("expected a command for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   \n").unwrap(), None);
    }

    #[test]
    fn test_session_commands() {
        assert_eq!(command("new"), Command::new_session());
        assert_eq!(
            command("new  build box "),
            Command::NewSession {
                fail_safe: false,
                name: Some("build box".to_string())
            }
        );
        assert_eq!(
            command("failsafe"),
            Command::NewSession {
                fail_safe: true,
                name: None
            }
        );
        assert_eq!(command("close"), Command::CloseCurrent);
        assert_eq!(command("next"), Command::NextSession);
        assert_eq!(command("prev"), Command::PreviousSession);
        assert_eq!(command("3"), Command::JumpTo(3));
    }

    #[test]
    fn test_text_commands() {
        assert_eq!(command("send ls -la"), Command::Paste("ls -la\r".to_string()));
        assert_eq!(command("paste  two  spaces"), Command::Paste(" two  spaces".to_string()));
        assert_eq!(
            command("rename"),
            Command::Rename {
                session: None,
                name: String::new()
            }
        );
        assert_eq!(
            command("copy http://a.com"),
            Command::CopyUrl("http://a.com".to_string())
        );
        assert_eq!(command("share"), Command::ShareTranscript);
    }

    #[test]
    fn test_settings_commands() {
        assert_eq!(command("font +"), Command::ChangeFontSize { increase: true });
        assert_eq!(command("font -"), Command::ChangeFontSize { increase: false });
        assert_eq!(command("fullscreen"), Command::ToggleFullscreen);
        assert!(parse_line("font big").is_err());
    }

    #[test]
    fn test_ui_requests() {
        assert_eq!(parse_line("help").unwrap(), Some(Request::Help));
        assert_eq!(
            parse_line("quit").unwrap(),
            Some(Request::Input(Input::Shutdown))
        );
        assert_eq!(
            parse_line("hide").unwrap(),
            Some(Request::Input(Input::Visibility(false)))
        );
        assert_eq!(
            parse_line("key Ctrl+Shift+n").unwrap(),
            Some(Request::Input(Input::Key(KeyChord::parse("Ctrl+Shift+n").unwrap())))
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse_line("frobnicate").is_err());
        assert!(parse_line("key").is_err());
        assert!(parse_line("copy").is_err());
        assert!(parse_line("3 4").is_err());
    }
}

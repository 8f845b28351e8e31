//! Configuration types for termdeck.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{CommandSpec, Error};

/// Observed session cap of the multiplexer.
pub const DEFAULT_MAX_SESSIONS: usize = 8;

/// Top-level configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Session settings
    pub sessions: SessionSettings,
    /// Terminal settings
    pub terminal: TerminalSettings,
    /// Display settings
    pub display: DisplaySettings,
    /// Notification settings
    pub notifications: NotificationSettings,
    /// Logging settings
    pub logging: LoggingSettings,
    /// JSON file holding persisted preferences (in-memory when unset)
    pub state_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: Config =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.sessions.max_sessions == 0 {
            return Err(Error::Config("sessions.max_sessions must be > 0".into()));
        }

        if self.sessions.failsafe_shell.trim().is_empty() {
            return Err(Error::Config("sessions.failsafe_shell cannot be empty".into()));
        }

        if let Some(shell) = &self.sessions.default_shell {
            if shell.trim().is_empty() {
                return Err(Error::Config("sessions.default_shell cannot be empty".into()));
            }
        }

        if self.terminal.default_rows == 0 || self.terminal.default_cols == 0 {
            return Err(Error::Config("terminal dimensions must be > 0".into()));
        }

        let display = &self.display;
        if display.min_font_size > display.max_font_size {
            return Err(Error::Config(format!(
                "display.min_font_size ({}) exceeds display.max_font_size ({})",
                display.min_font_size, display.max_font_size
            )));
        }
        if !(display.min_font_size..=display.max_font_size).contains(&display.font_size) {
            return Err(Error::Config(format!(
                "display.font_size {} outside {}..={}",
                display.font_size, display.min_font_size, display.max_font_size
            )));
        }
        if display.font_step == 0 {
            return Err(Error::Config("display.font_step must be > 0".into()));
        }

        Ok(())
    }

    /// Build the spawn spec for a new session.
    ///
    /// Fail-safe sessions run the minimal fallback shell; normal ones run the
    /// configured default shell, then `$SHELL`, then `/bin/sh`.
    pub fn command_spec(&self, fail_safe: bool) -> CommandSpec {
        let program = if fail_safe {
            self.sessions.failsafe_shell.clone()
        } else {
            self.sessions
                .default_shell
                .clone()
                .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
                .unwrap_or_else(|| "/bin/sh".to_string())
        };

        let mut spec = CommandSpec::new(program)
            .with_size(self.terminal.default_rows, self.terminal.default_cols)
            .env("TERM", self.terminal.term.clone())
            .fail_safe(fail_safe);
        spec.working_directory = self.sessions.working_directory.clone();
        spec
    }
}

/// Session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Maximum number of sessions held at once
    pub max_sessions: usize,
    /// Shell for normal sessions ($SHELL when unset)
    pub default_shell: Option<String>,
    /// Shell for fail-safe sessions
    pub failsafe_shell: String,
    /// Working directory for new sessions
    pub working_directory: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            default_shell: None,
            failsafe_shell: "/bin/sh".to_string(),
            working_directory: None,
        }
    }
}

/// Terminal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    /// Default terminal rows
    pub default_rows: u16,
    /// Default terminal columns
    pub default_cols: u16,
    /// Transcript lines kept per session
    pub scrollback_lines: usize,
    /// TERM environment variable value
    pub term: String,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            default_rows: 24,
            default_cols: 80,
            scrollback_lines: 2000,
            term: "xterm-256color".to_string(),
        }
    }
}

/// Display settings, the initial values of the persisted preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Initial font size
    pub font_size: u16,
    /// Smallest font size reachable by stepping
    pub min_font_size: u16,
    /// Largest font size reachable by stepping
    pub max_font_size: u16,
    /// Font size increment
    pub font_step: u16,
    /// Start in fullscreen
    pub fullscreen: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            font_size: 14,
            min_font_size: 8,
            max_font_size: 64,
            font_step: 2,
            fullscreen: false,
        }
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Vibration length for a terminal bell, in milliseconds
    pub bell_vibration_ms: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            bell_vibration_ms: 50,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error), overridden by RUST_LOG
    pub log_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

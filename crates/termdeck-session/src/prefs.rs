//! Persisted user preferences.
//!
//! Only three things survive a restart: the last active session, the font
//! size and the fullscreen flag. [`FilePreferences`] stores them as JSON;
//! [`MemoryPreferences`] keeps them for the lifetime of the process.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use termdeck_core::{DisplaySettings, Result, SessionId};

/// Read/write contract for persisted settings.
pub trait Preferences: Send {
    /// Session that was active when the UI last went away.
    fn last_active_session(&self) -> Option<SessionId>;

    /// Remember the active session.
    fn set_last_active_session(&mut self, id: SessionId) -> Result<()>;

    /// Current font size.
    fn font_size(&self) -> u16;

    /// Step the font size up or down, clamped to the configured bounds.
    /// Returns the new size.
    fn change_font_size(&mut self, increase: bool) -> Result<u16>;

    /// Whether fullscreen is on.
    fn is_fullscreen(&self) -> bool;

    /// Switch fullscreen on or off.
    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()>;
}

/// Serialized form of the preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPreferences {
    /// Last active session
    #[serde(default)]
    pub last_active_session: Option<SessionId>,
    /// Font size
    pub font_size: u16,
    /// Fullscreen flag
    #[serde(default)]
    pub fullscreen: bool,
    /// RFC 3339 timestamp of the last write
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl StoredPreferences {
    fn from_display(display: &DisplaySettings) -> Self {
        Self {
            last_active_session: None,
            font_size: display.font_size,
            fullscreen: display.fullscreen,
            updated_at: None,
        }
    }
}

/// Font size stepping rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FontBounds {
    min: u16,
    max: u16,
    step: u16,
}

impl FontBounds {
    fn from_display(display: &DisplaySettings) -> Self {
        Self {
            min: display.min_font_size,
            max: display.max_font_size,
            step: display.font_step.max(1),
        }
    }

    fn stepped(&self, current: u16, increase: bool) -> u16 {
        let next = if increase {
            current.saturating_add(self.step)
        } else {
            current.saturating_sub(self.step)
        };
        next.clamp(self.min, self.max)
    }

    fn clamp(&self, size: u16) -> u16 {
        size.clamp(self.min, self.max)
    }
}

/// Preferences kept in memory only.
#[derive(Debug, Clone)]
pub struct MemoryPreferences {
    stored: StoredPreferences,
    bounds: FontBounds,
}

impl MemoryPreferences {
    /// Start from the configured display defaults.
    pub fn new(display: &DisplaySettings) -> Self {
        Self {
            stored: StoredPreferences::from_display(display),
            bounds: FontBounds::from_display(display),
        }
    }
}

impl Default for MemoryPreferences {
    fn default() -> Self {
        Self::new(&DisplaySettings::default())
    }
}

impl Preferences for MemoryPreferences {
    fn last_active_session(&self) -> Option<SessionId> {
        self.stored.last_active_session
    }

    fn set_last_active_session(&mut self, id: SessionId) -> Result<()> {
        self.stored.last_active_session = Some(id);
        Ok(())
    }

    fn font_size(&self) -> u16 {
        self.stored.font_size
    }

    fn change_font_size(&mut self, increase: bool) -> Result<u16> {
        self.stored.font_size = self.bounds.stepped(self.stored.font_size, increase);
        Ok(self.stored.font_size)
    }

    fn is_fullscreen(&self) -> bool {
        self.stored.fullscreen
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        self.stored.fullscreen = fullscreen;
        Ok(())
    }
}

/// Preferences stored in a JSON file, rewritten on every change.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    stored: StoredPreferences,
    bounds: FontBounds,
}

impl FilePreferences {
    /// Load preferences from `path`, or start from the display defaults if
    /// the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>, display: &DisplaySettings) -> Result<Self> {
        let path = path.into();
        let bounds = FontBounds::from_display(display);

        let stored = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut stored: StoredPreferences = serde_json::from_str(&content)?;
            stored.font_size = bounds.clamp(stored.font_size);
            info!("Loaded preferences from {}", path.display());
            stored
        } else {
            debug!(
                "No preferences at {}, starting from defaults",
                path.display()
            );
            StoredPreferences::from_display(display)
        };

        Ok(Self {
            path,
            stored,
            bounds,
        })
    }

    /// File backing these preferences.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current stored values.
    pub fn stored(&self) -> &StoredPreferences {
        &self.stored
    }

    /// Write to a sibling temp file, then rename over the real one.
    fn save(&mut self) -> Result<()> {
        self.stored.updated_at = Some(Utc::now().to_rfc3339());
        let json = serde_json::to_string_pretty(&self.stored)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            warn!("Failed to replace {}: {}", self.path.display(), e);
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}

impl Preferences for FilePreferences {
    fn last_active_session(&self) -> Option<SessionId> {
        self.stored.last_active_session
    }

    fn set_last_active_session(&mut self, id: SessionId) -> Result<()> {
        if self.stored.last_active_session == Some(id) {
            return Ok(());
        }
        self.stored.last_active_session = Some(id);
        self.save()
    }

    fn font_size(&self) -> u16 {
        self.stored.font_size
    }

    fn change_font_size(&mut self, increase: bool) -> Result<u16> {
        self.stored.font_size = self.bounds.stepped(self.stored.font_size, increase);
        self.save()?;
        Ok(self.stored.font_size)
    }

    fn is_fullscreen(&self) -> bool {
        self.stored.fullscreen
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        self.stored.fullscreen = fullscreen;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use termdeck_core::Error;

    #[test]
    fn test_memory_defaults() {
        let prefs = MemoryPreferences::default();
        assert_eq!(prefs.font_size(), 14);
        assert!(!prefs.is_fullscreen());
        assert!(prefs.last_active_session().is_none());
    }

    #[test]
    fn test_font_size_steps_and_clamps() {
        let display = DisplaySettings {
            font_size: 10,
            min_font_size: 8,
            max_font_size: 14,
            font_step: 3,
            fullscreen: false,
        };
        let mut prefs = MemoryPreferences::new(&display);

        assert_eq!(prefs.change_font_size(true).unwrap(), 13);
        assert_eq!(prefs.change_font_size(true).unwrap(), 14);
        assert_eq!(prefs.change_font_size(true).unwrap(), 14);
        assert_eq!(prefs.change_font_size(false).unwrap(), 11);
        assert_eq!(prefs.change_font_size(false).unwrap(), 8);
        assert_eq!(prefs.change_font_size(false).unwrap(), 8);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("prefs.json");
        let id = SessionId::new();

        {
            let mut prefs = FilePreferences::open(&path, &DisplaySettings::default()).unwrap();
            prefs.set_last_active_session(id).unwrap();
            prefs.set_fullscreen(true).unwrap();
            prefs.change_font_size(true).unwrap();
            assert!(prefs.stored().updated_at.is_some());
        }

        let prefs = FilePreferences::open(&path, &DisplaySettings::default()).unwrap();
        assert_eq!(prefs.last_active_session(), Some(id));
        assert!(prefs.is_fullscreen());
        assert_eq!(prefs.font_size(), 16);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");

        let prefs = FilePreferences::open(&path, &DisplaySettings::default()).unwrap();
        assert_eq!(prefs.font_size(), 14);
        assert!(!path.exists());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");

        let mut prefs = FilePreferences::open(&path, &DisplaySettings::default()).unwrap();
        prefs.set_fullscreen(true).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["prefs.json".to_string()]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{ not json").unwrap();

        let result = FilePreferences::open(&path, &DisplaySettings::default());
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_stored_font_size_is_clamped_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"font_size": 200}"#).unwrap();

        let prefs = FilePreferences::open(&path, &DisplaySettings::default()).unwrap();
        assert_eq!(prefs.font_size(), 64);
    }
}

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    timeline::{ZoomState, MAX_VISIBLE_HOURS},
    timer::ActiveTimer,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub visible_hours: i64,
    pub active_timer: Option<ActiveTimer>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            visible_hours: MAX_VISIBLE_HOURS as i64,
            active_timer: None,
        }
    }
}

impl UserPreferences {
    /// Clamps values written by older builds or by hand into range.
    pub fn normalized(mut self) -> Self {
        self.visible_hours = self.zoom().visible_hours() as i64;
        self
    }

    pub fn zoom(&self) -> ZoomState {
        ZoomState::new(self.visible_hours)
    }
}

/// Where the zoom level and the running stopwatch survive restarts.
pub trait Preferences: Send + Sync + 'static {
    fn load(&self) -> UserPreferences;

    fn save(&self, preferences: &UserPreferences) -> Result<()>;

    fn zoom(&self) -> ZoomState {
        self.load().zoom()
    }

    fn set_zoom(&self, zoom: ZoomState) -> Result<()> {
        let mut preferences = self.load();
        preferences.visible_hours = zoom.visible_hours() as i64;
        self.save(&preferences)
    }

    fn active_timer(&self) -> Option<ActiveTimer> {
        self.load().active_timer
    }

    fn set_active_timer(&self, timer: Option<ActiveTimer>) -> Result<()> {
        let mut preferences = self.load();
        preferences.active_timer = timer;
        self.save(&preferences)
    }
}

/// JSON file backed preferences, read once on construction and rewritten on
/// every save.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserPreferences>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str::<UserPreferences>(&contents)
                .unwrap_or_else(|err| {
                    warn!("Ignoring unreadable settings at {}: {err}", path.display());
                    UserPreferences::default()
                })
                .normalized()
        } else {
            UserPreferences::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: UserPreferences = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings at {}", self.path.display()))?;
        *self.write() = data.normalized();
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, UserPreferences> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserPreferences> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &UserPreferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

impl Preferences for SettingsStore {
    fn load(&self) -> UserPreferences {
        self.read().clone()
    }

    fn save(&self, preferences: &UserPreferences) -> Result<()> {
        let normalized = preferences.clone().normalized();
        let mut guard = self.write();
        self.persist(&normalized)?;
        *guard = normalized;
        Ok(())
    }
}

//! # Settings
//!
//! The flat settings record: feature toggles, the mood-to-playlist mapping and
//! the target volume. Loaded once at startup, mutated through the session and
//! written back (debounced) after every mutation.
//!
//! Stored blobs are merged over the defaults: any missing field keeps its
//! default value, unknown fields and unknown mood keys are ignored. A blob
//! that cannot be read at all is logged and replaced by the defaults.

use crate::mood::Mood;
use anyhow::{Context, Result};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Maximum (and clamp bound for) volume.
pub const MAX_VOLUME: u8 = 100;

pub const DEFAULT_VOLUME: u8 = 50;

/// Persisted extension settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub enabled: bool,
    pub auto_analyze: bool,
    /// Playlist reference per mood, empty string means unset.
    #[serde(deserialize_with = "merge_mapping")]
    pub mood_mapping: BTreeMap<Mood, String>,
    #[serde(deserialize_with = "clamped_volume")]
    pub volume: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_analyze: true,
            mood_mapping: Mood::ALL.iter().map(|m| (*m, String::new())).collect(),
            volume: DEFAULT_VOLUME,
        }
    }
}

impl Settings {
    /// Configured playlist for `mood`, `None` if unset or blank.
    #[must_use]
    pub fn playlist_for(&self, mood: Mood) -> Option<&str> {
        self.mood_mapping
            .get(&mood)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Sets the playlist for `mood`, trimming surrounding whitespace.
    pub fn set_playlist(&mut self, mood: Mood, reference: &str) {
        self.mood_mapping.insert(mood, reference.trim().to_string());
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(MAX_VOLUME);
    }

    /// Moods with a configured playlist, in settings order.
    pub fn configured_moods(&self) -> impl Iterator<Item = Mood> + '_ {
        Mood::ALL.into_iter().filter(|m| self.playlist_for(*m).is_some())
    }
}

/// Stored mapping merged over the all-moods default. Keys that are not a
/// mood name are dropped.
fn merge_mapping<'de, D>(deserializer: D) -> Result<BTreeMap<Mood, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let stored = BTreeMap::<String, String>::deserialize(deserializer)?;
    let mut mapping = Settings::default().mood_mapping;
    for (key, playlist) in stored {
        match key.parse::<Mood>() {
            Ok(mood) => {
                mapping.insert(mood, playlist);
            }
            Err(_) => warn!("Ignoring playlist for unknown mood \"{key}\""),
        }
    }
    Ok(mapping)
}

fn clamped_volume<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.clamp(0, i64::from(MAX_VOLUME)) as u8)
}

/// Host-provided settings storage.
pub trait SettingsStore {
    /// Reads the stored settings. `Ok(None)` when nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage exists but cannot be read or parsed.
    fn load(&self) -> Result<Option<Settings>>;

    /// Writes `settings`, replacing whatever was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn save(&mut self, settings: &Settings) -> Result<()>;
}

/// Loads settings from `store`, falling back to defaults when nothing is
/// stored or the stored blob cannot be read.
pub fn load_or_default<S: SettingsStore + ?Sized>(store: &S) -> Settings {
    match store.load() {
        Ok(stored) => stored.unwrap_or_default(),
        Err(err) => {
            error!("{err:#}, using default settings");
            Settings::default()
        }
    }
}

/// Settings persisted as pretty JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Option<Settings>> {
        if !self.path.exists() {
            debug!("No settings file at {}, using defaults", self.path.display());
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid settings file {}", self.path.display()))?;
        Ok(Some(settings))
    }

    fn save(&mut self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
        debug!("Settings saved to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store. Clones share the same slot, so a caller can keep a handle
/// and observe what the session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<Settings>>>,
    saves: Rc<RefCell<u32>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::default();
        *store.slot.borrow_mut() = Some(settings);
        store
    }

    #[must_use]
    pub fn stored(&self) -> Option<Settings> {
        self.slot.borrow().clone()
    }

    /// Number of writes so far.
    #[must_use]
    pub fn save_count(&self) -> u32 {
        *self.saves.borrow()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<Settings>> {
        Ok(self.stored())
    }

    fn save(&mut self, settings: &Settings) -> Result<()> {
        *self.slot.borrow_mut() = Some(settings.clone());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

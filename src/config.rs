//! # Configuration Module
//!
//! This module handles data directory setup for Moodtune. Settings live in the
//! platform-standard data directory:
//! - Linux: `~/.local/share/moodtune/`
//! - macOS: `~/Library/Application Support/moodtune/`
//! - Windows: `%APPDATA%\moodtune\`

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Name of the settings file inside the data directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Returns the platform-appropriate data directory for Moodtune, creating it
/// if needed.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The moodtune subdirectory cannot be created due to permissions
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        )
    })?;

    let app_dir = data_dir.join("moodtune");
    fs::create_dir_all(&app_dir).with_context(|| {
        format!(
            "Failed to create Moodtune data directory at {}. Please check file permissions.",
            app_dir.display()
        )
    })?;

    Ok(app_dir)
}

/// Returns the path of the persisted settings file.
///
/// # Examples
///
/// ```no_run
/// use moodtune::config::get_settings_path;
///
/// let path = get_settings_path()?;
/// println!("Settings location: {}", path.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// # Errors
///
/// Same as [`get_data_dir`].
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(SETTINGS_FILE))
}

/// Configuration for runtime behavior
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Path to the settings file
    pub settings_path: PathBuf,
}

impl RuntimeConfig {
    /// Resolves the settings path, preferring an explicit override.
    ///
    /// # Errors
    ///
    /// Fails only when no override is given and the data directory is unusable.
    pub fn resolve(settings_override: Option<PathBuf>) -> Result<Self> {
        let settings_path = match settings_override {
            Some(path) => path,
            None => get_settings_path()?,
        };
        Ok(Self { settings_path })
    }
}

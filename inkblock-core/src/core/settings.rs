//! Editor tuning persisted as JSON.
//!
//! The host decides where the file lives; missing or unreadable files fall
//! back to defaults so a corrupt settings file never blocks editing.

use crate::{Result, LARGE_CHANGE_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default number of undo groups retained per session.
pub const DEFAULT_MAX_UNDO_GROUPS: usize = 200;

/// Tunable parameters of the editing core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSettings {
    /// Size jump, in content units, that closes the current undo group.
    pub large_change_threshold: usize,
    /// Undo groups kept before the oldest is dropped.
    pub max_undo_groups: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            large_change_threshold: LARGE_CHANGE_THRESHOLD,
            max_undo_groups: DEFAULT_MAX_UNDO_GROUPS,
        }
    }
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
pub fn load_settings(path: &Path) -> EditorSettings {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::debug!("no editor settings at {}: {e}", path.display());
            return EditorSettings::default();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        log::warn!("ignoring corrupt editor settings at {}: {e}", path.display());
        EditorSettings::default()
    })
}

/// Saves settings to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`crate::InkblockError::Io`] if the directory or file cannot be
/// written, or [`crate::InkblockError::Json`] if serialization fails.
pub fn save_settings(path: &Path, settings: &EditorSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}

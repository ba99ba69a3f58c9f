use std::fs;
use std::path::{Path, PathBuf};

use crate::config::settings::Settings;

pub fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("gamegirl");
    path.push("settings.json");
    path
}

/// Reads settings from `path`. A missing file means defaults; a broken one
/// is reported and also falls back to defaults.
pub fn load_settings(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Settings::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(settings)?)?;
    Ok(())
}

//! Loading of the species preference and weight documents

use std::path::Path;

use shared::{validate_engine_config, validate_preference, EngineConfig, PreferenceSet};

use crate::error::{AppError, AppResult};

/// Read `fisch.json`. Duplicates and suspicious entries are logged, not
/// rejected.
pub fn load_preferences(path: &Path) -> AppResult<PreferenceSet> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::Preferences(format!("{}: {}", path.display(), e)))?;
    parse_preferences(&text)
        .map_err(|e| AppError::Preferences(format!("{}: {}", path.display(), e)))
}

/// Parse a preference document and report what the loader would warn about
pub fn parse_preferences(text: &str) -> Result<PreferenceSet, serde_json::Error> {
    let (preferences, duplicates) = PreferenceSet::from_json_str(text)?;

    for name in &duplicates {
        tracing::warn!(species = %name, "Duplicate species in preferences, keeping the first entry");
    }
    for name in preferences.names() {
        let Some(pref) = preferences.get(name) else {
            continue;
        };
        for issue in validate_preference(pref) {
            tracing::warn!(species = %name, "{}", issue);
        }
    }

    tracing::info!(species = preferences.len(), "Preferences loaded");
    Ok(preferences)
}

/// Read `weights.json`; any problem falls back to the built-in tables
pub fn load_engine_config(path: &Path) -> EngineConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_engine_config(&text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No weight file at {}, using built-in weights", path.display());
            EngineConfig::default()
        }
        Err(e) => {
            tracing::warn!("Cannot read {}: {}, using built-in weights", path.display(), e);
            EngineConfig::default()
        }
    }
}

pub fn parse_engine_config(text: &str) -> EngineConfig {
    let config = EngineConfig::from_json_str_or_default(text);
    match validate_engine_config(&config) {
        Ok(()) => config,
        Err(e) => {
            tracing::warn!("Invalid weight configuration ({}), using built-in weights", e);
            EngineConfig::default()
        }
    }
}

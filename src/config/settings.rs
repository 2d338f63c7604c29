//! Application settings loading from config.toml
//!
//! Settings are optional: a missing file yields the defaults, while a file that
//! exists but cannot be read or parsed is a configuration error.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming an alternative settings file.
pub const CONFIG_PATH_ENV: &str = "CASHBOOK_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Identity provider settings
    #[serde(default)]
    pub auth: AuthSettings,
}

/// Settings for the local identity provider
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Whether new accounts may be created
    #[serde(default = "default_allow_sign_up")]
    pub allow_sign_up: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            allow_sign_up: default_allow_sign_up(),
        }
    }
}

const fn default_allow_sign_up() -> bool {
    true
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading settings from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {path_ref:?}: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings file {path_ref:?}: {e}"),
    })
}

/// Loads settings from `$CASHBOOK_CONFIG` (default `./config.toml`), falling back to
/// defaults when the file does not exist.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_settings(&path)
    } else {
        tracing::info!("No settings file at {}, using defaults", path);
        Ok(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_settings() {
        let toml_str = r"
            [auth]
            allow_sign_up = false
        ";

        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert!(!settings.auth.allow_sign_up);
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert!(settings.auth.allow_sign_up);

        let settings: Settings = toml::from_str("[auth]").unwrap();
        assert!(settings.auth.allow_sign_up);
    }

    #[test]
    fn test_load_settings_missing_file_is_config_error() {
        let result = load_settings("definitely/not/here/config.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}

//! Persistent client settings

use crate::PathManager;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Client settings stored in settings.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// Base URL of the document chat server (e.g., "http://127.0.0.1:8000")
    pub server_url: Option<String>,
    /// Log filter used when RUST_LOG is not set (e.g., "info,docchat=debug")
    pub log_filter: Option<String>,
}

impl Settings {
    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        match PathManager::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path. A missing or unreadable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&content).unwrap_or_default()
    }

    /// Save settings to the settings file
    pub fn save(&self) -> anyhow::Result<()> {
        let path = PathManager::settings_path().context("Could not determine settings path")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }

    /// Make `url` the server used when none is given on the command line.
    pub fn remember_server(&mut self, url: impl Into<String>) {
        self.server_url = Some(url.into());
    }

    /// Server URL with the built-in default applied
    pub fn server_url_or_default(&self) -> &str {
        self.server_url.as_deref().unwrap_or(crate::DEFAULT_SERVER_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.toml"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.server_url_or_default(), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let settings = Settings {
            server_url: Some("https://docs.example.com".to_string()),
            log_filter: None,
        };
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.server_url_or_default(), "https://docs.example.com");
    }

    #[test]
    fn test_remembered_server_survives_reload_and_keeps_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut settings = Settings {
            server_url: None,
            log_filter: Some("debug".to_string()),
        };
        settings.remember_server("http://10.0.0.5:8000");
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.server_url_or_default(), "http://10.0.0.5:8000");
        assert_eq!(loaded.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_toml_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "server_url = [").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }
}

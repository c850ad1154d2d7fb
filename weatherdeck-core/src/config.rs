use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::provider::weatherstack::DEFAULT_BASE_URL;

/// Environment variable holding the provider access key. Wins over the file.
pub const ACCESS_KEY_ENV: &str = "WEATHERSTACK_ACCESS_KEY";
/// Environment variable holding the provider (or proxy) base URL.
pub const BASE_URL_ENV: &str = "WEATHERSTACK_BASE_URL";

/// Deployment settings stored on disk.
///
/// Example TOML:
/// access_key = "..."
/// base_url = "http://localhost:8080/weather-api"
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub access_key: Option<String>,
    pub base_url: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherdeck", "weatherdeck")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_access_key(&mut self, access_key: String) {
        self.access_key = Some(access_key.trim().to_string());
    }

    /// An empty value resets to the default base URL.
    pub fn set_base_url(&mut self, base_url: String) {
        let base_url = base_url.trim();
        self.base_url = (!base_url.is_empty()).then(|| base_url.to_string());
    }

    /// Access key from the environment, else from the file.
    pub fn access_key(&self) -> Option<String> {
        self.access_key_with(std::env::var(ACCESS_KEY_ENV).ok())
    }

    pub fn access_key_with(&self, from_env: Option<String>) -> Option<String> {
        non_empty(from_env).or_else(|| non_empty(self.access_key.clone()))
    }

    pub fn require_access_key(&self) -> Result<String> {
        self.require_access_key_with(std::env::var(ACCESS_KEY_ENV).ok())
    }

    pub fn require_access_key_with(&self, from_env: Option<String>) -> Result<String> {
        self.access_key_with(from_env).ok_or_else(|| {
            anyhow!(
                "No access key configured for Weatherstack.\n\
                 Hint: run `weatherdeck configure` or set {ACCESS_KEY_ENV}."
            )
        })
    }

    /// Base URL from the environment, else the file, else the public endpoint.
    pub fn base_url(&self) -> String {
        self.base_url_with(std::env::var(BASE_URL_ENV).ok())
    }

    pub fn base_url_with(&self, from_env: Option<String>) -> String {
        non_empty(from_env)
            .or_else(|| non_empty(self.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_access_key_errors_with_hint() {
        let cfg = Config::default();
        let err = cfg.require_access_key_with(None).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No access key configured"));
        assert!(msg.contains("Hint: run `weatherdeck configure`"));
    }

    #[test]
    fn environment_key_wins_over_file() {
        let mut cfg = Config::default();
        cfg.set_access_key(" FILE_KEY ".into());

        assert_eq!(cfg.access_key_with(None).as_deref(), Some("FILE_KEY"));
        assert_eq!(cfg.access_key_with(Some("ENV_KEY".into())).as_deref(), Some("ENV_KEY"));
        assert_eq!(cfg.access_key_with(Some("".into())).as_deref(), Some("FILE_KEY"));
    }

    #[test]
    fn base_url_falls_back_to_default() {
        let mut cfg = Config::default();
        assert_eq!(cfg.base_url_with(None), DEFAULT_BASE_URL);

        cfg.set_base_url("http://localhost:8080/weather-api".into());
        assert_eq!(cfg.base_url_with(None), "http://localhost:8080/weather-api");

        cfg.set_base_url("  ".into());
        assert_eq!(cfg.base_url, None);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_access_key("KEY".into());
        cfg.save_to(&path).expect("save succeeds");

        let loaded = Config::load_from(&path).expect("load succeeds");
        assert_eq!(loaded.access_key.as_deref(), Some("KEY"));
        assert_eq!(loaded.base_url, None);
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = Config::load_from(&dir.path().join("absent.toml")).expect("default config");
        assert!(cfg.access_key.is_none());
    }
}

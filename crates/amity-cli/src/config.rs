//! CLI configuration
//!
//! Values come from the config file first, then `AMITY_*` environment
//! variables. Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Environment variable that relocates the config file
pub const CONFIG_PATH_ENV: &str = "AMITY_CONFIG";

const ENV_PREFIX: &str = "AMITY_";

const KEYS: &[&str] = &["data_dir", "database_file", "log_level", "busy_timeout_ms"];

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("amity")
}

/// Location of the config file
pub fn config_file_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("amity")
        .join("config.toml")
}

/// Configuration for the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub log_level: String,
    pub busy_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: "amity.db".to_string(),
            log_level: "warn".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Load from the config file and environment, falling back to defaults
    pub fn load() -> Self {
        let path = config_file_path();
        let mut config = match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                // Logging is not set up yet at this point
                eprintln!("warning: ignoring config file {}: {:#}", path.display(), e);
                Self::default()
            }
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        config
    }

    /// Read a config file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str(&raw).context("Invalid config file")?;
        Ok(config)
    }

    /// Apply `AMITY_<KEY>` overrides; unparseable values are skipped
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in KEYS {
            let name = format!("{}{}", ENV_PREFIX, key.to_uppercase());
            if let Some(value) = lookup(&name) {
                if let Err(e) = self.set(key, &value) {
                    eprintln!("warning: ignoring {}: {:#}", name, e);
                }
            }
        }
    }

    /// Write to `path`, creating its directory
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        KEYS
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "data_dir" => Some(self.data_dir.display().to_string()),
            "database_file" => Some(self.database_file.clone()),
            "log_level" => Some(self.log_level.clone()),
            "busy_timeout_ms" => Some(self.busy_timeout_ms.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "database_file" => {
                if value.trim().is_empty() {
                    anyhow::bail!("database_file must not be empty");
                }
                self.database_file = value.to_string();
            }
            "log_level" => self.log_level = value.to_string(),
            "busy_timeout_ms" => {
                self.busy_timeout_ms = value
                    .parse()
                    .with_context(|| format!("busy_timeout_ms must be a number, got '{}'", value))?;
            }
            _ => anyhow::bail!(
                "Unknown config key: {} (available: {})",
                key,
                KEYS.join(", ")
            ),
        }
        Ok(())
    }
}

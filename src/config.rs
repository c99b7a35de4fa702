use std::path::{Path, PathBuf};

use color_eyre::{Result, eyre::Context};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    database: String,
    media_root: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|path| path.join("anime-catalog"))
            .unwrap_or_else(|| PathBuf::from(".anime-catalog"));

        Self {
            database: data_dir.join("catalog.sqlite").to_string_lossy().to_string(),
            media_root: data_dir.join("media").to_string_lossy().to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .context(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("anime-catalog").join("config.toml"))
    }

    /// Load config from the default path, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the default config to the default path, if it doesn't exist
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path()
            .ok_or_else(|| color_eyre::eyre::eyre!("No default config path found"))?;

        if path.exists() {
            log::info!("Config already exists at: {}", path.display());
            return Ok(path);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create config directory: {}",
                parent.display()
            ))?;
        }

        let contents =
            toml::to_string_pretty(&Self::default()).context("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .context(format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }

    /// Get expanded database path
    pub fn database_path(&self) -> PathBuf {
        self.expand_path(&self.database)
    }

    /// Get expanded media root, where series photos are stored
    pub fn media_root(&self) -> PathBuf {
        self.expand_path(&self.media_root)
    }
}

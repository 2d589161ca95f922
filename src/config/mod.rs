use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

const APP_DIR: &str = "playback-coordinator";

/// Coordinator configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// How often the engine position is polled while playing
    pub position_poll_interval_ms: u64,
    /// Number of playback events kept in the in-memory history
    pub event_history_limit: usize,
    /// Capacity of the broadcast channel carrying reported conditions
    pub notice_capacity: usize,
    pub start_with_loop: bool,
    /// Fixed seed for the shuffle RNG; entropy-seeded when absent
    pub shuffle_seed: Option<u64>,
    pub load_warn_threshold_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            position_poll_interval_ms: 500,
            event_history_limit: 1000,
            notice_capacity: 64,
            start_with_loop: false,
            shuffle_seed: None,
            load_warn_threshold_ms: 200,
        }
    }
}

impl CoordinatorConfig {
    pub fn poll_interval(&self) -> Duration {
        // A zero period would panic inside tokio's interval
        Duration::from_millis(self.position_poll_interval_ms.max(1))
    }

    pub fn load_warn_threshold(&self) -> Duration {
        Duration::from_millis(self.load_warn_threshold_ms)
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    config: CoordinatorConfig,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Load from the default location under the user's config directory
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;
        Self::with_path(config_path)
    }

    /// Load from an explicit file; a missing file yields defaults
    pub fn with_path(config_path: PathBuf) -> Result<Self, ConfigError> {
        let config = Self::load_config(&config_path)?;
        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn get_config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn update_config<F>(&mut self, updater: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut CoordinatorConfig),
    {
        updater(&mut self.config);
        self.save_config()
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        self.config = CoordinatorConfig::default();
        self.save_config()
    }

    fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .ok_or(ConfigError::ConfigDirNotFound)?
            .join(APP_DIR);

        std::fs::create_dir_all(&config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    fn load_config(path: &Path) -> Result<CoordinatorConfig, ConfigError> {
        if !path.exists() {
            return Ok(CoordinatorConfig::default());
        }

        let config_content = std::fs::read_to_string(path)?;
        let config: CoordinatorConfig = toml::from_str(&config_content)?;

        Ok(config)
    }

    fn save_config(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let config_content = toml::to_string_pretty(&self.config)?;
        std::fs::write(&self.config_path, config_content)?;

        Ok(())
    }
}

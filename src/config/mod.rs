//! # Configuration Management Module
//!
//! TOML configuration for the idlequest engine and its CLI.
//!
//! ## Configuration Structure
//!
//! - [`GameConfig`] - Tick rate, per-call tick budget and the content directory
//! - [`StorageConfig`] - Location of the player database
//! - [`LoggingConfig`] - Log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use idlequest::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Create default configuration
//!     Config::create_default("config.toml").await?;
//!
//!     // Load and check it
//!     let config = Config::load("config.toml").await?;
//!     config.validate()?;
//!     println!("Tick rate: {}s", config.game.tick_rate_secs);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [game]
//! tick_rate_secs = 60
//! max_ticks_per_update = 10080
//! content_dir = "data"
//!
//! [storage]
//! data_dir = "./data/db"
//!
//! [logging]
//! level = "info"
//! file = "idlequest.log"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::adventure::engine::TickSettings;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub game: GameConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seconds of wall-clock time per simulated tick.
    #[serde(default = "default_tick_rate_secs")]
    pub tick_rate_secs: u64,
    /// Ticks processed per update at most (one week of minutes by default).
    /// Zero disables the cap.
    #[serde(default = "default_max_ticks_per_update")]
    pub max_ticks_per_update: u64,
    #[serde(default = "default_content_dir")]
    pub content_dir: String,
}

fn default_tick_rate_secs() -> u64 {
    60
}

fn default_max_ticks_per_update() -> u64 {
    7 * 24 * 60
}

fn default_content_dir() -> String {
    "data".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate_secs: default_tick_rate_secs(),
            max_ticks_per_update: default_max_ticks_per_update(),
            content_dir: default_content_dir(),
        }
    }
}

impl GameConfig {
    pub fn tick_settings(&self) -> TickSettings {
        TickSettings {
            tick_rate_secs: self.tick_rate_secs,
            max_ticks: match self.max_ticks_per_update {
                0 => None,
                limit => Some(limit),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.game.tick_rate_secs == 0 {
            return Err(anyhow!("game.tick_rate_secs must be greater than zero"));
        }
        if self.game.content_dir.trim().is_empty() {
            return Err(anyhow!("game.content_dir must not be empty"));
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            game: GameConfig::default(),
            storage: StorageConfig {
                data_dir: "./data/db".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("idlequest.log".to_string()),
            },
        }
    }
}

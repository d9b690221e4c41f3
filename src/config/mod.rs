//! Configuration management for memeflow.
//!
//! Configuration is read from `~/.config/memeflow/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is
//! created. Secrets can additionally be supplied through environment
//! variables, which take precedence over the file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::provider::RedditConfig;
use crate::report::TelegramConfig;
use crate::scheduler::CrawlConfig;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreSettings,
    pub reddit: RedditConfig,
    pub telegram: TelegramConfig,
    pub crawl: CrawlSettings,
    pub report: ReportSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path to the SQLite database. Defaults to the platform data
    /// directory when unset.
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub startup_delay_secs: u64,
    pub interval_secs: u64,
    pub fetch_limit: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            startup_delay_secs: 3,
            interval_secs: 600,
            fetch_limit: 100,
        }
    }
}

impl CrawlSettings {
    pub fn to_crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            startup_delay: Duration::from_secs(self.startup_delay_secs),
            interval: Duration::from_secs(self.interval_secs),
            fetch_limit: self.fetch_limit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Delay before the post-startup smoke run.
    pub startup_delay_secs: u64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            startup_delay_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating a commented
    /// default file there when none exists.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
                path: config_path.to_path_buf(),
                source: e,
            })?;

            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: config_path.to_path_buf(),
                source: e,
            })?
        } else {
            Self::create_default_config(config_path)?;
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Get the default config file path: `~/.config/memeflow/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("memeflow").join("config.toml"))
    }

    /// Secrets belong in the environment, not on disk. Any of these
    /// variables, when set and non-empty, wins over the file value.
    fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 6] = [
            ("REDDIT_CLIENT_ID", &mut self.reddit.client_id),
            ("REDDIT_CLIENT_SECRET", &mut self.reddit.client_secret),
            ("REDDIT_USERNAME", &mut self.reddit.username),
            ("REDDIT_PASSWORD", &mut self.reddit.password),
            ("TELEGRAM_BOT_TOKEN", &mut self.telegram.bot_token),
            ("TELEGRAM_CHAT_ID", &mut self.telegram.chat_id),
        ];

        for (var, slot) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    *slot = value;
                }
            }
        }
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let default_config = Self::default_config_content();

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(default_config.as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# memeflow configuration
#
# Secrets may be left blank here and supplied through the environment
# instead: REDDIT_CLIENT_ID, REDDIT_CLIENT_SECRET, REDDIT_USERNAME,
# REDDIT_PASSWORD, TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID.
# Environment variables take precedence over values in this file.

[store]
# Path to the SQLite database. Defaults to the platform data directory
# (e.g. ~/.local/share/memeflow/memeflow.db) when unset.
# db_path = "/var/lib/memeflow/memeflow.db"

[reddit]
# Reddit "script" app credentials (https://www.reddit.com/prefs/apps).
client_id = ""
client_secret = ""
username = ""
password = ""
# Subreddit to crawl.
subreddit = "memes"
# User agent sent with every Reddit request.
user_agent = "memeflow/0.1.0"

[telegram]
# Bot token from @BotFather and the target chat id. Leave both blank to
# disable delivery; reports are then logged and dropped.
bot_token = ""
chat_id = ""

[crawl]
# Delay before the first crawl cycle after startup.
startup_delay_secs = 3
# Pause between the end of one crawl cycle and the start of the next.
interval_secs = 600
# Number of posts requested from the provider per cycle.
fetch_limit = 100

[report]
# Delay before the post-startup smoke report run.
startup_delay_secs = 30
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::fs;
use std::time::Duration;
use log::info;
use crate::error::{Error, Result};

pub const DEFAULT_FUNKIT_BASE_URL: &str = "https://api.fun.xyz/v1";
pub const DEFAULT_COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

const FUNKIT_API_KEY_VAR: &str = "FUNKIT_API_KEY";
const COINGECKO_API_KEY_VAR: &str = "COINGECKO_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default)]
    pub funkit_api_key: String,
    #[serde(default)]
    pub coingecko_api_key: String,
    #[serde(default = "default_funkit_base_url")]
    pub funkit_base_url: String,
    #[serde(default = "default_coingecko_base_url")]
    pub coingecko_base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PollingConfig {
    /// Seconds between background refreshes of each price feed.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Grace period before a retry falls through to the secondary feed.
    #[serde(default = "default_retry_grace_ms")]
    pub retry_grace_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversionConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

fn default_funkit_base_url() -> String {
    DEFAULT_FUNKIT_BASE_URL.to_string()
}

fn default_coingecko_base_url() -> String {
    DEFAULT_COINGECKO_BASE_URL.to_string()
}

fn default_interval_secs() -> u64 {
    300
}

fn default_retry_grace_ms() -> u64 {
    2000
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            funkit_api_key: String::new(),
            coingecko_api_key: String::new(),
            funkit_base_url: default_funkit_base_url(),
            coingecko_base_url: default_coingecko_base_url(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            retry_grace_ms: default_retry_grace_ms(),
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn retry_grace(&self) -> Duration {
        Duration::from_millis(self.retry_grace_ms)
    }
}

impl ConversionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        fs::write(path, config_str)?;
        Ok(())
    }

    /// Defaults overlaid with the API keys found in the process environment (and `.env`).
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Environment keys win over keys read from a file.
    pub fn apply_env(&mut self) {
        if dotenv::dotenv().is_ok() {
            info!("Loaded environment from .env");
        }
        if let Ok(key) = std::env::var(FUNKIT_API_KEY_VAR) {
            self.api.funkit_api_key = key;
        }
        if let Ok(key) = std::env::var(COINGECKO_API_KEY_VAR) {
            self.api.coingecko_api_key = key;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.polling.interval_secs == 0 {
            return Err(Error::ConfigError("polling.interval_secs must be greater than zero".to_string()));
        }
        if self.conversion.debounce_ms == 0 {
            return Err(Error::ConfigError("conversion.debounce_ms must be greater than zero".to_string()));
        }
        if self.api.funkit_base_url.trim().is_empty() || self.api.coingecko_base_url.trim().is_empty() {
            return Err(Error::ConfigError("API base URLs cannot be empty".to_string()));
        }
        Ok(())
    }
}

//! Monitor configuration.
//!
//! Loaded once at startup from a TOML file; secrets may come from the
//! environment instead so the config file can be committed without them.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use vigil_core::{DomainConfig, Result, VigilError};

/// Environment variable fallback for the bot token
pub const ENV_BOT_TOKEN: &str = "VIGIL_TELEGRAM_BOT_TOKEN";

/// Environment variable fallback for the chat id
pub const ENV_CHAT_ID: &str = "VIGIL_TELEGRAM_CHAT_ID";

/// Process-wide monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between check cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// DNS-over-HTTPS endpoint base URL
    #[serde(default = "default_doh_url")]
    pub doh_url: String,

    /// Directory holding one JSON state file per domain
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Maximum concurrent domain checks per tick
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Alert channel settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Domains to monitor
    #[serde(default)]
    pub domains: Vec<DomainConfig>,
}

/// Telegram alert channel settings
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token; falls back to `VIGIL_TELEGRAM_BOT_TOKEN`
    pub bot_token: Option<String>,

    /// Chat id; falls back to `VIGIL_TELEGRAM_CHAT_ID`
    pub chat_id: Option<String>,

    /// Optional forum topic thread inside the chat
    pub topic_id: Option<i64>,

    /// API base URL, overridable for testing
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            topic_id: None,
            api_url: default_api_url(),
        }
    }
}

/// Resolved alert credentials after applying environment fallbacks
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Bot token
    pub bot_token: String,
    /// Chat id
    pub chat_id: String,
}

impl MonitorConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VigilError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            VigilError::Config(format!("cannot parse config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that a run can proceed at all: credentials resolvable, at least
    /// one domain, a sane interval
    pub fn validate(&self) -> Result<()> {
        self.credentials()?;
        if self.domains.is_empty() {
            return Err(VigilError::Config("no domains configured".into()));
        }
        if self.interval_secs == 0 {
            return Err(VigilError::Config("interval_secs must be positive".into()));
        }
        if self.concurrency == 0 {
            return Err(VigilError::Config("concurrency must be positive".into()));
        }
        Ok(())
    }

    /// Resolve alert credentials from the config file or the environment
    pub fn credentials(&self) -> Result<Credentials> {
        let bot_token = self
            .telegram
            .bot_token
            .clone()
            .or_else(|| std::env::var(ENV_BOT_TOKEN).ok())
            .ok_or_else(|| {
                VigilError::Config(format!(
                    "telegram bot token missing: set telegram.bot_token or {ENV_BOT_TOKEN}"
                ))
            })?;
        let chat_id = self
            .telegram
            .chat_id
            .clone()
            .or_else(|| std::env::var(ENV_CHAT_ID).ok())
            .ok_or_else(|| {
                VigilError::Config(format!(
                    "telegram chat id missing: set telegram.chat_id or {ENV_CHAT_ID}"
                ))
            })?;
        Ok(Credentials { bot_token, chat_id })
    }
}

// Default value functions for serde.
const fn default_interval_secs() -> u64 {
    300
}

fn default_doh_url() -> String {
    String::from("https://1.1.1.1")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}

const fn default_concurrency() -> usize {
    8
}

fn default_api_url() -> String {
    String::from("https://api.telegram.org")
}

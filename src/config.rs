use anyhow::{bail, Result};

const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
const API_BASE_VAR: &str = "BCN_API_BASE_URL";
const LOG_LEVEL_VAR: &str = "BCN_BOT_LOG_LEVEL";

#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token. Required; the process refuses to start without it.
    pub bot_token: String,
    /// Base URL of the BCN Art Compass backend.
    pub api_base_url: String,
    /// Log level name for the tracing filter (lowercased, validated).
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from a key lookup so tests don't touch process env.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup(TOKEN_VAR).unwrap_or_default();
        if bot_token.is_empty() {
            bail!("{TOKEN_VAR} is not set. Configure it in the environment or .env file.");
        }

        let api_base_url = lookup(API_BASE_VAR)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_api_base_url);

        let log_level = lookup(LOG_LEVEL_VAR)
            .map(|v| v.to_lowercase())
            .filter(|v| is_known_level(v))
            .unwrap_or_else(default_log_level);

        Ok(Config {
            bot_token,
            api_base_url,
            log_level,
        })
    }
}

fn is_known_level(name: &str) -> bool {
    matches!(name, "trace" | "debug" | "info" | "warn" | "error")
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono_tz::Tz;
use serde_json::json;

use crate::error::{AppError, AppResult};

pub const ENV_BIND_ADDRESS: &str = "FOCUSDAY_BIND_ADDRESS";
pub const ENV_DATA_DIR: &str = "FOCUSDAY_DATA_DIR";
pub const ENV_TIMEZONE: &str = "FOCUSDAY_TIMEZONE";
pub const ENV_AI_API_KEY: &str = "FOCUSDAY_AI_API_KEY";
pub const ENV_AI_BASE_URL: &str = "FOCUSDAY_AI_BASE_URL";
pub const ENV_AI_MODEL: &str = "FOCUSDAY_AI_MODEL";
pub const ENV_AI_TIMEOUT_SECS: &str = "FOCUSDAY_AI_TIMEOUT_SECS";

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8787";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_AI_BASE_URL: &str = "https://api.deepseek.com";
const DEFAULT_AI_MODEL: &str = "deepseek-chat";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

/// Settings for the text-generation provider.
#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub http_timeout: StdDuration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_AI_BASE_URL.to_string(),
            model: DEFAULT_AI_MODEL.to_string(),
            http_timeout: StdDuration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: SocketAddr,
    pub data_dir: PathBuf,
    /// `None` means the host's local zone.
    pub timezone: Option<Tz>,
    pub ai: AiConfig,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_raw = read(ENV_BIND_ADDRESS).unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let bind_address = bind_raw.parse::<SocketAddr>().map_err(|err| {
            AppError::validation_with_details(
                "invalid bind address",
                json!({ "key": ENV_BIND_ADDRESS, "value": bind_raw, "error": err.to_string() }),
            )
        })?;

        let data_dir = PathBuf::from(read(ENV_DATA_DIR).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let timezone = match read(ENV_TIMEZONE) {
            Some(name) => Some(name.parse::<Tz>().map_err(|_| {
                AppError::validation_with_details(
                    "invalid timezone",
                    json!({ "key": ENV_TIMEZONE, "value": name }),
                )
            })?),
            None => None,
        };

        let http_timeout = match read(ENV_AI_TIMEOUT_SECS) {
            Some(raw) => {
                let secs = raw.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or_else(|| {
                    AppError::validation_with_details(
                        "AI timeout must be a positive number of seconds",
                        json!({ "key": ENV_AI_TIMEOUT_SECS, "value": raw }),
                    )
                })?;
                StdDuration::from_secs(secs)
            }
            None => StdDuration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
        };

        let ai = AiConfig {
            api_key: read(ENV_AI_API_KEY),
            base_url: read(ENV_AI_BASE_URL)
                .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: read(ENV_AI_MODEL).unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            http_timeout,
        };

        Ok(Self {
            bind_address,
            data_dir,
            timezone,
            ai,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("focusday.sqlite")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8787");
        assert_eq!(config.database_path(), PathBuf::from("./data/focusday.sqlite"));
        assert!(config.timezone.is_none());
        assert_eq!(config.ai, AiConfig::default());
    }

    #[test]
    fn values_are_trimmed_and_blank_key_is_missing() {
        let config = config_from(&[
            (ENV_AI_API_KEY, "   "),
            (ENV_AI_BASE_URL, "http://localhost:9000/"),
            (ENV_TIMEZONE, "Europe/Berlin"),
            (ENV_AI_TIMEOUT_SECS, "5"),
        ])
        .unwrap();

        assert!(config.ai.api_key.is_none());
        assert_eq!(config.ai.base_url, "http://localhost:9000");
        assert_eq!(config.timezone, Some(chrono_tz::Europe::Berlin));
        assert_eq!(config.ai.http_timeout, StdDuration::from_secs(5));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config_from(&[(ENV_TIMEZONE, "Mars/Olympus")]).is_err());
        assert!(config_from(&[(ENV_BIND_ADDRESS, "localhost")]).is_err());
        assert!(config_from(&[(ENV_AI_TIMEOUT_SECS, "0")]).is_err());
    }
}

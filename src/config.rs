//! Configuration management

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.testingbot.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const KEY_VARS: &[&str] = &["TESTINGBOT_KEY", "TB_KEY", "TESTINGBOT_USERNAME"];
const SECRET_VARS: &[&str] = &["TESTINGBOT_SECRET", "TB_SECRET", "TESTINGBOT_ACCESS_KEY"];

/// Server configuration
#[derive(Clone)]
pub struct Config {
    /// TestingBot API key
    pub api_key: String,

    /// TestingBot API secret
    pub api_secret: String,

    /// REST API base URL, without trailing slash
    pub api_url: String,

    /// HTTP timeout for every API call
    pub request_timeout: Duration,

    /// Mirror logs into `logs/debug.log`
    pub debug_to_file: bool,

    /// Log filter directive (`LOG_LEVEL`, then `RUST_LOG`)
    pub log_level: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("request_timeout", &self.request_timeout)
            .field("debug_to_file", &self.debug_to_file)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_set = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.trim().is_empty())
        };

        let (Some(api_key), Some(api_secret)) = (first_set(KEY_VARS), first_set(SECRET_VARS))
        else {
            return Err(ConfigError::MissingCredentials);
        };

        let api_url = lookup("TESTINGBOT_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        validate_api_url(&api_url)?;

        let request_timeout = match lookup("TESTINGBOT_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let debug_to_file = lookup("TESTINGBOT_DEBUG")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let log_level = lookup("LOG_LEVEL").or_else(|| lookup("RUST_LOG"));

        Ok(Self {
            api_key,
            api_secret,
            api_url: api_url.trim_end_matches('/').to_string(),
            request_timeout,
            debug_to_file,
            log_level,
        })
    }

    /// Default log filter when none is configured
    pub fn default_log_level(&self) -> &'static str {
        if self.debug_to_file {
            "info"
        } else {
            "error"
        }
    }

    /// Debug log location, relative to the working directory
    pub fn debug_log_path(&self) -> PathBuf {
        PathBuf::from("logs").join("debug.log")
    }
}

fn validate_api_url(raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidApiUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(&format!("unsupported scheme '{}'", other))),
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    Ok(())
}

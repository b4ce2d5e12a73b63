//! Runtime configuration
//!
//! Everything is read from `FWD_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::insights::{DayClock, OffsetError, DEFAULT_WINDOW_DAYS};

pub use crate::insights::MAX_WINDOW_DAYS;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_ANALYZER_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANALYZER_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANALYZER_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: {source}")]
    Timezone {
        var: &'static str,
        #[source]
        source: OffsetError,
    },

    #[error("{var}: expected {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub clock: DayClock,
    pub correlation_window_days: u32,
    pub cache_ttl: Duration,
    pub analyzer_url: String,
    pub analyzer_model: String,
    pub analyzer_api_key: Option<String>,
    pub analyzer_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let clock = match var("FWD_TIMEZONE") {
            Some(tz) if tz.eq_ignore_ascii_case("local") => DayClock::local(),
            Some(tz) => DayClock::from_offset_str(&tz).map_err(|source| ConfigError::Timezone {
                var: "FWD_TIMEZONE",
                source,
            })?,
            None => DayClock::local(),
        };

        let correlation_window_days = match var("FWD_CORRELATION_WINDOW_DAYS") {
            Some(raw) => parse_window(&raw).ok_or(ConfigError::Invalid {
                var: "FWD_CORRELATION_WINDOW_DAYS",
                expected: "an integer from 1 to 14",
                value: raw,
            })?,
            None => DEFAULT_WINDOW_DAYS,
        };

        let cache_ttl = parse_secs(var("FWD_CACHE_TTL_SECS"), "FWD_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        let analyzer_timeout = parse_secs(
            var("FWD_ANALYZER_TIMEOUT_SECS"),
            "FWD_ANALYZER_TIMEOUT_SECS",
            DEFAULT_ANALYZER_TIMEOUT_SECS,
        )?;

        Ok(Self {
            database_path: var("FWD_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            clock,
            correlation_window_days,
            cache_ttl,
            analyzer_url: var("FWD_ANALYZER_URL").unwrap_or_else(|| DEFAULT_ANALYZER_URL.to_string()),
            analyzer_model: var("FWD_ANALYZER_MODEL").unwrap_or_else(|| DEFAULT_ANALYZER_MODEL.to_string()),
            analyzer_api_key: var("FWD_ANALYZER_API_KEY"),
            analyzer_timeout,
        })
    }
}

/// Window length accepted from configuration or a tool call
pub fn parse_window(raw: &str) -> Option<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|days| (1..=MAX_WINDOW_DAYS).contains(days))
}

fn parse_secs(raw: Option<String>, var: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match raw {
        Some(value) => value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid {
                var,
                expected: "a number of seconds",
                value,
            }),
        None => Ok(Duration::from_secs(default)),
    }
}

/// `data/fwd.db` next to the project root when running from target/, else
/// next to the executable
fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("fwd.db");
    path
}

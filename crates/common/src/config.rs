use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be within {range}, got {value}")]
    OutOfRange {
        key: &'static str,
        range: &'static str,
        value: String,
    },
}

/// Signal feed timing. The probability is checked once per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub interval: Duration,
    pub emit_probability: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            emit_probability: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_folder: PathBuf,
    pub ai: AiConfig,
    pub feed: FeedConfig,
    pub toast_duration: Duration,
    /// Maximum number of signals kept. `None` keeps everything.
    pub signal_retention: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_folder: PathBuf::from("."),
            ai: AiConfig::default(),
            feed: FeedConfig::default(),
            toast_duration: Duration::from_secs(3),
            signal_retention: Some(500),
        }
    }
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_folder = get("WORKDIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_folder);

        let ai = AiConfig {
            api_key: get("GEMINI_API_KEY"),
            model: get("GEMINI_MODEL").unwrap_or(defaults.ai.model),
            base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.ai.base_url),
        };

        let interval_secs: u64 = parse_or(
            "SIGNAL_INTERVAL_SECS",
            get("SIGNAL_INTERVAL_SECS"),
            defaults.feed.interval.as_secs(),
        )?;
        if interval_secs == 0 {
            return Err(ConfigError::OutOfRange {
                key: "SIGNAL_INTERVAL_SECS",
                range: "1..",
                value: interval_secs.to_string(),
            });
        }

        let emit_probability: f64 = parse_or(
            "SIGNAL_PROBABILITY",
            get("SIGNAL_PROBABILITY"),
            defaults.feed.emit_probability,
        )?;
        if !(0.0..=1.0).contains(&emit_probability) {
            return Err(ConfigError::OutOfRange {
                key: "SIGNAL_PROBABILITY",
                range: "0.0..=1.0",
                value: emit_probability.to_string(),
            });
        }

        let toast_secs: u64 = parse_or(
            "TOAST_SECS",
            get("TOAST_SECS"),
            defaults.toast_duration.as_secs(),
        )?;

        let retention: usize = parse_or(
            "SIGNAL_RETENTION",
            get("SIGNAL_RETENTION"),
            defaults.signal_retention.unwrap_or(0),
        )?;

        Ok(Self {
            data_folder,
            ai,
            feed: FeedConfig {
                interval: Duration::from_secs(interval_secs),
                emit_probability,
            },
            toast_duration: Duration::from_secs(toast_secs),
            signal_retention: (retention > 0).then_some(retention),
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_folder.join("sqlitedata").join("terminal.db")
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}

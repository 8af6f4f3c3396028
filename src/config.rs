//! Runtime settings and provider credentials.
//!
//! Credentials come from the command line or the environment (see
//! [`crate::cli::Cli`]), and the environment may be seeded from a `.env`
//! file with [`load_dotenv`]. Everything else has a built-in default and can be
//! overridden with an optional YAML file passed via `--config`:
//!
//! ```yaml
//! news:
//!   page_size: 20
//!   top_n: 5
//! chat:
//!   model: deepseek-chat
//!   temperature: 0.3
//! schedule:
//!   at: "07:30"
//! ```
//!
//! Sections and fields that are left out keep their defaults.

use crate::error::ConfigError;
use chrono::NaiveTime;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_NEWS_QUERY: &str = "(\"artificial intelligence\" OR \"machine learning\" OR \"ChatGPT\" OR \"OpenAI\" OR \"Google Gemini\") AND (technology OR innovation OR research)";

/// All tunable, non-secret settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub news: NewsSettings,
    pub chat: ChatSettings,
    pub linkedin: LinkedInSettings,
    pub http: HttpSettings,
    pub schedule: ScheduleSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    pub endpoint: String,
    pub query: String,
    pub language: String,
    pub page_size: u32,
    /// Articles kept after filtering.
    pub top_n: usize,
    /// Case-insensitive title keywords that disqualify an article.
    pub exclusions: Vec<String>,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://newsapi.org/v2/everything".to_string(),
            query: DEFAULT_NEWS_QUERY.to_string(),
            language: "en".to_string(),
            page_size: 10,
            top_n: 3,
            exclusions: ["stock", "nasdaq", "nyse", "shares", "market"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.deepseek.com/v1/chat/completions".to_string(),
            model: "deepseek-chat".to_string(),
            temperature: 0.5,
            max_tokens: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkedInSettings {
    /// Base URL of the LinkedIn REST API; `v2/ugcPosts` etc. are joined onto it.
    pub api_base: String,
}

impl Default for LinkedInSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.linkedin.com/".to_string(),
        }
    }
}

/// Shared transport policy applied to every outbound call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_secs: 30,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Daily fire time, `HH:MM` in UTC.
    pub at: String,
    pub poll_interval_secs: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            at: "09:00".to_string(),
            poll_interval_secs: 60,
        }
    }
}

impl ScheduleSettings {
    pub fn fire_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(self.at.trim(), "%H:%M")
            .map_err(|_| ConfigError::ScheduleTime(self.at.clone()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Settings {
    /// Load settings from a YAML file, or use the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No settings file given; using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(Path::new(path)).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let settings = Self::from_yaml(&raw)?;
        info!(path, "Loaded settings file");
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes to `null`, which should mean "all defaults".
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(raw)?;
        settings.schedule.fire_time()?;
        url::Url::parse(&settings.news.endpoint)?;
        url::Url::parse(&settings.chat.endpoint)?;
        url::Url::parse(&settings.linkedin.api_base)?;
        Ok(settings)
    }
}

/// A secret value that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Load `KEY=value` pairs from a dotenv file into the process environment.
///
/// With no `path`, looks for `.env` in the working directory and its
/// parents. Variables that are already set keep their values. Returns the
/// file that was loaded, if any.
pub fn load_dotenv(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|_| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

/// Require a non-blank value for the setting named `name`.
pub fn require(name: &'static str, value: Option<&str>) -> Result<Secret, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(Secret(v.to_string())),
        _ => Err(ConfigError::Missing(name)),
    }
}

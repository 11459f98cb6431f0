//! xrepl.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::TaskId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XreplConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Platform base URL, e.g. `http://127.0.0.1:9000`.
    pub base_url: String,
    pub customer_id: String,
    pub api_token: Option<String>,
    /// Per-request timeout (e.g., "10s").
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
}

/// How the task poller paces its status queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between status queries (e.g., "1s").
    #[serde(default = "default_poll_interval")]
    pub interval: String,
    /// Backoff cap after transient query errors (e.g., "30s").
    #[serde(default = "default_max_backoff")]
    pub max_backoff: String,
    /// Status queries before giving up watching.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_request_timeout() -> String {
    "10s".to_string()
}

fn default_poll_interval() -> String {
    "1s".to_string()
}

fn default_max_backoff() -> String {
    "30s".to_string()
}

fn default_max_attempts() -> u32 {
    600
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            max_backoff: default_max_backoff(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        parse_duration(&self.interval).unwrap_or(Duration::from_secs(1))
    }

    pub fn max_backoff(&self) -> Duration {
        parse_duration(&self.max_backoff).unwrap_or(Duration::from_secs(30))
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        parse_duration(&self.request_timeout).unwrap_or(Duration::from_secs(10))
    }

    /// Operator-facing link to a task's details page.
    pub fn task_link(&self, task_id: &TaskId) -> String {
        format!("{}/tasks/{task_id}", self.base_url.trim_end_matches('/'))
    }
}

impl XreplConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Minimal config pointing at `base_url`, all other fields defaulted.
    pub fn new(base_url: &str, customer_id: &str) -> Self {
        XreplConfig {
            api: ApiConfig {
                base_url: base_url.to_string(),
                customer_id: customer_id.to_string(),
                api_token: None,
                request_timeout: default_request_timeout(),
            },
            poll: PollConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.base_url.starts_with("http://") {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must be an http:// URL, got {:?}",
                self.api.base_url
            )));
        }
        if self.api.customer_id.is_empty() {
            return Err(ConfigError::Invalid("api.customer_id is empty".to_string()));
        }
        for (field, value) in [
            ("api.request_timeout", &self.api.request_timeout),
            ("poll.interval", &self.poll.interval),
            ("poll.max_backoff", &self.poll.max_backoff),
        ] {
            if parse_duration(value).is_none() {
                return Err(ConfigError::Invalid(format!("{field}: bad duration {value:?}")));
            }
        }
        if self.poll.max_attempts == 0 {
            return Err(ConfigError::Invalid("poll.max_attempts must be > 0".to_string()));
        }
        Ok(())
    }
}

impl std::str::FromStr for XreplConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: XreplConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

/// Parse a duration string: "500ms", "5s", "2m", or bare seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (value, unit) = s.split_at(split);
    let value: u64 = value.parse().ok()?;
    match unit.trim() {
        "ms" => Some(Duration::from_millis(value)),
        "" | "s" => Some(Duration::from_secs(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        _ => None,
    }
}

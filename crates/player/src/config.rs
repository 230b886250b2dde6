//! Player configuration.

use std::time::Duration;

pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000";
/// Pause between a passing reply and the switch to the next level.
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(5000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    pub proxy_base_url: String,
    pub advance_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            proxy_base_url: DEFAULT_PROXY_URL.to_string(),
            advance_delay: DEFAULT_ADVANCE_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl PlayerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let number = |key: &str| non_blank(key).and_then(|value| value.parse::<u64>().ok());

        Self {
            proxy_base_url: non_blank("LEVELUP_PROXY_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.proxy_base_url),
            advance_delay: number("LEVELUP_ADVANCE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.advance_delay),
            request_timeout: number("LEVELUP_REQUEST_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }
}

//! Proxy configuration, read from the environment at startup.

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Base URL of the game API. `None` when `GAME_API_URL` is unset or blank;
    /// every upstream route then answers with a configuration error.
    pub game_api_url: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub turn_timeout: Duration,
    pub catalog_timeout: Duration,
    /// `*` or a comma separated origin list. CORS is off when `None`.
    pub cors_allowed_origins: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            game_api_url: None,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            catalog_timeout: DEFAULT_CATALOG_TIMEOUT,
            cors_allowed_origins: None,
        }
    }
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let server_port = non_blank("SERVER_PORT")
            .or_else(|| non_blank("PORT"))
            .and_then(|port| match port.parse() {
                Ok(port) => Some(port),
                Err(_) => {
                    tracing::warn!(port = %port, "Ignoring invalid server port");
                    None
                }
            })
            .unwrap_or(DEFAULT_SERVER_PORT);

        Self {
            game_api_url: non_blank("GAME_API_URL"),
            server_host: non_blank("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.into()),
            server_port,
            turn_timeout: seconds(non_blank("GAME_API_TIMEOUT_SECS"), DEFAULT_TURN_TIMEOUT),
            catalog_timeout: seconds(non_blank("CATALOG_TIMEOUT_SECS"), DEFAULT_CATALOG_TIMEOUT),
            cors_allowed_origins: non_blank("CORS_ALLOWED_ORIGINS"),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// CORS layer for `cors_allowed_origins`. `None` when unset or when no
    /// listed origin is a valid header value.
    pub fn cors_layer(&self) -> Option<CorsLayer> {
        let allowed_origins = self.cors_allowed_origins.as_deref()?;

        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);

        if allowed_origins == "*" {
            return Some(cors.allow_origin(Any));
        }

        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| match HeaderValue::from_str(s) {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!(origin = %s.escape_debug(), "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        if origins.is_empty() {
            return None;
        }

        Some(cors.allow_origin(origins))
    }
}

fn seconds(value: Option<String>, default: Duration) -> Duration {
    match value.map(|v| v.parse::<u64>()) {
        Some(Ok(secs)) if secs > 0 => Duration::from_secs(secs),
        Some(_) => {
            tracing::warn!(default_secs = default.as_secs(), "Ignoring invalid timeout");
            default
        }
        None => default,
    }
}

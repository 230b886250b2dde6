//! Raw API Port - Object-safe HTTP boundary to the proxy
//!
//! Paths are relative to the proxy base URL (`/api/games`, ...). Services
//! decode the returned JSON themselves.

use serde_json::Value;

use super::ApiError;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RawApiPort: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError>;
}

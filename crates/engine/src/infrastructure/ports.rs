//! Port traits for infrastructure boundaries.
//!
//! The game API is the only external system the proxy talks to. Catalog
//! calls hand back raw JSON because the API is loose about catalog shapes;
//! normalization happens in the use cases.

use async_trait::async_trait;
use serde_json::Value;

use levelup_domain::Role;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameApiError {
    #[error("GAME_API_URL environment variable is not configured")]
    NotConfigured,
    #[error("GAME_API_URL is not a valid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Game API returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("Game API request timed out")]
    Timeout,
    #[error("Game API request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response from game API: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// Turn Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTurnMessage {
    pub role: Role,
    pub content: String,
}

impl GameTurnMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One turn forwarded to `POST /api/v1/games/{game}/{level}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTurnRequest {
    pub game: String,
    pub level_id: String,
    /// Prior turns, oldest first. Does not contain `message`.
    pub history: Vec<GameTurnMessage>,
    pub message: String,
}

/// What the game said back: the full conversation plus the verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTurnResult {
    pub messages: Vec<GameTurnMessage>,
    pub passed: bool,
    pub pass_rationale: String,
}

// =============================================================================
// Game API Port
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameApiPort: Send + Sync {
    /// Raw game catalog.
    async fn list_games(&self) -> Result<Value, GameApiError>;

    /// Raw level catalog of `game`.
    async fn list_levels(&self, game: &str) -> Result<Value, GameApiError>;

    async fn play_turn(&self, request: GameTurnRequest) -> Result<GameTurnResult, GameApiError>;
}

//! Game and level catalog use cases.

use std::sync::Arc;

use levelup_domain::{Game, Level};
use levelup_shared::{parse_games, parse_levels, ShapeError};

use crate::infrastructure::ports::{GameApiError, GameApiPort};

/// Game whose levels are listed when the caller does not name one.
pub const DEFAULT_GAME: &str = "password";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    GameApi(#[from] GameApiError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Container for catalog use cases.
pub struct CatalogUseCases {
    pub list_games: Arc<ListGames>,
    pub list_levels: Arc<ListLevels>,
}

impl CatalogUseCases {
    pub fn new(game_api: Arc<dyn GameApiPort>) -> Self {
        Self {
            list_games: Arc::new(ListGames::new(game_api.clone())),
            list_levels: Arc::new(ListLevels::new(game_api)),
        }
    }
}

pub struct ListGames {
    game_api: Arc<dyn GameApiPort>,
}

impl ListGames {
    pub fn new(game_api: Arc<dyn GameApiPort>) -> Self {
        Self { game_api }
    }

    pub async fn execute(&self) -> Result<Vec<Game>, CatalogError> {
        let raw = self.game_api.list_games().await?;
        let games = parse_games(&raw)?;
        tracing::info!(count = games.len(), "Fetched game catalog");
        Ok(games)
    }
}

pub struct ListLevels {
    game_api: Arc<dyn GameApiPort>,
}

impl ListLevels {
    pub fn new(game_api: Arc<dyn GameApiPort>) -> Self {
        Self { game_api }
    }

    /// Levels of `game`, or of [`DEFAULT_GAME`] when `game` is blank.
    pub async fn execute(&self, game: Option<&str>) -> Result<Vec<Level>, CatalogError> {
        let game = game
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_GAME);

        let raw = self.game_api.list_levels(game).await?;
        let levels = parse_levels(&raw)?;
        tracing::info!(game = %game, count = levels.len(), "Fetched level catalog");
        Ok(levels)
    }
}

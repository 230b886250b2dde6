//! Catalog Service - game and level lists from the proxy

use std::sync::Arc;

use url::form_urlencoded;

use levelup_domain::{Game, LevelCatalog};
use levelup_shared::{parse_games, parse_levels};

use crate::ports::outbound::{ApiError, RawApiPort};

#[derive(Clone)]
pub struct CatalogService {
    api: Arc<dyn RawApiPort>,
}

impl CatalogService {
    pub fn new(api: Arc<dyn RawApiPort>) -> Self {
        Self { api }
    }

    pub async fn list_games(&self) -> Result<Vec<Game>, ApiError> {
        let value = self.api.get_json("/api/games").await?;
        parse_games(&value).map_err(|e| ApiError::Shape(e.to_string()))
    }

    /// Level catalog of `game`, in the order the game API returned it.
    pub async fn list_levels(&self, game: &str) -> Result<LevelCatalog, ApiError> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("gameName", game)
            .finish();
        let value = self.api.get_json(&format!("/api/levels?{query}")).await?;
        let levels = parse_levels(&value).map_err(|e| ApiError::Shape(e.to_string()))?;
        Ok(LevelCatalog::new(game, levels))
    }
}

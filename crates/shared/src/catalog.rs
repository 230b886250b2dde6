//! Game and level catalogs
//!
//! The game API is loose about its catalog shapes: the list may be a bare
//! array or wrapped in `{games|levels: [...]}` / `{data: [...]}`, and level
//! entries use several spellings for the same field. [`parse_games`] and
//! [`parse_levels`] accept all of them and apply these defaults (index `i` is
//! the zero-based position in the list):
//!
//! | Level field     | Sources, first non-empty wins            | Default        |
//! |-----------------|------------------------------------------|----------------|
//! | `id`            | `id`, `_id`                              | `level-{i}`    |
//! | `name`          | `name`, `title`                          | `Level {i+1}`  |
//! | `difficulty`    | `difficulty`, `level`                    | absent         |
//! | `userObjective` | `userObjective`, `objective`, `description` | absent      |
//! | `helpContent`   | `helpContent`, `help`                    | absent         |
//!
//! Games need a `name`; `description` defaults to the name and `endpoint` to
//! the empty string. Numeric values are rendered as strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use levelup_domain::{Game, Level};

/// Raw catalog JSON did not have a usable shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("Invalid response format: expected array of {0}")]
    NotAList(&'static str),
    #[error("Invalid {kind} entry at index {index}: {reason}")]
    InvalidEntry {
        kind: &'static str,
        index: usize,
        reason: String,
    },
}

// =============================================================================
// Wire DTOs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDto {
    pub name: String,
    pub description: String,
    pub endpoint: String,
}

impl From<&Game> for GameDto {
    fn from(game: &Game) -> Self {
        Self {
            name: game.name().to_string(),
            description: game.description().to_string(),
            endpoint: game.endpoint().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDto {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_content: Option<String>,
}

impl From<&Level> for LevelDto {
    fn from(level: &Level) -> Self {
        Self {
            id: level.id().to_string(),
            name: level.name().to_string(),
            difficulty: level.difficulty().map(str::to_string),
            user_objective: level.user_objective().map(str::to_string),
            help_content: level.help_content().map(str::to_string),
        }
    }
}

/// `GET /api/games` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamesResponse {
    pub games: Vec<GameDto>,
}

impl GamesResponse {
    pub fn from_games(games: &[Game]) -> Self {
        Self {
            games: games.iter().map(GameDto::from).collect(),
        }
    }
}

/// `GET /api/levels` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelsResponse {
    pub levels: Vec<LevelDto>,
}

impl LevelsResponse {
    pub fn from_levels(levels: &[Level]) -> Self {
        Self {
            levels: levels.iter().map(LevelDto::from).collect(),
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse a raw game catalog.
pub fn parse_games(raw: &Value) -> Result<Vec<Game>, ShapeError> {
    let entries = extract_list(raw, "games").ok_or(ShapeError::NotAList("games"))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let invalid = |reason: String| ShapeError::InvalidEntry {
                kind: "game",
                index,
                reason,
            };
            if !entry.is_object() {
                return Err(invalid("expected object".to_string()));
            }
            let name =
                text_field(entry, &["name"]).ok_or_else(|| invalid("missing name".to_string()))?;
            let description = text_field(entry, &["description"]).unwrap_or_else(|| name.clone());
            let endpoint = text_field(entry, &["endpoint"]).unwrap_or_default();
            Game::new(name, description, endpoint).map_err(|e| invalid(e.to_string()))
        })
        .collect()
}

/// Parse a raw level catalog, keeping the API's order.
pub fn parse_levels(raw: &Value) -> Result<Vec<Level>, ShapeError> {
    let entries = extract_list(raw, "levels").ok_or(ShapeError::NotAList("levels"))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            if !entry.is_object() {
                return Err(ShapeError::InvalidEntry {
                    kind: "level",
                    index,
                    reason: "expected object".to_string(),
                });
            }
            let id = text_field(entry, &["id", "_id"]).unwrap_or_else(|| format!("level-{index}"));
            let name = text_field(entry, &["name", "title"])
                .unwrap_or_else(|| format!("Level {}", index + 1));

            let mut level = Level::new(id, name);
            if let Some(difficulty) = text_field(entry, &["difficulty", "level"]) {
                level = level.with_difficulty(difficulty);
            }
            if let Some(objective) =
                text_field(entry, &["userObjective", "objective", "description"])
            {
                level = level.with_user_objective(objective);
            }
            if let Some(help) = text_field(entry, &["helpContent", "help"]) {
                level = level.with_help_content(help);
            }
            Ok(level)
        })
        .collect()
}

fn extract_list<'a>(raw: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    raw.as_array()
        .or_else(|| raw.get(key).and_then(Value::as_array))
        .or_else(|| raw.get("data").and_then(Value::as_array))
}

/// First non-empty string or number among `keys`.
fn text_field(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match entry.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

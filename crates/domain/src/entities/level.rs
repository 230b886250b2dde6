//! Level entity and the ordered level catalog of a game

use serde::{Deserialize, Serialize};

use crate::ids::LevelId;

/// One level of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    id: LevelId,
    name: String,
    difficulty: Option<String>,
    user_objective: Option<String>,
    help_content: Option<String>,
}

impl Level {
    pub fn new(id: impl Into<LevelId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            difficulty: None,
            user_objective: None,
            help_content: None,
        }
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    pub fn with_user_objective(mut self, objective: impl Into<String>) -> Self {
        self.user_objective = Some(objective.into());
        self
    }

    pub fn with_help_content(mut self, help: impl Into<String>) -> Self {
        self.help_content = Some(help.into());
        self
    }

    #[inline]
    pub fn id(&self) -> &LevelId {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn difficulty(&self) -> Option<&str> {
        self.difficulty.as_deref()
    }

    pub fn user_objective(&self) -> Option<&str> {
        self.user_objective.as_deref()
    }

    pub fn help_content(&self) -> Option<&str> {
        self.help_content.as_deref()
    }
}

/// Ordered level list of one game.
///
/// # Invariants
///
/// - Order is the order the game API returned; advancement is by position.
/// - Every level in the catalog belongs to `game_name`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelCatalog {
    game_name: String,
    levels: Vec<Level>,
}

impl LevelCatalog {
    pub fn new(game_name: impl Into<String>, levels: Vec<Level>) -> Self {
        Self {
            game_name: game_name.into(),
            levels,
        }
    }

    /// An empty catalog for a game whose levels have not been fetched yet.
    pub fn pending(game_name: impl Into<String>) -> Self {
        Self::new(game_name, Vec::new())
    }

    #[inline]
    pub fn game_name(&self) -> &str {
        &self.game_name
    }

    #[inline]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Level> {
        self.levels.get(position)
    }

    /// Position of the first level carrying `id`.
    pub fn position(&self, id: &LevelId) -> Option<usize> {
        self.levels.iter().position(|level| level.id() == id)
    }

    /// Position of the level that follows `position`, if any.
    pub fn next_position(&self, position: usize) -> Option<usize> {
        let next = position.checked_add(1)?;
        (next < self.levels.len()).then_some(next)
    }
}

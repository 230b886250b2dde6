//! Game entity

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A playable game offered by the game API.
///
/// Identified by `name`; immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    name: String,
    description: String,
    endpoint: String,
}

impl Game {
    /// Create a game. The name must be non-empty after trimming.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Game name cannot be empty"));
        }
        Ok(Self {
            name,
            description: description.into(),
            endpoint: endpoint.into(),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

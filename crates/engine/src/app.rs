//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::ports::GameApiPort;
use crate::use_cases::{CatalogUseCases, PlayTurn};

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub catalog: CatalogUseCases,
    pub play_turn: Arc<PlayTurn>,
}

impl App {
    pub fn new(game_api: Arc<dyn GameApiPort>) -> Self {
        Self {
            use_cases: UseCases {
                catalog: CatalogUseCases::new(game_api.clone()),
                play_turn: Arc::new(PlayTurn::new(game_api)),
            },
        }
    }
}

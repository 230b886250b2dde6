//! Use cases - the three things the proxy does.
//!
//! Catalog listing normalizes whatever shape the game API returns; turn
//! forwarding validates the inbound body and reshapes the reply.

pub mod catalog;
pub mod play_turn;

pub use catalog::{CatalogError, CatalogUseCases, ListGames, ListLevels, DEFAULT_GAME};
pub use play_turn::{PlayTurn, PlayTurnError};

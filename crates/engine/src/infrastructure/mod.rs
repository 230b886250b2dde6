//! Infrastructure - the game API port and its HTTP adapter.

pub mod game_api;
pub mod ports;

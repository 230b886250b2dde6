//! LevelUp Shared - wire types for proxy and client communication
//!
//! This crate contains everything both sides of `/api/*` agree on:
//! - Catalog DTOs and the total parsing functions for raw catalog JSON
//! - Chat exchange request/response bodies
//! - The JSON error body
//!
//! # Design Principles
//!
//! 1. **No business logic** - Pure data types, serialization and boundary parsing
//! 2. **One parsing rule per record** - raw external shapes are normalized here
//!    and nowhere else

pub mod catalog;
pub mod chat;
pub mod error;

pub use catalog::{
    parse_games, parse_levels, GameDto, GamesResponse, LevelDto, LevelsResponse, ShapeError,
};
pub use chat::{ChatReply, ChatReplyMessage, ChatRequest, ChatRole, HistoryMessage, LevelRef};
pub use error::ErrorBody;

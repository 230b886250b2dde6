//! Aggregate roots - domain objects that own their related data
//!
//! Each aggregate:
//! - Owns all its constituent parts (enforced by Rust ownership)
//! - Exposes behavior through methods, not public fields
//! - Returns outcome enums from mutations instead of performing side effects

pub mod conversation;
pub mod progression;

pub use conversation::Conversation;
pub use progression::{
    AdvanceTicket, Advancement, ExchangeDraft, ExchangeReply, ExchangeResolution, Progression,
    ProgressionError, ProgressionPhase, ReplyMessage, NO_OBJECTIVE_TEXT,
};

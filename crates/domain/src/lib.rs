pub mod aggregates;
pub mod entities;
pub mod error;
pub mod ids;

pub use aggregates::{
    AdvanceTicket, Advancement, Conversation, ExchangeDraft, ExchangeReply, ExchangeResolution,
    Progression, ProgressionError, ProgressionPhase, ReplyMessage, NO_OBJECTIVE_TEXT,
};
pub use entities::{Game, Level, LevelCatalog, Role, Turn};
pub use error::DomainError;
pub use ids::{ConversationId, LevelId, TurnId};

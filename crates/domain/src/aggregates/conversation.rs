//! Conversation aggregate - the append-only turn log of one (game, level) pair

use serde::{Deserialize, Serialize};

use crate::entities::Turn;
use crate::ids::ConversationId;

/// Ordered sequence of turns.
///
/// # Invariants
///
/// - Turns are only ever appended; order is insertion order.
/// - `reset` is the only way to shrink it, and it also issues a new id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: ConversationId::new(),
            turns: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> ConversationId {
        self.id
    }

    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Drop every turn and start a new conversation.
    pub fn reset(&mut self) {
        self.id = ConversationId::new();
        self.turns.clear();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

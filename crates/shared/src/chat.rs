//! Chat exchange bodies for `POST /api/chat`

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use levelup_domain::{ExchangeDraft, ExchangeReply, ReplyMessage, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl From<Role> for ChatRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
        }
    }
}

impl From<ChatRole> for Role {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => Role::User,
            ChatRole::Assistant => Role::Assistant,
        }
    }
}

/// One prior turn sent along with a new message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct HistoryMessage {
    #[validate(length(min = 1, message = "history id cannot be empty"))]
    pub id: String,
    pub content: String,
    pub role: ChatRole,
}

/// Level identifier as sent by clients: either a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelRef {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for LevelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelRef::Text(text) => f.write_str(text),
            LevelRef::Number(number) => write!(f, "{number}"),
        }
    }
}

fn validate_level_ref(level: &LevelRef) -> Result<(), ValidationError> {
    match level {
        LevelRef::Text(text) if text.trim().is_empty() => {
            Err(ValidationError::new("level_id_empty"))
        }
        _ => Ok(()),
    }
}

/// `POST /api/chat` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Conversation identifier.
    #[validate(length(min = 1, message = "id cannot be empty"))]
    pub id: String,
    /// Turns before `message`, oldest first.
    #[serde(default)]
    #[validate(nested)]
    pub history: Vec<HistoryMessage>,
    #[validate(length(min = 1, max = 2000, message = "message must be 1-2000 characters"))]
    pub message: String,
    #[validate(custom(function = "validate_level_ref"))]
    pub level_id: LevelRef,
    #[validate(length(min = 1, message = "game cannot be empty"))]
    pub game: String,
}

impl ChatRequest {
    pub fn from_draft(draft: &ExchangeDraft) -> Self {
        Self {
            id: draft.conversation_id().to_string(),
            history: draft
                .history()
                .iter()
                .map(|turn| HistoryMessage {
                    id: turn.id().to_string(),
                    content: turn.text().to_string(),
                    role: turn.role().into(),
                })
                .collect(),
            message: draft.message().to_string(),
            level_id: LevelRef::Text(draft.level_id().to_string()),
            game: draft.game_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReplyMessage {
    pub role: ChatRole,
    pub content: String,
}

/// `POST /api/chat` response body.
///
/// `messages` repeats the whole conversation followed by the new turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub messages: Vec<ChatReplyMessage>,
    #[serde(default)]
    pub passed: bool,
    #[serde(default)]
    pub pass_rationale: String,
    #[serde(default)]
    pub error: bool,
}

impl ChatReply {
    pub fn into_exchange_reply(self) -> ExchangeReply {
        ExchangeReply {
            messages: self
                .messages
                .into_iter()
                .map(|message| ReplyMessage::new(message.role.into(), message.content))
                .collect(),
            passed: self.passed,
            rationale: self.pass_rationale,
        }
    }
}

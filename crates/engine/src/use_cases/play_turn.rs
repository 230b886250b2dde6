//! Forward one chat turn to the game API.

use std::sync::Arc;

use validator::Validate;

use levelup_shared::{ChatReply, ChatReplyMessage, ChatRequest};

use crate::infrastructure::ports::{GameApiError, GameApiPort, GameTurnMessage, GameTurnRequest};

#[derive(Debug, thiserror::Error)]
pub enum PlayTurnError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    GameApi(#[from] GameApiError),
}

pub struct PlayTurn {
    game_api: Arc<dyn GameApiPort>,
}

impl PlayTurn {
    pub fn new(game_api: Arc<dyn GameApiPort>) -> Self {
        Self { game_api }
    }

    pub async fn execute(&self, request: ChatRequest) -> Result<ChatReply, PlayTurnError> {
        request
            .validate()
            .map_err(|e| PlayTurnError::Validation(e.to_string()))?;

        let turn = GameTurnRequest {
            game: request.game,
            level_id: request.level_id.to_string(),
            history: request
                .history
                .into_iter()
                .map(|message| GameTurnMessage::new(message.role.into(), message.content))
                .collect(),
            message: request.message,
        };

        tracing::info!(
            conversation_id = %request.id,
            game = %turn.game,
            level_id = %turn.level_id,
            history_len = turn.history.len(),
            "Playing turn"
        );

        let result = self.game_api.play_turn(turn).await?;

        if result.passed {
            tracing::info!(conversation_id = %request.id, "Level passed");
        }

        Ok(ChatReply {
            messages: result
                .messages
                .into_iter()
                .map(|message| ChatReplyMessage {
                    role: message.role.into(),
                    content: message.content,
                })
                .collect(),
            passed: result.passed,
            pass_rationale: result.pass_rationale,
            error: false,
        })
    }
}

//! Progression Controller - drives one mounted chat
//!
//! Owns the [`Progression`] state machine and performs the I/O around it:
//! catalog fetches, chat exchanges, notifications and the delayed level
//! advance. State lives behind a `std::sync::Mutex` that is never held across
//! an await, so selection changes stay possible while an exchange is in
//! flight. Replies that arrive for an older selection are discarded by the
//! state machine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use levelup_domain::{
    AdvanceTicket, Advancement, ExchangeResolution, Game, Level, LevelId, Progression,
    ProgressionError, ProgressionPhase, Turn,
};
use levelup_shared::ChatRequest;

use super::{CatalogService, ChatService};
use crate::config::PlayerConfig;
use crate::ports::outbound::{ApiError, ClockPort, Notification, NotificationPort, RawApiPort};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Rejected(#[from] ProgressionError),
    #[error("Failed to send message: {0}")]
    Exchange(ApiError),
    #[error("Failed to load catalog: {0}")]
    Catalog(ApiError),
}

/// Read-only copy of everything a chat view renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionSnapshot {
    pub phase: ProgressionPhase,
    pub games: Vec<Game>,
    pub games_error: Option<String>,
    pub selected_game: Option<Game>,
    pub levels: Vec<Level>,
    pub levels_loading: bool,
    pub levels_error: Option<String>,
    pub selected_level: Option<Level>,
    pub objective: String,
    pub turns: Vec<Turn>,
    pub in_flight: bool,
}

struct ControllerState {
    progression: Progression,
    games: Vec<Game>,
    games_error: Option<String>,
    levels_loading: bool,
    levels_error: Option<String>,
}

#[derive(Clone)]
pub struct ProgressionController {
    state: Arc<Mutex<ControllerState>>,
    catalog: CatalogService,
    chat: ChatService,
    notifications: Arc<dyn NotificationPort>,
    clock: Arc<dyn ClockPort>,
    advance_delay: Duration,
}

impl ProgressionController {
    pub fn new(
        api: Arc<dyn RawApiPort>,
        notifications: Arc<dyn NotificationPort>,
        clock: Arc<dyn ClockPort>,
        advance_delay: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControllerState {
                progression: Progression::new(),
                games: Vec::new(),
                games_error: None,
                levels_loading: false,
                levels_error: None,
            })),
            catalog: CatalogService::new(api.clone()),
            chat: ChatService::new(api),
            notifications,
            clock,
            advance_delay,
        }
    }

    pub fn from_config(
        config: &PlayerConfig,
        api: Arc<dyn RawApiPort>,
        notifications: Arc<dyn NotificationPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self::new(api, notifications, clock, config.advance_delay)
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Fetch the game catalog and select the first game, unless one is
    /// already selected.
    pub async fn mount(&self) -> Result<(), ControllerError> {
        self.lock().progression.mount();

        let games = match self.catalog.list_games().await {
            Ok(games) => games,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch games");
                self.lock().games_error = Some(e.to_string());
                return Err(ControllerError::Catalog(e));
            }
        };

        let first = {
            let mut state = self.lock();
            state.games = games;
            state.games_error = None;
            if state.progression.selected_game().is_none() {
                state.games.first().cloned()
            } else {
                None
            }
        };

        match first {
            Some(game) => self.select_game(game).await,
            None => Ok(()),
        }
    }

    /// Switch games. The level and conversation are cleared immediately; the
    /// game's level catalog is fetched afterwards and its first level
    /// selected.
    ///
    /// A fetch that completes after a newer selection (even of the same game)
    /// is dropped without touching the state.
    pub async fn select_game(&self, game: Game) -> Result<(), ControllerError> {
        let name = game.name().to_string();
        let generation = {
            let mut state = self.lock();
            state.progression.select_game(game);
            state.levels_loading = true;
            state.levels_error = None;
            state.progression.generation()
        };
        tracing::info!(game = %name, "Game selected");

        let result = self.catalog.list_levels(&name).await;

        let mut state = self.lock();
        if state.progression.generation() != generation {
            tracing::debug!(game = %name, "Discarding superseded level catalog");
            return Ok(());
        }

        match result {
            Ok(catalog) => {
                if state.progression.install_levels(catalog) {
                    state.levels_loading = false;
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(game = %name, error = %e, "Failed to fetch levels");
                state.levels_loading = false;
                state.levels_error = Some(e.to_string());
                Err(ControllerError::Catalog(e))
            }
        }
    }

    pub fn select_level(&self, id: &LevelId) -> Result<Level, ControllerError> {
        let level = self.lock().progression.select_level(id).cloned()?;
        tracing::info!(level_id = %level.id(), "Level selected");
        Ok(level)
    }

    // =========================================================================
    // Exchange
    // =========================================================================

    /// Send one user message.
    ///
    /// The user turn is appended before the request goes out and stays even
    /// when the exchange fails. A passing reply schedules the switch to the
    /// next level after the advance delay.
    pub async fn submit(&self, text: &str) -> Result<ExchangeResolution, ControllerError> {
        let draft = {
            let now = self.clock.now();
            self.lock().progression.begin_exchange(text, now)?
        };
        let request = ChatRequest::from_draft(&draft);

        tracing::debug!(
            conversation_id = %draft.conversation_id(),
            game = %draft.game_name(),
            level_id = %draft.level_id(),
            history_len = draft.history().len(),
            "Sending message"
        );

        match self.chat.send(&request).await {
            Ok(reply) => {
                let now = self.clock.now();
                let resolution = self.lock().progression.complete_exchange(
                    &draft,
                    reply.into_exchange_reply(),
                    now,
                );
                self.on_resolution(&resolution);
                Ok(resolution)
            }
            Err(e) => {
                let current = self.lock().progression.fail_exchange(&draft);
                if current {
                    tracing::warn!(error = %e, "Exchange failed");
                    self.notifications.notify(Notification::error(e.to_string()));
                } else {
                    tracing::debug!(error = %e, "Ignoring failure of a previous selection");
                }
                Err(ControllerError::Exchange(e))
            }
        }
    }

    fn on_resolution(&self, resolution: &ExchangeResolution) {
        match resolution {
            ExchangeResolution::Stale => {
                tracing::debug!("Discarding reply for a previous selection");
            }
            ExchangeResolution::Held { appended } => {
                tracing::debug!(appended, "Reply applied");
            }
            ExchangeResolution::Passed {
                rationale,
                advance,
                ..
            } => {
                let message = if rationale.trim().is_empty() {
                    "Level passed!".to_string()
                } else {
                    format!("Level passed! {rationale}")
                };
                self.notifications.notify(Notification::success(message));
                if let Some(ticket) = advance {
                    self.schedule_advance(*ticket);
                }
            }
        }
    }

    fn schedule_advance(&self, ticket: AdvanceTicket) {
        let controller = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(controller.advance_delay).await;
            let advancement = controller.lock().progression.advance(ticket);
            match advancement {
                Advancement::Advanced(level) => {
                    tracing::info!(level_id = %level.id(), "Advanced to next level");
                }
                Advancement::FinalLevel => tracing::info!("Final level reached"),
                Advancement::Stale => tracing::debug!("Selection changed; advance dropped"),
            }
        });
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn snapshot(&self) -> ProgressionSnapshot {
        let state = self.lock();
        let progression = &state.progression;
        ProgressionSnapshot {
            phase: progression.phase(),
            games: state.games.clone(),
            games_error: state.games_error.clone(),
            selected_game: progression.selected_game().cloned(),
            levels: progression.levels().levels().to_vec(),
            levels_loading: state.levels_loading,
            levels_error: state.levels_error.clone(),
            selected_level: progression.selected_level().cloned(),
            objective: progression.objective().to_string(),
            turns: progression.conversation().turns().to_vec(),
            in_flight: progression.is_in_flight(),
        }
    }
}

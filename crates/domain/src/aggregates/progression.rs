//! Progression aggregate - game/level selection, exchange bookkeeping and
//! level advancement.
//!
//! This is a pure state machine: it never performs I/O and never sleeps.
//! Callers drive it in three steps per user message:
//!
//! 1. [`Progression::begin_exchange`] appends the user turn and returns an
//!    [`ExchangeDraft`] describing the outbound request.
//! 2. The caller performs the exchange and reports back through
//!    [`Progression::complete_exchange`] or [`Progression::fail_exchange`].
//! 3. A passing reply yields an [`AdvanceTicket`]; after the advance delay the
//!    caller hands it to [`Progression::advance`].
//!
//! # Stale results
//!
//! Every selection change bumps a generation counter. Drafts and advance
//! tickets remember the generation they were issued under, and results that
//! arrive under a different generation are discarded without touching the
//! conversation or the selected level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conversation::Conversation;
use crate::entities::{Game, Level, LevelCatalog, Role, Turn};
use crate::ids::{ConversationId, LevelId};

/// Objective shown for a selected level that does not define one.
pub const NO_OBJECTIVE_TEXT: &str = "No objective available for this level";

/// Observable phase of a progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionPhase {
    /// Not mounted yet.
    Idle,
    /// Mounted, game or level still missing.
    AwaitingSelection,
    /// Ready to accept a user message.
    Conversing,
    /// One exchange is in flight.
    Exchanging,
    /// The level was passed and the switch to the next level is scheduled.
    Advancing,
}

/// Reasons a progression operation is rejected. A rejected call has no
/// observable effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    #[error("No game selected")]
    NoGameSelected,
    #[error("No level selected")]
    NoLevelSelected,
    #[error("Message cannot be empty")]
    EmptyMessage,
    #[error("An exchange is already in progress")]
    ExchangeInFlight,
    #[error("Level advancement is pending")]
    AdvancePending,
    #[error("Level {0} is not part of the selected game")]
    UnknownLevel(LevelId),
}

/// Everything needed to build one outbound exchange request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeDraft {
    generation: u64,
    conversation_id: ConversationId,
    history: Vec<Turn>,
    message: String,
    level_id: LevelId,
    game_name: String,
}

impl ExchangeDraft {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Turns that preceded the new message.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn level_id(&self) -> &LevelId {
        &self.level_id
    }

    pub fn game_name(&self) -> &str {
        &self.game_name
    }

    /// Index of the first reply message the caller does not have yet.
    ///
    /// The reply repeats the whole conversation: the history plus the new
    /// user message come first.
    pub fn reply_boundary(&self) -> usize {
        self.history.len() + 1
    }
}

/// One message of an exchange reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyMessage {
    pub role: Role,
    pub text: String,
}

impl ReplyMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// A successful exchange reply, already reshaped from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeReply {
    /// Full conversation so far plus the new turns.
    pub messages: Vec<ReplyMessage>,
    pub passed: bool,
    pub rationale: String,
}

/// Permission to switch to the next level once the advance delay elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceTicket {
    generation: u64,
}

/// What [`Progression::complete_exchange`] did with a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeResolution {
    /// The selection changed while the exchange was in flight; reply dropped.
    Stale,
    /// Not passed yet; `appended` new turns were added.
    Held { appended: usize },
    /// Passed. `advance` is `None` when the current level is the last one.
    Passed {
        appended: usize,
        rationale: String,
        advance: Option<AdvanceTicket>,
    },
}

/// Result of redeeming an [`AdvanceTicket`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advancement {
    /// The selection changed since the ticket was issued.
    Stale,
    /// Switched to this level; the conversation was cleared.
    Advanced(Level),
    /// No level follows the current one; nothing changed.
    FinalLevel,
}

/// Selection and conversation state of one mounted chat.
///
/// # Invariants
///
/// - The selected level, when set, is a position inside `catalog`, and
///   `catalog` belongs to the selected game.
/// - The conversation is cleared whenever the game or level changes.
/// - At most one exchange is in flight.
#[derive(Debug, Clone)]
pub struct Progression {
    mounted: bool,
    game: Option<Game>,
    catalog: LevelCatalog,
    level: Option<usize>,
    conversation: Conversation,
    in_flight: bool,
    advance_pending: bool,
    generation: u64,
}

impl Progression {
    // =========================================================================
    // Constructor
    // =========================================================================

    pub fn new() -> Self {
        Self {
            mounted: false,
            game: None,
            catalog: LevelCatalog::default(),
            level: None,
            conversation: Conversation::new(),
            in_flight: false,
            advance_pending: false,
            generation: 0,
        }
    }

    /// Idle -> AwaitingSelection.
    pub fn mount(&mut self) {
        self.mounted = true;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn phase(&self) -> ProgressionPhase {
        if !self.mounted {
            ProgressionPhase::Idle
        } else if self.game.is_none() || self.level.is_none() {
            ProgressionPhase::AwaitingSelection
        } else if self.in_flight {
            ProgressionPhase::Exchanging
        } else if self.advance_pending {
            ProgressionPhase::Advancing
        } else {
            ProgressionPhase::Conversing
        }
    }

    pub fn selected_game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn selected_level(&self) -> Option<&Level> {
        self.level.and_then(|position| self.catalog.get(position))
    }

    /// Level catalog of the selected game (empty until installed).
    pub fn levels(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Objective text for the selected level.
    pub fn objective(&self) -> &str {
        match self.selected_level() {
            Some(level) => level.user_objective().unwrap_or(NO_OBJECTIVE_TEXT),
            None => "",
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Select a game. Always clears the level, the level catalog and the
    /// conversation, even when the same game is selected again.
    pub fn select_game(&mut self, game: Game) {
        self.mounted = true;
        self.catalog = LevelCatalog::pending(game.name());
        self.game = Some(game);
        self.level = None;
        self.start_new_generation();
    }

    /// Install the fetched level catalog for the selected game.
    ///
    /// Returns `false` (and changes nothing) when the catalog belongs to a
    /// different game than the one currently selected. The selected level is
    /// kept when it still exists; otherwise the first level is selected.
    pub fn install_levels(&mut self, catalog: LevelCatalog) -> bool {
        let Some(game) = &self.game else {
            return false;
        };
        if game.name() != catalog.game_name() {
            return false;
        }

        let previous = self.selected_level().map(|level| level.id().clone());
        self.catalog = catalog;
        self.level = previous
            .as_ref()
            .and_then(|id| self.catalog.position(id));

        if self.level.is_none() {
            if !self.catalog.is_empty() {
                self.select_position(0);
            } else if previous.is_some() {
                self.start_new_generation();
            }
        }
        true
    }

    /// Select a level of the current game's catalog.
    pub fn select_level(&mut self, id: &LevelId) -> Result<&Level, ProgressionError> {
        if self.game.is_none() {
            return Err(ProgressionError::NoGameSelected);
        }
        let position = self
            .catalog
            .position(id)
            .ok_or_else(|| ProgressionError::UnknownLevel(id.clone()))?;
        self.select_position(position);
        self.selected_level()
            .ok_or_else(|| ProgressionError::UnknownLevel(id.clone()))
    }

    fn select_position(&mut self, position: usize) {
        self.level = Some(position);
        self.start_new_generation();
    }

    fn start_new_generation(&mut self) {
        self.conversation.reset();
        self.advance_pending = false;
        self.generation = self.generation.wrapping_add(1);
    }

    // =========================================================================
    // Exchange
    // =========================================================================

    /// Append the user turn and mark the exchange in flight.
    pub fn begin_exchange(
        &mut self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<ExchangeDraft, ProgressionError> {
        let game_name = self
            .game
            .as_ref()
            .ok_or(ProgressionError::NoGameSelected)?
            .name()
            .to_string();
        let level_id = self
            .selected_level()
            .ok_or(ProgressionError::NoLevelSelected)?
            .id()
            .clone();
        if self.in_flight {
            return Err(ProgressionError::ExchangeInFlight);
        }
        if self.advance_pending {
            return Err(ProgressionError::AdvancePending);
        }
        if text.trim().is_empty() {
            return Err(ProgressionError::EmptyMessage);
        }

        let history = self.conversation.turns().to_vec();
        self.conversation.push(Turn::user(text, now));
        self.in_flight = true;

        Ok(ExchangeDraft {
            generation: self.generation,
            conversation_id: self.conversation.id(),
            history,
            message: text.to_string(),
            level_id,
            game_name,
        })
    }

    /// Apply a successful reply.
    pub fn complete_exchange(
        &mut self,
        draft: &ExchangeDraft,
        reply: ExchangeReply,
        now: DateTime<Utc>,
    ) -> ExchangeResolution {
        self.in_flight = false;
        if draft.generation != self.generation {
            return ExchangeResolution::Stale;
        }

        let mut appended = 0;
        for message in reply.messages.into_iter().skip(draft.reply_boundary()) {
            self.conversation
                .push(Turn::new(message.role, message.text, now));
            appended += 1;
        }

        if !reply.passed {
            return ExchangeResolution::Held { appended };
        }

        let has_next = self
            .level
            .and_then(|position| self.catalog.next_position(position))
            .is_some();
        let advance = has_next.then(|| {
            self.advance_pending = true;
            AdvanceTicket {
                generation: self.generation,
            }
        });

        ExchangeResolution::Passed {
            appended,
            rationale: reply.rationale,
            advance,
        }
    }

    /// Record a failed exchange. The optimistic user turn stays.
    ///
    /// Returns whether the draft still belongs to the current selection.
    pub fn fail_exchange(&mut self, draft: &ExchangeDraft) -> bool {
        self.in_flight = false;
        draft.generation == self.generation
    }

    // =========================================================================
    // Advancement
    // =========================================================================

    /// Switch to the level after the current one.
    pub fn advance(&mut self, ticket: AdvanceTicket) -> Advancement {
        if ticket.generation != self.generation {
            return Advancement::Stale;
        }
        self.advance_pending = false;

        let next = self
            .level
            .and_then(|position| self.catalog.next_position(position));
        match next {
            Some(position) => {
                self.select_position(position);
                match self.selected_level() {
                    Some(level) => Advancement::Advanced(level.clone()),
                    None => Advancement::FinalLevel,
                }
            }
            None => Advancement::FinalLevel,
        }
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password_game() -> Game {
        Game::new("password", "Guess the password", "/password").unwrap()
    }

    fn two_levels() -> LevelCatalog {
        LevelCatalog::new(
            "password",
            vec![
                Level::new("1", "Level 1").with_user_objective("Find the password"),
                Level::new("2", "Level 2"),
            ],
        )
    }

    fn ready() -> Progression {
        let mut progression = Progression::new();
        progression.mount();
        progression.select_game(password_game());
        assert!(progression.install_levels(two_levels()));
        progression
    }

    fn reply(messages: &[(Role, &str)], passed: bool) -> ExchangeReply {
        ExchangeReply {
            messages: messages
                .iter()
                .map(|(role, text)| ReplyMessage::new(*role, *text))
                .collect(),
            passed,
            rationale: if passed { "You got it".into() } else { String::new() },
        }
    }

    fn texts(progression: &Progression) -> Vec<(Role, String)> {
        progression
            .conversation()
            .turns()
            .iter()
            .map(|turn| (turn.role(), turn.text().to_string()))
            .collect()
    }

    #[test]
    fn phases_follow_selection_and_exchange() {
        let mut progression = Progression::new();
        assert_eq!(progression.phase(), ProgressionPhase::Idle);

        progression.mount();
        assert_eq!(progression.phase(), ProgressionPhase::AwaitingSelection);

        progression.select_game(password_game());
        assert_eq!(progression.phase(), ProgressionPhase::AwaitingSelection);

        progression.install_levels(two_levels());
        assert_eq!(progression.phase(), ProgressionPhase::Conversing);

        let draft = progression.begin_exchange("hello", Utc::now()).unwrap();
        assert_eq!(progression.phase(), ProgressionPhase::Exchanging);

        let resolution = progression.complete_exchange(
            &draft,
            reply(&[(Role::User, "hello"), (Role::Assistant, "yes")], true),
            Utc::now(),
        );
        assert!(matches!(
            resolution,
            ExchangeResolution::Passed { advance: Some(_), .. }
        ));
        assert_eq!(progression.phase(), ProgressionPhase::Advancing);
    }

    #[test]
    fn install_levels_auto_selects_first_level() {
        let progression = ready();
        assert_eq!(progression.selected_level().unwrap().id().as_str(), "1");
        assert_eq!(progression.objective(), "Find the password");
    }

    #[test]
    fn install_levels_for_other_game_is_ignored() {
        let mut progression = Progression::new();
        progression.select_game(password_game());
        let installed =
            progression.install_levels(LevelCatalog::new("riddles", vec![Level::new("1", "R1")]));
        assert!(!installed);
        assert!(progression.levels().is_empty());
        assert!(progression.selected_level().is_none());
    }

    #[test]
    fn reinstalling_catalog_keeps_selected_level_and_conversation() {
        let mut progression = ready();
        progression.select_level(&LevelId::new("2")).unwrap();
        let draft = progression.begin_exchange("hi", Utc::now()).unwrap();
        progression.fail_exchange(&draft);

        progression.install_levels(two_levels());

        assert_eq!(progression.selected_level().unwrap().id().as_str(), "2");
        assert_eq!(progression.conversation().len(), 1);
    }

    #[test]
    fn objective_falls_back_when_level_has_none() {
        let mut progression = ready();
        progression.select_level(&LevelId::new("2")).unwrap();
        assert_eq!(progression.objective(), NO_OBJECTIVE_TEXT);
        assert_eq!(Progression::new().objective(), "");
    }

    #[test]
    fn select_game_always_clears_level_and_conversation() {
        let mut progression = ready();
        progression.begin_exchange("hello", Utc::now()).unwrap();
        assert_eq!(progression.conversation().len(), 1);

        progression.select_game(password_game());

        assert!(progression.selected_level().is_none());
        assert!(progression.conversation().is_empty());
        assert!(progression.levels().is_empty());
        assert_eq!(progression.selected_game().unwrap().name(), "password");
    }

    #[test]
    fn select_level_rejects_levels_outside_catalog() {
        let mut progression = ready();
        let err = progression.select_level(&LevelId::new("9")).unwrap_err();
        assert_eq!(err, ProgressionError::UnknownLevel(LevelId::new("9")));
        assert_eq!(progression.selected_level().unwrap().id().as_str(), "1");

        let mut fresh = Progression::new();
        assert_eq!(
            fresh.select_level(&LevelId::new("1")).unwrap_err(),
            ProgressionError::NoGameSelected
        );
    }

    #[test]
    fn select_level_clears_conversation() {
        let mut progression = ready();
        let draft = progression.begin_exchange("hello", Utc::now()).unwrap();
        progression.complete_exchange(
            &draft,
            reply(&[(Role::User, "hello"), (Role::Assistant, "no")], false),
            Utc::now(),
        );
        let old_id = progression.conversation().id();

        progression.select_level(&LevelId::new("1")).unwrap();

        assert!(progression.conversation().is_empty());
        assert_ne!(progression.conversation().id(), old_id);
    }

    #[test]
    fn begin_exchange_checks_preconditions() {
        let mut progression = Progression::new();
        assert_eq!(
            progression.begin_exchange("hi", Utc::now()).unwrap_err(),
            ProgressionError::NoGameSelected
        );

        progression.select_game(password_game());
        assert_eq!(
            progression.begin_exchange("hi", Utc::now()).unwrap_err(),
            ProgressionError::NoLevelSelected
        );

        progression.install_levels(two_levels());
        assert_eq!(
            progression.begin_exchange("   ", Utc::now()).unwrap_err(),
            ProgressionError::EmptyMessage
        );
        assert!(progression.conversation().is_empty());
    }

    #[test]
    fn begin_exchange_while_in_flight_has_no_effect() {
        let mut progression = ready();
        progression.begin_exchange("first", Utc::now()).unwrap();

        let err = progression.begin_exchange("second", Utc::now()).unwrap_err();

        assert_eq!(err, ProgressionError::ExchangeInFlight);
        assert_eq!(progression.conversation().len(), 1);
    }

    #[test]
    fn draft_carries_prior_history_only() {
        let mut progression = ready();
        let first = progression.begin_exchange("hello", Utc::now()).unwrap();
        assert!(first.history().is_empty());
        assert_eq!(first.reply_boundary(), 1);
        progression.complete_exchange(
            &first,
            reply(&[(Role::User, "hello"), (Role::Assistant, "try again")], false),
            Utc::now(),
        );

        let second = progression.begin_exchange("please", Utc::now()).unwrap();

        assert_eq!(second.history().len(), 2);
        assert_eq!(second.message(), "please");
        assert_eq!(second.level_id().as_str(), "1");
        assert_eq!(second.game_name(), "password");
        assert_eq!(second.conversation_id(), progression.conversation().id());
        assert_eq!(second.reply_boundary(), 3);
    }

    #[test]
    fn only_messages_past_the_boundary_are_appended() {
        let mut progression = ready();
        let first = progression.begin_exchange("a", Utc::now()).unwrap();
        progression.complete_exchange(
            &first,
            reply(&[(Role::User, "a"), (Role::Assistant, "b")], false),
            Utc::now(),
        );

        // history.len() == 2 and the reply carries 5 messages: indices 0..=2 echo
        // the history plus the new user turn, only 3 and 4 are new.
        let second = progression.begin_exchange("c", Utc::now()).unwrap();
        assert_eq!(second.history().len(), 2);
        let resolution = progression.complete_exchange(
            &second,
            reply(
                &[
                    (Role::User, "a"),
                    (Role::Assistant, "b"),
                    (Role::User, "c"),
                    (Role::Assistant, "d"),
                    (Role::Assistant, "e"),
                ],
                false,
            ),
            Utc::now(),
        );

        assert_eq!(resolution, ExchangeResolution::Held { appended: 2 });
        assert_eq!(
            texts(&progression),
            vec![
                (Role::User, "a".to_string()),
                (Role::Assistant, "b".to_string()),
                (Role::User, "c".to_string()),
                (Role::Assistant, "d".to_string()),
                (Role::Assistant, "e".to_string()),
            ]
        );
    }

    #[test]
    fn failed_exchange_keeps_user_turn_and_clears_in_flight() {
        let mut progression = ready();
        let draft = progression.begin_exchange("hello", Utc::now()).unwrap();

        assert!(progression.fail_exchange(&draft));

        assert!(!progression.is_in_flight());
        assert_eq!(texts(&progression), vec![(Role::User, "hello".to_string())]);
        assert_eq!(progression.phase(), ProgressionPhase::Conversing);
    }

    #[test]
    fn reply_after_level_switch_is_discarded() {
        let mut progression = ready();
        let draft = progression.begin_exchange("hello", Utc::now()).unwrap();
        progression.select_level(&LevelId::new("2")).unwrap();

        // Still one exchange at a time while the stale one is outstanding.
        assert_eq!(
            progression.begin_exchange("again", Utc::now()).unwrap_err(),
            ProgressionError::ExchangeInFlight
        );

        let resolution = progression.complete_exchange(
            &draft,
            reply(&[(Role::User, "hello"), (Role::Assistant, "secret")], true),
            Utc::now(),
        );

        assert_eq!(resolution, ExchangeResolution::Stale);
        assert!(progression.conversation().is_empty());
        assert!(!progression.is_in_flight());
        assert_eq!(progression.selected_level().unwrap().id().as_str(), "2");
    }

    #[test]
    fn passing_advances_to_next_level() {
        let mut progression = ready();
        let draft = progression.begin_exchange("hello", Utc::now()).unwrap();
        let resolution = progression.complete_exchange(
            &draft,
            reply(&[(Role::User, "hello"), (Role::Assistant, "ok")], true),
            Utc::now(),
        );
        let ExchangeResolution::Passed {
            appended,
            rationale,
            advance: Some(ticket),
        } = resolution
        else {
            panic!("expected a passed resolution with a ticket");
        };
        assert_eq!(appended, 1);
        assert_eq!(rationale, "You got it");
        assert_eq!(
            progression.begin_exchange("more", Utc::now()).unwrap_err(),
            ProgressionError::AdvancePending
        );

        let advancement = progression.advance(ticket);

        assert_eq!(advancement, Advancement::Advanced(Level::new("2", "Level 2")));
        assert_eq!(progression.selected_level().unwrap().id().as_str(), "2");
        assert!(progression.conversation().is_empty());
        assert_eq!(progression.phase(), ProgressionPhase::Conversing);
    }

    #[test]
    fn passing_final_level_stays_put() {
        let mut progression = ready();
        progression.select_level(&LevelId::new("2")).unwrap();
        let draft = progression.begin_exchange("hello", Utc::now()).unwrap();

        let resolution = progression.complete_exchange(
            &draft,
            reply(&[(Role::User, "hello"), (Role::Assistant, "done")], true),
            Utc::now(),
        );

        assert!(matches!(
            resolution,
            ExchangeResolution::Passed { advance: None, .. }
        ));
        assert_eq!(progression.phase(), ProgressionPhase::Conversing);
        assert_eq!(progression.selected_level().unwrap().id().as_str(), "2");
        assert_eq!(progression.conversation().len(), 2);
    }

    #[test]
    fn advance_ticket_is_void_after_selection_change() {
        let mut progression = ready();
        let draft = progression.begin_exchange("hello", Utc::now()).unwrap();
        let ExchangeResolution::Passed {
            advance: Some(ticket),
            ..
        } = progression.complete_exchange(
            &draft,
            reply(&[(Role::User, "hello"), (Role::Assistant, "ok")], true),
            Utc::now(),
        )
        else {
            panic!("expected ticket");
        };

        progression.select_level(&LevelId::new("1")).unwrap();

        assert_eq!(progression.advance(ticket), Advancement::Stale);
        assert_eq!(progression.selected_level().unwrap().id().as_str(), "1");
    }

    #[test]
    fn conversation_never_shrinks_across_submits() {
        let mut progression = ready();
        let mut last_len = 0;
        for (text, passed) in [("a", false), ("b", false), ("c", false)] {
            let draft = progression.begin_exchange(text, Utc::now()).unwrap();
            assert!(progression.conversation().len() > last_len);
            let mut messages: Vec<(Role, String)> = texts(&progression);
            messages.push((Role::Assistant, format!("re: {text}")));
            let reply = ExchangeReply {
                messages: messages
                    .into_iter()
                    .map(|(role, text)| ReplyMessage::new(role, text))
                    .collect(),
                passed,
                rationale: String::new(),
            };
            progression.complete_exchange(&draft, reply, Utc::now());
            assert!(progression.conversation().len() >= last_len);
            last_len = progression.conversation().len();
        }
        assert_eq!(last_len, 6);
    }
}

//! The public face of one game: `GameSession`.
//!
//! A session owns its players, both card pools, the turn state and an event
//! log. It checks who is calling before handing a request to the round
//! controller, records what happened, and turns a deck running dry into a
//! finished (aborted) game.
//!
//! ## Example
//!
//! ```
//! use rust_blanks::cards::{CardId, Deck, PromptCard, ResponseCard};
//! use rust_blanks::core::{PlayerId, SessionConfig, SessionId, WinCondition};
//! use rust_blanks::rules::Phase;
//! use rust_blanks::session::GameSession;
//!
//! let mut deck = Deck::new("demo");
//! for i in 0..5 {
//!     deck.prompts.push(PromptCard::new(CardId::new(i), "Why is there _ in my soup?"));
//! }
//! for i in 0..30 {
//!     deck.responses.push(ResponseCard::new(CardId::new(i), format!("Thing {}", i)));
//! }
//!
//! let (a, b, c) = (PlayerId::new(1), PlayerId::new(2), PlayerId::new(3));
//! let config = SessionConfig::default()
//!     .with_hand_size(5)
//!     .with_win_condition(WinCondition::Wins(1));
//!
//! let mut session = GameSession::new(SessionId::new(1), a, [deck], config).unwrap();
//! session.join(b).unwrap();
//! session.join(c).unwrap();
//! session.start(a).unwrap();
//!
//! session.submit_cards(b, &[0]).unwrap();
//! session.submit_cards(c, &[4]).unwrap();
//! assert!(session.all_submitted());
//!
//! session.close_submissions().unwrap();
//! session.pick_winner(a, c).unwrap();
//! assert_eq!(session.phase(), Phase::GameOver);
//! ```

use std::borrow::Borrow;

use tracing::{debug, info};

use super::history::{History, SessionEvent};
use crate::cards::{Deck, PromptCard, ResponseCard};
use crate::core::{EngineError, GameRng, PlayerId, Result, SessionConfig, SessionId};
use crate::hands::{Player, Standing};
use crate::rules::{GameResult, Phase, RoundController, RoundState, Submission, Table};

/// One independent game instance.
#[derive(Clone, Debug)]
pub struct GameSession {
    id: SessionId,
    host: PlayerId,
    pub(crate) controller: RoundController,
    pub(crate) table: Table,
    pub(crate) history: History,
}

impl GameSession {
    /// Create a session in `Setup` with the host already joined.
    ///
    /// Cards from every deck are copied into the session's own pools under
    /// session-local ids. Fails with `InvalidConfig` when the
    /// configuration is unplayable, a card kind is missing, a single hand
    /// needs more responses than exist, or some prompt needs more blanks
    /// than a hand holds.
    pub fn new<I>(id: SessionId, host: PlayerId, decks: I, config: SessionConfig) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Borrow<Deck>,
    {
        config.validate()?;

        let decks: Vec<I::Item> = decks.into_iter().collect();
        let max_blanks = decks.iter().map(|d| d.borrow().max_blanks()).max().unwrap_or(0);
        if max_blanks > config.hand_size {
            return Err(EngineError::InvalidConfig(format!(
                "a prompt needs {} blanks but hands hold {}",
                max_blanks, config.hand_size
            )));
        }

        let mut table = Table::from_decks(decks, config.hand_size, GameRng::new(config.seed));
        if table.prompts.total() == 0 {
            return Err(EngineError::InvalidConfig("no prompt cards".into()));
        }
        if table.responses.total() == 0 {
            return Err(EngineError::InvalidConfig("no response cards".into()));
        }
        if config.hand_size > table.responses.total() {
            return Err(EngineError::InvalidConfig(format!(
                "hands hold {} cards but the decks have {} responses",
                config.hand_size,
                table.responses.total()
            )));
        }
        table.hands.add_player(host)?;

        let mut history = History::new();
        history.record(1, SessionEvent::Joined { player: host });

        info!(
            session = %id,
            %host,
            prompts = table.prompts.total(),
            responses = table.responses.total(),
            "Session created"
        );

        Ok(Self {
            id,
            host,
            controller: RoundController::new(config),
            table,
            history,
        })
    }

    pub(crate) fn from_parts(
        id: SessionId,
        host: PlayerId,
        controller: RoundController,
        table: Table,
        history: History,
    ) -> Self {
        Self {
            id,
            host,
            controller,
            table,
            history,
        }
    }

    fn record(&mut self, event: SessionEvent) {
        let round = self.controller.state().round;
        self.history.record(round, event);
    }

    fn record_turn_started(&mut self) {
        let state = self.controller.state();
        if let (Some(arbiter), Some(prompt)) = (state.arbiter, state.current_prompt.as_ref()) {
            let event = SessionEvent::TurnStarted {
                round: state.round,
                arbiter,
                prompt: prompt.id,
            };
            self.record(event);
        }
    }

    /// Pass results through, turning deck exhaustion into a finished game.
    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(EngineError::DeckExhausted(kind)) = &result {
            self.controller.abort(*kind);
            self.record(SessionEvent::GameEnded {
                result: GameResult::Aborted(*kind),
            });
        }
        result
    }

    // === Lobby ===

    /// Add a player. Only while in `Setup`.
    pub fn join(&mut self, player: PlayerId) -> Result<()> {
        self.require_phase(Phase::Setup, "join")?;
        if self.table.hands.contains(player) {
            return Err(EngineError::AlreadyJoined(player));
        }
        let max = self.controller.config().max_players;
        if self.table.hands.len() >= max {
            return Err(EngineError::TooManyPlayers {
                have: self.table.hands.len() + 1,
                max,
            });
        }

        self.table.hands.add_player(player)?;
        self.record(SessionEvent::Joined { player });
        debug!(session = %self.id, %player, players = self.table.hands.len(), "Player joined");
        Ok(())
    }

    /// Remove a player before the game starts. The host cannot leave.
    pub fn leave(&mut self, player: PlayerId) -> Result<()> {
        self.require_phase(Phase::Setup, "leave")?;
        if player == self.host {
            return Err(EngineError::NotHost);
        }

        self.table.hands.remove_player(player)?;
        self.record(SessionEvent::Left { player });
        debug!(session = %self.id, %player, "Player left");
        Ok(())
    }

    /// Freeze the player set and deal the first turn. Host only.
    pub fn start(&mut self, caller: PlayerId) -> Result<()> {
        if caller != self.host {
            return Err(EngineError::NotHost);
        }
        let result = self.controller.start_game(&mut self.table);
        self.guard(result)?;
        self.record_turn_started();
        Ok(())
    }

    fn require_phase(&self, phase: Phase, operation: &'static str) -> Result<()> {
        let current = self.controller.phase();
        if current != phase {
            return Err(EngineError::WrongPhase {
                operation,
                phase: current,
            });
        }
        Ok(())
    }

    // === Turn ===

    /// Submit the cards at `indices` of the player's hand for the current
    /// prompt.
    pub fn submit_cards(&mut self, player: PlayerId, indices: &[usize]) -> Result<()> {
        self.controller.submit(&mut self.table, player, indices)?;
        self.record(SessionEvent::Submitted { player });
        Ok(())
    }

    /// Stop taking submissions and hand over to the arbiter.
    ///
    /// The host application calls this once `all_submitted()` holds, or on
    /// its own timer to move past silent players.
    pub fn close_submissions(&mut self) -> Result<()> {
        self.controller.close_submissions(&mut self.table)?;
        let count = self.controller.state().submissions.len();
        self.record(SessionEvent::SubmissionsClosed { count });
        Ok(())
    }

    /// The arbiter picks the winning submission.
    ///
    /// Returns the game result when this pick ended the game.
    pub fn pick_winner(&mut self, arbiter: PlayerId, winner: PlayerId) -> Result<Option<GameResult>> {
        let prompt = self.controller.state().current_prompt.as_ref().map(|p| p.id);
        let result = self.controller.pick_winner(&mut self.table, arbiter, winner);

        // Exhaustion can only strike the redeal, after the prompt was awarded.
        let awarded = matches!(result, Ok(_) | Err(EngineError::DeckExhausted(_)));
        if let Some(prompt) = prompt.filter(|_| awarded) {
            self.record(SessionEvent::WinnerPicked {
                arbiter,
                winner,
                prompt,
            });
        }
        let outcome = self.guard(result)?;
        match &outcome {
            Some(result) => self.record(SessionEvent::GameEnded {
                result: result.clone(),
            }),
            None => self.record_turn_started(),
        }
        Ok(outcome)
    }

    /// The arbiter throws out the current prompt; submissions return to
    /// their owners and a fresh prompt is drawn.
    ///
    /// Returns the discarded prompt with its updated report count.
    pub fn discard_prompt(&mut self, arbiter: PlayerId) -> Result<PromptCard> {
        let result = self.controller.discard_prompt(&mut self.table, arbiter);
        let discarded = self.guard(result)?;

        self.record(SessionEvent::PromptDiscarded {
            arbiter,
            prompt: discarded.id,
            report_count: discarded.report_count,
        });
        self.record_turn_started();
        Ok(discarded)
    }

    /// End the game now, from any phase but `GameOver`.
    pub fn cancel(&mut self) -> Result<()> {
        self.controller.cancel(&mut self.table)?;
        self.record(SessionEvent::GameEnded {
            result: GameResult::Cancelled,
        });
        Ok(())
    }

    // === Queries ===

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Player who created the session.
    #[must_use]
    pub fn host(&self) -> PlayerId {
        self.host
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        self.controller.config()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// Current round (starts at 1).
    #[must_use]
    pub fn round(&self) -> u32 {
        self.controller.state().round
    }

    /// Current arbiter.
    #[must_use]
    pub fn arbiter(&self) -> Option<PlayerId> {
        self.controller.state().arbiter
    }

    /// Prompt currently in play.
    #[must_use]
    pub fn current_prompt(&self) -> Option<&PromptCard> {
        self.controller.state().current_prompt.as_ref()
    }

    /// Full turn state.
    #[must_use]
    pub fn round_state(&self) -> &RoundState {
        self.controller.state()
    }

    /// How the game ended, once it has.
    #[must_use]
    pub fn result(&self) -> Option<&GameResult> {
        self.controller.result()
    }

    /// Whether every non-arbiter player has submitted this turn.
    #[must_use]
    pub fn all_submitted(&self) -> bool {
        self.controller.all_submitted(&self.table.hands)
    }

    /// Non-arbiter players still to submit this turn.
    #[must_use]
    pub fn pending_players(&self) -> Vec<PlayerId> {
        self.controller.pending(&self.table.hands)
    }

    /// A player's submission this turn.
    #[must_use]
    pub fn submission(&self, player: PlayerId) -> Option<&Submission> {
        self.controller.state().submission(player)
    }

    /// Submissions in the anonymized reading order fixed at close.
    pub fn reading_order(&self) -> impl Iterator<Item = &Submission> {
        let state = self.controller.state();
        state
            .reading_order
            .iter()
            .filter_map(move |&player| state.submission(player))
    }

    /// A player's hand.
    #[must_use]
    pub fn hand(&self, player: PlayerId) -> Option<&[ResponseCard]> {
        self.table.hands.player(player).map(|p| p.hand.as_slice())
    }

    /// Look up a player.
    #[must_use]
    pub fn player(&self, player: PlayerId) -> Option<&Player> {
        self.table.hands.player(player)
    }

    /// Player IDs in join order.
    #[must_use]
    pub fn player_order(&self) -> Vec<PlayerId> {
        self.table.hands.order().collect()
    }

    /// Scores, highest first; ties in join order.
    #[must_use]
    pub fn leaderboard(&self) -> Vec<Standing> {
        self.table.hands.leaderboard()
    }

    /// Event log.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Hands, pools and RNG, read-only.
    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }
}

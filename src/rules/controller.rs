//! The turn state machine.
//!
//! ```text
//! SETUP --start_game--> CHOOSING --close_submissions--> READING
//!                          ^  |                            |
//!                          |  +--submit (until all in)     |
//!                          +-------pick_winner / discard---+
//! any non-terminal --cancel / abort--> GAME_OVER <--pick_winner (win)
//! ```
//!
//! Every transition validates first and mutates second, so a rejected call
//! leaves the session exactly as it was. The exception is `DeckExhausted`
//! raised while refilling hands or prompts: that is fatal and the session
//! façade aborts the game.

use tracing::{debug, info, warn};

use super::round::{Phase, RoundState, Submission};
use super::table::Table;
use super::win::{self, GameResult};
use crate::cards::{DeckKind, PromptCard};
use crate::core::{EngineError, PlayerId, Result, SessionConfig, WinCondition};
use crate::hands::{HandStore, Submitted};

/// Drives one session through its phases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundController {
    config: SessionConfig,
    state: RoundState,
    result: Option<GameResult>,
}

impl RoundController {
    /// Create a controller in `Setup`.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: RoundState::new(),
            result: None,
        }
    }

    /// Rebuild a controller from snapshot parts.
    #[must_use]
    pub fn from_parts(config: SessionConfig, state: RoundState, result: Option<GameResult>) -> Self {
        Self {
            config,
            state,
            result,
        }
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current turn state.
    #[must_use]
    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Final result, once in `GameOver`.
    #[must_use]
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    fn require(&self, phase: Phase, operation: &'static str) -> Result<()> {
        if self.state.phase != phase {
            return Err(EngineError::WrongPhase {
                operation,
                phase: self.state.phase,
            });
        }
        Ok(())
    }

    fn require_arbiter(&self, caller: PlayerId) -> Result<()> {
        if !self.state.is_arbiter(caller) {
            return Err(EngineError::NotYourTurn(caller));
        }
        Ok(())
    }

    // === Transitions ===

    /// SETUP → CHOOSING: deal every hand, seat the first arbiter, draw the
    /// first prompt.
    pub fn start_game(&mut self, table: &mut Table) -> Result<()> {
        self.require(Phase::Setup, "start the game")?;

        let have = table.hands.len();
        if have < self.config.min_players {
            return Err(EngineError::NotEnoughPlayers {
                have,
                min: self.config.min_players,
            });
        }
        if have > self.config.max_players {
            return Err(EngineError::TooManyPlayers {
                have,
                max: self.config.max_players,
            });
        }

        table.hands.deal_all(&mut table.responses, &mut table.rng)?;
        let prompt = table.prompts.draw_random(&mut table.rng)?;

        self.state.round = 1;
        self.state.arbiter = table.hands.id_at(0);
        self.state.current_prompt = Some(prompt);
        self.state.phase = Phase::Choosing;

        info!(
            players = have,
            arbiter = ?self.state.arbiter,
            win_condition = %self.config.win_condition,
            "Game started"
        );
        Ok(())
    }

    /// Record a player's cards for the current prompt.
    pub fn submit(&mut self, table: &mut Table, player: PlayerId, indices: &[usize]) -> Result<Submitted> {
        self.require(Phase::Choosing, "submit cards")?;
        if !table.hands.contains(player) {
            return Err(EngineError::UnknownPlayer(player));
        }
        if self.state.is_arbiter(player) {
            return Err(EngineError::NotYourTurn(player));
        }
        if self.state.has_submitted(player) {
            return Err(EngineError::AlreadySubmitted(player));
        }

        let blanks = self.blanks_required();
        let cards = table.hands.play_cards(player, indices, blanks)?;
        self.state.submissions.push(Submission {
            player,
            cards: cards.clone(),
        });

        debug!(
            %player,
            submitted = self.state.submissions.len(),
            eligible = table.hands.len().saturating_sub(1),
            "Cards submitted"
        );
        Ok(cards)
    }

    fn blanks_required(&self) -> usize {
        self.state
            .current_prompt
            .as_ref()
            .map_or(1, |prompt| prompt.blanks_required)
    }

    /// Players other than the arbiter who have not submitted yet.
    #[must_use]
    pub fn pending(&self, hands: &HandStore) -> Vec<PlayerId> {
        if self.state.phase != Phase::Choosing {
            return Vec::new();
        }
        hands
            .order()
            .filter(|&id| !self.state.is_arbiter(id) && !self.state.has_submitted(id))
            .collect()
    }

    /// Whether every eligible player has submitted this turn.
    #[must_use]
    pub fn all_submitted(&self, hands: &HandStore) -> bool {
        self.state.phase == Phase::Choosing && self.pending(hands).is_empty()
    }

    /// CHOOSING → READING. May be forced before everyone has submitted;
    /// missing players simply have no entry.
    pub fn close_submissions(&mut self, table: &mut Table) -> Result<()> {
        self.require(Phase::Choosing, "close submissions")?;

        let mut order: Vec<_> = self.state.submissions.iter().map(|s| s.player).collect();
        table.rng.shuffle(&mut order);
        self.state.reading_order = order;
        self.state.phase = Phase::Reading;

        let missing = self.pending_count(&table.hands);
        if missing > 0 {
            debug!(missing, "Submissions closed early");
        }
        info!(submissions = self.state.submissions.len(), "Reading submissions");
        Ok(())
    }

    fn pending_count(&self, hands: &HandStore) -> usize {
        hands
            .order()
            .filter(|&id| !self.state.is_arbiter(id) && !self.state.has_submitted(id))
            .count()
    }

    /// READING → CHOOSING or GAME_OVER: award the prompt to `winner`.
    ///
    /// Returns the result when this pick ended the game.
    pub fn pick_winner(
        &mut self,
        table: &mut Table,
        caller: PlayerId,
        winner: PlayerId,
    ) -> Result<Option<GameResult>> {
        self.require(Phase::Reading, "pick a winner")?;
        self.require_arbiter(caller)?;
        if !self.state.has_submitted(winner) {
            return Err(EngineError::NoSuchSubmission(winner));
        }
        let prompt = self
            .state
            .current_prompt
            .take()
            .ok_or(EngineError::WrongPhase {
                operation: "pick a winner",
                phase: self.state.phase,
            })?;

        info!(arbiter = %caller, %winner, prompt = %prompt.id, "Winner picked");
        table.hands.award(winner, prompt.clone())?;
        table.prompts.mark_used(prompt);
        table.hands.discard_played(&mut table.responses);
        self.state.clear_turn();

        // A win count ends the game with the deciding arbiter still seated;
        // a round limit is only reached by the rotation itself.
        let condition = self.config.win_condition;
        if matches!(condition, WinCondition::Rounds(_)) {
            self.advance_arbiter(&table.hands);
        }
        if let Some(result) = win::evaluate(condition, self.state.round, &table.hands, winner) {
            self.finish(result.clone());
            return Ok(Some(result));
        }
        if matches!(condition, WinCondition::Wins(_)) {
            self.advance_arbiter(&table.hands);
        }

        table.hands.deal_all(&mut table.responses, &mut table.rng)?;
        let next = table.prompts.draw_random(&mut table.rng)?;
        self.state.current_prompt = Some(next);
        self.state.phase = Phase::Choosing;
        Ok(None)
    }

    /// Seat the next player in join order, bumping the round on wrap.
    fn advance_arbiter(&mut self, hands: &HandStore) {
        let count = hands.len();
        let current = self
            .state
            .arbiter
            .and_then(|id| hands.index_of(id))
            .unwrap_or(0);
        let next = (current + 1) % count.max(1);
        if next == 0 {
            self.state.round += 1;
        }
        self.state.arbiter = hands.id_at(next);
        debug!(arbiter = ?self.state.arbiter, round = self.state.round, "Arbiter advanced");
    }

    /// Throw out the current prompt without a winner.
    ///
    /// Allowed while choosing or reading. Submitted cards go back to their
    /// owners' hands and a replacement prompt is drawn; arbiter and round
    /// stay put. Returns the discarded prompt with its bumped report count.
    pub fn discard_prompt(&mut self, table: &mut Table, caller: PlayerId) -> Result<PromptCard> {
        if !self.state.phase.in_turn() {
            return Err(EngineError::WrongPhase {
                operation: "discard the prompt",
                phase: self.state.phase,
            });
        }
        self.require_arbiter(caller)?;

        let mut discarded = match &self.state.current_prompt {
            Some(prompt) => prompt.clone(),
            None => {
                return Err(EngineError::WrongPhase {
                    operation: "discard the prompt",
                    phase: self.state.phase,
                })
            }
        };

        // Draw before releasing the old prompt so it cannot come straight back.
        let replacement = table.prompts.draw_random(&mut table.rng)?;
        self.state.current_prompt = Some(replacement);
        discarded.report_count += 1;

        let retire = self
            .config
            .retire_after_reports
            .is_some_and(|limit| discarded.report_count >= limit);
        if retire {
            table.prompts.retire(discarded.clone());
        } else {
            table.prompts.mark_used(discarded.clone());
        }

        for submission in self.state.clear_turn() {
            table.hands.unplay_cards(submission.player, &submission.cards)?;
        }
        self.state.phase = Phase::Choosing;

        info!(
            arbiter = %caller,
            prompt = %discarded.id,
            reports = discarded.report_count,
            retired = retire,
            "Prompt discarded"
        );
        Ok(discarded)
    }

    /// Any non-terminal phase → GAME_OVER. In-progress submissions go back
    /// to their owners.
    pub fn cancel(&mut self, table: &mut Table) -> Result<()> {
        if self.state.phase == Phase::GameOver {
            return Err(EngineError::WrongPhase {
                operation: "cancel",
                phase: self.state.phase,
            });
        }
        for submission in self.state.clear_turn() {
            table.hands.unplay_cards(submission.player, &submission.cards)?;
        }
        warn!(round = self.state.round, "Game cancelled");
        self.finish(GameResult::Cancelled);
        Ok(())
    }

    /// End the game after a deck ran out.
    pub fn abort(&mut self, kind: DeckKind) {
        warn!(%kind, round = self.state.round, "Deck exhausted, aborting game");
        self.finish(GameResult::Aborted(kind));
    }

    fn finish(&mut self, result: GameResult) {
        info!(?result, round = self.state.round, "Game over");
        self.state.phase = Phase::GameOver;
        self.result = Some(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, Deck, ResponseCard};
    use crate::core::{GameRng, WinCondition};

    fn p(id: u64) -> PlayerId {
        PlayerId::new(id)
    }

    fn table(prompts: u32, responses: u32, players: &[u64], hand_size: usize) -> Table {
        let mut deck = Deck::new("test");
        for i in 0..prompts {
            deck.prompts.push(PromptCard::new(CardId::new(i), format!("Prompt {} _", i)));
        }
        for i in 0..responses {
            deck.responses.push(ResponseCard::new(CardId::new(i), format!("Response {}", i)));
        }
        let mut table = Table::from_decks([deck], hand_size, GameRng::new(42));
        for &id in players {
            table.hands.add_player(p(id)).unwrap();
        }
        table
    }

    fn config(win: WinCondition) -> SessionConfig {
        SessionConfig::default()
            .with_hand_size(3)
            .with_win_condition(win)
            .with_player_limits(3, 5)
    }

    fn started(win: WinCondition) -> (RoundController, Table) {
        let mut table = table(10, 40, &[1, 2, 3], 3);
        let mut rc = RoundController::new(config(win));
        rc.start_game(&mut table).unwrap();
        (rc, table)
    }

    fn play_turn(rc: &mut RoundController, table: &mut Table, winner: PlayerId) -> Option<GameResult> {
        let arbiter = rc.state().arbiter.unwrap();
        for id in table.hands.order().collect::<Vec<_>>() {
            if id != arbiter {
                rc.submit(table, id, &[0]).unwrap();
            }
        }
        rc.close_submissions(table).unwrap();
        rc.pick_winner(table, arbiter, winner).unwrap()
    }

    #[test]
    fn test_start_requires_player_range() {
        let mut small = table(5, 30, &[1, 2], 3);
        let mut rc = RoundController::new(config(WinCondition::Wins(3)));
        assert_eq!(
            rc.start_game(&mut small),
            Err(EngineError::NotEnoughPlayers { have: 2, min: 3 })
        );
        assert_eq!(rc.phase(), Phase::Setup);
        assert_eq!(small.responses.in_play_len(), 0);

        let mut big = table(5, 60, &[1, 2, 3, 4, 5, 6], 3);
        assert_eq!(
            rc.start_game(&mut big),
            Err(EngineError::TooManyPlayers { have: 6, max: 5 })
        );
        assert_eq!(rc.phase(), Phase::Setup);
    }

    #[test]
    fn test_start_deals_and_seats_first_player() {
        let (rc, table) = started(WinCondition::Wins(3));

        assert_eq!(rc.phase(), Phase::Choosing);
        assert_eq!(rc.state().arbiter, Some(p(1)));
        assert_eq!(rc.state().round, 1);
        assert!(rc.state().current_prompt.is_some());
        assert!(table.hands.players().iter().all(|pl| pl.hand.len() == 3));
        assert!(table.check_invariants().is_ok());
    }

    #[test]
    fn test_start_twice_is_wrong_phase() {
        let (mut rc, mut table) = started(WinCondition::Wins(3));
        assert!(matches!(
            rc.start_game(&mut table),
            Err(EngineError::WrongPhase { phase: Phase::Choosing, .. })
        ));
    }

    #[test]
    fn test_arbiter_cannot_submit() {
        let (mut rc, mut table) = started(WinCondition::Wins(3));
        assert_eq!(rc.submit(&mut table, p(1), &[0]), Err(EngineError::NotYourTurn(p(1))));
        assert!(rc.state().submissions.is_empty());
    }

    #[test]
    fn test_double_submission_rejected() {
        let (mut rc, mut table) = started(WinCondition::Wins(3));
        rc.submit(&mut table, p(2), &[0]).unwrap();
        let hand_before = table.hands.player(p(2)).unwrap().hand.clone();

        assert_eq!(rc.submit(&mut table, p(2), &[0]), Err(EngineError::AlreadySubmitted(p(2))));
        assert_eq!(table.hands.player(p(2)).unwrap().hand, hand_before);
    }

    #[test]
    fn test_unknown_player_rejected() {
        let (mut rc, mut table) = started(WinCondition::Wins(3));
        assert_eq!(rc.submit(&mut table, p(9), &[0]), Err(EngineError::UnknownPlayer(p(9))));
    }

    #[test]
    fn test_all_submitted_and_pending() {
        let (mut rc, mut table) = started(WinCondition::Wins(3));
        assert_eq!(rc.pending(&table.hands), vec![p(2), p(3)]);
        assert!(!rc.all_submitted(&table.hands));

        rc.submit(&mut table, p(3), &[1]).unwrap();
        assert_eq!(rc.pending(&table.hands), vec![p(2)]);

        rc.submit(&mut table, p(2), &[2]).unwrap();
        assert!(rc.all_submitted(&table.hands));
        assert!(!rc.state().has_submitted(p(1)));
    }

    #[test]
    fn test_force_close_leaves_missing_absent() {
        let (mut rc, mut table) = started(WinCondition::Wins(3));
        rc.submit(&mut table, p(2), &[0]).unwrap();
        rc.close_submissions(&mut table).unwrap();

        assert_eq!(rc.phase(), Phase::Reading);
        assert_eq!(rc.state().reading_order, vec![p(2)]);
        assert_eq!(
            rc.pick_winner(&mut table, p(1), p(3)),
            Err(EngineError::NoSuchSubmission(p(3)))
        );
        assert_eq!(rc.phase(), Phase::Reading);
    }

    #[test]
    fn test_pick_winner_requires_arbiter_and_reading() {
        let (mut rc, mut table) = started(WinCondition::Wins(3));
        rc.submit(&mut table, p(2), &[0]).unwrap();
        assert!(matches!(
            rc.pick_winner(&mut table, p(1), p(2)),
            Err(EngineError::WrongPhase { phase: Phase::Choosing, .. })
        ));

        rc.submit(&mut table, p(3), &[0]).unwrap();
        rc.close_submissions(&mut table).unwrap();
        let before = rc.clone();
        assert_eq!(rc.pick_winner(&mut table, p(2), p(3)), Err(EngineError::NotYourTurn(p(2))));
        assert_eq!(rc, before);
    }

    #[test]
    fn test_pick_winner_rotates_and_refills() {
        let (mut rc, mut table) = started(WinCondition::Wins(3));
        let first_prompt = rc.state().current_prompt.clone().unwrap();

        assert_eq!(play_turn(&mut rc, &mut table, p(3)), None);

        assert_eq!(rc.phase(), Phase::Choosing);
        assert_eq!(rc.state().arbiter, Some(p(2)));
        assert_eq!(rc.state().round, 1);
        assert!(rc.state().submissions.is_empty());
        assert_eq!(table.hands.player(p(3)).unwrap().cards_won, vec![first_prompt]);
        assert!(table.hands.players().iter().all(|pl| pl.hand.len() == 3));
        assert_eq!(table.responses.used_len(), 2);
        assert_eq!(table.prompts.used_len(), 1);
        assert!(table.check_invariants().is_ok());
    }

    #[test]
    fn test_round_increments_on_wrap_only() {
        let (mut rc, mut table) = started(WinCondition::Wins(10));

        play_turn(&mut rc, &mut table, p(2));
        assert_eq!((rc.state().arbiter, rc.state().round), (Some(p(2)), 1));
        play_turn(&mut rc, &mut table, p(3));
        assert_eq!((rc.state().arbiter, rc.state().round), (Some(p(3)), 1));
        play_turn(&mut rc, &mut table, p(1));
        assert_eq!((rc.state().arbiter, rc.state().round), (Some(p(1)), 2));
        play_turn(&mut rc, &mut table, p(3));
        assert_eq!((rc.state().arbiter, rc.state().round), (Some(p(2)), 2));
    }

    #[test]
    fn test_wins_ends_on_exact_pick() {
        let (mut rc, mut table) = started(WinCondition::Wins(2));

        assert_eq!(play_turn(&mut rc, &mut table, p(2)), None);
        assert_eq!(play_turn(&mut rc, &mut table, p(3)), None);
        let result = play_turn(&mut rc, &mut table, p(2));

        assert_eq!(result, Some(GameResult::Winner(p(2))));
        assert_eq!(rc.phase(), Phase::GameOver);
        assert_eq!(rc.result(), Some(&GameResult::Winner(p(2))));
        assert_eq!(rc.state().arbiter, Some(p(3)));
        assert_eq!(rc.state().round, 1);
    }

    #[test]
    fn test_discard_returns_cards_and_keeps_seat() {
        let (mut rc, mut table) = started(WinCondition::Wins(3));
        let hand_before = table.hands.player(p(2)).unwrap().hand.clone();
        rc.submit(&mut table, p(2), &[1]).unwrap();
        rc.submit(&mut table, p(3), &[0]).unwrap();
        rc.close_submissions(&mut table).unwrap();
        let old = rc.state().current_prompt.clone().unwrap();

        let discarded = rc.discard_prompt(&mut table, p(1)).unwrap();

        assert_eq!(discarded.id, old.id);
        assert_eq!(discarded.report_count, 1);
        assert_eq!(rc.phase(), Phase::Choosing);
        assert_eq!(rc.state().arbiter, Some(p(1)));
        assert_ne!(rc.state().current_prompt.as_ref().unwrap().id, old.id);
        assert!(rc.state().submissions.is_empty());

        let mut hand_after = table.hands.player(p(2)).unwrap().hand.clone();
        let mut expected = hand_before;
        hand_after.sort_by_key(|c| c.id);
        expected.sort_by_key(|c| c.id);
        assert_eq!(hand_after, expected);
        assert_eq!(table.prompts.used_len(), 1);
        assert!(table.check_invariants().is_ok());
    }

    #[test]
    fn test_discard_requires_arbiter() {
        let (mut rc, mut table) = started(WinCondition::Wins(3));
        assert_eq!(rc.discard_prompt(&mut table, p(2)), Err(EngineError::NotYourTurn(p(2))));
    }

    #[test]
    fn test_discard_retires_over_reported_prompt() {
        let mut table = table(5, 40, &[1, 2, 3], 3);
        let mut rc = RoundController::new(config(WinCondition::Wins(3)).with_retirement(1));
        rc.start_game(&mut table).unwrap();

        let discarded = rc.discard_prompt(&mut table, p(1)).unwrap();
        assert_eq!(table.prompts.retired_len(), 1);
        assert!(table.prompts.retired().any(|c| c.id == discarded.id));
        assert_eq!(table.prompts.used_len(), 0);
    }

    #[test]
    fn test_discard_without_replacement_is_exhaustion() {
        let mut table = table(1, 40, &[1, 2, 3], 3);
        let mut rc = RoundController::new(config(WinCondition::Wins(3)));
        rc.start_game(&mut table).unwrap();
        let before = rc.clone();

        assert_eq!(
            rc.discard_prompt(&mut table, p(1)),
            Err(EngineError::DeckExhausted(DeckKind::Prompt))
        );
        assert_eq!(rc, before);
    }

    #[test]
    fn test_cancel_from_any_live_phase() {
        let mut rc = RoundController::new(config(WinCondition::Wins(3)));
        let mut table = table(5, 40, &[1], 3);
        rc.cancel(&mut table).unwrap();
        assert_eq!(rc.phase(), Phase::GameOver);
        assert_eq!(rc.result(), Some(&GameResult::Cancelled));

        let (mut rc, mut table) = started(WinCondition::Wins(3));
        rc.submit(&mut table, p(2), &[0]).unwrap();
        rc.cancel(&mut table).unwrap();
        assert_eq!(table.hands.player(p(2)).unwrap().hand.len(), 3);
        assert!(matches!(rc.cancel(&mut table), Err(EngineError::WrongPhase { .. })));
    }

    #[test]
    fn test_game_over_rejects_everything() {
        let (mut rc, mut table) = started(WinCondition::Wins(1));
        play_turn(&mut rc, &mut table, p(2));
        assert_eq!(rc.phase(), Phase::GameOver);

        assert!(matches!(rc.submit(&mut table, p(2), &[0]), Err(EngineError::WrongPhase { .. })));
        assert!(matches!(rc.close_submissions(&mut table), Err(EngineError::WrongPhase { .. })));
        assert!(matches!(rc.discard_prompt(&mut table, p(2)), Err(EngineError::WrongPhase { .. })));
        assert!(matches!(rc.pick_winner(&mut table, p(2), p(3)), Err(EngineError::WrongPhase { .. })));
    }
}

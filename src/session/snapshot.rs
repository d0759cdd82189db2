//! Session snapshots for external persistence.
//!
//! `SessionState` carries every field of a session: players and their
//! cards, both pool partitions, the turn state, the RNG position and the
//! event log. It derives `Serialize`/`Deserialize`; which format it is
//! written in is up to the store. `GameSession::restore` checks the
//! invariants a live session relies on before accepting a snapshot.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::game::GameSession;
use super::history::History;
use crate::cards::{CardPool, PromptCard, ResponseCard};
use crate::core::{EngineError, GameRng, GameRngState, PlayerId, Result, SessionConfig, SessionId};
use crate::hands::HandStore;
use crate::rules::{GameResult, Phase, RoundController, RoundState, Table};

/// Complete, serializable state of one session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: SessionId,
    pub host: PlayerId,
    pub config: SessionConfig,
    pub hands: HandStore,
    pub responses: CardPool<ResponseCard>,
    pub prompts: CardPool<PromptCard>,
    pub round: RoundState,
    pub result: Option<GameResult>,
    pub rng: GameRngState,
    pub history: History,
}

impl GameSession {
    /// Capture the whole session.
    ///
    /// Pools and history are persistent structures, so this is cheap.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        SessionState {
            id: self.id(),
            host: self.host(),
            config: self.controller.config().clone(),
            hands: self.table.hands.clone(),
            responses: self.table.responses.clone(),
            prompts: self.table.prompts.clone(),
            round: self.controller.state().clone(),
            result: self.controller.result().cloned(),
            rng: self.table.rng.state(),
            history: self.history.clone(),
        }
    }

    /// Rebuild a session from a snapshot.
    ///
    /// Fails with `CorruptSnapshot` if the state could not have been
    /// produced by a live session.
    pub fn restore(state: SessionState) -> Result<Self> {
        validate(&state).map_err(EngineError::CorruptSnapshot)?;

        let SessionState {
            id,
            host,
            config,
            hands,
            responses,
            prompts,
            round,
            result,
            rng,
            history,
        } = state;

        let table = Table {
            hands,
            responses,
            prompts,
            rng: GameRng::from_state(&rng),
        };
        let controller = RoundController::from_parts(config, round, result);
        Ok(GameSession::from_parts(id, host, controller, table, history))
    }
}

fn validate(state: &SessionState) -> std::result::Result<(), String> {
    state.config.validate().map_err(|e| e.to_string())?;

    if state.hands.hand_size() != state.config.hand_size {
        return Err(format!(
            "hand size {} does not match config {}",
            state.hands.hand_size(),
            state.config.hand_size
        ));
    }
    let mut seen = FxHashSet::default();
    if let Some(dup) = state.hands.order().find(|&id| !seen.insert(id)) {
        return Err(format!("{} joined twice", dup));
    }
    if !state.hands.contains(state.host) {
        return Err(format!("host {} is not a player", state.host));
    }

    let table = Table {
        hands: state.hands.clone(),
        responses: state.responses.clone(),
        prompts: state.prompts.clone(),
        rng: GameRng::from_state(&state.rng),
    };
    table.check_invariants()?;

    let round = &state.round;
    if round.round == 0 {
        return Err("round must start at 1".into());
    }
    if let Some(prompt) = &round.current_prompt {
        if !state.prompts.is_in_play(prompt.id) {
            return Err(format!("current prompt {} is not in play", prompt.id));
        }
    }
    let expected_in_play = usize::from(round.current_prompt.is_some());
    if state.prompts.in_play_len() != expected_in_play {
        return Err(format!(
            "{} prompts in play but {} on the table",
            state.prompts.in_play_len(),
            expected_in_play
        ));
    }

    match round.phase {
        Phase::Setup => {
            if round.arbiter.is_some() || round.current_prompt.is_some() {
                return Err("setup phase with a turn in progress".into());
            }
        }
        Phase::Choosing | Phase::Reading => {
            let arbiter = round.arbiter.ok_or("turn in progress without an arbiter")?;
            if !state.hands.contains(arbiter) {
                return Err(format!("arbiter {} is not a player", arbiter));
            }
            if round.current_prompt.is_none() {
                return Err("turn in progress without a prompt".into());
            }
        }
        Phase::GameOver => {
            if state.result.is_none() {
                return Err("game over without a result".into());
            }
        }
    }
    if round.phase != Phase::GameOver && state.result.is_some() {
        return Err(format!("result recorded during {}", round.phase));
    }

    for submission in &round.submissions {
        if round.is_arbiter(submission.player) {
            return Err(format!("arbiter {} has a submission", submission.player));
        }
        let player = state
            .hands
            .player(submission.player)
            .ok_or_else(|| format!("submission from unknown {}", submission.player))?;
        for card in &submission.cards {
            if !player.played_cards.iter().any(|c| c.id == card.id) {
                return Err(format!("{} submitted {} it never played", player.id, card.id));
            }
        }
    }
    for reader in &round.reading_order {
        if !round.has_submitted(*reader) {
            return Err(format!("reading order lists {} without a submission", reader));
        }
    }

    if !state.history.is_sequential() {
        return Err("history sequence numbers have gaps".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, Deck};
    use crate::core::WinCondition;

    fn p(id: u64) -> PlayerId {
        PlayerId::new(id)
    }

    fn session() -> GameSession {
        let mut deck = Deck::new("snap");
        for i in 0..6 {
            deck.prompts.push(PromptCard::new(CardId::new(i), "_?"));
        }
        for i in 0..40 {
            deck.responses.push(ResponseCard::new(CardId::new(i), format!("R{}", i)));
        }
        let config = SessionConfig::default()
            .with_hand_size(4)
            .with_win_condition(WinCondition::Wins(5))
            .with_seed(11);
        let mut session = GameSession::new(SessionId::new(3), p(1), [deck], config).unwrap();
        session.join(p(2)).unwrap();
        session.join(p(3)).unwrap();
        session.start(p(1)).unwrap();
        session
    }

    #[test]
    fn test_snapshot_restore_identity() {
        let mut live = session();
        live.submit_cards(p(2), &[1]).unwrap();

        let snapshot = live.snapshot();
        let restored = GameSession::restore(snapshot.clone()).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn test_restored_session_continues_identically() {
        let mut live = session();
        let mut restored = GameSession::restore(live.snapshot()).unwrap();

        for s in [&mut live, &mut restored] {
            s.submit_cards(p(2), &[0]).unwrap();
            s.submit_cards(p(3), &[2]).unwrap();
            s.close_submissions().unwrap();
            s.pick_winner(p(1), p(3)).unwrap();
        }

        assert_eq!(live.snapshot(), restored.snapshot());
    }

    #[test]
    fn test_rejects_unknown_arbiter() {
        let mut state = session().snapshot();
        state.round.arbiter = Some(p(99));
        assert!(matches!(
            GameSession::restore(state),
            Err(EngineError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn test_rejects_duplicated_card() {
        let mut state = session().snapshot();
        let stolen = state.hands.players()[0].hand[0].clone();
        // Go through serde to plant the same card in two hands.
        let mut json = serde_json::to_value(&state.hands).unwrap();
        json["players"][1]["hand"][0] = serde_json::to_value(&stolen).unwrap();
        state.hands = serde_json::from_value(json).unwrap();

        assert!(matches!(
            GameSession::restore(state),
            Err(EngineError::CorruptSnapshot(_))
        ));
    }

    fn lobby() -> GameSession {
        let mut deck = Deck::new("lobby");
        for i in 0..3 {
            deck.prompts.push(PromptCard::new(CardId::new(i), "_"));
            deck.responses.push(ResponseCard::new(CardId::new(i), "r"));
        }
        let config = SessionConfig::default().with_hand_size(1);
        let mut session = GameSession::new(SessionId::new(4), p(1), [deck], config).unwrap();
        session.join(p(2)).unwrap();
        session
    }

    #[test]
    fn test_rejects_stray_prompt_in_play() {
        let state = lobby().snapshot();
        assert!(GameSession::restore(state.clone()).is_ok());

        // Move a prompt into play with nothing on the table.
        let mut prompts = serde_json::to_value(&state.prompts).unwrap();
        let stray = prompts["active"].as_array_mut().unwrap().remove(0);
        prompts["in_play"] = serde_json::Value::Array(vec![stray["id"].clone()]);
        let mut tampered = state;
        tampered.prompts = serde_json::from_value(prompts).unwrap();

        assert!(matches!(
            GameSession::restore(tampered),
            Err(EngineError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn test_rejects_repeated_player() {
        let state = lobby().snapshot();

        let mut hands = serde_json::to_value(&state.hands).unwrap();
        let second = hands["players"][1].clone();
        hands["players"].as_array_mut().unwrap().push(second);
        let mut tampered = state;
        tampered.hands = serde_json::from_value(hands).unwrap();

        assert!(matches!(
            GameSession::restore(tampered),
            Err(EngineError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn test_rejects_result_outside_game_over() {
        let mut state = session().snapshot();
        state.result = Some(GameResult::Cancelled);
        assert!(GameSession::restore(state).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let snapshot = session().snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}

//! Engine error kinds.
//!
//! Every fallible operation returns `Result<T, EngineError>`. All errors
//! except `DeckExhausted` leave the session untouched; the caller can
//! surface them to the player and carry on.

use thiserror::Error;

use super::player::PlayerId;
use crate::cards::DeckKind;
use crate::rules::Phase;

/// Errors returned across the engine API.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("not enough players to start (have={have}, min={min})")]
    NotEnoughPlayers { have: usize, min: usize },

    #[error("too many players (have={have}, max={max})")]
    TooManyPlayers { have: usize, max: usize },

    #[error("cannot {operation} during {phase}")]
    WrongPhase {
        operation: &'static str,
        phase: Phase,
    },

    #[error("{0} is not allowed to act right now")]
    NotYourTurn(PlayerId),

    #[error("wrong number of cards (expected={expected}, got={got})")]
    WrongCardCount { expected: usize, got: usize },

    #[error("{0} has already submitted this turn")]
    AlreadySubmitted(PlayerId),

    #[error("invalid hand index {index} (hand size={hand_size})")]
    InvalidIndex { index: usize, hand_size: usize },

    #[error("{0} deck exhausted")]
    DeckExhausted(DeckKind),

    #[error("{0} has already joined")]
    AlreadyJoined(PlayerId),

    #[error("{0} is not in this game")]
    UnknownPlayer(PlayerId),

    #[error("only the host can do that")]
    NotHost,

    #[error("{0} has no submission this turn")]
    NoSuchSubmission(PlayerId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

impl EngineError {
    /// Whether this error ends the session.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::DeckExhausted(_))
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

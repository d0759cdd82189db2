//! Core engine types: identifiers, RNG, configuration, errors.
//!
//! Everything here is independent of the game rules; the card, hand and
//! round modules build on it.

pub mod player;
pub mod rng;
pub mod config;
pub mod error;

pub use player::{PlayerId, SessionId};
pub use rng::{GameRng, GameRngState};
pub use config::{SessionConfig, WinCondition};
pub use error::{EngineError, Result};

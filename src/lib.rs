//! # rust-blanks
//!
//! Engine for fill-in-the-blank party card games: each turn one player (the
//! arbiter) reveals a prompt with one or more blanks, everyone else answers
//! with response cards from their hand, and the arbiter picks the funniest
//! answer.
//!
//! ## Design Principles
//!
//! 1. **Independent Sessions**: Every session owns its pools, hands and RNG.
//!    Decks are read-only and shared; nothing else is.
//!
//! 2. **Validate, Then Mutate**: Every operation checks the caller and the
//!    phase before touching state. A rejected request leaves the session
//!    exactly as it was.
//!
//! 3. **Deterministic**: Draws and reading order come from a seeded RNG whose
//!    position is part of the snapshot.
//!
//! ## Architecture
//!
//! - **Pools**: Each card kind is split into active, used, in-play and
//!   retired cards. Draws come from active; when it runs dry, used cards are
//!   shuffled back in.
//!
//! - **Persistent Data Structures**: Pools and history use `im` so snapshots
//!   are O(1) clones.
//!
//! ## Modules
//!
//! - `core`: Player and session IDs, RNG, configuration, errors
//! - `cards`: Card definitions, decks, and per-session pools
//! - `hands`: Player hands and scores
//! - `rules`: Turn state, round controller, win conditions
//! - `session`: Game sessions, snapshots, event history, sharing

pub mod core;
pub mod cards;
pub mod hands;
pub mod rules;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    EngineError, Result,
    PlayerId, SessionId,
    GameRng, GameRngState,
    SessionConfig, WinCondition,
};

pub use crate::cards::{CardId, DeckKind, PromptCard, ResponseCard, Deck, DeckLibrary, CardPool};

pub use crate::hands::{HandStore, Player, Standing};

pub use crate::rules::{Phase, RoundState, Submission, GameResult};

pub use crate::session::{
    GameSession, SessionState,
    History, EventRecord, SessionEvent,
    SharedSession, SessionRegistry,
};

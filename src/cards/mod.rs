//! Card system: definitions, decks, and per-session pools.
//!
//! ## Key Types
//!
//! - `CardId`: Identifier for a card within its kind
//! - `PromptCard` / `ResponseCard`: The two card kinds
//! - `Deck`: A named source set of cards
//! - `DeckLibrary`: Read-only decks shared by every session
//! - `CardPool`: A session's active/used partition of one card kind

pub mod definition;
pub mod deck;
pub mod pool;

pub use definition::{CardId, DeckKind, PoolCard, PromptCard, ResponseCard};
pub use deck::{Deck, DeckLibrary};
pub use pool::CardPool;

//! Source decks and the process-wide deck library.
//!
//! Card content is loaded once by the host application (file, database,
//! whatever) into a `DeckLibrary`. The library is immutable after loading
//! and shared behind an `Arc`; each session copies the cards it needs into
//! its own pools, so no session can ever mutate another's cards.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::definition::{PromptCard, ResponseCard};
use crate::core::{EngineError, Result};

/// A named set of prompt and response cards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub name: String,
    pub prompts: Vec<PromptCard>,
    pub responses: Vec<ResponseCard>,
}

impl Deck {
    /// Create an empty deck.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompts: Vec::new(),
            responses: Vec::new(),
        }
    }

    /// Add a prompt card.
    #[must_use]
    pub fn with_prompt(mut self, prompt: PromptCard) -> Self {
        self.prompts.push(prompt);
        self
    }

    /// Add a response card.
    #[must_use]
    pub fn with_response(mut self, response: ResponseCard) -> Self {
        self.responses.push(response);
        self
    }

    /// Largest `blanks_required` among the prompts (0 for no prompts).
    #[must_use]
    pub fn max_blanks(&self) -> usize {
        self.prompts.iter().map(|p| p.blanks_required).max().unwrap_or(0)
    }
}

/// Read-only registry of every deck the process knows about.
///
/// ```
/// use rust_blanks::cards::{CardId, Deck, DeckLibrary, PromptCard, ResponseCard};
///
/// let mut library = DeckLibrary::new();
/// library
///     .register(
///         Deck::new("base")
///             .with_prompt(PromptCard::new(CardId::new(1), "Why am I sticky?"))
///             .with_response(ResponseCard::new(CardId::new(1), "Jam.")),
///     )
///     .unwrap();
///
/// let decks = library.select(&["base"]).unwrap();
/// assert_eq!(decks[0].responses.len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DeckLibrary {
    decks: FxHashMap<String, Arc<Deck>>,
}

impl DeckLibrary {
    /// Create an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a deck under its name.
    ///
    /// Rejects duplicate names and prompts with zero blanks.
    pub fn register(&mut self, deck: Deck) -> Result<()> {
        if self.decks.contains_key(&deck.name) {
            return Err(EngineError::InvalidConfig(format!(
                "deck '{}' already registered",
                deck.name
            )));
        }
        if let Some(bad) = deck.prompts.iter().find(|p| p.blanks_required == 0) {
            return Err(EngineError::InvalidConfig(format!(
                "prompt {} in deck '{}' has no blanks",
                bad.id, deck.name
            )));
        }
        tracing::debug!(
            deck = %deck.name,
            prompts = deck.prompts.len(),
            responses = deck.responses.len(),
            "Registered deck"
        );
        self.decks.insert(deck.name.clone(), Arc::new(deck));
        Ok(())
    }

    /// Get a deck by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Deck>> {
        self.decks.get(name).cloned()
    }

    /// Resolve several deck names at once, in the order given.
    pub fn select(&self, names: &[&str]) -> Result<Vec<Arc<Deck>>> {
        names
            .iter()
            .map(|name| {
                self.get(name).ok_or_else(|| {
                    EngineError::InvalidConfig(format!("unknown deck '{}'", name))
                })
            })
            .collect()
    }

    /// Number of registered decks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decks.len()
    }

    /// Check if the library is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    /// Deck names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.decks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

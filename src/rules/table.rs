//! The mutable card state of one session: hands, both pools, and the RNG.
//!
//! The round controller borrows a `Table` for every transition, the same
//! way every rule needs the same handful of collaborators.

use std::borrow::Borrow;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::cards::{CardId, CardPool, Deck, PromptCard, ResponseCard};
use crate::core::GameRng;
use crate::hands::HandStore;

/// Hands, pools and randomness of a session.
#[derive(Clone, Debug)]
pub struct Table {
    pub hands: HandStore,
    pub responses: CardPool<ResponseCard>,
    pub prompts: CardPool<PromptCard>,
    pub rng: GameRng,
}

impl Table {
    /// Copy the cards of every deck into fresh pools.
    ///
    /// Decks number their cards independently, so each card gets a
    /// session-local id in merge order: prompts and responses each count
    /// from 0. A deck listed twice is only copied once. Decks are read,
    /// never retained.
    pub fn from_decks<I>(decks: I, hand_size: usize, rng: GameRng) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<Deck>,
    {
        let mut names = FxHashSet::default();
        let mut prompts: Vec<PromptCard> = Vec::new();
        let mut responses: Vec<ResponseCard> = Vec::new();
        for deck in decks {
            let deck = deck.borrow();
            if !names.insert(deck.name.clone()) {
                debug!(deck = %deck.name, "Deck listed twice, skipping");
                continue;
            }
            for card in &deck.prompts {
                let mut card = card.clone();
                card.id = CardId::new(prompts.len() as u32);
                prompts.push(card);
            }
            for card in &deck.responses {
                let mut card = card.clone();
                card.id = CardId::new(responses.len() as u32);
                responses.push(card);
            }
        }

        Self {
            hands: HandStore::new(hand_size),
            responses: CardPool::from_cards(responses),
            prompts: CardPool::from_cards(prompts),
            rng,
        }
    }

    /// Check pool partitions and that every dealt response card is held by
    /// exactly one player.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.responses.check_invariants()?;
        self.prompts.check_invariants()?;

        let mut held = FxHashSet::default();
        for player in self.hands.players() {
            for card in player.hand.iter().chain(player.played_cards.iter()) {
                if !self.responses.is_in_play(card.id) {
                    return Err(format!("{} holds {} which is not in play", player.id, card.id));
                }
                if !held.insert(card.id) {
                    return Err(format!("{} is held twice", card.id));
                }
            }
        }
        if held.len() != self.responses.in_play_len() {
            return Err(format!(
                "{} response cards in play but players hold {}",
                self.responses.in_play_len(),
                held.len()
            ));
        }
        Ok(())
    }
}

//! Card pools: a scarce, per-session supply of one kind of card.
//!
//! A pool partitions its deck into:
//! - `active`: cards that can still be drawn
//! - `used`: cards that have left play and wait for the next reshuffle
//! - in play: ids of cards currently dealt out (hands, submissions, the
//!   current prompt); the cards themselves live with their holder
//! - `retired`: cards permanently taken out of rotation
//!
//! The four partitions are pairwise disjoint and together always hold
//! exactly the deck the pool was created with. Drawing from an empty
//! `active` first moves every `used` card back; only when both are empty
//! does a draw fail with `DeckExhausted`.

use im::{OrdSet, Vector};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use super::definition::{CardId, PoolCard};
use crate::core::{EngineError, GameRng, Result};

/// Active/used partition of one session's cards of a single kind.
///
/// Backed by `im` persistent vectors so cloning a pool for a snapshot is
/// O(1).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPool<T: Clone> {
    active: Vector<T>,
    used: Vector<T>,
    in_play: OrdSet<CardId>,
    retired: Vector<T>,
}

impl<T: PoolCard> CardPool<T> {
    /// Build a pool from source cards. Every card starts active.
    ///
    /// Cards repeating an id already seen are dropped, so merging decks that
    /// share cards never puts one card in the pool twice.
    pub fn from_cards(cards: impl IntoIterator<Item = T>) -> Self {
        let mut seen = FxHashSet::default();
        let mut active = Vector::new();
        let mut duplicates = 0usize;

        for card in cards {
            if seen.insert(card.card_id()) {
                active.push_back(card);
            } else {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            debug!(kind = %T::KIND, duplicates, "Dropped duplicate cards");
        }

        Self {
            active,
            used: Vector::new(),
            in_play: OrdSet::new(),
            retired: Vector::new(),
        }
    }

    /// Remove one card uniformly at random from `active` and put it in play.
    ///
    /// Reshuffles `used` into `active` first when `active` is empty.
    pub fn draw_random(&mut self, rng: &mut GameRng) -> Result<T> {
        if self.active.is_empty() {
            if self.used.is_empty() {
                return Err(EngineError::DeckExhausted(T::KIND));
            }
            self.reshuffle();
        }

        let index = rng.gen_index(self.active.len());
        let card = self.active.remove(index);
        self.in_play.insert(card.card_id());
        Ok(card)
    }

    /// Move an in-play card to `used`.
    ///
    /// Returns false (and changes nothing) if the card is not in play.
    pub fn mark_used(&mut self, card: T) -> bool {
        if !self.leave_play(&card, "mark_used") {
            return false;
        }
        self.used.push_back(card);
        true
    }

    /// Put an in-play card straight back into `active`.
    pub fn return_to_active(&mut self, card: T) -> bool {
        if !self.leave_play(&card, "return_to_active") {
            return false;
        }
        self.active.push_back(card);
        true
    }

    /// Take an in-play card out of rotation for good.
    pub fn retire(&mut self, card: T) -> bool {
        if !self.leave_play(&card, "retire") {
            return false;
        }
        debug!(kind = %T::KIND, card = %card.card_id(), "Retired card");
        self.retired.push_back(card);
        true
    }

    fn leave_play(&mut self, card: &T, operation: &'static str) -> bool {
        let id = card.card_id();
        if self.in_play.remove(&id).is_none() {
            warn!(kind = %T::KIND, card = %id, operation, "Card is not in play");
            return false;
        }
        true
    }

    /// Move every `used` card back into `active`.
    pub fn reshuffle(&mut self) {
        let recycled = std::mem::take(&mut self.used);
        debug!(kind = %T::KIND, recycled = recycled.len(), "Reshuffling pool");
        self.active.append(recycled);
    }

    /// Whether a card is currently dealt out.
    #[must_use]
    pub fn is_in_play(&self, id: CardId) -> bool {
        self.in_play.contains(&id)
    }

    /// Cards available to draw without reshuffling.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Cards waiting for the next reshuffle.
    #[must_use]
    pub fn used_len(&self) -> usize {
        self.used.len()
    }

    /// Cards currently dealt out.
    #[must_use]
    pub fn in_play_len(&self) -> usize {
        self.in_play.len()
    }

    /// Cards permanently out of rotation.
    #[must_use]
    pub fn retired_len(&self) -> usize {
        self.retired.len()
    }

    /// Size of the deck this pool was built from.
    #[must_use]
    pub fn total(&self) -> usize {
        self.active.len() + self.used.len() + self.in_play.len() + self.retired.len()
    }

    /// Cards that can still be drawn, counting a reshuffle.
    #[must_use]
    pub fn drawable(&self) -> usize {
        self.active.len() + self.used.len()
    }

    /// Active cards, in storage order.
    pub fn active(&self) -> impl Iterator<Item = &T> {
        self.active.iter()
    }

    /// Used cards, in the order they left play.
    pub fn used(&self) -> impl Iterator<Item = &T> {
        self.used.iter()
    }

    /// Retired cards.
    pub fn retired(&self) -> impl Iterator<Item = &T> {
        self.retired.iter()
    }

    /// Every card id the pool accounts for, across all partitions.
    #[must_use]
    pub fn card_ids(&self) -> BTreeSet<CardId> {
        self.active
            .iter()
            .chain(self.used.iter())
            .chain(self.retired.iter())
            .map(|c| c.card_id())
            .chain(self.in_play.iter().copied())
            .collect()
    }

    /// Verify the partitions are disjoint and free of duplicates.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let mut seen = FxHashSet::default();
        let stored = self
            .active
            .iter()
            .map(|c| (c.card_id(), "active"))
            .chain(self.used.iter().map(|c| (c.card_id(), "used")))
            .chain(self.retired.iter().map(|c| (c.card_id(), "retired")))
            .chain(self.in_play.iter().map(|&id| (id, "in play")));

        for (id, partition) in stored {
            if !seen.insert(id) {
                return Err(format!("{} {} appears twice (again in {})", T::KIND, id, partition));
            }
        }
        Ok(())
    }
}

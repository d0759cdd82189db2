//! Per-player hands, pending submissions, and won prompts.
//!
//! `HandStore` owns every `Player` of a session in join order. It keeps
//! hands topped up to `hand_size` by drawing from the session's response
//! pool and moves cards between a player's hand and their played cards.
//! Turn rules (who may submit, when) live in the round controller; the
//! store only enforces what it can see: indices and card counts.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::cards::{CardPool, PromptCard, ResponseCard};
use crate::core::{EngineError, GameRng, PlayerId, Result};

/// Cards one player submitted for one prompt.
///
/// Inline storage covers the usual one to three blanks.
pub type Submitted = SmallVec<[ResponseCard; 3]>;

/// A participant in one session.
///
/// Holds no reference back to the session; everything session-wide is
/// looked up by `PlayerId`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Cards available to play, in deal order.
    pub hand: Vec<ResponseCard>,
    /// Cards submitted this turn and not yet resolved.
    pub played_cards: Vec<ResponseCard>,
    /// Prompts this player has won.
    pub cards_won: Vec<PromptCard>,
}

impl Player {
    /// Create a player with empty hand.
    #[must_use]
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            hand: Vec::new(),
            played_cards: Vec::new(),
            cards_won: Vec::new(),
        }
    }

    /// Number of prompts won.
    #[must_use]
    pub fn score(&self) -> usize {
        self.cards_won.len()
    }
}

/// One leaderboard row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub player: PlayerId,
    pub score: usize,
}

/// Every player's cards, in join order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandStore {
    hand_size: usize,
    players: Vec<Player>,
}

impl HandStore {
    /// Create an empty store dealing `hand_size` cards per player.
    #[must_use]
    pub fn new(hand_size: usize) -> Self {
        Self {
            hand_size,
            players: Vec::new(),
        }
    }

    /// Target hand size.
    #[must_use]
    pub fn hand_size(&self) -> usize {
        self.hand_size
    }

    // === Membership ===

    /// Add a player at the end of the join order.
    pub fn add_player(&mut self, id: PlayerId) -> Result<()> {
        if self.contains(id) {
            return Err(EngineError::AlreadyJoined(id));
        }
        self.players.push(Player::new(id));
        Ok(())
    }

    /// Remove a player, keeping everyone else's order.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<Player> {
        let index = self.index_of(id).ok_or(EngineError::UnknownPlayer(id))?;
        Ok(self.players.remove(index))
    }

    /// Check if a player has joined.
    #[must_use]
    pub fn contains(&self, id: PlayerId) -> bool {
        self.index_of(id).is_some()
    }

    /// Position in join order.
    #[must_use]
    pub fn index_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Number of players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Check if nobody has joined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Player IDs in join order.
    pub fn order(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|p| p.id)
    }

    /// Player by join position.
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<PlayerId> {
        self.players.get(index).map(|p| p.id)
    }

    /// Look up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// All players in join order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(EngineError::UnknownPlayer(id))
    }

    // === Dealing ===

    /// Top a player's hand back up to `hand_size`.
    ///
    /// Played cards still attached to the player go to the pool's used
    /// partition first, so they can be reshuffled into this very deal.
    /// On `DeckExhausted` the cards drawn so far go back to the pool and the
    /// hand is left as it was. Returns the number of cards drawn.
    pub fn deal_hand(
        &mut self,
        id: PlayerId,
        pool: &mut CardPool<ResponseCard>,
        rng: &mut GameRng,
    ) -> Result<usize> {
        let hand_size = self.hand_size;
        let player = self.player_mut(id)?;
        if player.hand.len() >= hand_size {
            return Ok(0);
        }

        for card in player.played_cards.drain(..) {
            pool.mark_used(card);
        }

        let needed = hand_size - player.hand.len();
        let mut drawn = Vec::new();
        while drawn.len() < needed {
            match pool.draw_random(rng) {
                Ok(card) => drawn.push(card),
                Err(err) => {
                    for card in drawn {
                        pool.return_to_active(card);
                    }
                    return Err(err);
                }
            }
        }

        debug!(player = %id, drawn = needed, "Dealt cards");
        player.hand.extend(drawn);
        Ok(needed)
    }

    /// Deal every player in join order.
    pub fn deal_all(&mut self, pool: &mut CardPool<ResponseCard>, rng: &mut GameRng) -> Result<()> {
        let ids: Vec<_> = self.order().collect();
        for id in ids {
            self.deal_hand(id, pool, rng)?;
        }
        Ok(())
    }

    // === Playing ===

    /// Move the cards at `indices` from a player's hand to their played
    /// cards, returning them in the order given.
    ///
    /// Fails without touching the hand if the count is not `expected` or
    /// any index is out of range or repeated.
    pub fn play_cards(&mut self, id: PlayerId, indices: &[usize], expected: usize) -> Result<Submitted> {
        let player = self.player_mut(id)?;

        if indices.len() != expected {
            return Err(EngineError::WrongCardCount {
                expected,
                got: indices.len(),
            });
        }
        let hand_size = player.hand.len();
        for (n, &index) in indices.iter().enumerate() {
            if index >= hand_size || indices[..n].contains(&index) {
                return Err(EngineError::InvalidIndex { index, hand_size });
            }
        }

        let picked: Submitted = indices.iter().map(|&i| player.hand[i].clone()).collect();

        let mut descending = indices.to_vec();
        descending.sort_unstable_by(|a, b| b.cmp(a));
        for index in descending {
            player.hand.remove(index);
        }
        player.played_cards.extend(picked.iter().cloned());

        Ok(picked)
    }

    /// Undo a submission: the cards go from played cards back to the hand.
    pub fn unplay_cards(&mut self, id: PlayerId, cards: &[ResponseCard]) -> Result<()> {
        let player = self.player_mut(id)?;
        for card in cards {
            if let Some(pos) = player.played_cards.iter().position(|c| c.id == card.id) {
                let card = player.played_cards.remove(pos);
                player.hand.push(card);
            }
        }
        Ok(())
    }

    /// Send every player's played cards to the pool's used partition.
    pub fn discard_played(&mut self, pool: &mut CardPool<ResponseCard>) {
        for player in &mut self.players {
            for card in player.played_cards.drain(..) {
                pool.mark_used(card);
            }
        }
    }

    /// Give a won prompt to a player.
    pub fn award(&mut self, id: PlayerId, prompt: PromptCard) -> Result<()> {
        self.player_mut(id)?.cards_won.push(prompt);
        Ok(())
    }

    // === Scores ===

    /// Scores sorted by prompts won, highest first; ties keep join order.
    #[must_use]
    pub fn leaderboard(&self) -> Vec<Standing> {
        let mut rows: Vec<_> = self
            .players
            .iter()
            .map(|p| Standing {
                player: p.id,
                score: p.score(),
            })
            .collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        rows
    }

    /// Highest score and every player holding it, in join order.
    #[must_use]
    pub fn leaders(&self) -> (usize, Vec<PlayerId>) {
        let best = self.players.iter().map(Player::score).max().unwrap_or(0);
        let ids = self
            .players
            .iter()
            .filter(|p| p.score() == best)
            .map(|p| p.id)
            .collect();
        (best, ids)
    }
}

//! Game results and win-condition evaluation.

use serde::{Deserialize, Serialize};

use crate::cards::DeckKind;
use crate::core::{PlayerId, WinCondition};
use crate::hands::HandStore;

/// How a session ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// Single winner.
    Winner(PlayerId),
    /// Several players tied for the most won prompts, in join order.
    Winners(Vec<PlayerId>),
    /// Stopped by `cancel`.
    Cancelled,
    /// A deck ran dry mid-game.
    Aborted(DeckKind),
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        self.winners().contains(&player)
    }

    /// Every winning player (empty for cancelled or aborted games).
    #[must_use]
    pub fn winners(&self) -> &[PlayerId] {
        match self {
            GameResult::Winner(p) => std::slice::from_ref(p),
            GameResult::Winners(ps) => ps,
            GameResult::Cancelled | GameResult::Aborted(_) => &[],
        }
    }
}

/// Decide whether the game is over right after `last_winner` was awarded a
/// prompt and the arbiter seat advanced.
///
/// - `Wins(k)`: over once `last_winner` holds `k` prompts. Only the player
///   just awarded can have crossed the line.
/// - `Rounds(k)`: over once `round >= k`; every player tied for the top
///   score wins.
#[must_use]
pub fn evaluate(
    condition: WinCondition,
    round: u32,
    hands: &HandStore,
    last_winner: PlayerId,
) -> Option<GameResult> {
    match condition {
        WinCondition::Wins(k) => {
            let score = hands.player(last_winner).map_or(0, |p| p.score());
            (score >= k as usize).then_some(GameResult::Winner(last_winner))
        }
        WinCondition::Rounds(k) => {
            if round < k {
                return None;
            }
            let (_, mut leaders) = hands.leaders();
            Some(if leaders.len() == 1 {
                GameResult::Winner(leaders.remove(0))
            } else {
                GameResult::Winners(leaders)
            })
        }
    }
}

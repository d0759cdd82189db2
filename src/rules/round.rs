//! Turn state: phase, round counter, arbiter, prompt and submissions.

use serde::{Deserialize, Serialize};

use crate::cards::PromptCard;
use crate::core::PlayerId;
use crate::hands::Submitted;

/// Session phase.
///
/// Moves SETUP → CHOOSING ⇄ READING → GAME_OVER. `GameOver` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Lobby: players join, nothing dealt.
    #[default]
    Setup,
    /// Players pick cards for the current prompt.
    Choosing,
    /// The arbiter reads submissions and picks one.
    Reading,
    /// Finished or cancelled.
    GameOver,
}

impl Phase {
    /// Whether a turn is underway.
    #[must_use]
    pub const fn in_turn(self) -> bool {
        matches!(self, Phase::Choosing | Phase::Reading)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::Setup => "setup",
            Phase::Choosing => "choosing",
            Phase::Reading => "reading",
            Phase::GameOver => "game over",
        })
    }
}

/// One player's cards for the current prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub player: PlayerId,
    pub cards: Submitted,
}

/// Round/turn state of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    pub phase: Phase,

    /// Starts at 1; bumped each time the arbiter seat wraps to the first
    /// player.
    pub round: u32,

    /// Current judge. `None` before the game starts.
    pub arbiter: Option<PlayerId>,

    pub current_prompt: Option<PromptCard>,

    /// Submissions in the order they arrived.
    pub submissions: Vec<Submission>,

    /// Shuffled submitter order fixed when submissions close, so the
    /// arbiter reads them without knowing who played what.
    pub reading_order: Vec<PlayerId>,
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundState {
    /// Fresh state in `Setup`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Phase::Setup,
            round: 1,
            arbiter: None,
            current_prompt: None,
            submissions: Vec::new(),
            reading_order: Vec::new(),
        }
    }

    /// Check if a player is the current arbiter.
    #[must_use]
    pub fn is_arbiter(&self, player: PlayerId) -> bool {
        self.arbiter == Some(player)
    }

    /// A player's submission this turn.
    #[must_use]
    pub fn submission(&self, player: PlayerId) -> Option<&Submission> {
        self.submissions.iter().find(|s| s.player == player)
    }

    /// Check if a player has submitted this turn.
    #[must_use]
    pub fn has_submitted(&self, player: PlayerId) -> bool {
        self.submission(player).is_some()
    }

    /// Drop all in-progress turn data.
    pub fn clear_turn(&mut self) -> Vec<Submission> {
        self.reading_order.clear();
        std::mem::take(&mut self.submissions)
    }
}

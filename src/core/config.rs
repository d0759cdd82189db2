//! Session configuration.
//!
//! Hosts configure a session at creation by providing a `SessionConfig`:
//! - hand size and win condition
//! - the player-count policy enforced by `start`
//! - the RNG seed
//! - an optional retirement policy for over-reported prompts
//!
//! The engine never hardcodes these limits.

use serde::{Deserialize, Serialize};

use super::error::{EngineError, Result};

/// When the game ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinCondition {
    /// Play until `round` reaches the threshold; everyone tied for the most
    /// won prompts wins.
    Rounds(u32),
    /// The first player to win this many prompts wins outright.
    Wins(u32),
}

impl WinCondition {
    /// The configured threshold.
    #[must_use]
    pub const fn threshold(self) -> u32 {
        match self {
            WinCondition::Rounds(k) | WinCondition::Wins(k) => k,
        }
    }
}

impl std::fmt::Display for WinCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WinCondition::Rounds(k) => write!(f, "{} rounds", k),
            WinCondition::Wins(k) => write!(f, "first to {} wins", k),
        }
    }
}

/// Complete session configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cards each player holds between turns.
    pub hand_size: usize,

    /// End-of-game rule.
    pub win_condition: WinCondition,

    /// Fewest players `start` accepts (the arbiter counts).
    pub min_players: usize,

    /// Most players the session admits.
    pub max_players: usize,

    /// Seed for the session RNG.
    pub seed: u64,

    /// Retire a prompt permanently once it has been discarded this many
    /// times. `None` keeps reported prompts in rotation.
    pub retire_after_reports: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hand_size: 10,
            win_condition: WinCondition::Wins(7),
            min_players: 3,
            max_players: 20,
            seed: 0,
            retire_after_reports: None,
        }
    }
}

impl SessionConfig {
    /// Set the hand size.
    #[must_use]
    pub fn with_hand_size(mut self, hand_size: usize) -> Self {
        self.hand_size = hand_size;
        self
    }

    /// Set the win condition.
    #[must_use]
    pub fn with_win_condition(mut self, win_condition: WinCondition) -> Self {
        self.win_condition = win_condition;
        self
    }

    /// Set the accepted player range.
    #[must_use]
    pub fn with_player_limits(mut self, min: usize, max: usize) -> Self {
        self.min_players = min;
        self.max_players = max;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Retire prompts after `reports` discards.
    #[must_use]
    pub fn with_retirement(mut self, reports: u32) -> Self {
        self.retire_after_reports = Some(reports);
        self
    }

    /// Check that the configuration describes a playable game.
    pub fn validate(&self) -> Result<()> {
        if self.hand_size == 0 {
            return Err(EngineError::InvalidConfig("hand size must be at least 1".into()));
        }
        if self.win_condition.threshold() == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "win condition threshold must be at least 1 ({})",
                self.win_condition
            )));
        }
        // One arbiter plus at least one submitter.
        if self.min_players < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "min_players must be at least 2 (got {})",
                self.min_players
            )));
        }
        if self.min_players > self.max_players {
            return Err(EngineError::InvalidConfig(format!(
                "min_players {} exceeds max_players {}",
                self.min_players, self.max_players
            )));
        }
        if self.retire_after_reports == Some(0) {
            return Err(EngineError::InvalidConfig(
                "retire_after_reports must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

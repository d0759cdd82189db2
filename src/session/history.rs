//! Session event history.
//!
//! Every successful mutation of a session appends one `EventRecord`. The
//! host application can replay the log to render what happened (who won
//! which prompt, when a prompt was thrown out) without the engine knowing
//! anything about how it is displayed.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::cards::CardId;
use crate::core::PlayerId;
use crate::rules::GameResult;

/// Something that happened in a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    Joined { player: PlayerId },
    Left { player: PlayerId },
    /// A new prompt is up; emitted at game start and after each resolved
    /// or discarded prompt.
    TurnStarted {
        round: u32,
        arbiter: PlayerId,
        prompt: CardId,
    },
    Submitted { player: PlayerId },
    SubmissionsClosed { count: usize },
    WinnerPicked {
        arbiter: PlayerId,
        winner: PlayerId,
        prompt: CardId,
    },
    PromptDiscarded {
        arbiter: PlayerId,
        prompt: CardId,
        report_count: u32,
    },
    GameEnded { result: GameResult },
}

/// A sequenced event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the session log, starting at 0.
    pub sequence: u64,

    /// Round the event happened in.
    pub round: u32,

    pub event: SessionEvent,
}

/// Append-only event log.
///
/// Backed by `im::Vector` so snapshots share structure with the live log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    records: Vector<EventRecord>,
}

impl History {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&mut self, round: u32, event: SessionEvent) {
        let sequence = self.records.len() as u64;
        self.records.push_back(EventRecord {
            sequence,
            round,
            event,
        });
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent event.
    #[must_use]
    pub fn last(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    /// All events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }

    /// Events from `sequence` onward, for callers polling for news.
    pub fn since(&self, sequence: u64) -> impl Iterator<Item = &EventRecord> {
        let start = (sequence as usize).min(self.records.len());
        self.records.iter().skip(start)
    }

    /// Whether sequence numbers run 0, 1, 2, ... without gaps.
    #[must_use]
    pub fn is_sequential(&self) -> bool {
        self.records
            .iter()
            .enumerate()
            .all(|(i, r)| r.sequence == i as u64)
    }
}

//! Card definitions - prompt and response cards.
//!
//! Cards are plain values. The text never changes during a game; the only
//! mutable field is `report_count`, bumped when an arbiter throws a prompt
//! out. Identity is the `CardId`, so two copies of a card with different
//! report counts are still the same card.

use serde::{Deserialize, Serialize};

/// Unique identifier for a card within its deck kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Which kind of card a pool holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeckKind {
    Prompt,
    Response,
}

impl std::fmt::Display for DeckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeckKind::Prompt => f.write_str("prompt"),
            DeckKind::Response => f.write_str("response"),
        }
    }
}

/// Anything a `CardPool` can hold.
pub trait PoolCard: Clone {
    /// Pool kind, reported in `DeckExhausted`.
    const KIND: DeckKind;

    /// Stable identity of the card.
    fn card_id(&self) -> CardId;
}

/// A playable phrase submitted against a prompt.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponseCard {
    pub id: CardId,
    pub text: String,
    #[serde(default)]
    pub report_count: u32,
}

impl ResponseCard {
    /// Create a new response card.
    pub fn new(id: CardId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            report_count: 0,
        }
    }
}

impl PoolCard for ResponseCard {
    const KIND: DeckKind = DeckKind::Response;

    fn card_id(&self) -> CardId {
        self.id
    }
}

/// A fill-in-the-blank prompt.
///
/// `blanks_required` is the number of response cards each player submits
/// against it. Always at least 1.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptCard {
    pub id: CardId,
    pub text: String,
    pub blanks_required: usize,
    #[serde(default)]
    pub report_count: u32,
}

impl PromptCard {
    /// Create a single-blank prompt.
    pub fn new(id: CardId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            blanks_required: 1,
            report_count: 0,
        }
    }

    /// Require more than one response. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_blanks(mut self, blanks: usize) -> Self {
        self.blanks_required = blanks.max(1);
        self
    }

    /// Fill the blanks with submitted texts.
    ///
    /// Each `_` run in the prompt text is replaced in order; answers left
    /// over (prompts with no visible blank) are appended.
    #[must_use]
    pub fn fill(&self, answers: &[ResponseCard]) -> String {
        let mut out = String::with_capacity(self.text.len() + 32);
        let mut answers = answers.iter();
        let mut chars = self.text.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '_' {
                out.push(c);
                continue;
            }
            while chars.peek() == Some(&'_') {
                chars.next();
            }
            match answers.next() {
                Some(answer) => out.push_str(answer.text.trim_end_matches('.')),
                None => out.push('_'),
            }
        }

        for answer in answers {
            out.push(' ');
            out.push_str(&answer.text);
        }
        out
    }
}

impl PoolCard for PromptCard {
    const KIND: DeckKind = DeckKind::Prompt;

    fn card_id(&self) -> CardId {
        self.id
    }
}

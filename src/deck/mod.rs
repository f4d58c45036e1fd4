// Public API
pub use cards::{Card, Rank, Suit};

// Internal modules
mod cards;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// The single shared deck of cards. Holds an ordered 52-card sequence whose
/// composition is fixed for the process lifetime; only the order changes.
///
/// The deck has no concurrency awareness of its own. The broadcast
/// coordinator owns the one instance and serializes access to it.
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Builds the canonical 52-card set and shuffles it once, so the first
    /// snapshot a player sees is already randomized.
    pub fn new() -> Self {
        let mut deck = Self {
            cards: Card::all_cards(),
        };
        deck.shuffle();
        deck
    }

    /// Randomizes the card order in place with a uniform permutation.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
    }

    /// An independently-owned copy of the current order. A shuffle that runs
    /// after this returns cannot touch the data a caller is serializing.
    pub fn snapshot(&self) -> DeckSnapshot {
        DeckSnapshot {
            cards: self.cards.clone(),
        }
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable capture of the deck order, and the payload pushed to every
/// connected player. Wire form is one JSON object per line:
/// `{"cards":[{"suit":"Spade","value":5}, ...]}` — the field names are an
/// interface contract players depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSnapshot {
    pub cards: Vec<Card>,
}

impl DeckSnapshot {
    /// Encodes the snapshot as a single line of JSON. Never shuffles and
    /// needs no lock held by the caller.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

use serde::{Deserialize, Serialize};

pub type DeckId = i64;
pub type CardId = i64;

/// A named group of cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Study progress carried on every card. Freshly imported cards start zeroed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardProgress {
    pub last_reviewed: Option<String>,
    pub reviews: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub deck_id: DeckId,
    pub kind: String,
    pub front: String,
    pub back: String,
    pub notes: String,
    pub tags: Vec<String>,
    pub tag_excludes: Vec<String>,
    pub progress: CardProgress,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields needed to insert a card. Ids and timestamps are assigned by storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCard {
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
    pub notes: String,
    pub tags: Vec<String>,
    pub tag_excludes: Vec<String>,
    pub progress: CardProgress,
}

/// Counts reported after validating (and optionally importing) a CSV file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub valid: usize,
    pub invalid: usize,
    pub warnings: usize,
    pub imported: usize,
}

pub mod db;
pub mod repo;
pub mod store;

pub use store::SqliteStore;

use crate::error::AppError;
use crate::model::{Card, Deck, DeckId, NewCard};

/// The write surface the CSV importer needs from storage.
///
/// Reads return the current state; writes may be buffered until `persist`.
pub trait CardStore {
    fn list_decks(&self) -> Result<Vec<Deck>, AppError>;

    fn list_cards(&self) -> Result<Vec<Card>, AppError>;

    /// Create an empty deck (no tags, fresh timestamps) and return its id.
    fn create_deck(&mut self, name: &str) -> Result<DeckId, AppError>;

    fn create_card(&mut self, card: NewCard) -> Result<(), AppError>;

    /// Make every write since the last persist durable.
    fn persist(&mut self) -> Result<(), AppError>;
}

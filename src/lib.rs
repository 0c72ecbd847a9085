pub mod error;
pub mod import;
pub mod model;
pub mod storage;

use std::path::Path;

use rusqlite::Connection;

use error::AppError;
use import::{FieldMapping, ImportOptions, ParseOptions, RawTable, ValidationResult};
use model::{Card, Deck};
use storage::SqliteStore;

/// Main entry point for the flashlearn library.
///
/// Wraps a SQLite connection and exposes deck/card storage plus the CSV
/// import pipeline. Used by the CLI binary and usable as a library.
pub struct Flashlearn {
    conn: Connection,
}

impl Flashlearn {
    /// Open (or create) a database at the given path and initialize the schema.
    pub fn new(db_path: &Path) -> Result<Self, AppError> {
        let conn = Connection::open(db_path)?;
        storage::db::init_db(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()?;
        storage::db::init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // ── Deck operations ──────────────────────────────────────────────────

    pub fn create_deck(&self, name: &str) -> Result<Deck, AppError> {
        storage::repo::create_deck(&self.conn, name, &[])
    }

    pub fn list_decks(&self) -> Result<Vec<Deck>, AppError> {
        storage::repo::list_decks(&self.conn)
    }

    pub fn deck_by_name(&self, name: &str) -> Result<Deck, AppError> {
        storage::repo::deck_by_name(&self.conn, name)
    }

    // ── Card operations ──────────────────────────────────────────────────

    /// List cards, optionally restricted to one deck by name.
    pub fn list_cards(&self, deck_name: Option<&str>) -> Result<Vec<Card>, AppError> {
        let deck_id = deck_name
            .map(|name| self.deck_by_name(name).map(|d| d.id))
            .transpose()?;
        storage::repo::list_cards(&self.conn, deck_id)
    }

    // ── CSV import ───────────────────────────────────────────────────────

    pub fn parse_csv(&self, text: &str, options: &ParseOptions) -> Result<RawTable, AppError> {
        Ok(import::parse_file(text, options)?)
    }

    /// Validate a parsed table against the decks and cards currently stored.
    pub fn validate_csv(
        &self,
        table: &RawTable,
        mapping: &FieldMapping,
        options: &ImportOptions,
    ) -> Result<ValidationResult, AppError> {
        let decks = self.list_decks()?;
        let cards = storage::repo::list_cards(&self.conn, None)?;
        Ok(import::validate(table, mapping, options, &cards, &decks))
    }

    /// Import the valid rows of a validation result in one transaction.
    /// Returns the number of cards created.
    pub fn import_csv(&self, result: &ValidationResult) -> Result<usize, AppError> {
        let mut store = SqliteStore::new(&self.conn)?;
        import::execute(result, &mut store)
    }
}

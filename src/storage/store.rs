use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::debug;

use crate::error::AppError;
use crate::model::{Card, Deck, DeckId, NewCard};
use crate::storage::{repo, CardStore};

/// `CardStore` over a SQLite connection.
///
/// Opening the store starts an immediate transaction, so the database write
/// lock is held from the first deck read until `persist` commits. Dropping
/// the store before that rolls everything back.
pub struct SqliteStore<'a> {
    tx: Option<Transaction<'a>>,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Result<Self, AppError> {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        Ok(Self { tx: Some(tx) })
    }

    fn tx(&self) -> Result<&Transaction<'a>, AppError> {
        self.tx
            .as_ref()
            .ok_or_else(|| AppError::InvalidArgument("store already persisted".into()))
    }
}

impl CardStore for SqliteStore<'_> {
    fn list_decks(&self) -> Result<Vec<Deck>, AppError> {
        repo::list_decks(self.tx()?)
    }

    fn list_cards(&self) -> Result<Vec<Card>, AppError> {
        repo::list_cards(self.tx()?, None)
    }

    fn create_deck(&mut self, name: &str) -> Result<DeckId, AppError> {
        Ok(repo::create_deck(self.tx()?, name, &[])?.id)
    }

    fn create_card(&mut self, card: NewCard) -> Result<(), AppError> {
        repo::add_card(self.tx()?, &card)?;
        Ok(())
    }

    fn persist(&mut self) -> Result<(), AppError> {
        if let Some(tx) = self.tx.take() {
            tx.commit()?;
            debug!("import transaction committed");
        }
        Ok(())
    }
}

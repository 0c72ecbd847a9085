use std::collections::HashMap;

use tracing::info;

use crate::error::AppError;
use crate::import::validate::{deck_key, DeckRef, ValidationResult, FALLBACK_DECK_NAME};
use crate::model::{CardProgress, DeckId, NewCard};
use crate::storage::CardStore;

/// Deck lookup for one import run. Decks created during the run are added so
/// each new name is created once.
struct DeckResolver {
    by_key: HashMap<String, DeckId>,
    created: usize,
}

impl DeckResolver {
    fn seed<S: CardStore + ?Sized>(store: &S) -> Result<Self, AppError> {
        let by_key = store
            .list_decks()?
            .into_iter()
            .map(|d| (deck_key(&d.name), d.id))
            .collect();
        Ok(Self { by_key, created: 0 })
    }

    fn by_name<S: CardStore + ?Sized>(
        &mut self,
        store: &mut S,
        key: &str,
        label: &str,
    ) -> Result<DeckId, AppError> {
        if let Some(id) = self.by_key.get(key) {
            return Ok(*id);
        }
        let id = store.create_deck(label)?;
        info!(deck = label, id, "created deck");
        self.by_key.insert(key.to_string(), id);
        self.created += 1;
        Ok(id)
    }

    fn resolve<S: CardStore + ?Sized>(
        &mut self,
        store: &mut S,
        deck_ref: &DeckRef,
        label: &str,
    ) -> Result<DeckId, AppError> {
        match deck_ref {
            DeckRef::Existing(id) => Ok(*id),
            DeckRef::ByName(key) => self.by_name(store, key, label),
            DeckRef::Unassigned => {
                self.by_name(store, &deck_key(FALLBACK_DECK_NAME), FALLBACK_DECK_NAME)
            }
        }
    }
}

/// Write every valid row of `result` to `store` and return the number of
/// cards created.
///
/// Missing decks are created on first use. Cards start with no review
/// progress. Nothing is persisted unless every write succeeds.
pub fn execute<S: CardStore + ?Sized>(
    result: &ValidationResult,
    store: &mut S,
) -> Result<usize, AppError> {
    let mut decks = DeckResolver::seed(store)?;
    let mut imported = 0;

    for row in &result.valid_rows {
        let deck_id = decks.resolve(store, &row.deck_ref, &row.deck_label)?;
        store.create_card(NewCard {
            deck_id,
            front: row.front.clone(),
            back: row.back.clone(),
            notes: row.notes.clone(),
            tags: row.tags.clone(),
            tag_excludes: Vec::new(),
            progress: CardProgress::default(),
        })?;
        imported += 1;
    }

    store.persist()?;
    info!(imported, decks_created = decks.created, "imported CSV rows");
    Ok(imported)
}

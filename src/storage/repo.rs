use chrono::Utc;
use rusqlite::{params, Connection, Row};

use crate::error::AppError;
use crate::model::{Card, CardId, CardProgress, Deck, DeckId, NewCard};

const DECK_COLUMNS: &str = "id, name, tags, created_at, updated_at";
const CARD_COLUMNS: &str = "id, deck_id, kind, front, back, notes, tags, tag_excludes,
                            last_reviewed, reviews, created_at, updated_at";

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn tags_from_json(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn deck_from_row(row: &Row<'_>) -> rusqlite::Result<Deck> {
    let tags: String = row.get(2)?;
    Ok(Deck {
        id: row.get(0)?,
        name: row.get(1)?,
        tags: tags_from_json(&tags),
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    let tags: String = row.get(6)?;
    let tag_excludes: String = row.get(7)?;
    Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        kind: row.get(2)?,
        front: row.get(3)?,
        back: row.get(4)?,
        notes: row.get(5)?,
        tags: tags_from_json(&tags),
        tag_excludes: tags_from_json(&tag_excludes),
        progress: CardProgress {
            last_reviewed: row.get(8)?,
            reviews: row.get(9)?,
        },
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Look up a deck by name (case-insensitive), returning DeckNotFound if missing.
pub fn deck_by_name(conn: &Connection, name: &str) -> Result<Deck, AppError> {
    conn.query_row(
        &format!("SELECT {DECK_COLUMNS} FROM decks WHERE name = ?1 COLLATE NOCASE"),
        params![name.trim()],
        deck_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::DeckNotFound(name.to_string()),
        other => AppError::Db(other),
    })
}

// ── Deck operations ──────────────────────────────────────────────────────

pub fn create_deck(conn: &Connection, name: &str, tags: &[String]) -> Result<Deck, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidArgument("deck name must not be empty".into()));
    }
    let tags_str = serde_json::to_string(tags)?;
    let ts = now();
    conn.execute(
        "INSERT INTO decks (name, tags, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![name, tags_str, ts],
    )?;
    Ok(Deck {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        tags: tags.to_vec(),
        created_at: ts.clone(),
        updated_at: ts,
    })
}

pub fn list_decks(conn: &Connection) -> Result<Vec<Deck>, AppError> {
    let mut stmt = conn.prepare(&format!("SELECT {DECK_COLUMNS} FROM decks ORDER BY id"))?;
    let decks = stmt
        .query_map([], deck_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(decks)
}

// ── Card operations ──────────────────────────────────────────────────────

pub fn add_card(conn: &Connection, card: &NewCard) -> Result<CardId, AppError> {
    let ts = now();
    conn.execute(
        "INSERT INTO cards (deck_id, front, back, notes, tags, tag_excludes,
                            last_reviewed, reviews, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            card.deck_id,
            card.front,
            card.back,
            card.notes,
            serde_json::to_string(&card.tags)?,
            serde_json::to_string(&card.tag_excludes)?,
            card.progress.last_reviewed,
            card.progress.reviews,
            ts,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All cards, or only those in one deck, in insertion order.
pub fn list_cards(conn: &Connection, deck_id: Option<DeckId>) -> Result<Vec<Card>, AppError> {
    let cards = match deck_id {
        Some(id) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CARD_COLUMNS} FROM cards WHERE deck_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![id], card_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!("SELECT {CARD_COLUMNS} FROM cards ORDER BY id"))?;
            let rows = stmt.query_map([], card_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(cards)
}

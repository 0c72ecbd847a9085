use rusqlite::Connection;

use crate::error::AppError;

/// Initialize the database schema. Uses CREATE TABLE IF NOT EXISTS so it's
/// safe to call on every startup.
pub fn init_db(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS decks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_id INTEGER NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
            kind TEXT NOT NULL DEFAULT 'basic',
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT '[]',
            tag_excludes TEXT NOT NULL DEFAULT '[]',
            last_reviewed TEXT,
            reviews INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS cards_deck_id ON cards(deck_id);
        ",
    )?;

    Ok(())
}

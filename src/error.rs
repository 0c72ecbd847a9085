use thiserror::Error;

use crate::import::Field;
use crate::model::DeckId;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Deck not found: {0}")]
    DeckNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Structural problems with the CSV text itself. Fatal to the whole file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("CSV has an unterminated quoted value.")]
    UnterminatedQuote,

    #[error("CSV contains no rows.")]
    Empty,

    #[error("CSV header row is empty.")]
    EmptyHeader,

    #[error("Unsupported delimiter: {0:?}")]
    InvalidDelimiter(String),
}

/// Column mapping problems, detected before any row is looked at.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Front and back columns are required in mapping.")]
    MissingRequired,

    #[error("Front and back mappings must use different columns.")]
    SameColumn,

    #[error("Column {index} mapped to {field} does not exist (table has {columns} columns).")]
    ColumnOutOfRange {
        field: Field,
        index: usize,
        columns: usize,
    },

    #[error("Default deck {0} does not exist.")]
    DefaultDeckNotFound(DeckId),
}

/// Why a single CSV row was rejected. Rows are rejected whole; other rows
/// keep being processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("Missing required front or back value.")]
    MissingRequired,

    #[error("Field length exceeded (front/back/notes too long).")]
    TooLong,

    #[error("Deck \"{0}\" not found.")]
    DeckNotFound(String),

    #[error("Duplicate card in target deck.")]
    Duplicate,
}

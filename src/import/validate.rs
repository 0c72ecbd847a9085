use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{MappingError, RowError};
use crate::import::mapping::FieldMapping;
use crate::import::parser::{RawRow, RawTable};
use crate::model::{Card, Deck, DeckId, ImportSummary};

pub const MAX_FRONT_CHARS: usize = 2000;
pub const MAX_BACK_CHARS: usize = 4000;
pub const MAX_NOTES_CHARS: usize = 6000;

/// Number of valid rows kept for the confirmation preview.
pub const PREVIEW_ROWS: usize = 20;

/// Deck that receives rows with no deck of their own and no default deck.
pub const FALLBACK_DECK_NAME: &str = "Imported CSV";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportOptions {
    pub default_deck_id: Option<DeckId>,
    pub tag_separator: char,
    pub create_missing_decks: bool,
    pub skip_duplicates: bool,
    pub lock_to_default_deck: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            default_deck_id: None,
            tag_separator: ',',
            create_missing_decks: true,
            skip_duplicates: true,
            lock_to_default_deck: false,
        }
    }
}

/// Where a validated row will land.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum DeckRef {
    /// A deck that already exists.
    Existing(DeckId),
    /// A deck to create on import, keyed by lowercased name.
    ByName(String),
    /// No deck given; the row goes to the fallback deck.
    Unassigned,
}

impl fmt::Display for DeckRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckRef::Existing(id) => write!(f, "existing:{id}"),
            DeckRef::ByName(name) => write!(f, "byName:{name}"),
            DeckRef::Unassigned => f.write_str("none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidRow {
    pub row_number: usize,
    pub front: String,
    pub back: String,
    pub notes: String,
    pub tags: Vec<String>,
    pub deck_ref: DeckRef,
    pub deck_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRow {
    pub row_number: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid_rows: Vec<ValidRow>,
    pub error_rows: Vec<ErrorRow>,
    /// Valid rows that had no deck and will go to the fallback deck.
    pub warn_rows: usize,
    pub preview: Vec<ValidRow>,
}

impl ValidationResult {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            valid: self.valid_rows.len(),
            invalid: self.error_rows.len(),
            warnings: self.warn_rows,
            imported: 0,
        }
    }
}

/// Identity of a card for duplicate suppression: target deck plus normalized
/// front and back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub deck: DeckRef,
    pub front: String,
    pub back: String,
}

impl DedupKey {
    pub fn new(deck: DeckRef, front: &str, back: &str) -> Self {
        Self {
            deck,
            front: normalize_dup_text(front),
            back: normalize_dup_text(back),
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.deck, self.front, self.back)
    }
}

/// Trim, lowercase and collapse whitespace runs to one space.
pub fn normalize_dup_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Key used to match deck names case-insensitively.
pub(crate) fn deck_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Split a tag cell, trimming parts, dropping empties and repeats.
pub fn parse_tags(raw: &str, separator: char) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(separator)
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn cell(row: &RawRow, column: Option<usize>) -> &str {
    column
        .and_then(|i| row.values.get(i))
        .map_or("", |v| v.trim())
}

struct Validator<'a> {
    mapping: &'a FieldMapping,
    options: &'a ImportOptions,
    decks_by_key: HashMap<String, &'a Deck>,
    default_deck: Option<(DeckId, String)>,
    fallback: DeckRef,
    fallback_label: String,
    seen: HashSet<DedupKey>,
}

impl<'a> Validator<'a> {
    fn new(
        mapping: &'a FieldMapping,
        options: &'a ImportOptions,
        existing_cards: &[Card],
        decks: &'a [Deck],
    ) -> Self {
        let decks_by_key: HashMap<String, &Deck> =
            decks.iter().map(|d| (deck_key(&d.name), d)).collect();

        let default_deck = options
            .default_deck_id
            .and_then(|id| decks.iter().find(|d| d.id == id))
            .map(|d| (d.id, d.name.clone()));

        // Deck-less rows dedup against the deck they will actually end up in.
        let (fallback, fallback_label) = match decks_by_key.get(&deck_key(FALLBACK_DECK_NAME)) {
            Some(d) => (DeckRef::Existing(d.id), d.name.clone()),
            None => (
                DeckRef::ByName(deck_key(FALLBACK_DECK_NAME)),
                FALLBACK_DECK_NAME.to_string(),
            ),
        };

        let seen = if options.skip_duplicates {
            existing_cards
                .iter()
                .map(|c| DedupKey::new(DeckRef::Existing(c.deck_id), &c.front, &c.back))
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            mapping,
            options,
            decks_by_key,
            default_deck,
            fallback,
            fallback_label,
            seen,
        }
    }

    /// Resolve the row's deck. `Ok(None)` means the row has no deck.
    fn resolve_deck(&self, raw_deck: &str) -> Result<Option<(DeckRef, String)>, RowError> {
        if !raw_deck.is_empty() {
            let key = deck_key(raw_deck);
            if let Some(deck) = self.decks_by_key.get(&key) {
                return Ok(Some((DeckRef::Existing(deck.id), deck.name.clone())));
            }
            if self.options.create_missing_decks {
                return Ok(Some((DeckRef::ByName(key), raw_deck.to_string())));
            }
            return Err(RowError::DeckNotFound(raw_deck.to_string()));
        }
        Ok(self
            .default_deck
            .as_ref()
            .map(|(id, label)| (DeckRef::Existing(*id), label.clone())))
    }

    /// Validate one row. The bool is true when the row had no deck.
    fn check_row(&mut self, row: &RawRow) -> Result<(ValidRow, bool), RowError> {
        let front = cell(row, self.mapping.front);
        let back = cell(row, self.mapping.back);
        let notes = cell(row, self.mapping.notes);

        if front.is_empty() || back.is_empty() {
            return Err(RowError::MissingRequired);
        }
        if front.chars().count() > MAX_FRONT_CHARS
            || back.chars().count() > MAX_BACK_CHARS
            || notes.chars().count() > MAX_NOTES_CHARS
        {
            return Err(RowError::TooLong);
        }

        let raw_deck = if self.options.lock_to_default_deck {
            ""
        } else {
            cell(row, self.mapping.deck)
        };
        let (deck_ref, deck_label, deckless) = match self.resolve_deck(raw_deck)? {
            Some((deck_ref, label)) => (deck_ref, label, false),
            None => (DeckRef::Unassigned, self.fallback_label.clone(), true),
        };

        let tags = match self.mapping.tags {
            Some(_) => parse_tags(cell(row, self.mapping.tags), self.options.tag_separator),
            None => Vec::new(),
        };

        if self.options.skip_duplicates {
            let bucket = match &deck_ref {
                DeckRef::Unassigned => self.fallback.clone(),
                other => other.clone(),
            };
            if !self.seen.insert(DedupKey::new(bucket, front, back)) {
                return Err(RowError::Duplicate);
            }
        }

        let valid = ValidRow {
            row_number: row.row_number,
            front: front.to_string(),
            back: back.to_string(),
            notes: notes.to_string(),
            tags,
            deck_ref,
            deck_label,
        };
        Ok((valid, deckless))
    }
}

/// Checks that reject the whole table rather than single rows.
fn check_table(
    table: &RawTable,
    mapping: &FieldMapping,
    options: &ImportOptions,
    decks: &[Deck],
) -> Result<(), MappingError> {
    mapping.check(table.headers.len())?;
    match options.default_deck_id {
        Some(id) if !decks.iter().any(|d| d.id == id) => {
            Err(MappingError::DefaultDeckNotFound(id))
        }
        _ => Ok(()),
    }
}

/// Validate every row of `table` under `mapping` and `options`.
///
/// A bad mapping or an unknown default deck rejects the whole table with one
/// error row and no row is examined. Otherwise each row is either accepted or rejected with a reason.
/// With `skip_duplicates`, rows matching an existing card or an earlier row
/// of the same file in the same target deck are rejected.
pub fn validate(
    table: &RawTable,
    mapping: &FieldMapping,
    options: &ImportOptions,
    existing_cards: &[Card],
    decks: &[Deck],
) -> ValidationResult {
    if let Err(e) = check_table(table, mapping, options, decks) {
        warn!(error = %e, "import rejected before row checks");
        return ValidationResult {
            error_rows: vec![ErrorRow {
                row_number: 1,
                reason: e.to_string(),
            }],
            ..ValidationResult::default()
        };
    }

    let mut validator = Validator::new(mapping, options, existing_cards, decks);
    let mut result = ValidationResult::default();

    for row in &table.rows {
        match validator.check_row(row) {
            Ok((valid, deckless)) => {
                if deckless {
                    result.warn_rows += 1;
                }
                result.valid_rows.push(valid);
            }
            Err(e) => {
                debug!(row = row.row_number, reason = %e, "row rejected");
                result.error_rows.push(ErrorRow {
                    row_number: row.row_number,
                    reason: e.to_string(),
                });
            }
        }
    }

    result.preview = result.valid_rows.iter().take(PREVIEW_ROWS).cloned().collect();

    if result.warn_rows > 0 {
        warn!(
            rows = result.warn_rows,
            deck = %validator.fallback_label,
            "rows without a deck will use the fallback deck"
        );
    }
    info!(
        valid = result.valid_rows.len(),
        invalid = result.error_rows.len(),
        warnings = result.warn_rows,
        "validated CSV rows"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::sniff::Delimiter;
    use crate::model::CardProgress;

    fn deck(id: DeckId, name: &str) -> Deck {
        Deck {
            id,
            name: name.into(),
            tags: vec![],
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn card(deck_id: DeckId, front: &str, back: &str) -> Card {
        Card {
            id: 1,
            deck_id,
            kind: "basic".into(),
            front: front.into(),
            back: back.into(),
            notes: String::new(),
            tags: vec![],
            tag_excludes: vec![],
            progress: CardProgress::default(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            delimiter: Delimiter::Comma,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, r)| RawRow {
                    row_number: i + 2,
                    values: r.iter().map(|v| v.to_string()).collect(),
                })
                .collect(),
        }
    }

    fn mapping(front: usize, back: usize) -> FieldMapping {
        FieldMapping {
            front: Some(front),
            back: Some(back),
            ..FieldMapping::default()
        }
    }

    fn full_mapping() -> FieldMapping {
        FieldMapping {
            front: Some(0),
            back: Some(1),
            deck: Some(2),
            tags: Some(3),
            notes: Some(4),
        }
    }

    #[test]
    fn accepts_well_formed_rows() {
        let t = table(
            &["front", "back", "deck", "tags", "notes"],
            &[&["hi", "hola", "Spanish", "a, b, a", "informal"]],
        );
        let decks = [deck(7, "Spanish")];
        let r = validate(&t, &full_mapping(), &ImportOptions::default(), &[], &decks);

        assert!(r.error_rows.is_empty());
        assert_eq!(r.warn_rows, 0);
        let row = &r.valid_rows[0];
        assert_eq!(row.row_number, 2);
        assert_eq!(row.notes, "informal");
        assert_eq!(row.tags, vec!["a", "b"]);
        assert_eq!(row.deck_ref, DeckRef::Existing(7));
        assert_eq!(row.deck_label, "Spanish");
    }

    #[test]
    fn missing_front_or_back_mapping_rejects_everything() {
        let t = table(&["front", "back"], &[&["a", "b"], &["c", "d"]]);
        let m = FieldMapping {
            front: Some(0),
            ..FieldMapping::default()
        };
        let r = validate(&t, &m, &ImportOptions::default(), &[], &[]);
        assert!(r.valid_rows.is_empty());
        assert_eq!(
            r.error_rows,
            vec![ErrorRow {
                row_number: 1,
                reason: "Front and back columns are required in mapping.".into(),
            }]
        );
    }

    #[test]
    fn front_and_back_on_same_column_rejects_everything() {
        let t = table(&["front", "back"], &[&["a", "b"]]);
        let r = validate(&t, &mapping(1, 1), &ImportOptions::default(), &[], &[]);
        assert!(r.valid_rows.is_empty());
        assert_eq!(r.error_rows.len(), 1);
        assert_eq!(r.error_rows[0].reason, "Front and back mappings must use different columns.");
    }

    #[test]
    fn empty_front_is_always_an_error() {
        let t = table(&["front", "back"], &[&["   ", "b"], &["a", ""]]);
        for skip_duplicates in [true, false] {
            let options = ImportOptions {
                skip_duplicates,
                create_missing_decks: false,
                ..ImportOptions::default()
            };
            let r = validate(&t, &mapping(0, 1), &options, &[], &[]);
            assert!(r.valid_rows.is_empty());
            let reasons: Vec<&str> = r.error_rows.iter().map(|e| e.reason.as_str()).collect();
            assert_eq!(reasons, vec![RowError::MissingRequired.to_string(); 2]);
        }
    }

    #[test]
    fn length_limits_are_enforced() {
        let long_front = "x".repeat(MAX_FRONT_CHARS + 1);
        let max_front = "y".repeat(MAX_FRONT_CHARS);
        let long_back = "é".repeat(MAX_BACK_CHARS + 1);
        let long_notes = "n".repeat(MAX_NOTES_CHARS + 1);
        let t = table(
            &["front", "back", "deck", "tags", "notes"],
            &[
                &[long_front.as_str(), "b", "", "", ""],
                &[max_front.as_str(), "b", "", "", ""],
                &["f", long_back.as_str(), "", "", ""],
                &["f2", "b", "", "", long_notes.as_str()],
            ],
        );
        let r = validate(&t, &full_mapping(), &ImportOptions::default(), &[], &[]);
        assert_eq!(r.valid_rows.len(), 1);
        assert_eq!(r.valid_rows[0].row_number, 3);
        let failed: Vec<usize> = r.error_rows.iter().map(|e| e.row_number).collect();
        assert_eq!(failed, vec![2, 4, 5]);
        assert!(r.error_rows.iter().all(|e| e.reason == RowError::TooLong.to_string()));
    }

    #[test]
    fn deck_names_match_case_insensitively() {
        let t = table(&["front", "back", "deck"], &[&["a", "b", "  spanish "]]);
        let decks = [deck(3, "Spanish")];
        let m = FieldMapping {
            deck: Some(2),
            ..mapping(0, 1)
        };
        let r = validate(&t, &m, &ImportOptions::default(), &[], &decks);
        assert_eq!(r.valid_rows[0].deck_ref, DeckRef::Existing(3));
    }

    #[test]
    fn unknown_deck_is_created_or_rejected() {
        let t = table(&["front", "back", "deck"], &[&["a", "b", "French"]]);
        let m = FieldMapping {
            deck: Some(2),
            ..mapping(0, 1)
        };

        let r = validate(&t, &m, &ImportOptions::default(), &[], &[]);
        assert_eq!(r.valid_rows[0].deck_ref, DeckRef::ByName("french".into()));
        assert_eq!(r.valid_rows[0].deck_label, "French");

        let no_create = ImportOptions {
            create_missing_decks: false,
            ..ImportOptions::default()
        };
        let r = validate(&t, &m, &no_create, &[], &[]);
        assert!(r.valid_rows.is_empty());
        assert_eq!(r.error_rows[0].reason, "Deck \"French\" not found.");
    }

    #[test]
    fn rows_without_deck_use_default_or_warn() {
        let t = table(&["front", "back", "deck"], &[&["a", "b", ""]]);
        let m = FieldMapping {
            deck: Some(2),
            ..mapping(0, 1)
        };
        let decks = [deck(9, "Main")];

        let with_default = ImportOptions {
            default_deck_id: Some(9),
            ..ImportOptions::default()
        };
        let r = validate(&t, &m, &with_default, &[], &decks);
        assert_eq!(r.warn_rows, 0);
        assert_eq!(r.valid_rows[0].deck_ref, DeckRef::Existing(9));
        assert_eq!(r.valid_rows[0].deck_label, "Main");

        let r = validate(&t, &m, &ImportOptions::default(), &[], &decks);
        assert_eq!(r.warn_rows, 1);
        assert!(r.error_rows.is_empty());
        assert_eq!(r.valid_rows[0].deck_ref, DeckRef::Unassigned);
        assert_eq!(r.valid_rows[0].deck_label, FALLBACK_DECK_NAME);
    }

    #[test]
    fn unknown_default_deck_rejects_whole_table() {
        let t = table(&["front", "back"], &[&["q", "a"], &["q2", "a2"]]);
        let options = ImportOptions {
            default_deck_id: Some(42),
            ..ImportOptions::default()
        };
        let decks = [deck(1, "Spanish")];
        let r = validate(&t, &mapping(0, 1), &options, &[], &decks);
        assert!(r.valid_rows.is_empty());
        assert_eq!(r.error_rows.len(), 1);
        assert_eq!(r.error_rows[0].row_number, 1);
        assert_eq!(r.error_rows[0].reason, "Default deck 42 does not exist.");
    }

    #[test]
    fn locked_deck_ignores_deck_column() {
        let t = table(&["front", "back", "deck"], &[&["a", "b", "Elsewhere"]]);
        let m = FieldMapping {
            deck: Some(2),
            ..mapping(0, 1)
        };
        let options = ImportOptions {
            default_deck_id: Some(1),
            lock_to_default_deck: true,
            create_missing_decks: false,
            ..ImportOptions::default()
        };
        let r = validate(&t, &m, &options, &[], &[deck(1, "Locked")]);
        assert!(r.error_rows.is_empty());
        assert_eq!(r.valid_rows[0].deck_ref, DeckRef::Existing(1));
        assert_eq!(r.valid_rows[0].deck_label, "Locked");
    }

    #[test]
    fn duplicates_of_existing_cards_are_rejected_only_when_skipping() {
        let t = table(&["front", "back", "deck"], &[&["Hi", "Hello ", "deckA"]]);
        let m = FieldMapping {
            deck: Some(2),
            ..mapping(0, 1)
        };
        let decks = [deck(1, "deckA")];
        let cards = [card(1, "hi", "hello")];

        let r = validate(&t, &m, &ImportOptions::default(), &cards, &decks);
        assert!(r.valid_rows.is_empty());
        assert_eq!(r.error_rows[0].reason, "Duplicate card in target deck.");

        let keep = ImportOptions {
            skip_duplicates: false,
            ..ImportOptions::default()
        };
        let r = validate(&t, &m, &keep, &cards, &decks);
        assert_eq!(r.valid_rows.len(), 1);
        assert!(r.error_rows.is_empty());
    }

    #[test]
    fn duplicates_in_other_decks_are_allowed() {
        let t = table(&["front", "back", "deck"], &[&["hi", "hello", "deckB"]]);
        let m = FieldMapping {
            deck: Some(2),
            ..mapping(0, 1)
        };
        let decks = [deck(1, "deckA"), deck(2, "deckB")];
        let cards = [card(1, "hi", "hello")];
        let r = validate(&t, &m, &ImportOptions::default(), &cards, &decks);
        assert_eq!(r.valid_rows.len(), 1);
    }

    #[test]
    fn later_rows_duplicating_earlier_rows_are_rejected() {
        let t = table(
            &["front", "back"],
            &[&["hi", "hello"], &["HI", "hello"], &["hi  there", "x"], &["hi there", "X"]],
        );
        let r = validate(&t, &mapping(0, 1), &ImportOptions::default(), &[], &[]);
        let valid: Vec<usize> = r.valid_rows.iter().map(|v| v.row_number).collect();
        let failed: Vec<usize> = r.error_rows.iter().map(|e| e.row_number).collect();
        assert_eq!(valid, vec![2, 4]);
        assert_eq!(failed, vec![3, 5]);
    }

    #[test]
    fn deckless_rows_dedup_against_existing_fallback_deck() {
        let t = table(&["front", "back"], &[&["hi", "hello"]]);
        let decks = [deck(5, "imported csv")];
        let cards = [card(5, "hi", "hello")];
        let r = validate(&t, &mapping(0, 1), &ImportOptions::default(), &cards, &decks);
        assert!(r.valid_rows.is_empty());
        assert_eq!(r.error_rows[0].reason, RowError::Duplicate.to_string());
    }

    #[test]
    fn preview_is_the_first_twenty_valid_rows() {
        let fronts: Vec<String> = (0..30).map(|i| format!("q{i}")).collect();
        let rows: Vec<[&str; 2]> = fronts.iter().map(|f| [f.as_str(), "a"]).collect();
        let row_refs: Vec<&[&str]> = rows.iter().map(|r| &r[..]).collect();
        let t = table(&["front", "back"], &row_refs);

        let r = validate(&t, &mapping(0, 1), &ImportOptions::default(), &[], &[]);
        assert_eq!(r.valid_rows.len(), 30);
        assert_eq!(r.preview.len(), PREVIEW_ROWS);
        assert_eq!(r.preview[..], r.valid_rows[..PREVIEW_ROWS]);
    }

    #[test]
    fn validation_is_repeatable() {
        let t = table(&["front", "back"], &[&["a", "b"], &["a", "b"], &["", "c"]]);
        let first = validate(&t, &mapping(0, 1), &ImportOptions::default(), &[], &[]);
        let second = validate(&t, &mapping(0, 1), &ImportOptions::default(), &[], &[]);
        assert_eq!(first, second);
    }

    #[test]
    fn tag_parsing() {
        assert_eq!(parse_tags("greeting|basic", '|'), vec!["greeting", "basic"]);
        assert_eq!(parse_tags(" a ,, b ,a, B", ','), vec!["a", "b", "B"]);
        assert_eq!(parse_tags("exam   prep;x", ';'), vec!["exam prep", "x"]);
        assert!(parse_tags("", ',').is_empty());
    }

    #[test]
    fn dedup_key_display() {
        let key = DedupKey::new(DeckRef::ByName("spanish".into()), " Hello ", "Hola");
        assert_eq!(key.to_string(), "byName:spanish|hello|hola");
        assert_eq!(normalize_dup_text("  A \t b\n C "), "a b c");
    }
}

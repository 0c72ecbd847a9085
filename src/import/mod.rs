//! CSV import pipeline.
//!
//! Text flows strictly forward through the stages:
//!
//! 1. [`tokenize`] splits text into raw cells.
//! 2. [`sniff`] guesses the delimiter when none is fixed.
//! 3. [`parse_file`] builds a [`RawTable`] with headers and numbered rows.
//! 4. [`infer`] guesses a [`FieldMapping`] from the headers.
//! 5. [`validate`] checks rows and suppresses duplicates.
//! 6. [`execute`] writes the valid rows through a [`CardStore`](crate::storage::CardStore).
//! 7. [`error_rows_to_csv`] reports rejected rows for correction.
//!
//! Stages 1-5 and 7 are pure. Only stage 6 touches storage.

mod scan;

pub mod execute;
pub mod mapping;
pub mod parser;
pub mod prompt;
pub mod report;
pub mod sniff;
pub mod tokenizer;
pub mod validate;

pub use execute::execute;
pub use mapping::{infer, normalize_header, Field, FieldMapping};
pub use parser::{parse_file, ParseOptions, RawRow, RawTable};
pub use prompt::{csv_prompt, PromptStyle};
pub use report::{error_report_filename, error_rows_to_csv};
pub use sniff::{sniff, Delimiter, DelimiterMode};
pub use tokenizer::tokenize;
pub use validate::{
    validate, DeckRef, DedupKey, ErrorRow, ImportOptions, ValidRow, ValidationResult,
    FALLBACK_DECK_NAME,
};

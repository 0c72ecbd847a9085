use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::info;

use crate::error::ParseError;
use crate::import::sniff::{Delimiter, DelimiterMode};
use crate::import::tokenizer::tokenize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub delimiter: DelimiterMode,
    pub has_header_row: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: DelimiterMode::Auto,
            has_header_row: true,
        }
    }
}

/// A non-blank data row. `row_number` is the 1-based position of the record
/// in the file, counting the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRow {
    pub row_number: usize,
    pub values: Vec<String>,
}

/// A parsed CSV file: unique header names plus rows aligned to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTable {
    pub delimiter: Delimiter,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn delimiter_char(&self) -> char {
        self.delimiter.as_char()
    }

    pub fn delimiter_name(&self) -> &'static str {
        self.delimiter.name()
    }
}

fn column_name(index: usize) -> String {
    format!("column_{}", index + 1)
}

/// Append `_2`, `_3`, ... to repeated names, keeping the first occurrence as is.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(headers.len());
    for h in headers {
        let n = counts.entry(h.clone()).or_insert(0);
        *n += 1;
        let mut name = if *n == 1 { h.clone() } else { format!("{h}_{n}") };
        // a literal "x_2" column may already hold the generated name
        while !used.insert(name.clone()) {
            *n += 1;
            name = format!("{h}_{n}");
        }
        out.push(name);
    }
    out
}

/// Parse CSV text into a [`RawTable`].
///
/// Without a header row, columns are named `column_1..column_N` after the
/// width of the first row. Cells are trimmed, missing trailing cells read as
/// empty and extra cells are ignored. Rows whose cells are all blank are
/// dropped without renumbering the rows after them.
///
/// Fails with [`ParseError::Empty`] when the text holds no rows, and with
/// [`ParseError::EmptyHeader`] when a header row is expected but every cell
/// in it is blank.
pub fn parse_file(text: &str, options: &ParseOptions) -> Result<RawTable, ParseError> {
    let delimiter = options.delimiter.resolve(text);
    let rows = tokenize(text, delimiter.as_char())?;

    let first = rows.first().ok_or(ParseError::Empty)?;
    let raw_headers: Vec<String> = if options.has_header_row {
        if first.iter().all(|h| h.trim().is_empty()) {
            return Err(ParseError::EmptyHeader);
        }
        first
            .iter()
            .enumerate()
            .map(|(i, h)| match h.trim() {
                "" => column_name(i),
                name => name.to_string(),
            })
            .collect()
    } else {
        (0..first.len()).map(column_name).collect()
    };
    let headers = dedupe_headers(raw_headers);

    let skip = usize::from(options.has_header_row);
    let data: Vec<RawRow> = rows
        .iter()
        .enumerate()
        .skip(skip)
        .filter_map(|(i, row)| {
            let values: Vec<String> = (0..headers.len())
                .map(|idx| row.get(idx).map_or("", |c| c.trim()).to_string())
                .collect();
            if values.iter().all(|v| v.is_empty()) {
                return None;
            }
            Some(RawRow {
                row_number: i + 1,
                values,
            })
        })
        .collect();

    info!(
        delimiter = %delimiter,
        columns = headers.len(),
        rows = data.len(),
        "parsed CSV"
    );

    Ok(RawTable {
        delimiter,
        headers,
        rows: data,
    })
}

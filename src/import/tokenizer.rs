use crate::error::ParseError;
use crate::import::scan::QuoteScan;

const BOM: char = '\u{feff}';

/// Split CSV text into rows of raw cells.
///
/// Outside quotes the delimiter ends a cell, `\n` ends a row and `\r` is
/// dropped. Inside quotes every character is kept, so cells may contain the
/// delimiter or line breaks. A final row without a trailing newline is still
/// emitted. A leading byte-order mark is ignored.
pub fn tokenize(text: &str, delimiter: char) -> Result<Vec<Vec<String>>, ParseError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();

    let mut scan = QuoteScan::new(text);
    for s in scan.by_ref() {
        if s.quoted {
            cell.push(s.ch);
            continue;
        }
        match s.ch {
            c if c == delimiter => row.push(std::mem::take(&mut cell)),
            '\n' => {
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            '\r' => {}
            c => cell.push(c),
        }
    }

    if scan.in_quotes() {
        return Err(ParseError::UnterminatedQuote);
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }
    Ok(rows)
}

use chrono::NaiveDate;

use crate::error::AppError;
use crate::import::validate::ErrorRow;

/// Serialize rejected rows as a `row_number,reason` CSV.
///
/// Cells holding a comma, quote or `\n` are quoted with inner quotes doubled.
/// A bare `\r` is not quoted on its own; the only reasons that can carry one
/// echo a deck name inside quotes, which forces quoting.
pub fn error_rows_to_csv(rows: &[ErrorRow]) -> Result<String, AppError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(["row_number", "reason"])?;
    for row in rows {
        wtr.write_record([row.row_number.to_string().as_str(), row.reason.as_str()])?;
    }

    let bytes = wtr.into_inner().map_err(|e| AppError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| AppError::InvalidArgument(e.to_string()))
}

/// Suggested file name for an error report written on `date`.
pub fn error_report_filename(date: NaiveDate) -> String {
    format!("flashlearn-csv-errors-{}.csv", date.format("%Y-%m-%d"))
}

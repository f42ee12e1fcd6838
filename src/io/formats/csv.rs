//! CSV codec for archive tables.
//!
//! Rows are string-keyed maps; typing of cell values is the caller's job.
//! Output uses `\n` line endings and quotes a field only when it contains a
//! comma, a double quote or a line break, doubling any embedded quotes.

use crate::{Error, Result};
use std::collections::BTreeMap;

/// One decoded CSV record, keyed by header name.
pub type CsvRow = BTreeMap<String, String>;

/// Encodes `rows` under the given ordered `headers`.
///
/// A header missing from a row is written as an empty cell; keys not named in
/// `headers` are ignored.
///
/// # Errors
///
/// Returns an error if the writer fails, which only happens for I/O on the
/// in-memory buffer.
pub fn encode(headers: &[&str], rows: &[CsvRow]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(headers)
        .map_err(|e| Error::operation("write_csv_header", e))?;
    for row in rows {
        writer
            .write_record(
                headers
                    .iter()
                    .map(|h| row.get(*h).map_or("", String::as_str)),
            )
            .map_err(|e| Error::operation("write_csv_record", e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::operation("flush_csv", e.error()))?;
    String::from_utf8(bytes).map_err(|e| Error::operation("flush_csv", e))
}

/// Decodes CSV text whose first line is the header row.
///
/// Values are returned verbatim (no trimming). Empty input yields no rows.
///
/// # Errors
///
/// Returns [`Error::Parse`] naming the offending line for an unterminated
/// quoted field or a record whose field count differs from the header's.
pub fn decode(text: &str) -> Result<Vec<CsvRow>> {
    check_quotes(text)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::None)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(parse_error)?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

fn parse_error(e: csv::Error) -> Error {
    let line = e.position().map_or(0, csv::Position::line);
    let message = match e.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {expected_len} fields, found {len}"),
        _ => e.to_string(),
    };
    Error::Parse { line, message }
}

/// Rejects text with a quoted field that never closes.
///
/// The `csv` reader tolerates this by reading to end of input, which would
/// silently swallow every following record.
fn check_quotes(text: &str) -> Result<()> {
    let mut line: u64 = 1;
    let mut opened_on: u64 = 0;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                },
                '"' => {
                    in_quotes = false;
                    field_start = false;
                },
                '\n' => line += 1,
                _ => {},
            }
            continue;
        }
        match c {
            '"' if field_start => {
                in_quotes = true;
                opened_on = line;
            },
            ',' => field_start = true,
            '\n' => {
                line += 1;
                field_start = true;
            },
            '\r' => {},
            _ => field_start = false,
        }
    }

    if in_quotes {
        return Err(Error::Parse {
            line: opened_on,
            message: "unterminated quoted field".to_string(),
        });
    }
    Ok(())
}

//! Text formats used inside archives.

pub mod csv;

pub use self::csv::{CsvRow, decode as decode_csv, encode as encode_csv};

//! Parsers for local fallback files.
//!
//! Exported spreadsheets arrive as delimited text with a human-readable header
//! row. Parsing stays structural here; header names are mapped to canonical
//! fields by `record::Schema`.

pub mod delimited;

pub use delimited::{parse_delimited, split_line, DelimitedRow};

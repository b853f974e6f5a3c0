//! # Formats Module
//!
//! Backing-file formats for stockwatch collections.
//!
//! File I/O (opening, atomic replacement) lives in the `store` module; this
//! module only turns bytes into records and records into bytes.

pub mod flat_file;

pub use flat_file::{FlatRecord, Parsed, Rejected, parse_line, parse_records, write_records};

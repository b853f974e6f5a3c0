//! # Flat File Format
//!
//! One record per line, fields separated by a single comma, no quoting and
//! no escaping.
//!
//! - Catalog: `id,name,category,quantity,price,supplierId`
//! - Suppliers: `id,name,contact,email,phone`
//!
//! Parsing is best-effort: a bad line becomes a [`Rejected`] row and the
//! remaining lines are still read. Only a failure of the underlying reader
//! aborts the parse.

use crate::primitives::{CATALOG_FIELDS, FIELD_SEPARATOR, MIN_RECORD_FIELDS, SUPPLIER_FIELDS};
use crate::{CatalogEntry, StockError, Supplier};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use rust_decimal::Decimal;
use std::io::{Read, Write};
use std::str::FromStr;

// =============================================================================
// RECORD LAYOUT
// =============================================================================

/// A record type with a fixed flat-file layout.
pub trait FlatRecord: Sized {
    /// Number of fields a complete record carries.
    const FIELD_COUNT: usize;

    /// Human-readable record kind, used in error messages.
    const KIND: &'static str;

    /// Build a record from the fields of one line.
    ///
    /// `fields` always holds at least `FIELD_COUNT` values; extra trailing
    /// fields are ignored.
    fn from_fields(line: u64, fields: &StringRecord) -> Result<Self, StockError>;

    /// Fields in file order.
    fn to_fields(&self) -> Vec<String>;
}

impl FlatRecord for CatalogEntry {
    const FIELD_COUNT: usize = CATALOG_FIELDS;
    const KIND: &'static str = "catalog entry";

    fn from_fields(line: u64, fields: &StringRecord) -> Result<Self, StockError> {
        let quantity = fields[3].parse::<i64>().map_err(|_| {
            StockError::format(line, format!("quantity '{}' is not an integer", &fields[3]))
        })?;
        let price = Decimal::from_str(&fields[4]).map_err(|_| {
            StockError::format(line, format!("price '{}' is not a decimal", &fields[4]))
        })?;

        Ok(Self::new(
            &fields[0], &fields[1], &fields[2], quantity, price, &fields[5],
        ))
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.category.clone(),
            self.quantity.to_string(),
            self.price.to_string(),
            self.supplier_id.clone(),
        ]
    }
}

impl FlatRecord for Supplier {
    const FIELD_COUNT: usize = SUPPLIER_FIELDS;
    const KIND: &'static str = "supplier";

    fn from_fields(_line: u64, fields: &StringRecord) -> Result<Self, StockError> {
        Ok(Self::new(
            &fields[0], &fields[1], &fields[2], &fields[3], &fields[4],
        ))
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.contact.clone(),
            self.email.clone(),
            self.phone.clone(),
        ]
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// A line that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    /// 1-based line number in the source.
    pub line: u64,
    /// Why the line was rejected.
    pub error: StockError,
}

/// Result of a best-effort parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<R> {
    /// Records in file order, each with its 1-based line number.
    pub records: Vec<(u64, R)>,
    /// Lines that were skipped.
    pub rejected: Vec<Rejected>,
}

impl<R> Default for Parsed<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

fn check_field_count<R: FlatRecord>(line: u64, fields: &StringRecord) -> Result<(), StockError> {
    if fields.len() < MIN_RECORD_FIELDS {
        return Err(StockError::format(
            line,
            format!("expected at least {} fields, found {}", MIN_RECORD_FIELDS, fields.len()),
        ));
    }
    if fields.len() < R::FIELD_COUNT {
        return Err(StockError::format(
            line,
            format!(
                "incomplete {}: expected {} fields, found {}",
                R::KIND,
                R::FIELD_COUNT,
                fields.len()
            ),
        ));
    }
    Ok(())
}

fn is_blank(fields: &StringRecord) -> bool {
    fields.iter().all(|f| f.trim().is_empty()) && fields.len() <= 1
}

/// Parse every line of `reader` into records of type `R`.
///
/// Blank lines are skipped silently. Lines with too few fields or with
/// unparseable numbers are collected in [`Parsed::rejected`].
///
/// # Errors
///
/// Returns `StockError::IoFailure` only if reading from `reader` fails.
pub fn parse_records<R: FlatRecord>(reader: impl Read) -> Result<Parsed<R>, StockError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .delimiter(FIELD_SEPARATOR)
        .from_reader(reader);

    let mut parsed = Parsed::default();
    let mut fields = StringRecord::new();

    loop {
        let more = match csv_reader.read_record(&mut fields) {
            Ok(more) => more,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                    return Err(StockError::IoFailure(e.to_string()));
                }
                parsed.rejected.push(Rejected {
                    line,
                    error: StockError::format(line, e.to_string()),
                });
                continue;
            }
        };
        if !more {
            break;
        }

        let line = fields.position().map_or(0, |p| p.line());
        if is_blank(&fields) {
            continue;
        }

        match check_field_count::<R>(line, &fields).and_then(|()| R::from_fields(line, &fields)) {
            Ok(record) => parsed.records.push((line, record)),
            Err(error) => parsed.rejected.push(Rejected { line, error }),
        }
    }

    Ok(parsed)
}

/// Parse a single line typed by a user, e.g. `P1,Widget,Tools,4,2.50,S1`.
pub fn parse_line<R: FlatRecord>(line: &str) -> Result<R, StockError> {
    let mut parsed = parse_records::<R>(line.as_bytes())?;
    if let Some(rejected) = parsed.rejected.pop() {
        return Err(rejected.error);
    }
    match parsed.records.len() {
        1 => parsed
            .records
            .pop()
            .map(|(_, record)| record)
            .ok_or_else(|| StockError::format(1, "empty record")),
        0 => Err(StockError::format(1, "empty record")),
        n => Err(StockError::format(
            1,
            format!("expected one {}, found {}", R::KIND, n),
        )),
    }
}

// =============================================================================
// WRITING
// =============================================================================

/// Write `records` to `writer`, one line each, in the given order.
pub fn write_records<R: FlatRecord>(
    writer: impl Write,
    records: &[R],
) -> Result<(), StockError> {
    let mut csv_writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .delimiter(FIELD_SEPARATOR)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    for record in records {
        csv_writer
            .write_record(record.to_fields())
            .map_err(|e| StockError::IoFailure(e.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

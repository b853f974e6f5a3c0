//! # Primitives
//!
//! Fixed constants for the stockwatch catalog.
//!
//! These values describe the backing-file layout and the monitor defaults.
//! They are compiled into the binary; runtime configuration may override the
//! monitor defaults but never the file layout.

/// Field separator used by both backing files.
///
/// The format has no quoting or escaping, so no stored text field may
/// contain this byte.
pub const FIELD_SEPARATOR: u8 = b',';

/// Number of fields in a catalog record:
/// `id,name,category,quantity,price,supplierId`.
pub const CATALOG_FIELDS: usize = 6;

/// Number of fields in a supplier record: `id,name,contact,email,phone`.
pub const SUPPLIER_FIELDS: usize = 5;

/// A line with fewer fields than this is not a record at all.
pub const MIN_RECORD_FIELDS: usize = 2;

/// Default alert threshold: entries with `quantity < 10` are low on stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Default seconds between two monitor scans.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default time the lifecycle controller waits for the monitor to stop.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2_000;

/// Default upper bound on a single foreground command, persistence included.
pub const DEFAULT_PERSIST_TIMEOUT_MS: u64 = 5_000;

/// Default name of the catalog backing file inside the data directory.
pub const DEFAULT_CATALOG_FILE: &str = "products.csv";

/// Default name of the supplier backing file inside the data directory.
pub const DEFAULT_SUPPLIER_FILE: &str = "suppliers.csv";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_is_comma() {
        assert_eq!(FIELD_SEPARATOR, b',');
    }

    #[test]
    fn record_layouts() {
        assert_eq!(CATALOG_FIELDS, 6);
        assert_eq!(SUPPLIER_FIELDS, 5);
        assert!(MIN_RECORD_FIELDS < SUPPLIER_FIELDS);
    }
}

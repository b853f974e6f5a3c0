//! # Query Module
//!
//! Read-only queries over a catalog snapshot.
//!
//! - Pure functions over `&[CatalogEntry]`: no locking, no I/O
//! - Case-insensitive text matching
//! - Structured `Search` values for callers that dispatch queries by kind

use crate::store::Catalog;
use crate::{CatalogEntry, StockError, Supplier};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// LOW-STOCK SOURCE
// =============================================================================

/// The only view of the catalog a low-stock monitor gets.
///
/// Implementations must answer from a consistent snapshot and must never
/// mutate the catalog.
pub trait LowStockSource: Send + Sync {
    /// Entries with `quantity < threshold`.
    fn low_stock(&self, threshold: i64) -> Result<Vec<CatalogEntry>, StockError>;
}

// =============================================================================
// SEARCH
// =============================================================================

/// Search operations supported over the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Search {
    /// Exact identifier.
    Id(String),
    /// Case-insensitive substring of the name.
    NameContains(String),
    /// Case-insensitive exact category.
    Category(String),
    /// Quantity strictly below the threshold.
    LowStock(i64),
}

impl Search {
    /// Run the search against `entries`, preserving their order.
    #[must_use]
    pub fn run(&self, entries: &[CatalogEntry]) -> Vec<CatalogEntry> {
        match self {
            Self::Id(id) => entries.iter().filter(|e| &e.id == id).cloned().collect(),
            Self::NameContains(needle) => name_contains(entries, needle),
            Self::Category(category) => in_category(entries, category),
            Self::LowStock(threshold) => below_threshold(entries, *threshold),
        }
    }
}

/// Entries whose name contains `needle`, ignoring case.
#[must_use]
pub fn name_contains(entries: &[CatalogEntry], needle: &str) -> Vec<CatalogEntry> {
    let needle = needle.to_lowercase();
    entries
        .iter()
        .filter(|e| e.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Entries whose category equals `category`, ignoring case.
#[must_use]
pub fn in_category(entries: &[CatalogEntry], category: &str) -> Vec<CatalogEntry> {
    let category = category.to_lowercase();
    entries
        .iter()
        .filter(|e| e.category.to_lowercase() == category)
        .cloned()
        .collect()
}

/// Entries with `quantity < threshold`. The threshold itself is not low.
#[must_use]
pub fn below_threshold(entries: &[CatalogEntry], threshold: i64) -> Vec<CatalogEntry> {
    entries
        .iter()
        .filter(|e| e.quantity < threshold)
        .cloned()
        .collect()
}

/// Sum of `quantity × price`. Zero for an empty slice.
///
/// Each valid entry's value fits in a [`Decimal`], but the sum may not; it
/// saturates at [`Decimal::MAX`].
#[must_use]
pub fn total_value(entries: &[CatalogEntry]) -> Decimal {
    entries
        .iter()
        .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.value()))
}

/// Number of entries per category. Categories are grouped as written.
#[must_use]
pub fn count_by_category(entries: &[CatalogEntry]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.category.clone()).or_insert(0) += 1;
    }
    counts
}

// =============================================================================
// REPORT
// =============================================================================

/// Catalog summary taken from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryReport {
    pub entry_count: usize,
    pub total_value: Decimal,
    pub by_category: BTreeMap<String, usize>,
    /// Identifiers of entries whose supplier reference is unknown.
    pub unresolved_suppliers: Vec<String>,
}

/// Build a report; `suppliers` enables the dangling-reference check.
#[must_use]
pub fn report(entries: &[CatalogEntry], suppliers: Option<&Catalog<Supplier>>) -> InventoryReport {
    let unresolved_suppliers = suppliers
        .map(|known| {
            entries
                .iter()
                .filter(|e| !known.contains(&e.supplier_id))
                .map(|e| e.id.clone())
                .collect()
        })
        .unwrap_or_default();

    InventoryReport {
        entry_count: entries.len(),
        total_value: total_value(entries),
        by_category: count_by_category(entries),
        unresolved_suppliers,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, category: &str, quantity: i64, price: Decimal) -> CatalogEntry {
        CatalogEntry::new(id, format!("Item {id}"), category, quantity, price, "S1")
    }

    #[test]
    fn below_threshold_is_strict() {
        let entries = vec![
            entry("A", "x", 5, Decimal::ONE),
            entry("B", "x", 10, Decimal::ONE),
            entry("C", "x", 15, Decimal::ONE),
        ];

        let low = below_threshold(&entries, 10);

        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "A");
    }

    #[test]
    fn total_value_sums_products() {
        let entries = vec![
            entry("A", "x", 2, Decimal::new(30, 1)),
            entry("B", "x", 1, Decimal::new(50, 1)),
        ];

        assert_eq!(total_value(&entries), Decimal::new(11, 0));
        assert_eq!(total_value(&[]), Decimal::ZERO);
    }

    #[test]
    fn total_value_caps_at_decimal_max() {
        let price = Decimal::new(5_000_000_000, 0);
        let entries = vec![
            entry("A", "x", i64::MAX, price),
            entry("B", "x", i64::MAX, price),
        ];

        assert!(entries[0].value() < Decimal::MAX);
        assert_eq!(total_value(&entries), Decimal::MAX);
    }

    #[test]
    fn count_by_category_groups_entries() {
        let entries = vec![
            entry("A", "Tools", 1, Decimal::ONE),
            entry("B", "Toys", 1, Decimal::ONE),
            entry("C", "Tools", 1, Decimal::ONE),
        ];

        let counts = count_by_category(&entries);

        assert_eq!(counts.get("Tools"), Some(&2));
        assert_eq!(counts.get("Toys"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn search_dispatches_by_kind() {
        let entries = vec![
            entry("A", "Tools", 1, Decimal::ONE),
            entry("B", "toys", 50, Decimal::ONE),
        ];

        assert_eq!(Search::Id("B".into()).run(&entries).len(), 1);
        assert_eq!(Search::Category("TOYS".into()).run(&entries).len(), 1);
        assert_eq!(Search::NameContains("item".into()).run(&entries).len(), 2);
        assert_eq!(Search::LowStock(2).run(&entries)[0].id, "A");
        assert!(Search::Id("Z".into()).run(&entries).is_empty());
    }

    #[test]
    fn report_without_suppliers_skips_reference_check() {
        let entries = vec![entry("A", "Tools", 2, Decimal::new(25, 1))];

        let report = report(&entries, None);

        assert_eq!(report.entry_count, 1);
        assert_eq!(report.total_value, Decimal::new(50, 1));
        assert!(report.unresolved_suppliers.is_empty());
    }
}

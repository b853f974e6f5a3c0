//! # Mutation Engine
//!
//! Validation and mutation of the inventory catalog.
//!
//! Every mutation:
//! - validates its input before touching the store
//! - is applied as one complete catalog version (see `store`)
//! - persists the whole catalog before returning
//!
//! Read operations work on a snapshot and never block the writer.

use crate::query::{self, InventoryReport, LowStockSource, Search};
use crate::store::{Backing, LoadReport, Record, RecordStore};
use crate::supplier::SupplierRegistry;
use crate::{CatalogEntry, EntryPatch, StockError};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Characters that would corrupt a flat-file line.
const FORBIDDEN_CHARS: [char; 3] = [',', '\n', '\r'];

/// Reject text that cannot be stored in a flat-file field.
pub(crate) fn check_text(field: &str, value: &str) -> Result<(), StockError> {
    if value.contains(FORBIDDEN_CHARS) {
        return Err(StockError::invalid(format!(
            "{field} may not contain commas or line breaks"
        )));
    }
    Ok(())
}

/// Reject blank text, then text that cannot be stored.
pub(crate) fn check_required(field: &str, value: &str) -> Result<(), StockError> {
    if value.trim().is_empty() {
        return Err(StockError::invalid(format!("{field} cannot be empty")));
    }
    check_text(field, value)
}

fn check_quantity(quantity: i64) -> Result<(), StockError> {
    if quantity < 0 {
        return Err(StockError::invalid("quantity cannot be negative"));
    }
    Ok(())
}

fn check_price(price: Decimal) -> Result<(), StockError> {
    if price < Decimal::ZERO {
        return Err(StockError::invalid("price cannot be negative"));
    }
    Ok(())
}

/// Reject an entry whose stock value `quantity × price` is not representable.
fn check_value(quantity: i64, price: Decimal) -> Result<(), StockError> {
    if Decimal::from(quantity).checked_mul(price).is_none() {
        return Err(StockError::invalid("stock value (quantity × price) is too large"));
    }
    Ok(())
}

impl Record for CatalogEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), StockError> {
        Inventory::validate_entry(self)
    }
}

/// The inventory catalog: validation, mutation and queries over one
/// [`RecordStore`] of catalog entries.
#[derive(Debug)]
pub struct Inventory {
    store: RecordStore<CatalogEntry>,
}

impl Inventory {
    /// Wrap an existing store.
    #[must_use]
    pub fn new(store: RecordStore<CatalogEntry>) -> Self {
        Self { store }
    }

    /// Load the catalog from `backing`. See [`RecordStore::load`].
    pub fn load(backing: impl Backing<CatalogEntry> + 'static) -> (Self, LoadReport) {
        let (store, report) = RecordStore::load(backing);
        (Self::new(store), report)
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &RecordStore<CatalogEntry> {
        &self.store
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Validate a complete entry.
    ///
    /// An entry is valid if:
    /// - identifier and name are non-blank
    /// - quantity and price are not negative
    /// - `quantity × price` fits in a [`Decimal`]
    /// - no text field contains a comma or line break
    pub fn validate_entry(entry: &CatalogEntry) -> Result<(), StockError> {
        check_required("identifier", &entry.id)?;
        check_required("name", &entry.name)?;
        check_quantity(entry.quantity)?;
        check_price(entry.price)?;
        check_value(entry.quantity, entry.price)?;
        check_text("category", &entry.category)?;
        check_text("supplier reference", &entry.supplier_id)
    }

    /// Validate the fields a patch would write.
    ///
    /// The supplier reference is not checked for existence.
    pub fn validate_patch(patch: &EntryPatch) -> Result<(), StockError> {
        if let Some(quantity) = patch.quantity {
            check_quantity(quantity)?;
        }
        if let Some(price) = patch.price {
            check_price(price)?;
        }
        if let Some(name) = &patch.name {
            check_required("name", name)?;
        }
        if let Some(category) = &patch.category {
            check_text("category", category)?;
        }
        if let Some(supplier_id) = &patch.supplier_id {
            check_text("supplier reference", supplier_id)?;
        }
        Ok(())
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Add a new entry and persist the catalog.
    ///
    /// # Errors
    /// - `InvalidEntry` for invalid fields or a duplicate identifier
    /// - `IoFailure` if persisting fails; the entry stays in memory
    pub fn add_entry(&self, entry: CatalogEntry) -> Result<(), StockError> {
        self.store.insert(entry)
    }

    /// Apply `patch` to the entry `id` in place and persist the catalog.
    ///
    /// Returns the updated entry.
    ///
    /// # Errors
    /// - `NotFound` if no entry has this identifier
    /// - `InvalidEntry` if the patch writes a negative quantity or price
    /// - `IoFailure` if persisting fails; the update stays in memory
    pub fn update_entry(&self, id: &str, patch: &EntryPatch) -> Result<CatalogEntry, StockError> {
        if !self.store.snapshot().contains(id) {
            return Err(StockError::NotFound(id.to_string()));
        }
        Self::validate_patch(patch)?;
        self.store.update(id, |entry| patch.apply_to(entry))
    }

    /// Remove the entry `id` and persist the catalog.
    pub fn remove_entry(&self, id: &str) -> Result<CatalogEntry, StockError> {
        self.store.remove(id)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn find_by_id(&self, id: &str) -> Result<CatalogEntry, StockError> {
        self.store.get(id)
    }

    /// Entries whose name contains `needle`, ignoring case.
    #[must_use]
    pub fn find_by_name_substring(&self, needle: &str) -> Vec<CatalogEntry> {
        query::name_contains(self.store.snapshot().as_slice(), needle)
    }

    /// Entries whose category equals `category`, ignoring case.
    #[must_use]
    pub fn find_by_category(&self, category: &str) -> Vec<CatalogEntry> {
        query::in_category(self.store.snapshot().as_slice(), category)
    }

    /// Run a structured search against the current snapshot.
    #[must_use]
    pub fn search(&self, search: &Search) -> Vec<CatalogEntry> {
        search.run(self.store.snapshot().as_slice())
    }

    /// Entries with `quantity < threshold`.
    #[must_use]
    pub fn low_stock(&self, threshold: i64) -> Vec<CatalogEntry> {
        query::below_threshold(self.store.snapshot().as_slice(), threshold)
    }

    /// Sum of `quantity × price` over every entry, capped at
    /// [`Decimal::MAX`]. See [`query::total_value`].
    #[must_use]
    pub fn total_value(&self) -> Decimal {
        query::total_value(self.store.snapshot().as_slice())
    }

    #[must_use]
    pub fn count_by_category(&self) -> BTreeMap<String, usize> {
        query::count_by_category(self.store.snapshot().as_slice())
    }

    /// Every entry in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<CatalogEntry> {
        self.store.list()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Summary of the whole catalog, computed from a single snapshot.
    ///
    /// With a supplier registry, entries whose supplier reference does not
    /// resolve are listed in the report.
    #[must_use]
    pub fn report(&self, suppliers: Option<&SupplierRegistry>) -> InventoryReport {
        let snapshot = self.store.snapshot();
        let known = suppliers.map(|registry| registry.store().snapshot());
        query::report(snapshot.as_slice(), known.as_deref())
    }

    /// Rewrite the backing file from memory, e.g. after an earlier
    /// `IoFailure`.
    pub fn persist(&self) -> Result<(), StockError> {
        self.store.persist()
    }
}

impl LowStockSource for Inventory {
    fn low_stock(&self, threshold: i64) -> Result<Vec<CatalogEntry>, StockError> {
        Ok(Self::low_stock(self, threshold))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBacking;

    fn inventory() -> Inventory {
        Inventory::new(RecordStore::empty(MemoryBacking::default()))
    }

    fn entry(id: &str, quantity: i64, price: Decimal) -> CatalogEntry {
        CatalogEntry::new(id, format!("Item {id}"), "General", quantity, price, "S1")
    }

    #[test]
    fn add_then_find_returns_same_entry() {
        let inv = inventory();
        let e = entry("P1", 3, Decimal::new(199, 2));

        inv.add_entry(e.clone()).expect("add");

        assert_eq!(inv.find_by_id("P1").expect("find"), e);
    }

    #[test]
    fn blank_identifier_or_name_rejected() {
        let inv = inventory();
        let mut e = entry("  ", 1, Decimal::ONE);
        assert!(matches!(inv.add_entry(e.clone()), Err(StockError::InvalidEntry(_))));

        e.id = "P1".into();
        e.name = "\t".into();
        assert!(matches!(inv.add_entry(e), Err(StockError::InvalidEntry(_))));
        assert!(inv.is_empty());
    }

    #[test]
    fn unrepresentable_stock_value_rejected() {
        let inv = inventory();
        let huge = entry("P1", i64::MAX, Decimal::new(10_000_000_000, 0));
        assert!(matches!(inv.add_entry(huge), Err(StockError::InvalidEntry(_))));

        inv.add_entry(entry("P2", 1, Decimal::new(10_000_000_000, 0)))
            .expect("add");
        let err = inv
            .update_entry("P2", &EntryPatch::new().quantity(i64::MAX))
            .expect_err("overflowing update");
        assert!(matches!(err, StockError::InvalidEntry(_)));
        assert_eq!(inv.find_by_id("P2").expect("find").quantity, 1);
    }

    #[test]
    fn separator_in_text_rejected() {
        let inv = inventory();
        let mut e = entry("P1", 1, Decimal::ONE);
        e.category = "Tools, misc".into();

        assert!(matches!(inv.add_entry(e), Err(StockError::InvalidEntry(_))));
    }

    #[test]
    fn update_checks_existence_before_values() {
        let inv = inventory();
        let patch = EntryPatch::new().quantity(-1);

        assert!(matches!(
            inv.update_entry("missing", &patch),
            Err(StockError::NotFound(_))
        ));
    }

    #[test]
    fn update_mutates_in_place() {
        let inv = inventory();
        inv.add_entry(entry("P1", 3, Decimal::ONE)).expect("add");
        inv.add_entry(entry("P2", 3, Decimal::ONE)).expect("add");

        let updated = inv
            .update_entry("P1", &EntryPatch::new().quantity(40).supplier_id("NOPE"))
            .expect("update");

        assert_eq!(updated.quantity, 40);
        assert_eq!(updated.supplier_id, "NOPE");
        let ids: Vec<_> = inv.list().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
    }

    #[test]
    fn update_rejects_negative_price() {
        let inv = inventory();
        inv.add_entry(entry("P1", 3, Decimal::ONE)).expect("add");

        let patch = EntryPatch::new().price(Decimal::new(-5, 1));
        assert!(matches!(
            inv.update_entry("P1", &patch),
            Err(StockError::InvalidEntry(_))
        ));
        assert_eq!(inv.find_by_id("P1").expect("find").price, Decimal::ONE);
    }

    #[test]
    fn name_search_is_case_insensitive_substring() {
        let inv = inventory();
        let mut e = entry("P1", 1, Decimal::ONE);
        e.name = "Cordless Drill".into();
        inv.add_entry(e).expect("add");
        inv.add_entry(entry("P2", 1, Decimal::ONE)).expect("add");

        assert_eq!(inv.find_by_name_substring("DRILL").len(), 1);
        assert_eq!(inv.find_by_name_substring("item").len(), 1);
        assert!(inv.find_by_name_substring("saw").is_empty());
    }

    #[test]
    fn category_search_is_case_insensitive_exact() {
        let inv = inventory();
        inv.add_entry(entry("P1", 1, Decimal::ONE)).expect("add");

        assert_eq!(inv.find_by_category("general").len(), 1);
        assert!(inv.find_by_category("gen").is_empty());
    }

    #[test]
    fn search_matches_dedicated_queries() {
        let inv = inventory();
        inv.add_entry(entry("P1", 2, Decimal::ONE)).expect("add");
        inv.add_entry(entry("P2", 20, Decimal::ONE)).expect("add");

        assert_eq!(inv.search(&Search::LowStock(10)), inv.low_stock(10));
        assert_eq!(
            inv.search(&Search::NameContains("item p2".into())),
            inv.find_by_name_substring("item p2")
        );
        assert_eq!(inv.search(&Search::Category("GENERAL".into())).len(), 2);
        assert_eq!(inv.search(&Search::Id("P2".into()))[0].quantity, 20);
    }

    #[test]
    fn low_stock_source_matches_direct_query() {
        let inv = inventory();
        inv.add_entry(entry("P1", 2, Decimal::ONE)).expect("add");
        inv.add_entry(entry("P2", 20, Decimal::ONE)).expect("add");

        let source: &dyn LowStockSource = &inv;
        assert_eq!(source.low_stock(10).expect("scan"), inv.low_stock(10));
    }

    #[test]
    fn report_lists_unresolved_suppliers() {
        let inv = inventory();
        inv.add_entry(entry("P1", 2, Decimal::ONE)).expect("add");

        let registry = SupplierRegistry::new(RecordStore::empty(MemoryBacking::default()));
        let report = inv.report(Some(&registry));

        assert_eq!(report.entry_count, 1);
        assert_eq!(report.unresolved_suppliers, vec!["P1".to_string()]);
        assert!(inv.report(None).unresolved_suppliers.is_empty());
    }
}

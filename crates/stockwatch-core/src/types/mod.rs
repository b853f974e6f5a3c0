//! # Core Type Definitions
//!
//! This module contains the record types of the stockwatch catalog:
//! - Catalog entries (`CatalogEntry`) and partial updates (`EntryPatch`)
//! - Supplier records (`Supplier`)
//! - Error types (`StockError`)
//!
//! Money is carried as `rust_decimal::Decimal`; there is no floating point
//! anywhere in the catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// CATALOG ENTRY
// =============================================================================

/// One inventory record.
///
/// Every entry held by a store satisfies `quantity >= 0` and `price >= 0`;
/// construction itself is unchecked so that invalid input can reach the
/// validation layer and be rejected there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Unique, non-blank identifier.
    pub id: String,
    /// Non-blank display name.
    pub name: String,
    /// Free-form category, compared case-insensitively.
    pub category: String,
    /// Units on hand.
    pub quantity: i64,
    /// Unit price.
    pub price: Decimal,
    /// Supplier reference. Not required to resolve.
    pub supplier_id: String,
}

impl CatalogEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: i64,
        price: Decimal,
        supplier_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            quantity,
            price,
            supplier_id: supplier_id.into(),
        }
    }

    /// Stock value of this entry: `quantity × price`.
    #[must_use]
    pub fn value(&self) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(self.price)
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | qty {} | {:.2} | supplier {}",
            self.id, self.name, self.category, self.quantity, self.price, self.supplier_id
        )
    }
}

// =============================================================================
// ENTRY PATCH
// =============================================================================

/// Partial update for a catalog entry.
///
/// `None` keeps the current value. The identifier is never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Decimal>,
    pub supplier_id: Option<String>,
}

impl EntryPatch {
    /// An empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub const fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    #[must_use]
    pub const fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn supplier_id(mut self, supplier_id: impl Into<String>) -> Self {
        self.supplier_id = Some(supplier_id.into());
        self
    }

    /// A patch that overwrites every mutable field with `entry`'s values.
    #[must_use]
    pub fn replace_with(entry: &CatalogEntry) -> Self {
        Self {
            name: Some(entry.name.clone()),
            category: Some(entry.category.clone()),
            quantity: Some(entry.quantity),
            price: Some(entry.price),
            supplier_id: Some(entry.supplier_id.clone()),
        }
    }

    /// Check if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.quantity.is_none()
            && self.price.is_none()
            && self.supplier_id.is_none()
    }

    /// Write the patched fields into `entry`.
    pub fn apply_to(&self, entry: &mut CatalogEntry) {
        if let Some(name) = &self.name {
            entry.name.clone_from(name);
        }
        if let Some(category) = &self.category {
            entry.category.clone_from(category);
        }
        if let Some(quantity) = self.quantity {
            entry.quantity = quantity;
        }
        if let Some(price) = self.price {
            entry.price = price;
        }
        if let Some(supplier_id) = &self.supplier_id {
            entry.supplier_id.clone_from(supplier_id);
        }
    }
}

// =============================================================================
// SUPPLIER
// =============================================================================

/// A supplier record. Catalog entries may reference it by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub phone: String,
}

impl Supplier {
    /// Create a new supplier.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        contact: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            contact: contact.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}

impl fmt::Display for Supplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {} | {}",
            self.id, self.name, self.contact, self.email, self.phone
        )
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the stockwatch catalog.
///
/// - Validation and lookup errors are returned to the caller, never fatal
/// - Format errors describe one rejected backing-file line
/// - I/O failures leave the in-memory catalog as it was after the mutation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// A record failed validation or duplicates an existing identifier.
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// No record with the given identifier exists.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A backing-file line could not be parsed.
    #[error("Format error at line {line}: {reason}")]
    FormatError { line: u64, reason: String },

    /// Reading or writing a backing file failed.
    #[error("I/O failure: {0}")]
    IoFailure(String),
}

impl StockError {
    /// Shorthand for an `InvalidEntry` error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidEntry(reason.into())
    }

    /// Shorthand for a `FormatError` error.
    pub fn format(line: u64, reason: impl Into<String>) -> Self {
        Self::FormatError {
            line,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for StockError {
    fn from(err: std::io::Error) -> Self {
        Self::IoFailure(err.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> CatalogEntry {
        CatalogEntry::new("P1", "Widget", "Tools", 4, Decimal::new(250, 2), "S1")
    }

    #[test]
    fn value_multiplies_quantity_and_price() {
        assert_eq!(widget().value(), Decimal::new(1000, 2));
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut entry = widget();
        let patch = EntryPatch::new();
        assert!(patch.is_empty());

        patch.apply_to(&mut entry);
        assert_eq!(entry, widget());
    }

    #[test]
    fn patch_overwrites_only_given_fields() {
        let mut entry = widget();
        EntryPatch::new()
            .quantity(9)
            .category("Hardware")
            .apply_to(&mut entry);

        assert_eq!(entry.quantity, 9);
        assert_eq!(entry.category, "Hardware");
        assert_eq!(entry.name, "Widget");
        assert_eq!(entry.id, "P1");
    }

    #[test]
    fn replace_with_copies_all_mutable_fields() {
        let other = CatalogEntry::new("P9", "Gadget", "Toys", 1, Decimal::ONE, "S2");
        let mut entry = widget();
        EntryPatch::replace_with(&other).apply_to(&mut entry);

        assert_eq!(entry.id, "P1");
        assert_eq!(entry.name, "Gadget");
        assert_eq!(entry.supplier_id, "S2");
    }

    #[test]
    fn display_rounds_price() {
        let text = widget().to_string();
        assert!(text.contains("2.50"));
        assert!(text.starts_with("P1 |"));
    }

    #[test]
    fn io_error_maps_to_io_failure() {
        let err = StockError::from(std::io::Error::other("disk gone"));
        assert!(matches!(err, StockError::IoFailure(msg) if msg.contains("disk gone")));
    }
}

//! # Supplier Registry
//!
//! Supplier records kept alongside the catalog. Catalog entries reference
//! suppliers by identifier, but the reference is never enforced: an entry may
//! name a supplier that does not exist.

use crate::mutation::{check_required, check_text};
use crate::store::{Backing, LoadReport, Record, RecordStore};
use crate::{StockError, Supplier};

impl Record for Supplier {
    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), StockError> {
        check_required("supplier identifier", &self.id)?;
        check_text("supplier name", &self.name)?;
        check_text("contact", &self.contact)?;
        check_text("email", &self.email)?;
        check_text("phone", &self.phone)
    }
}

/// Registry of suppliers backed by its own flat file.
#[derive(Debug)]
pub struct SupplierRegistry {
    store: RecordStore<Supplier>,
}

impl SupplierRegistry {
    #[must_use]
    pub fn new(store: RecordStore<Supplier>) -> Self {
        Self { store }
    }

    /// Load suppliers from `backing`. Never fails; see [`RecordStore::load`].
    pub fn load(backing: impl Backing<Supplier> + 'static) -> (Self, LoadReport) {
        let (store, report) = RecordStore::load(backing);
        (Self::new(store), report)
    }

    #[must_use]
    pub fn store(&self) -> &RecordStore<Supplier> {
        &self.store
    }

    /// Register a new supplier and persist.
    ///
    /// # Errors
    /// - `InvalidEntry` if the identifier is blank or already registered
    /// - `IoFailure` if persisting fails; the supplier stays registered
    pub fn add_supplier(&self, supplier: Supplier) -> Result<(), StockError> {
        self.store.insert(supplier)
    }

    pub fn get_supplier(&self, id: &str) -> Result<Supplier, StockError> {
        self.store.get(id)
    }

    /// Every supplier in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<Supplier> {
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
}

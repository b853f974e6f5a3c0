//! # stockwatch-core
//!
//! The inventory catalog engine for stockwatch - THE LOGIC.
//!
//! This crate holds the catalog and supplier collections, their flat-file
//! persistence, validation, and read-only queries.
//!
//! ## Architectural Constraints
//!
//! - Synchronous: no async runtime, no logging dependency
//! - One writer, many snapshot readers: reads never see a half-applied
//!   mutation and never wait for disk I/O
//! - Every successful mutation is persisted before it returns
//! - Decimal money, never floating point

// =============================================================================
// MODULES
// =============================================================================

pub mod formats;
pub mod mutation;
pub mod primitives;
pub mod query;
pub mod store;
pub mod supplier;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{CatalogEntry, EntryPatch, StockError, Supplier};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use mutation::Inventory;
pub use query::{InventoryReport, LowStockSource, Search};
pub use store::{Backing, Catalog, FlatFile, LoadReport, MemoryBacking, Record, RecordStore};
pub use supplier::SupplierRegistry;

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{FlatRecord, Parsed, Rejected, parse_line};

// =============================================================================
// RE-EXPORTS: Decimal type used for prices
// =============================================================================

pub use rust_decimal::Decimal;

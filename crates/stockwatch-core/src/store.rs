//! # Record Store
//!
//! In-memory collections keyed by identifier, persisted in full to a backing
//! file after every successful mutation.
//!
//! ## Consistency
//!
//! A store publishes immutable catalog versions. Readers take an
//! `Arc<Catalog>` snapshot and never observe a mutation in progress:
//!
//! - one writer `Mutex` serializes mutations and file writes
//! - a mutation clones the current version, applies the change, and publishes
//!   the complete new version with one pointer swap
//! - the read lock is only held long enough to clone the `Arc`, never across
//!   disk I/O
//!
//! If persistence fails after a mutation, the new version stays published and
//! the caller receives `StockError::IoFailure`. Disk is a best-effort copy of
//! memory within a session.

use crate::formats::{FlatRecord, Parsed, Rejected, parse_records, write_records};
use crate::StockError;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

// =============================================================================
// RECORD TRAIT
// =============================================================================

/// A record that can live in a [`RecordStore`].
pub trait Record: Clone + Send + Sync + 'static {
    /// Unique identifier of this record.
    fn id(&self) -> &str;

    /// Check the record's own field invariants.
    ///
    /// Uniqueness is checked by the store, not here.
    fn validate(&self) -> Result<(), StockError>;
}

// =============================================================================
// BACKING
// =============================================================================

/// Where a store's records are read from at startup and written to after
/// each mutation.
pub trait Backing<R>: Send + Sync {
    /// Read every record. Bad lines are reported, not fatal.
    fn load(&self) -> Result<Parsed<R>, StockError>;

    /// Replace the stored records with `records`.
    fn save(&self, records: &[R]) -> Result<(), StockError>;

    /// Short description for log messages.
    fn describe(&self) -> String;
}

/// A delimited text file, rewritten in full on every save.
#[derive(Debug, Clone)]
pub struct FlatFile {
    path: PathBuf,
}

impl FlatFile {
    /// Create a backing for the file at `path`. Nothing is opened yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sibling file written before being renamed over the real one.
    fn staging_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn create_empty(&self) -> Result<(), StockError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StockError::IoFailure(format!("create {}: {}", parent.display(), e))
            })?;
        }
        File::create(&self.path).map_err(|e| {
            StockError::IoFailure(format!("create {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

impl<R: FlatRecord + Send + Sync> Backing<R> for FlatFile {
    fn load(&self) -> Result<Parsed<R>, StockError> {
        if !self.path.exists() {
            self.create_empty()?;
            return Ok(Parsed::default());
        }
        let file = File::open(&self.path)
            .map_err(|e| StockError::IoFailure(format!("open {}: {}", self.path.display(), e)))?;
        parse_records(BufReader::new(file))
    }

    fn save(&self, records: &[R]) -> Result<(), StockError> {
        let staging = self.staging_path();
        let file = File::create(&staging)
            .map_err(|e| StockError::IoFailure(format!("create {}: {}", staging.display(), e)))?;

        let mut writer = BufWriter::new(file);
        write_records(&mut writer, records)?;
        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| StockError::IoFailure(e.to_string()))?
            .sync_all()?;

        fs::rename(&staging, &self.path).map_err(|e| {
            StockError::IoFailure(format!("replace {}: {}", self.path.display(), e))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Backing that keeps the last saved records in memory.
///
/// Used for tests and for sessions that should not touch disk.
#[derive(Debug)]
pub struct MemoryBacking<R> {
    saved: Mutex<Vec<R>>,
    saves: Mutex<usize>,
}

impl<R> Default for MemoryBacking<R> {
    fn default() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            saves: Mutex::new(0),
        }
    }
}

impl<R: Clone> MemoryBacking<R> {
    /// A backing whose `load` returns `records`.
    #[must_use]
    pub fn new(records: Vec<R>) -> Self {
        Self {
            saved: Mutex::new(records),
            saves: Mutex::new(0),
        }
    }

    /// Records written by the most recent save.
    #[must_use]
    pub fn saved(&self) -> Vec<R> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Clone + Send + Sync> Backing<R> for MemoryBacking<R> {
    fn load(&self) -> Result<Parsed<R>, StockError> {
        let records = self.saved();
        Ok(Parsed {
            records: (1u64..).zip(records).collect(),
            rejected: Vec::new(),
        })
    }

    fn save(&self, records: &[R]) -> Result<(), StockError> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = records.to_vec();
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Shared backings forward to the inner value, so a caller can keep a handle
/// to inspect what the store saved.
impl<R, B: Backing<R>> Backing<R> for Arc<B> {
    fn load(&self) -> Result<Parsed<R>, StockError> {
        (**self).load()
    }

    fn save(&self, records: &[R]) -> Result<(), StockError> {
        (**self).save(records)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

// =============================================================================
// CATALOG (one immutable version)
// =============================================================================

/// Insertion-ordered records with an identifier index.
#[derive(Debug, Clone)]
pub struct Catalog<R> {
    records: Vec<R>,
    index: BTreeMap<String, usize>,
}

impl<R> Default for Catalog<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: BTreeMap::new(),
        }
    }
}

impl<R: Record> Catalog<R> {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lookup a record by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&R> {
        self.index.get(id).and_then(|&pos| self.records.get(pos))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Records in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[R] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    /// Check that the identifier index agrees with the records.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.index.len() == self.records.len()
            && self
                .index
                .iter()
                .all(|(id, &pos)| self.records.get(pos).is_some_and(|r| r.id() == id))
    }

    fn insert(&mut self, record: R) -> Result<(), StockError> {
        if self.contains(record.id()) {
            return Err(StockError::invalid(format!(
                "identifier '{}' already exists",
                record.id()
            )));
        }
        self.index.insert(record.id().to_string(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut R, StockError> {
        let pos = *self
            .index
            .get(id)
            .ok_or_else(|| StockError::NotFound(id.to_string()))?;
        self.records
            .get_mut(pos)
            .ok_or_else(|| StockError::NotFound(id.to_string()))
    }

    fn remove(&mut self, id: &str) -> Result<R, StockError> {
        let pos = self
            .index
            .remove(id)
            .ok_or_else(|| StockError::NotFound(id.to_string()))?;
        let removed = self.records.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Ok(removed)
    }
}

impl<'a, R> IntoIterator for &'a Catalog<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// =============================================================================
// LOAD REPORT
// =============================================================================

/// Outcome of loading a store at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records accepted into the store.
    pub loaded: usize,
    /// Lines skipped because they could not be parsed or validated.
    pub rejected: Vec<Rejected>,
    /// Set when the backing could not be read at all; the store starts empty.
    pub failure: Option<StockError>,
}

impl LoadReport {
    /// Check if every line was accepted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.failure.is_none()
    }
}

// =============================================================================
// RECORD STORE
// =============================================================================

/// A collection of records shared between one writer and any number of
/// snapshot readers.
pub struct RecordStore<R: Record> {
    current: RwLock<Arc<Catalog<R>>>,
    writer: Mutex<()>,
    backing: Box<dyn Backing<R>>,
}

impl<R: Record> std::fmt::Debug for RecordStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("backing", &self.backing.describe())
            .field("len", &self.len())
            .finish()
    }
}

impl<R: Record> RecordStore<R> {
    /// Create an empty store over `backing` without reading it.
    pub fn empty(backing: impl Backing<R> + 'static) -> Self {
        Self {
            current: RwLock::new(Arc::new(Catalog::new())),
            writer: Mutex::new(()),
            backing: Box::new(backing),
        }
    }

    /// Load a store from `backing`.
    ///
    /// Never fails: unparseable lines, invalid records and duplicate
    /// identifiers are skipped and listed in the report. If the backing
    /// cannot be read at all the store starts empty.
    pub fn load(backing: impl Backing<R> + 'static) -> (Self, LoadReport) {
        let store = Self::empty(backing);
        let mut report = LoadReport::default();

        let parsed = match store.backing.load() {
            Ok(parsed) => parsed,
            Err(e) => {
                report.failure = Some(e);
                return (store, report);
            }
        };

        let mut catalog = Catalog::new();
        report.rejected = parsed.rejected;
        for (line, record) in parsed.records {
            if let Err(error) = record.validate().and_then(|()| catalog.insert(record)) {
                report.rejected.push(Rejected { line, error });
            }
        }
        report.rejected.sort_by_key(|r| r.line);
        report.loaded = catalog.len();

        *store.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
        (store, report)
    }

    /// Description of the backing, for log messages.
    #[must_use]
    pub fn backing_name(&self) -> String {
        self.backing.describe()
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Point-in-time version of the whole collection.
    ///
    /// The snapshot is immutable; later mutations publish new versions and
    /// leave it untouched.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Catalog<R>> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Lookup a record by identifier.
    pub fn get(&self, id: &str) -> Result<R, StockError> {
        self.snapshot()
            .get(id)
            .cloned()
            .ok_or_else(|| StockError::NotFound(id.to_string()))
    }

    /// Copy of every record in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<R> {
        self.snapshot().as_slice().to_vec()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Append a new record and persist.
    ///
    /// # Errors
    /// - `InvalidEntry` if the record is invalid or its identifier is taken
    /// - `IoFailure` if persisting fails (the record stays inserted)
    pub fn insert(&self, record: R) -> Result<(), StockError> {
        record.validate()?;
        self.mutate(|catalog| catalog.insert(record))
    }

    /// Modify a record in place and persist. Returns the updated record.
    ///
    /// The result of `edit` is validated before it is published; an invalid
    /// result leaves the store unchanged. The identifier must not change.
    pub fn update(&self, id: &str, edit: impl FnOnce(&mut R)) -> Result<R, StockError> {
        self.mutate(|catalog| {
            let record = catalog.get_mut(id)?;
            let mut edited = record.clone();
            edit(&mut edited);
            if edited.id() != id {
                return Err(StockError::invalid("identifier cannot be changed"));
            }
            edited.validate()?;
            *record = edited.clone();
            Ok(edited)
        })
    }

    /// Remove a record and persist. Returns the removed record.
    pub fn remove(&self, id: &str) -> Result<R, StockError> {
        self.mutate(|catalog| catalog.remove(id))
    }

    /// Rewrite the backing from the current version.
    pub fn persist(&self) -> Result<(), StockError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.backing.save(self.snapshot().as_slice())
    }

    /// Apply `change` to a private copy of the current version, publish it,
    /// then persist it.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Catalog<R>) -> Result<T, StockError>,
    ) -> Result<T, StockError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = Catalog::clone(&self.snapshot());
        let output = change(&mut next)?;
        let next = Arc::new(next);

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);

        self.backing.save(next.as_slice())?;
        Ok(output)
    }
}

// =============================================================================
// TESTS
// =============================================================================

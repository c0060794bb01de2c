//! Service cache.
//!
//! Readers load an immutable snapshot; a refresh builds a complete new
//! snapshot and swaps it in, so no reader ever observes a half-built cache.

use arc_swap::ArcSwap;
use gateway_core::ServiceRecord;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable view of the directory at one point in time
#[derive(Debug, Default)]
pub struct CacheSnapshot {
    records: Vec<ServiceRecord>,
    by_model: HashMap<String, usize>,
}

impl CacheSnapshot {
    /// Index records by model; the first record for a model wins
    #[must_use]
    pub fn from_records(records: Vec<ServiceRecord>) -> Self {
        let mut by_model = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            by_model.entry(record.model.clone()).or_insert(idx);
        }
        Self { records, by_model }
    }

    /// Exact, case-sensitive lookup
    #[must_use]
    pub fn lookup(&self, model: &str) -> Option<&ServiceRecord> {
        self.by_model.get(model).map(|&idx| &self.records[idx])
    }

    /// All records in directory order
    #[must_use]
    pub fn records(&self) -> &[ServiceRecord] {
        &self.records
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Shared service cache
#[derive(Debug, Default)]
pub struct ServiceCache {
    snapshot: ArcSwap<CacheSnapshot>,
}

impl ServiceCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        self.snapshot.load_full()
    }

    /// Replace the whole cache with `records`
    pub fn replace(&self, records: Vec<ServiceRecord>) {
        self.snapshot
            .store(Arc::new(CacheSnapshot::from_records(records)));
    }

    /// Look up a model in the current snapshot
    #[must_use]
    pub fn lookup(&self, model: &str) -> Option<ServiceRecord> {
        self.snapshot.load().lookup(model).cloned()
    }

    /// Whether the cache holds no services
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }
}

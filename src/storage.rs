//! Contracts for the storage collaborators the engine runs against, plus an
//! in-memory implementation useful for tests and small tools.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use serde_json::Value as Json;
use thiserror::Error;

use crate::types::{Num, PropertyDiscovery};

/// A failure inside a storage collaborator. Opaque to the engine, which
/// reports it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StorageError(pub String);

impl StorageError {
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// One indexed object in the storage tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageEntry {
    uri: String,
    type_name: String,
    schema: String,
}

impl StorageEntry {
    #[must_use]
    pub fn new(
        uri: impl Into<String>,
        type_name: impl Into<String>,
        schema: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            type_name: type_name.into(),
            schema: schema.into(),
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }
}

/// What an indexing pass should cover. Empty sets mean everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexingTarget {
    pub types: BTreeSet<String>,
    pub schemas: BTreeSet<String>,
}

impl IndexingTarget {
    #[must_use]
    pub fn everything() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_everything(&self) -> bool {
        self.types.is_empty() && self.schemas.is_empty()
    }

    #[must_use]
    pub fn covers(&self, entry: &StorageEntry) -> bool {
        (self.types.is_empty() || self.types.contains(entry.type_name()))
            && (self.schemas.is_empty() || self.schemas.contains(entry.schema()))
    }

    /// Whether everything the other target covers is also covered by this
    /// one. An empty set on this side covers all values; an empty set on the
    /// other side asks for all values, which only an empty set here satisfies.
    #[must_use]
    pub fn includes(&self, other: &IndexingTarget) -> bool {
        let types = self.types.is_empty()
            || (!other.types.is_empty() && other.types.is_subset(&self.types));
        let schemas = self.schemas.is_empty()
            || (!other.schemas.is_empty() && other.schemas.is_subset(&self.schemas));
        types && schemas
    }
}

/// The index over the storage tree. Implementations must tolerate concurrent
/// evaluation threads.
pub trait StorageIndex: Send + Sync {
    /// All currently indexed entries.
    fn entities(&self) -> Vec<Arc<StorageEntry>>;

    /// Look up an entry by URI in the index.
    fn get(&self, uri: &str) -> Option<Arc<StorageEntry>>;

    /// Look up an entry by URI in the backing tree directly, bypassing the
    /// index. Finds entries the index has not picked up yet.
    fn locate(&self, uri: &str) -> Option<Arc<StorageEntry>>;

    /// Confirm that the given entries still exist, dropping stale ones.
    fn validate(&self, entries: &[Arc<StorageEntry>]) -> Result<(), StorageError>;

    /// Refresh the index over the given target, merging the result into the
    /// existing index. Only entries the target covers are replaced; an
    /// everything-target rebuilds from scratch. Returns the number of
    /// entries found.
    fn refresh(&self, target: &IndexingTarget) -> Result<u64, StorageError>;

    /// Whether the index is current for the given target, so a query over
    /// that target can run without refreshing first.
    fn is_fresh(&self, target: &IndexingTarget) -> bool;
}

/// Resolves property paths on entries.
pub trait PropertyExaminer: Send + Sync {
    /// Resolve a dot-separated property path on an entry.
    fn discover(
        &self,
        entry: &StorageEntry,
        prop: &str,
    ) -> Result<PropertyDiscovery, StorageError>;
}

/// The pair of collaborators a single evaluation borrows.
#[derive(Clone, Copy)]
pub struct StorageContext<'a> {
    pub index: &'a dyn StorageIndex,
    pub examiner: &'a dyn PropertyExaminer,
}

impl<'a> StorageContext<'a> {
    #[must_use]
    pub fn new(index: &'a dyn StorageIndex, examiner: &'a dyn PropertyExaminer) -> Self {
        Self { index, examiner }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    docs: HashMap<String, (Arc<StorageEntry>, Json)>,
    indexed: BTreeMap<String, Arc<StorageEntry>>,
    // freshness since the last mutation: a full refresh, or the targets of
    // partial refreshes
    full: bool,
    partials: Vec<IndexingTarget>,
}

impl MemoryState {
    fn invalidate(&mut self) {
        self.full = false;
        self.partials.clear();
    }
}

/// A heap-backed storage instance implementing both collaborator traits.
///
/// Entries are JSON documents keyed by URI. The index starts stale and stays
/// stale until [`StorageIndex::refresh`] runs, so implicit indexing paths
/// are exercised the same way they are against real storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document. Marks the index stale.
    pub fn put(
        &self,
        uri: impl Into<String>,
        type_name: impl Into<String>,
        schema: impl Into<String>,
        doc: Json,
    ) {
        let uri = uri.into();
        let entry = Arc::new(StorageEntry::new(uri.clone(), type_name, schema));
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.docs.insert(uri, (entry, doc));
        state.invalidate();
    }

    /// Remove a document. Marks the index stale.
    pub fn remove(&self, uri: &str) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.docs.remove(uri);
        state.invalidate();
    }

    fn walk<'v>(doc: &'v Json, prop: &str) -> Option<&'v Json> {
        let mut current = doc;
        for segment in prop.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl StorageIndex for MemoryStorage {
    fn entities(&self) -> Vec<Arc<StorageEntry>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.indexed.values().cloned().collect()
    }

    fn get(&self, uri: &str) -> Option<Arc<StorageEntry>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.indexed.get(uri).cloned()
    }

    fn locate(&self, uri: &str) -> Option<Arc<StorageEntry>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.docs.get(uri).map(|(entry, _)| Arc::clone(entry))
    }

    fn validate(&self, entries: &[Arc<StorageEntry>]) -> Result<(), StorageError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for entry in entries {
            if !state.docs.contains_key(entry.uri()) {
                return Err(StorageError::new(format!(
                    "entry vanished during evaluation: {}",
                    entry.uri()
                )));
            }
        }
        Ok(())
    }

    fn refresh(&self, target: &IndexingTarget) -> Result<u64, StorageError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let state = &mut *state;
        // Entries outside the target survive a partial refresh; a full
        // refresh starts over.
        if target.is_everything() {
            state.indexed.clear();
        } else {
            state.indexed.retain(|_, entry| !target.covers(entry));
        }
        let mut found = 0;
        for (uri, (entry, _)) in &state.docs {
            if target.covers(entry) {
                state.indexed.insert(uri.clone(), Arc::clone(entry));
                found += 1;
            }
        }
        if target.is_everything() {
            state.full = true;
            state.partials.clear();
        } else if !state.full {
            state.partials.push(target.clone());
        }
        Ok(found)
    }

    fn is_fresh(&self, target: &IndexingTarget) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.full || state.partials.iter().any(|t| t.includes(target))
    }
}

impl PropertyExaminer for MemoryStorage {
    fn discover(
        &self,
        entry: &StorageEntry,
        prop: &str,
    ) -> Result<PropertyDiscovery, StorageError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some((_, doc)) = state.docs.get(entry.uri()) else {
            return Err(StorageError::new(format!(
                "no document for entry: {}",
                entry.uri()
            )));
        };
        let discovered = match Self::walk(doc, prop) {
            None => PropertyDiscovery::NotFound,
            Some(Json::Null) => PropertyDiscovery::NoValue,
            Some(Json::String(s)) => PropertyDiscovery::StringFound(s.clone()),
            Some(Json::Bool(b)) => PropertyDiscovery::BooleanFound(*b),
            Some(Json::Number(n)) => {
                let num = if n.is_f64() {
                    Num::Float(n.as_f64().unwrap_or_default())
                } else {
                    Num::Int(n.as_i64().unwrap_or_default())
                };
                PropertyDiscovery::NumberFound(num)
            }
            Some(Json::Object(map)) => PropertyDiscovery::ComplexFound(map.clone()),
            // Arrays are not addressable property values.
            Some(Json::Array(_)) => PropertyDiscovery::NotFound,
        };
        Ok(discovered)
    }
}

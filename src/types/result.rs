use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value as Json;

use crate::storage::StorageEntry;
use crate::types::PropertyDiscovery;

/// The outcome of one executed instruction, in script order.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionResult {
    IndexingPerformed(IndexingPerformed),
    QueryPerformed(QueryPerformed),
}

/// Report of one indexing pass, explicit or implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexingPerformed {
    pub implicit: bool,
    pub types: BTreeSet<String>,
    pub schemas: BTreeSet<String>,
    /// The instruction in re-compilable script syntax.
    pub pretty_print: String,
    pub entries_found: u64,
    pub time_taken: Duration,
}

/// Report of one executed query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPerformed {
    /// The instruction in re-compilable script syntax.
    pub pretty_print: String,
    pub result_set: ResultSet,
    /// Time spent matching entries, excluding projection.
    pub time_taken: Duration,
}

/// The rows a query produced, plus projection metadata when the query had a
/// `show` clause.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    rows: Vec<QueryResultRow>,
    meta: Option<ResultSetMeta>,
}

impl ResultSet {
    #[must_use]
    pub fn new(rows: Vec<QueryResultRow>, meta: Option<ResultSetMeta>) -> Self {
        Self { rows, meta }
    }

    #[must_use]
    pub fn rows(&self) -> &[QueryResultRow] {
        &self.rows
    }

    /// The matched entries, in index order.
    #[must_use]
    pub fn entries(&self) -> Vec<Arc<StorageEntry>> {
        self.rows.iter().map(|row| Arc::clone(&row.entry)).collect()
    }

    #[must_use]
    pub fn meta(&self) -> Option<&ResultSetMeta> {
        self.meta.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Projection metadata: the column headings and the time the projection
/// phase took, measured separately from matching.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSetMeta {
    pub columns: Vec<ColumnDescriptor>,
    pub time_taken: Duration,
}

/// One projected column heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub prop: String,
    pub title: String,
}

/// One matched entry with its projected cells keyed by property path.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResultRow {
    entry: Arc<StorageEntry>,
    cells: HashMap<String, DataCell>,
}

impl QueryResultRow {
    #[must_use]
    pub fn new(entry: Arc<StorageEntry>, cells: HashMap<String, DataCell>) -> Self {
        Self { entry, cells }
    }

    #[must_use]
    pub fn entry(&self) -> &StorageEntry {
        &self.entry
    }

    #[must_use]
    pub fn cell(&self, prop: &str) -> Option<&DataCell> {
        self.cells.get(prop)
    }
}

/// Whether a cell holds a scalar rendering or serialized structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Simple,
    Complex,
}

/// One projected value, already rendered to text. Absent properties render
/// as an empty simple cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCell {
    kind: CellKind,
    value: String,
}

impl DataCell {
    #[must_use]
    pub fn simple(value: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Simple,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn complex(value: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Complex,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn no_value() -> Self {
        Self::simple("")
    }

    #[must_use]
    pub fn kind(&self) -> CellKind {
        self.kind
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl From<&PropertyDiscovery> for DataCell {
    fn from(discovered: &PropertyDiscovery) -> Self {
        match discovered {
            PropertyDiscovery::StringFound(s) => DataCell::simple(s.clone()),
            PropertyDiscovery::NumberFound(n) => DataCell::simple(n.to_string()),
            PropertyDiscovery::BooleanFound(b) => DataCell::simple(b.to_string()),
            PropertyDiscovery::ComplexFound(map) => {
                DataCell::complex(Json::Object(map.clone()).to_string())
            }
            PropertyDiscovery::NoValue | PropertyDiscovery::NotFound => DataCell::no_value(),
        }
    }
}

impl fmt::Display for DataCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Num;
    use serde_json::json;

    #[test]
    fn cells_from_discovery() {
        assert_eq!(
            DataCell::from(&PropertyDiscovery::StringFound("John".into())),
            DataCell::simple("John")
        );
        assert_eq!(
            DataCell::from(&PropertyDiscovery::NumberFound(Num::Float(1.5))),
            DataCell::simple("1.5")
        );
        assert_eq!(
            DataCell::from(&PropertyDiscovery::BooleanFound(false)),
            DataCell::simple("false")
        );
    }

    #[test]
    fn absent_discoveries_render_empty() {
        assert_eq!(DataCell::from(&PropertyDiscovery::NoValue), DataCell::no_value());
        assert_eq!(DataCell::from(&PropertyDiscovery::NotFound), DataCell::no_value());
        assert_eq!(DataCell::no_value().value(), "");
        assert_eq!(DataCell::no_value().kind(), CellKind::Simple);
    }

    #[test]
    fn complex_cells_serialize_to_json() {
        let map = match json!({"a": 1}) {
            Json::Object(map) => map,
            _ => unreachable!(),
        };
        let cell = DataCell::from(&PropertyDiscovery::ComplexFound(map));
        assert_eq!(cell.kind(), CellKind::Complex);
        assert_eq!(cell.value(), "{\"a\":1}");
    }

    #[test]
    fn result_set_exposes_entries() {
        let entry = Arc::new(StorageEntry::new("/foo/1", "Foo", "baz"));
        let row = QueryResultRow::new(Arc::clone(&entry), HashMap::new());
        let set = ResultSet::new(vec![row], None);
        assert_eq!(set.len(), 1);
        assert_eq!(set.entries()[0].uri(), "/foo/1");
        assert!(set.meta().is_none());
    }
}

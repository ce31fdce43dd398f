//! Instruction execution against the storage collaborators.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::compile::compile;
use crate::storage::{
    IndexingTarget, PropertyExaminer as _, StorageContext, StorageEntry, StorageIndex as _,
};
use crate::types::{
    ColumnDescriptor, DataCell, IndexInstruction, IndexingPerformed, Instruction,
    InstructionResult, QueryInstruction, QueryPerformed, QueryResultRow, ResultSet,
    ResultSetMeta, ScriptError, ScriptResult,
};

/// Engine policy switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Whether scripts may contain explicit `index` blocks.
    pub allow_explicit_indexing: bool,
    /// Whether a stale index is refreshed automatically before a query.
    pub implicit_indexing: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allow_explicit_indexing: true,
            implicit_indexing: true,
        }
    }
}

/// Compiles and executes scripts under one [`EngineConfig`].
///
/// The engine itself is stateless; all state lives behind the
/// [`StorageContext`] borrows passed to [`ScriptEngine::evaluate`], so one
/// engine can serve concurrent callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptEngine {
    config: EngineConfig,
}

impl ScriptEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Compile and run a script. Results come back in script order; nothing
    /// is partially applied on error.
    ///
    /// # Errors
    ///
    /// [`ScriptError::Compilation`] for syntax problems,
    /// [`ScriptError::Impermissible`] when the script asks for something the
    /// configuration forbids, and [`ScriptError::Unknown`] when a storage
    /// collaborator fails.
    pub fn evaluate(&self, source: &str, storage: StorageContext<'_>) -> ScriptResult {
        let instructions = compile(source)?;
        debug!(instructions = instructions.len(), "script compiled");
        let mut results = Vec::with_capacity(instructions.len());
        for instruction in &instructions {
            match instruction {
                Instruction::Index(index) => {
                    if !self.config.allow_explicit_indexing {
                        return Err(ScriptError::impermissible(
                            "explicit indexing is disabled",
                            instruction,
                        ));
                    }
                    results.push(InstructionResult::IndexingPerformed(run_index(
                        index, storage,
                    )?));
                }
                Instruction::Query(query) => {
                    let target = IndexingTarget {
                        types: query.types().clone(),
                        schemas: query.schemas().clone(),
                    };
                    if self.config.implicit_indexing && !storage.index.is_fresh(&target) {
                        let implicit = IndexInstruction::implicit(
                            query.types().clone(),
                            query.schemas().clone(),
                        );
                        results.push(InstructionResult::IndexingPerformed(run_index(
                            &implicit, storage,
                        )?));
                    }
                    results.push(InstructionResult::QueryPerformed(run_query(
                        query, storage,
                    )?));
                }
            }
        }
        Ok(results)
    }
}

/// Run a script under the default configuration.
///
/// # Errors
///
/// See [`ScriptEngine::evaluate`].
pub fn evaluate(source: &str, storage: StorageContext<'_>) -> ScriptResult {
    ScriptEngine::default().evaluate(source, storage)
}

fn run_index(
    index: &IndexInstruction,
    storage: StorageContext<'_>,
) -> Result<IndexingPerformed, ScriptError> {
    let target = IndexingTarget {
        types: index.types().clone(),
        schemas: index.schemas().clone(),
    };
    let started = Instant::now();
    let entries_found = storage
        .index
        .refresh(&target)
        .map_err(|e| ScriptError::unknown(e.to_string()))?;
    let time_taken = started.elapsed();
    debug!(
        implicit = index.is_implicit(),
        entries_found, "index refreshed"
    );
    Ok(IndexingPerformed {
        implicit: index.is_implicit(),
        types: index.types().clone(),
        schemas: index.schemas().clone(),
        pretty_print: index.to_string(),
        entries_found,
        time_taken,
    })
}

fn run_query(
    query: &QueryInstruction,
    storage: StorageContext<'_>,
) -> Result<QueryPerformed, ScriptError> {
    let started = Instant::now();
    let limit = query.limit();
    let mut matched: Vec<Arc<StorageEntry>> = Vec::new();

    for entry in storage.index.entities() {
        if !query.selects_type(entry.type_name()) || !query.selects_schema(entry.schema()) {
            continue;
        }
        let hit = match query.condition() {
            None => true,
            Some(tree) => tree
                .try_check(&mut |assertion| {
                    storage
                        .examiner
                        .discover(&entry, assertion.prop())
                        .map(|discovered| assertion.check(&discovered))
                })
                .map_err(|e| ScriptError::unknown(e.to_string()))?,
        };
        if hit {
            matched.push(entry);
            if limit > 0 && matched.len() as i64 >= limit {
                break;
            }
        }
    }

    storage
        .index
        .validate(&matched)
        .map_err(|e| ScriptError::unknown(e.to_string()))?;
    let time_taken = started.elapsed();
    debug!(matched = matched.len(), "query matched");

    let result_set = if query.columns().is_empty() {
        let rows = matched
            .into_iter()
            .map(|entry| QueryResultRow::new(entry, HashMap::new()))
            .collect();
        ResultSet::new(rows, None)
    } else {
        // Projection is timed separately from matching.
        let projection_started = Instant::now();
        let mut rows = Vec::with_capacity(matched.len());
        for entry in matched {
            let mut cells = HashMap::with_capacity(query.columns().len());
            for column in query.columns() {
                let discovered = storage
                    .examiner
                    .discover(&entry, column.prop())
                    .map_err(|e| ScriptError::unknown(e.to_string()))?;
                cells.insert(column.prop().to_owned(), DataCell::from(&discovered));
            }
            rows.push(QueryResultRow::new(entry, cells));
        }
        let columns = query
            .columns()
            .iter()
            .map(|c| ColumnDescriptor {
                prop: c.prop().to_owned(),
                title: c.display_name().to_owned(),
            })
            .collect();
        let meta = ResultSetMeta {
            columns,
            time_taken: projection_started.elapsed(),
        };
        ResultSet::new(rows, Some(meta))
    };

    Ok(QueryPerformed {
        pretty_print: query.to_string(),
        result_set,
        time_taken,
    })
}

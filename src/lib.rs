mod compile;
mod evaluate;
mod parse;
mod storage;
mod types;

pub use compile::compile;
pub use evaluate::{evaluate, EngineConfig, ScriptEngine};
pub use storage::{
    IndexingTarget, MemoryStorage, PropertyExaminer, StorageContext, StorageEntry, StorageError,
    StorageIndex,
};
pub use types::{
    boolean, json, number, string, Assertion, BoolAssertion, CellKind, ColumnDescriptor,
    ColumnSpec, CompileResult, ConditionElement, ConditionNode, ConditionTree, DataCell,
    IndexInstruction, IndexingPerformed, Instruction, InstructionResult, JsonAssertion, Literal,
    Num, NumAssertion, OpKind, Predicate, PropertyDiscovery, QueryInstruction,
    QueryInstructionBuilder, QueryPerformed, QueryResultRow, Relation, ResultSet, ResultSetMeta,
    ScriptError, ScriptResult, StrAssertion, ValueKind,
};

//! The data model: values, discoveries, predicates, assertions, conditions,
//! instructions and results.

pub mod assertion;
pub mod condition;
pub mod discovery;
pub mod error;
pub mod instruction;
pub mod predicate;
pub mod result;
pub mod value;

pub use assertion::{
    boolean, json, number, string, Assertion, BoolAssertion, JsonAssertion, NumAssertion,
    OpKind, StrAssertion, ValueKind,
};
pub use condition::{ConditionElement, ConditionNode, ConditionTree, Relation};
pub use discovery::PropertyDiscovery;
pub use error::{CompileResult, ScriptError, ScriptResult};
pub use instruction::{
    ColumnSpec, IndexInstruction, Instruction, QueryInstruction, QueryInstructionBuilder,
};
pub use result::{
    CellKind, ColumnDescriptor, DataCell, IndexingPerformed, InstructionResult, QueryPerformed,
    QueryResultRow, ResultSet, ResultSetMeta,
};
pub use predicate::Predicate;
pub use value::{Literal, Num};

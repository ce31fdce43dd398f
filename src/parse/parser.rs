use crate::types::{ColumnSpec, ConditionTree};

/// A parsed script: instruction blocks in source order, not yet folded into
/// immutable instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScript {
    pub blocks: Vec<InstructionBlock>,
}

/// One top-level block.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionBlock {
    Query(Vec<QueryClause>),
    Index(Vec<IndexClause>),
}

/// One clause inside a `query` block, kept in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryClause {
    /// `a 'Type'` / `an 'Type'`
    Single(String),
    /// `every 'Type', ...`
    Every(Vec<String>),
    /// `from 'schema', ...`
    From(Vec<String>),
    /// `where { ... }`
    Where(ConditionTree),
    /// `limit N`
    Limit(u64),
    /// `show 'prop' as 'Title', ...`
    Show(Vec<ColumnSpec>),
}

/// One clause inside an `index` block.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexClause {
    Types(Vec<String>),
    Schemas(Vec<String>),
}

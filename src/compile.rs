//! Compilation from script text to immutable instructions.

use std::collections::BTreeSet;

use crate::parse::{self, IndexClause, InstructionBlock, QueryClause};
use crate::types::{
    CompileResult, IndexInstruction, Instruction, QueryInstruction, ScriptError,
};

/// Compile script text into instructions, in source order.
///
/// # Errors
///
/// Returns [`ScriptError::Compilation`] with the 1-based source position of
/// the first syntax problem.
pub fn compile(source: &str) -> CompileResult {
    let script = parse::parse(source).map_err(|e| ScriptError::Compilation {
        line: e.line(),
        column: e.column(),
        message: e.message().to_owned(),
    })?;
    Ok(script.blocks.into_iter().map(compile_block).collect())
}

fn compile_block(block: InstructionBlock) -> Instruction {
    match block {
        InstructionBlock::Query(clauses) => {
            let mut builder = QueryInstruction::builder();
            for clause in clauses {
                builder = match clause {
                    QueryClause::Single(type_name) => builder.single(type_name),
                    QueryClause::Every(type_names) => builder.every(type_names),
                    QueryClause::From(schemas) => {
                        schemas.into_iter().fold(builder, |b, s| b.from(s))
                    }
                    QueryClause::Where(tree) => builder.where_clause(tree),
                    QueryClause::Limit(limit) => builder.limit(limit),
                    QueryClause::Show(columns) => {
                        columns.into_iter().fold(builder, |b, c| b.column(c))
                    }
                };
            }
            Instruction::Query(builder.build())
        }
        InstructionBlock::Index(clauses) => {
            let mut types = BTreeSet::new();
            let mut schemas = BTreeSet::new();
            for clause in clauses {
                match clause {
                    IndexClause::Types(names) => types.extend(names),
                    IndexClause::Schemas(names) => schemas.extend(names),
                }
            }
            Instruction::Index(IndexInstruction::new(types, schemas))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_one(source: &str) -> Instruction {
        let mut instructions = compile(source).unwrap();
        assert_eq!(instructions.len(), 1);
        instructions.remove(0)
    }

    #[test]
    fn single_clause_pins_limit_through_compilation() {
        let Instruction::Query(q) = compile_one("query { a 'Foo' limit 10 }") else {
            panic!("expected query");
        };
        assert_eq!(q.limit(), 1);
    }

    #[test]
    fn clauses_fold_in_declaration_order() {
        // 'every' after 'a' unpins the limit, then 'limit' applies
        let Instruction::Query(q) = compile_one("query { a 'Foo' every 'Bar' limit 10 }") else {
            panic!("expected query");
        };
        assert_eq!(q.limit(), 10);
        assert_eq!(q.types().len(), 2);
    }

    #[test]
    fn later_where_replaces_earlier() {
        let Instruction::Query(q) = compile_one(
            "query { every 'F' where { str 'a' is '1' } where { str 'b' is '2' } }",
        ) else {
            panic!("expected query");
        };
        let tree = q.condition().unwrap();
        assert_eq!(tree.to_string(), "str 'b' is '2'");
    }

    #[test]
    fn from_clauses_accumulate() {
        let Instruction::Query(q) = compile_one("query { every 'F' from 's1' from 's2' }")
        else {
            panic!("expected query");
        };
        assert_eq!(q.schemas().len(), 2);
    }

    #[test]
    fn index_block_compiles_explicit() {
        let Instruction::Index(idx) = compile_one("index { types 'Foo' schemas 'baz' }") else {
            panic!("expected index");
        };
        assert!(!idx.is_implicit());
        assert!(idx.types().contains("Foo"));
        assert!(idx.schemas().contains("baz"));
    }

    #[test]
    fn bare_index_targets_everything() {
        let Instruction::Index(idx) = compile_one("index { }") else {
            panic!("expected index");
        };
        assert!(idx.types().is_empty());
        assert!(idx.schemas().is_empty());
    }

    #[test]
    fn syntax_error_carries_position() {
        let err = compile("query {\n  limit -3\n}").unwrap_err();
        match err {
            ScriptError::Compilation { line, column, .. } => {
                assert_eq!(line, 2);
                assert!(column > 1);
            }
            other => panic!("expected compilation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_script_compiles_to_nothing() {
        assert!(compile("").unwrap().is_empty());
        assert!(compile("  # only a comment\n").unwrap().is_empty());
    }
}

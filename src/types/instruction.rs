use std::collections::BTreeSet;
use std::fmt;

use super::condition::ConditionTree;
use super::value::quote;

/// A column selected by a `show` clause, optionally retitled with `as`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    prop: String,
    title: Option<String>,
}

impl ColumnSpec {
    #[must_use]
    pub fn new(prop: impl Into<String>, title: Option<String>) -> Self {
        Self {
            prop: prop.into(),
            title,
        }
    }

    /// The property path projected into this column.
    #[must_use]
    pub fn prop(&self) -> &str {
        &self.prop
    }

    /// The `as` title, if one was given.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The column heading: the `as` title if given, the property otherwise.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.prop)
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.prop))?;
        if let Some(title) = &self.title {
            write!(f, " as {}", quote(title))?;
        }
        Ok(())
    }
}

/// One unit of compiled work.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Query(QueryInstruction),
    Index(IndexInstruction),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Query(q) => write!(f, "{q}"),
            Instruction::Index(i) => write!(f, "{i}"),
        }
    }
}

/// An immutable, fully resolved query. Built through
/// [`QueryInstructionBuilder`]; scripts compile into one of these per
/// `query` block.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryInstruction {
    types: BTreeSet<String>,
    schemas: BTreeSet<String>,
    condition: Option<ConditionTree>,
    limit: i64,
    columns: Vec<ColumnSpec>,
}

impl QueryInstruction {
    #[must_use]
    pub fn builder() -> QueryInstructionBuilder {
        QueryInstructionBuilder::default()
    }

    /// The entry types this query targets. Empty means every type.
    #[must_use]
    pub fn types(&self) -> &BTreeSet<String> {
        &self.types
    }

    /// The schemas this query targets. Empty means every schema.
    #[must_use]
    pub fn schemas(&self) -> &BTreeSet<String> {
        &self.schemas
    }

    #[must_use]
    pub fn condition(&self) -> Option<&ConditionTree> {
        self.condition.as_ref()
    }

    /// The match cap. Zero or negative means unlimited.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    #[must_use]
    pub fn selects_type(&self, type_name: &str) -> bool {
        self.types.is_empty() || self.types.contains(type_name)
    }

    #[must_use]
    pub fn selects_schema(&self, schema: &str) -> bool {
        self.schemas.is_empty() || self.schemas.contains(schema)
    }
}

impl fmt::Display for QueryInstruction {
    /// Single-line script rendering that compiles back to an equal query.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query {{")?;
        if !self.types.is_empty() {
            let quoted: Vec<String> = self.types.iter().map(|t| quote(t)).collect();
            write!(f, " every {}", quoted.join(", "))?;
        }
        if !self.schemas.is_empty() {
            let quoted: Vec<String> = self.schemas.iter().map(|s| quote(s)).collect();
            write!(f, " from {}", quoted.join(", "))?;
        }
        match &self.condition {
            Some(condition) if !condition.is_empty() => {
                write!(f, " where {{ {condition} }}")?;
            }
            _ => {}
        }
        if self.limit >= 0 {
            write!(f, " limit {}", self.limit)?;
        }
        if !self.columns.is_empty() {
            let rendered: Vec<String> =
                self.columns.iter().map(ToString::to_string).collect();
            write!(f, " show {}", rendered.join(", "))?;
        }
        write!(f, " }}")
    }
}

/// Accumulates query clauses in declaration order.
///
/// `single` pins the limit to one and later `limit` clauses cannot unpin it;
/// `every` resets the limit to unlimited.
#[derive(Debug, Clone, Default)]
pub struct QueryInstructionBuilder {
    types: BTreeSet<String>,
    schemas: BTreeSet<String>,
    condition: Option<ConditionTree>,
    limit: Option<i64>,
    columns: Vec<ColumnSpec>,
}

impl QueryInstructionBuilder {
    /// Target one entry of the given type (the `a` / `an` clause).
    #[must_use]
    pub fn single(mut self, type_name: impl Into<String>) -> Self {
        self.types.insert(type_name.into());
        self.limit = Some(1);
        self
    }

    /// Target all entries of the given types (the `every` clause).
    #[must_use]
    pub fn every<I, S>(mut self, type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.extend(type_names.into_iter().map(Into::into));
        self.limit = Some(-1);
        self
    }

    /// Restrict to a schema (the `from` clause). Cumulative.
    #[must_use]
    pub fn from(mut self, schema: impl Into<String>) -> Self {
        self.schemas.insert(schema.into());
        self
    }

    /// Set the filter condition, replacing any earlier one.
    #[must_use]
    pub fn where_clause(mut self, condition: ConditionTree) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Cap the number of matches. Ignored when the limit is pinned to one
    /// by a preceding `single`. Zero means unlimited.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn limit(mut self, limit: u64) -> Self {
        if self.limit != Some(1) {
            self.limit = Some(limit as i64);
        }
        self
    }

    /// Project a column (the `show` clause). Cumulative.
    #[must_use]
    pub fn show(self, prop: impl Into<String>, title: Option<String>) -> Self {
        self.column(ColumnSpec::new(prop, title))
    }

    /// Project an already built column.
    #[must_use]
    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn build(self) -> QueryInstruction {
        QueryInstruction {
            types: self.types,
            schemas: self.schemas,
            condition: self.condition,
            limit: self.limit.unwrap_or(-1),
            columns: self.columns,
        }
    }
}

/// An explicit or implicit request to refresh the storage index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInstruction {
    types: BTreeSet<String>,
    schemas: BTreeSet<String>,
    implicit: bool,
}

impl IndexInstruction {
    /// An explicit `index` block over the given targets. Empty sets mean
    /// everything.
    #[must_use]
    pub fn new(types: BTreeSet<String>, schemas: BTreeSet<String>) -> Self {
        Self {
            types,
            schemas,
            implicit: false,
        }
    }

    /// An indexing pass the engine inserted on its own before a query.
    #[must_use]
    pub fn implicit(types: BTreeSet<String>, schemas: BTreeSet<String>) -> Self {
        Self {
            types,
            schemas,
            implicit: true,
        }
    }

    #[must_use]
    pub fn types(&self) -> &BTreeSet<String> {
        &self.types
    }

    #[must_use]
    pub fn schemas(&self) -> &BTreeSet<String> {
        &self.schemas
    }

    #[must_use]
    pub fn is_implicit(&self) -> bool {
        self.implicit
    }
}

impl fmt::Display for IndexInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index {{")?;
        if !self.types.is_empty() {
            let quoted: Vec<String> = self.types.iter().map(|t| quote(t)).collect();
            write!(f, " types {}", quoted.join(", "))?;
        }
        if !self.schemas.is_empty() {
            let quoted: Vec<String> = self.schemas.iter().map(|s| quote(s)).collect();
            write!(f, " schemas {}", quoted.join(", "))?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::assertion::string;

    #[test]
    fn single_pins_limit() {
        let q = QueryInstruction::builder().single("Foo").build();
        assert_eq!(q.limit(), 1);
        assert!(q.types().contains("Foo"));
    }

    #[test]
    fn limit_after_single_is_ignored() {
        let q = QueryInstruction::builder().single("Foo").limit(10).build();
        assert_eq!(q.limit(), 1);
    }

    #[test]
    fn every_resets_limit() {
        let q = QueryInstruction::builder()
            .single("Foo")
            .every(["Bar"])
            .build();
        assert_eq!(q.limit(), -1);
        assert!(q.types().contains("Foo"));
        assert!(q.types().contains("Bar"));
    }

    #[test]
    fn limit_applies_after_every() {
        let q = QueryInstruction::builder()
            .every(["Foo"])
            .limit(5)
            .build();
        assert_eq!(q.limit(), 5);
    }

    #[test]
    fn limit_zero_means_unlimited() {
        let q = QueryInstruction::builder().every(["Foo"]).limit(0).build();
        assert_eq!(q.limit(), 0);
        assert!(q.limit() <= 0);
    }

    #[test]
    fn empty_selectors_match_everything() {
        let q = QueryInstruction::builder().build();
        assert!(q.selects_type("Anything"));
        assert!(q.selects_schema("any.schema"));
    }

    #[test]
    fn populated_selectors_are_exact() {
        let q = QueryInstruction::builder()
            .every(["Foo"])
            .from("my.schema")
            .build();
        assert!(q.selects_type("Foo"));
        assert!(!q.selects_type("Bar"));
        assert!(q.selects_schema("my.schema"));
        assert!(!q.selects_schema("other"));
    }

    #[test]
    fn display_renders_clauses_in_order() {
        let q = QueryInstruction::builder()
            .every(["Foo"])
            .from("baz")
            .where_clause(ConditionTree::new().or(string("name").is(Some("John"))))
            .limit(3)
            .show("name", Some("Name".into()))
            .show("age", None)
            .build();
        assert_eq!(
            q.to_string(),
            "query { every 'Foo' from 'baz' where { str 'name' is 'John' } \
             limit 3 show 'name' as 'Name', 'age' }"
        );
    }

    #[test]
    fn display_omits_absent_clauses() {
        let q = QueryInstruction::builder().every(["Foo"]).build();
        assert_eq!(q.to_string(), "query { every 'Foo' }");
    }

    #[test]
    fn index_display() {
        let idx = IndexInstruction::new(
            ["Foo".to_owned(), "Bar".to_owned()].into(),
            ["s1".to_owned()].into(),
        );
        assert_eq!(idx.to_string(), "index { types 'Bar', 'Foo' schemas 's1' }");
        assert!(!idx.is_implicit());
    }

    #[test]
    fn column_display_name_prefers_title() {
        assert_eq!(
            ColumnSpec::new("name", Some("Name".into())).display_name(),
            "Name"
        );
        assert_eq!(ColumnSpec::new("name", None).display_name(), "name");
    }
}

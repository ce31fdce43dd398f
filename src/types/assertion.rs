use std::fmt;

use serde_json::Value as Json;

use super::discovery::PropertyDiscovery;
use super::predicate::Predicate;
use super::value::{quote, Literal, Num};

/// The declared value type of an assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Num,
    Bool,
    Json,
}

impl ValueKind {
    /// The script keyword introducing an assertion of this kind.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            ValueKind::Str => "str",
            ValueKind::Num => "num",
            ValueKind::Bool => "bool",
            ValueKind::Json => "json",
        }
    }
}

/// The operator of an assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Is,
    Not,
    Contains,
    StartsWith,
    EndsWith,
    In,
    Overlaps,
    IsEmpty,
    IsPresent,
}

impl OpKind {
    /// The operator symbol shown to users.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            OpKind::Is | OpKind::IsEmpty | OpKind::IsPresent => "is",
            OpKind::Not => "not",
            OpKind::Contains => "contains",
            OpKind::StartsWith => "starts_with",
            OpKind::EndsWith => "ends_with",
            OpKind::In => "in",
            OpKind::Overlaps => "overlaps",
        }
    }

    /// The script token that compiles to this operator.
    #[must_use]
    pub fn script_token(self) -> &'static str {
        match self {
            OpKind::IsEmpty => "is_empty",
            OpKind::IsPresent => "is_present",
            other => other.symbol(),
        }
    }
}

/// One leaf condition: a property name, an operator, the expected value(s)
/// and the [`Predicate`] that implements the match.
///
/// Created once at compile time by the typed builders below and immutable
/// thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    prop: String,
    kind: ValueKind,
    op: OpKind,
    args: Vec<Literal>,
    predicate: Predicate,
}

impl Assertion {
    fn new(
        prop: String,
        kind: ValueKind,
        op: OpKind,
        args: Vec<Literal>,
        predicate: Predicate,
    ) -> Self {
        Self {
            prop,
            kind,
            op,
            args,
            predicate,
        }
    }

    /// The property path this assertion examines.
    #[must_use]
    pub fn prop(&self) -> &str {
        &self.prop
    }

    /// The declared value kind.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// The operator symbol, for display.
    #[must_use]
    pub fn op(&self) -> &'static str {
        self.op.symbol()
    }

    /// A human-readable rendering of the expected value.
    #[must_use]
    pub fn display_value(&self) -> String {
        match self.op {
            OpKind::IsEmpty => "empty".to_owned(),
            OpKind::IsPresent => "present".to_owned(),
            OpKind::In if self.args.is_empty() => "{{ EMPTY SET }}".to_owned(),
            OpKind::In => {
                let inner: Vec<String> = self.args.iter().map(Literal::raw).collect();
                format!("( {} )", inner.join(", "))
            }
            _ => self.args.first().map(Literal::raw).unwrap_or_default(),
        }
    }

    /// The predicate implementing this assertion.
    #[must_use]
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Test a discovery outcome against this assertion.
    #[must_use]
    pub fn check(&self, discovered: &PropertyDiscovery) -> bool {
        self.predicate.test(discovered)
    }
}

impl fmt::Display for Assertion {
    /// Script-syntax rendering, suitable for re-compilation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.keyword(), quote(&self.prop))?;
        match self.op {
            OpKind::IsEmpty | OpKind::IsPresent => write!(f, " {}", self.op.script_token()),
            OpKind::In => {
                let inner: Vec<String> = self.args.iter().map(ToString::to_string).collect();
                write!(f, " in ({})", inner.join(", "))
            }
            _ => match self.args.first() {
                Some(arg) => write!(f, " {} {arg}", self.op.script_token()),
                None => write!(f, " {}", self.op.script_token()),
            },
        }
    }
}

/// Fold per-value equality predicates into an `in` clause predicate.
fn any_of(predicates: Vec<Predicate>) -> Predicate {
    if predicates.is_empty() {
        Predicate::Never
    } else {
        Predicate::AnyOf(predicates)
    }
}

/// Begin a string-typed assertion on the given property.
#[must_use]
pub fn string(prop: impl Into<String>) -> StrAssertion {
    StrAssertion { prop: prop.into() }
}

/// Begin a number-typed assertion on the given property.
#[must_use]
pub fn number(prop: impl Into<String>) -> NumAssertion {
    NumAssertion { prop: prop.into() }
}

/// Begin a boolean-typed assertion on the given property.
#[must_use]
pub fn boolean(prop: impl Into<String>) -> BoolAssertion {
    BoolAssertion { prop: prop.into() }
}

/// Begin a structured-object assertion on the given property.
#[must_use]
pub fn json(prop: impl Into<String>) -> JsonAssertion {
    JsonAssertion { prop: prop.into() }
}

/// Builder for string assertions. `None` stands for the script's `null`.
#[derive(Debug, Clone)]
pub struct StrAssertion {
    prop: String,
}

impl StrAssertion {
    fn equality(value: Option<&str>) -> (Literal, Predicate) {
        match value {
            None => (Literal::Null, Predicate::IsNull),
            Some(s) => (Literal::Str(s.to_owned()), Predicate::StrEq(s.to_owned())),
        }
    }

    #[must_use]
    pub fn is(self, value: Option<&str>) -> Assertion {
        let (lit, p) = Self::equality(value);
        Assertion::new(self.prop, ValueKind::Str, OpKind::Is, vec![lit], p)
    }

    #[must_use]
    pub fn not(self, value: Option<&str>) -> Assertion {
        let (lit, p) = Self::equality(value);
        Assertion::new(
            self.prop,
            ValueKind::Str,
            OpKind::Not,
            vec![lit],
            Predicate::Not(Box::new(p)),
        )
    }

    /// Substring match. A null argument is unrepresentable here by design;
    /// the grammar rejects `contains null` at compile time.
    #[must_use]
    pub fn contains(self, value: impl Into<String>) -> Assertion {
        let value = value.into();
        Assertion::new(
            self.prop,
            ValueKind::Str,
            OpKind::Contains,
            vec![Literal::Str(value.clone())],
            Predicate::StrContains(value),
        )
    }

    #[must_use]
    pub fn starts_with(self, value: impl Into<String>) -> Assertion {
        let value = value.into();
        Assertion::new(
            self.prop,
            ValueKind::Str,
            OpKind::StartsWith,
            vec![Literal::Str(value.clone())],
            Predicate::StrStartsWith(value),
        )
    }

    #[must_use]
    pub fn ends_with(self, value: impl Into<String>) -> Assertion {
        let value = value.into();
        Assertion::new(
            self.prop,
            ValueKind::Str,
            OpKind::EndsWith,
            vec![Literal::Str(value.clone())],
            Predicate::StrEndsWith(value),
        )
    }

    /// Membership: true when the discovered string equals any listed value,
    /// with the same null handling as `is`.
    #[must_use]
    pub fn is_in(self, values: &[Option<&str>]) -> Assertion {
        let (args, predicates): (Vec<_>, Vec<_>) =
            values.iter().map(|v| Self::equality(*v)).unzip();
        Assertion::new(
            self.prop,
            ValueKind::Str,
            OpKind::In,
            args,
            any_of(predicates),
        )
    }

    #[must_use]
    pub fn is_empty(self) -> Assertion {
        Assertion::new(
            self.prop,
            ValueKind::Str,
            OpKind::IsEmpty,
            Vec::new(),
            Predicate::IsEmpty,
        )
    }

    #[must_use]
    pub fn is_present(self) -> Assertion {
        Assertion::new(
            self.prop,
            ValueKind::Str,
            OpKind::IsPresent,
            Vec::new(),
            Predicate::IsPresent,
        )
    }
}

/// Builder for numeric assertions.
#[derive(Debug, Clone)]
pub struct NumAssertion {
    prop: String,
}

impl NumAssertion {
    fn equality(value: Option<Num>) -> (Literal, Predicate) {
        match value {
            None => (Literal::Null, Predicate::IsNull),
            Some(n) => (Literal::Num(n), Predicate::NumEq(n)),
        }
    }

    #[must_use]
    pub fn is(self, value: Option<impl Into<Num>>) -> Assertion {
        let (lit, p) = Self::equality(value.map(Into::into));
        Assertion::new(self.prop, ValueKind::Num, OpKind::Is, vec![lit], p)
    }

    #[must_use]
    pub fn not(self, value: Option<impl Into<Num>>) -> Assertion {
        let (lit, p) = Self::equality(value.map(Into::into));
        Assertion::new(
            self.prop,
            ValueKind::Num,
            OpKind::Not,
            vec![lit],
            Predicate::Not(Box::new(p)),
        )
    }

    #[must_use]
    pub fn is_in(self, values: &[Option<Num>]) -> Assertion {
        let (args, predicates): (Vec<_>, Vec<_>) =
            values.iter().map(|v| Self::equality(*v)).unzip();
        Assertion::new(
            self.prop,
            ValueKind::Num,
            OpKind::In,
            args,
            any_of(predicates),
        )
    }

    #[must_use]
    pub fn is_empty(self) -> Assertion {
        Assertion::new(
            self.prop,
            ValueKind::Num,
            OpKind::IsEmpty,
            Vec::new(),
            Predicate::IsEmpty,
        )
    }

    #[must_use]
    pub fn is_present(self) -> Assertion {
        Assertion::new(
            self.prop,
            ValueKind::Num,
            OpKind::IsPresent,
            Vec::new(),
            Predicate::IsPresent,
        )
    }
}

/// Builder for boolean assertions.
#[derive(Debug, Clone)]
pub struct BoolAssertion {
    prop: String,
}

impl BoolAssertion {
    fn equality(value: Option<bool>) -> (Literal, Predicate) {
        match value {
            None => (Literal::Null, Predicate::IsNull),
            Some(b) => (Literal::Bool(b), Predicate::BoolEq(b)),
        }
    }

    #[must_use]
    pub fn is(self, value: Option<bool>) -> Assertion {
        let (lit, p) = Self::equality(value);
        Assertion::new(self.prop, ValueKind::Bool, OpKind::Is, vec![lit], p)
    }

    #[must_use]
    pub fn not(self, value: Option<bool>) -> Assertion {
        let (lit, p) = Self::equality(value);
        Assertion::new(
            self.prop,
            ValueKind::Bool,
            OpKind::Not,
            vec![lit],
            Predicate::Not(Box::new(p)),
        )
    }

    #[must_use]
    pub fn is_in(self, values: &[Option<bool>]) -> Assertion {
        let (args, predicates): (Vec<_>, Vec<_>) =
            values.iter().map(|v| Self::equality(*v)).unzip();
        Assertion::new(
            self.prop,
            ValueKind::Bool,
            OpKind::In,
            args,
            any_of(predicates),
        )
    }

    #[must_use]
    pub fn is_empty(self) -> Assertion {
        Assertion::new(
            self.prop,
            ValueKind::Bool,
            OpKind::IsEmpty,
            Vec::new(),
            Predicate::IsEmpty,
        )
    }

    #[must_use]
    pub fn is_present(self) -> Assertion {
        Assertion::new(
            self.prop,
            ValueKind::Bool,
            OpKind::IsPresent,
            Vec::new(),
            Predicate::IsPresent,
        )
    }
}

/// Builder for structured-object assertions.
#[derive(Debug, Clone)]
pub struct JsonAssertion {
    prop: String,
}

impl JsonAssertion {
    #[must_use]
    pub fn is(self, value: serde_json::Map<String, Json>) -> Assertion {
        Assertion::new(
            self.prop,
            ValueKind::Json,
            OpKind::Is,
            vec![Literal::Json(value.clone())],
            Predicate::JsonEq(value),
        )
    }

    #[must_use]
    pub fn not(self, value: serde_json::Map<String, Json>) -> Assertion {
        Assertion::new(
            self.prop,
            ValueKind::Json,
            OpKind::Not,
            vec![Literal::Json(value.clone())],
            Predicate::Not(Box::new(Predicate::JsonEq(value))),
        )
    }

    /// Existential overlap: at least one key present in both the expected
    /// and the discovered map holds an equal value. Use when intersection
    /// semantics are wanted instead of a full match.
    #[must_use]
    pub fn overlaps(self, value: serde_json::Map<String, Json>) -> Assertion {
        Assertion::new(
            self.prop,
            ValueKind::Json,
            OpKind::Overlaps,
            vec![Literal::Json(value.clone())],
            Predicate::JsonOverlaps(value),
        )
    }

    #[must_use]
    pub fn is_empty(self) -> Assertion {
        Assertion::new(
            self.prop,
            ValueKind::Json,
            OpKind::IsEmpty,
            Vec::new(),
            Predicate::IsEmpty,
        )
    }

    #[must_use]
    pub fn is_present(self) -> Assertion {
        Assertion::new(
            self.prop,
            ValueKind::Json,
            OpKind::IsPresent,
            Vec::new(),
            Predicate::IsPresent,
        )
    }
}

use serde_json::Value as Json;

use super::discovery::PropertyDiscovery;
use super::value::Num;

/// The matching logic of one assertion, as a closed variant type.
///
/// Every operator the typed assertion builders expose compiles down to one
/// of these; evaluation is a single exhaustive match with no dynamic
/// dispatch. "No match" is always `false`, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches nothing (e.g. `in ()` over an empty set).
    Never,
    /// Matches only an explicitly null property value.
    IsNull,
    StrEq(String),
    StrContains(String),
    StrStartsWith(String),
    StrEndsWith(String),
    BoolEq(bool),
    NumEq(Num),
    JsonEq(serde_json::Map<String, Json>),
    JsonOverlaps(serde_json::Map<String, Json>),
    /// Matches when the property is absent or explicitly null.
    IsEmpty,
    /// Matches when discovery produced a value of any type.
    IsPresent,
    /// Matches when any inner predicate matches (`in` clauses).
    AnyOf(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Test a property discovery outcome against this predicate.
    #[must_use]
    pub fn test(&self, discovered: &PropertyDiscovery) -> bool {
        match self {
            Predicate::Never => false,
            Predicate::IsNull => matches!(discovered, PropertyDiscovery::NoValue),
            Predicate::StrEq(expected) => {
                matches!(discovered, PropertyDiscovery::StringFound(s) if s == expected)
            }
            Predicate::StrContains(expected) => {
                matches!(discovered, PropertyDiscovery::StringFound(s) if s.contains(expected))
            }
            Predicate::StrStartsWith(expected) => {
                matches!(discovered, PropertyDiscovery::StringFound(s) if s.starts_with(expected))
            }
            Predicate::StrEndsWith(expected) => {
                matches!(discovered, PropertyDiscovery::StringFound(s) if s.ends_with(expected))
            }
            Predicate::BoolEq(expected) => {
                matches!(discovered, PropertyDiscovery::BooleanFound(b) if b == expected)
            }
            Predicate::NumEq(expected) => match discovered {
                PropertyDiscovery::NumberFound(n) => Num::coerced_eq(*n, *expected),
                _ => false,
            },
            Predicate::JsonEq(expected) => match discovered {
                PropertyDiscovery::ComplexFound(actual) => json_eq(actual, expected),
                _ => false,
            },
            Predicate::JsonOverlaps(expected) => match discovered {
                PropertyDiscovery::ComplexFound(actual) => json_overlaps(actual, expected),
                _ => false,
            },
            Predicate::IsEmpty => !discovered.is_found(),
            Predicate::IsPresent => discovered.is_found(),
            Predicate::AnyOf(inner) => inner.iter().any(|p| p.test(discovered)),
            Predicate::Not(inner) => !inner.test(discovered),
        }
    }
}

/// Deep map equality: size match, key superset, per-key equality.
fn json_eq(actual: &serde_json::Map<String, Json>, expected: &serde_json::Map<String, Json>) -> bool {
    actual.len() == expected.len()
        && expected
            .iter()
            .all(|(key, value)| actual.get(key) == Some(value))
}

/// Existential overlap: any key present in both maps holds an equal value.
fn json_overlaps(
    actual: &serde_json::Map<String, Json>,
    expected: &serde_json::Map<String, Json>,
) -> bool {
    expected
        .iter()
        .any(|(key, value)| actual.get(key) == Some(value))
}

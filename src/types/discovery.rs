use std::fmt;

use serde_json::Value as Json;

use super::value::Num;

/// The outcome of resolving a property path on a storage entry, supplied by
/// the external examiner collaborator.
///
/// `NoValue` and `NotFound` are distinct: the property exists but holds an
/// explicit null in the former, while the path cannot be resolved at all in
/// the latter. Only `NoValue` satisfies an expected-null assertion.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDiscovery {
    StringFound(String),
    NumberFound(Num),
    BooleanFound(bool),
    ComplexFound(serde_json::Map<String, Json>),
    NoValue,
    NotFound,
}

impl PropertyDiscovery {
    /// Whether discovery produced a value of any type.
    #[must_use]
    pub fn is_found(&self) -> bool {
        !matches!(
            self,
            PropertyDiscovery::NoValue | PropertyDiscovery::NotFound
        )
    }
}

impl fmt::Display for PropertyDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyDiscovery::StringFound(s) => write!(f, "\"{s}\""),
            PropertyDiscovery::NumberFound(n) => write!(f, "{n}"),
            PropertyDiscovery::BooleanFound(b) => write!(f, "{b}"),
            PropertyDiscovery::ComplexFound(map) => {
                write!(f, "{}", Json::Object(map.clone()))
            }
            PropertyDiscovery::NoValue => write!(f, "<<<NO VALUE>>>"),
            PropertyDiscovery::NotFound => write!(f, "<<<NOT FOUND>>>"),
        }
    }
}

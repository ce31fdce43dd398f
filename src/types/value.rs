use std::fmt;

use serde_json::Value as Json;

/// A numeric script value, either integral or floating-point.
///
/// Scripts may write `69` or `69.0`; discovery may likewise yield either
/// representation. Equality between the two is defined by
/// [`Num::coerced_eq`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
}

impl Num {
    /// The floating-point projection of this number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    /// The integral projection of this number. Floats truncate toward zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(self) -> i64 {
        match self {
            Num::Int(i) => i,
            Num::Float(f) => f as i64,
        }
    }

    /// Cross-representation numeric equality, driven by the discovered side.
    ///
    /// A floating-point discovered value compares via the floating
    /// projections (`total_cmp`, so NaN equals NaN); an integral discovered
    /// value compares via the integral projections. This makes
    /// `num 'x' is 69` match a discovered `69.0` and `num 'x' is 69.0`
    /// match a discovered `69`.
    #[must_use]
    pub fn coerced_eq(discovered: Num, expected: Num) -> bool {
        match discovered {
            Num::Float(f) => f.total_cmp(&expected.as_f64()).is_eq(),
            Num::Int(i) => i == expected.as_i64(),
        }
    }
}

impl From<i64> for Num {
    fn from(v: i64) -> Self {
        Num::Int(v)
    }
}

impl From<f64> for Num {
    fn from(v: f64) -> Self {
        Num::Float(v)
    }
}

impl fmt::Display for Num {
    /// Script-syntax rendering. Finite values re-parse to an equal number;
    /// non-finite floats have no script literal form, so an instruction
    /// holding one does not pretty-print to compilable text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Num::Int(i) => write!(f, "{i}"),
            // Keep a decimal point so the printed literal reparses as a float.
            Num::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Num::Float(v) => write!(f, "{v}"),
        }
    }
}

/// A literal value as written in script source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Num(Num),
    Bool(bool),
    Null,
    Json(serde_json::Map<String, Json>),
}

impl Literal {
    /// Human-readable rendering without script quoting, used for
    /// [`Assertion::display_value`](super::Assertion::display_value).
    #[must_use]
    pub fn raw(&self) -> String {
        match self {
            Literal::Str(s) => s.clone(),
            Literal::Num(n) => n.to_string(),
            Literal::Bool(b) => b.to_string(),
            Literal::Null => "null".to_owned(),
            Literal::Json(map) => json_script(&Json::Object(map.clone())),
        }
    }
}

impl fmt::Display for Literal {
    /// Script-syntax rendering, suitable for re-compilation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "{}", quote(s)),
            Literal::Num(n) => write!(f, "{n}"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Null => write!(f, "null"),
            Literal::Json(map) => write!(f, "{}", json_script(&Json::Object(map.clone()))),
        }
    }
}

/// Single-quote a string in script syntax, escaping as the grammar expects.
#[must_use]
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Render a JSON value in script object syntax (single-quoted strings).
#[must_use]
pub(crate) fn json_script(value: &Json) -> String {
    match value {
        Json::Null => "null".to_owned(),
        Json::Bool(b) => b.to_string(),
        Json::Number(n) => n.to_string(),
        Json::String(s) => quote(s),
        Json::Array(items) => {
            let inner: Vec<String> = items.iter().map(json_script).collect();
            format!("[{}]", inner.join(", "))
        }
        Json::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", quote(k), json_script(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

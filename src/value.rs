//! Dynamic values produced by transformation functions

use crate::error::FunctionError;
use crate::selection::Selection;

/// Result of a transformation function
#[derive(Debug, Clone)]
pub enum Value<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    TextList(Vec<String>),
    /// A node subset to keep mapping into instead of a leaf value
    Nodes(Selection<'a>),
}

impl Value<'_> {
    /// Name of the variant, used in cast errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::TextList(_) => "text list",
            Value::Nodes(_) => "nodes",
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::TextList(_))
    }

    /// Debug-style rendering of the value for error messages
    pub fn describe(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => format!("{:?}", s),
            Value::TextList(list) => format!("{:?}", list),
            Value::Nodes(nodes) => format!("<{} nodes>", nodes.len()),
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value<'_> {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value<'_> {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value<'_> {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value<'_> {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value<'_> {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value<'_> {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<String>> for Value<'_> {
    fn from(v: Vec<String>) -> Self {
        Value::TextList(v)
    }
}

impl<'a> From<Selection<'a>> for Value<'a> {
    fn from(v: Selection<'a>) -> Self {
        Value::Nodes(v)
    }
}

/// What a record method handed back
///
/// Built with [`IntoOutcome`] from the method's return value: a plain value,
/// a `Result`, or `()` for methods that produce nothing.
#[derive(Debug)]
pub enum Outcome<'a> {
    Returned(Value<'a>),
    Failed(FunctionError),
    /// The method returned no value at all
    Empty,
}

/// Conversion of a record method's return value into an [`Outcome`]
pub trait IntoOutcome<'a> {
    fn into_outcome(self) -> Outcome<'a>;
}

impl<'a> IntoOutcome<'a> for () {
    fn into_outcome(self) -> Outcome<'a> {
        Outcome::Empty
    }
}

impl<'a> IntoOutcome<'a> for Outcome<'a> {
    fn into_outcome(self) -> Outcome<'a> {
        self
    }
}

macro_rules! returned {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'a> IntoOutcome<'a> for $ty {
                fn into_outcome(self) -> Outcome<'a> {
                    Outcome::Returned(self.into())
                }
            }
        )*
    };
}

returned!(
    Value<'a>,
    Selection<'a>,
    bool,
    i64,
    i32,
    usize,
    f64,
    String,
    &str,
    Vec<String>,
);

impl<'a, T, E> IntoOutcome<'a> for Result<T, E>
where
    T: Into<Value<'a>>,
    E: Into<FunctionError>,
{
    fn into_outcome(self) -> Outcome<'a> {
        match self {
            Ok(v) => Outcome::Returned(v.into()),
            Err(e) => Outcome::Failed(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes() {
        assert!(matches!(().into_outcome(), Outcome::Empty));
        assert!(matches!(
            "x".into_outcome(),
            Outcome::Returned(Value::Text(s)) if s == "x"
        ));
        let failed: Result<String, FunctionError> = Err(FunctionError::msg("boom"));
        assert!(matches!(failed.into_outcome(), Outcome::Failed(_)));
        let parsed: Result<i64, std::num::ParseIntError> = "42".parse::<i64>();
        assert!(matches!(parsed.into_outcome(), Outcome::Returned(Value::Int(42))));
    }

    #[test]
    fn test_describe() {
        assert_eq!(Value::Text("a".into()).describe(), "\"a\"");
        assert_eq!(Value::TextList(vec!["a".into()]).type_name(), "text list");
    }
}

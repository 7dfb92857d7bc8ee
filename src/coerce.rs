//! Conversion of dynamic values into declared field types
//!
//! The `to_*` functions are strict: anything that cannot be converted
//! without loss is a [`CastError`]. [`settle`] applies the engine's cast
//! policy on top, replacing failures with the zero value in lenient mode.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Value;

/// Scalar kinds a value can be coerced into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    Int,
    Uint,
    Float,
    #[serde(alias = "text")]
    String,
    /// Assigned as-is
    Any,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Uint => "uint",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
            ScalarKind::Any => "any",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to cast {value} of type {source_type} to {target}")]
pub struct CastError {
    pub value: String,
    pub source_type: &'static str,
    pub target: String,
}

impl CastError {
    pub fn new(value: &Value<'_>, target: impl fmt::Display) -> Self {
        Self {
            value: value.describe(),
            source_type: value.type_name(),
            target: target.to_string(),
        }
    }
}

/// Apply the cast policy: strict keeps the error, lenient yields the zero value
pub fn settle<T: Default>(result: Result<T, CastError>, strict: bool) -> Result<T, CastError> {
    match result {
        Ok(v) => Ok(v),
        Err(e) if strict => Err(e),
        Err(e) => {
            tracing::debug!(error = %e, "lenient cast, using zero value");
            Ok(T::default())
        }
    }
}

pub fn to_bool(value: &Value<'_>) -> Result<bool, CastError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        Value::Float(f) => Ok(*f != 0.0),
        Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Ok(true),
            "false" | "f" | "0" => Ok(false),
            _ => Err(CastError::new(value, ScalarKind::Bool)),
        },
        _ => Err(CastError::new(value, ScalarKind::Bool)),
    }
}

pub fn to_i64(value: &Value<'_>) -> Result<i64, CastError> {
    let fail = || CastError::new(value, ScalarKind::Int);
    match value {
        Value::Bool(b) => Ok(*b as i64),
        Value::Int(i) => Ok(*i),
        Value::Float(f) => whole(*f, i64::MIN as f64, i64::MAX as f64)
            .map(|f| f as i64)
            .ok_or_else(fail),
        Value::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    let f = s.parse::<f64>().ok()?;
                    whole(f, i64::MIN as f64, i64::MAX as f64).map(|f| f as i64)
                })
                .ok_or_else(fail)
        }
        _ => Err(fail()),
    }
}

pub fn to_u64(value: &Value<'_>) -> Result<u64, CastError> {
    let fail = || CastError::new(value, ScalarKind::Uint);
    match value {
        Value::Bool(b) => Ok(*b as u64),
        Value::Int(i) => u64::try_from(*i).map_err(|_| fail()),
        Value::Float(f) => whole(*f, 0.0, u64::MAX as f64)
            .map(|f| f as u64)
            .ok_or_else(fail),
        Value::Text(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| {
                    let f = s.parse::<f64>().ok()?;
                    whole(f, 0.0, u64::MAX as f64).map(|f| f as u64)
                })
                .ok_or_else(fail)
        }
        _ => Err(fail()),
    }
}

pub fn to_f64(value: &Value<'_>) -> Result<f64, CastError> {
    match value {
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| CastError::new(value, ScalarKind::Float)),
        _ => Err(CastError::new(value, ScalarKind::Float)),
    }
}

pub fn to_text(value: &Value<'_>) -> Result<String, CastError> {
    match value {
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Text(s) => Ok(s.clone()),
        _ => Err(CastError::new(value, ScalarKind::String)),
    }
}

/// Opaque conversion, never fails
pub fn to_json(value: &Value<'_>) -> serde_json::Value {
    match value {
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::TextList(list) => serde_json::Value::from(list.clone()),
        Value::Nodes(nodes) => nodes
            .each()
            .map(|node| serde_json::Value::String(node.outer_html()))
            .collect(),
    }
}

/// Coerce into a scalar kind, rendered as JSON
pub fn to_kind(value: &Value<'_>, kind: ScalarKind) -> Result<serde_json::Value, CastError> {
    Ok(match kind {
        ScalarKind::Bool => serde_json::Value::Bool(to_bool(value)?),
        ScalarKind::Int => serde_json::Value::from(to_i64(value)?),
        ScalarKind::Uint => serde_json::Value::from(to_u64(value)?),
        ScalarKind::Float => serde_json::Number::from_f64(to_f64(value)?)
            .map(serde_json::Value::Number)
            .ok_or_else(|| CastError::new(value, ScalarKind::Float))?,
        ScalarKind::String => serde_json::Value::String(to_text(value)?),
        ScalarKind::Any => to_json(value),
    })
}

/// Zero value of a scalar kind, rendered as JSON
pub fn zero_json(kind: ScalarKind) -> serde_json::Value {
    match kind {
        ScalarKind::Bool => serde_json::Value::Bool(false),
        ScalarKind::Int | ScalarKind::Uint => serde_json::Value::from(0),
        ScalarKind::Float => serde_json::Value::from(0.0),
        ScalarKind::String => serde_json::Value::String(String::new()),
        ScalarKind::Any => serde_json::Value::Null,
    }
}

/// Elements of a text list, each coerced with `convert`
pub fn to_list<T>(
    value: &Value<'_>,
    target: &str,
    convert: impl Fn(&Value<'_>) -> Result<T, CastError>,
) -> Result<Vec<T>, CastError> {
    match value {
        Value::TextList(list) => list
            .iter()
            .map(|item| convert(&Value::Text(item.clone())))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| CastError::new(value, format!("[{}]", target))),
        _ => Err(CastError::new(value, format!("[{}]", target))),
    }
}

fn whole(f: f64, min: f64, max: f64) -> Option<f64> {
    (f.is_finite() && f.fract() == 0.0 && f >= min && f < max).then_some(f)
}

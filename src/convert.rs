//! Preprocessing helpers
//!
//! Ready-made [`ValueFn`]s for the conversions wrapped tools need most:
//! command-line tokens arrive as strings, datasets as arbitrary JSON.
//!
//! ```text
//! .preproc("values", convert::list_of(Dtype::Float))
//! .preproc("names", convert::apply_all([convert::items_of("name", None), convert::sentence()]))
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::binding::parse_literal;
use crate::call::ValueFn;
use crate::error::{BindError, Result};
use crate::runtime::render;

/// Element type for [`list_of`] and [`tuple_of`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    Str,
    Int,
    Float,
    Bool,
    /// Strings parsed as literals, other values unchanged
    Literal,
}

impl Dtype {
    pub fn convert(self, value: Value) -> Result<Value> {
        let fail = |value: &Value| {
            BindError::invocation(format!("cannot convert {} to {:?}", value, self))
        };
        match self {
            Self::Str => Ok(Value::String(render(&value))),
            Self::Literal => Ok(match value {
                Value::String(s) => parse_literal(&s),
                other => other,
            }),
            Self::Int => match &value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value),
                Value::Number(n) => n
                    .as_f64()
                    .map(|f| Value::from(f.trunc() as i64))
                    .ok_or_else(|| fail(&value)),
                Value::Bool(b) => Ok(Value::from(i64::from(*b))),
                Value::String(s) => {
                    let s = s.trim();
                    s.parse::<i64>()
                        .map(Value::from)
                        .or_else(|_| s.parse::<f64>().map(|f| Value::from(f.trunc() as i64)))
                        .map_err(|_| fail(&value))
                }
                _ => Err(fail(&value)),
            },
            Self::Float => match &value {
                Value::Number(n) => n.as_f64().map(Value::from).ok_or_else(|| fail(&value)),
                Value::Bool(b) => Ok(Value::from(if *b { 1.0 } else { 0.0 })),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::from)
                    .map_err(|_| fail(&value)),
                _ => Err(fail(&value)),
            },
            Self::Bool => match &value {
                Value::Bool(_) => Ok(value),
                Value::Null => Ok(Value::Bool(false)),
                Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
                    "false" | "no" | "off" | "0" | "" => Ok(Value::Bool(false)),
                    _ => Err(fail(&value)),
                },
                Value::Array(a) => Ok(Value::Bool(!a.is_empty())),
                Value::Object(o) => Ok(Value::Bool(!o.is_empty())),
            },
        }
    }
}

/// Elements of a value: arrays as-is, strings split on commas and whitespace
fn elements(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::String(s) => Ok(s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(|t| Value::String(t.to_string()))
            .collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(BindError::invocation(format!(
            "expecting a sequence, got {}",
            other
        ))),
    }
}

/// Convert every element to `dtype`
pub fn list_of(dtype: Dtype) -> ValueFn {
    Arc::new(move |value| {
        elements(value)?
            .into_iter()
            .map(|v| dtype.convert(v))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    })
}

/// Same as [`list_of`]; values have no tuple type, so the result is an array
pub fn tuple_of(dtype: Dtype) -> ValueFn {
    list_of(dtype)
}

/// Join all elements with single spaces
pub fn sentence() -> ValueFn {
    Arc::new(|value| {
        let words: Vec<String> = elements(value)?.iter().map(render).collect();
        Ok(Value::String(words.join(" ")))
    })
}

/// Pick `key` from every element (object key or array index)
///
/// A missing key yields `default`, or fails when there is none.
pub fn items_of(key: impl Into<String>, default: Option<Value>) -> ValueFn {
    let key = key.into();
    Arc::new(move |value| {
        elements(value)?
            .into_iter()
            .map(|item| {
                let found = match &item {
                    Value::Object(map) => map.get(&key).cloned(),
                    Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
                    _ => None,
                };
                found.or_else(|| default.clone()).ok_or_else(|| {
                    BindError::invocation(format!("item '{}' not found in {}", key, item))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    })
}

/// Apply functions in order
pub fn apply_all(funcs: impl IntoIterator<Item = ValueFn>) -> ValueFn {
    let funcs: Vec<ValueFn> = funcs.into_iter().collect();
    Arc::new(move |value| funcs.iter().try_fold(value, |acc, f| f(acc)))
}

/// Parse strings as literals (`"[1, 2]"` → array), leave other values alone
pub fn literal() -> ValueFn {
    Arc::new(|value| Dtype::Literal.convert(value))
}

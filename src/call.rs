//! Call interface of a wrapped function
//!
//! Arguments are reconstructed from the resolved input data: fixed
//! parameters in declaration order, then the `*args` values, then keywords
//! (the `**kwargs` object plus every remaining input that is not a fixed
//! parameter).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{BindError, Result};
use crate::signature::Signature;

/// Wrapped function
pub type Callable = Arc<dyn Fn(&CallArgs) -> Result<Outcome> + Send + Sync>;

/// Value transformer used for preprocessing and element-wise postprocessing
pub type ValueFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Whole-result transformer
pub type OutcomeFn = Arc<dyn Fn(Outcome) -> Result<Outcome> + Send + Sync>;

/// Setup/teardown hook
pub type Hook = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Positional and keyword arguments for one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keywords: Map<String, Value>,
    names: Vec<String>,
}

impl CallArgs {
    /// Split resolved input data according to the signature
    pub fn from_indata(sig: &Signature, mut indata: BTreeMap<String, Value>) -> Result<Self> {
        let mut positional = Vec::with_capacity(sig.params().len());
        let mut names = Vec::with_capacity(sig.params().len());
        for param in sig.params() {
            let value = indata.remove(&param.name).ok_or_else(|| {
                BindError::invocation(format!("no value for parameter '{}'", param.name))
            })?;
            positional.push(value);
            names.push(param.name.clone());
        }

        if let Some(name) = sig.var_args_name() {
            match indata.remove(name) {
                Some(Value::Array(items)) => positional.extend(items),
                Some(Value::Null) | None => {}
                Some(other) => positional.push(other),
            }
        }

        let mut keywords = match sig.var_kwargs_name().and_then(|n| indata.remove(n)) {
            Some(Value::Object(map)) => map,
            Some(Value::String(s)) if !s.trim().is_empty() => match serde_json::from_str(&s)? {
                Value::Object(map) => map,
                other => {
                    return Err(BindError::invocation(format!(
                        "keyword arguments must be an object, got {}",
                        other
                    )))
                }
            },
            Some(Value::Null) | Some(Value::String(_)) | None => Map::new(),
            Some(other) => {
                return Err(BindError::invocation(format!(
                    "keyword arguments must be an object, got {}",
                    other
                )))
            }
        };
        keywords.retain(|k, _| !sig.is_param(k));
        keywords.extend(indata);

        Ok(Self {
            positional,
            keywords,
            names,
        })
    }

    /// Value of a fixed parameter or keyword by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.positional.get(i))
            .or_else(|| self.keywords.get(name))
    }

    /// Values beyond the fixed parameters (`*args`)
    pub fn var_args(&self) -> &[Value] {
        self.positional.get(self.names.len()..).unwrap_or(&[])
    }
}

/// Result of one invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    None,
    Single(Value),
    Tuple(Vec<Value>),
}

impl Outcome {
    /// Number of addressable result values (a non-tuple counts as one)
    pub fn len(&self) -> usize {
        match self {
            Outcome::Tuple(values) => values.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Result value at `index`; index 0 of a non-tuple is the value itself
    pub fn get(&self, index: usize) -> Result<Value> {
        let len = self.len();
        let value = match self {
            Outcome::Tuple(values) => values.get(index).cloned(),
            Outcome::Single(v) if index == 0 => Some(v.clone()),
            Outcome::None if index == 0 => Some(Value::Null),
            _ => None,
        };
        value.ok_or(BindError::ResultIndex { index, len })
    }

    /// Whole result as one value
    pub fn whole(&self) -> Value {
        match self {
            Outcome::None => Value::Null,
            Outcome::Single(v) => v.clone(),
            Outcome::Tuple(values) => Value::Array(values.clone()),
        }
    }
}

impl From<Value> for Outcome {
    fn from(v: Value) -> Self {
        Outcome::Single(v)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::None => write!(f, "null"),
            Outcome::Single(v) => write!(f, "{}", v),
            Outcome::Tuple(values) => {
                write!(f, "(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Postprocessing of the result
#[derive(Clone)]
pub enum Postproc {
    /// Applied to the whole result
    Whole(OutcomeFn),
    /// Applied element-wise to a tuple result; `None` passes the element through
    PerElement(Vec<Option<ValueFn>>),
}

impl fmt::Debug for Postproc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Postproc::Whole(_) => write!(f, "Whole(<fn>)"),
            Postproc::PerElement(fns) => {
                let shape: Vec<&str> = fns
                    .iter()
                    .map(|p| if p.is_some() { "<fn>" } else { "None" })
                    .collect();
                write!(f, "PerElement({:?})", shape)
            }
        }
    }
}

impl Postproc {
    pub fn apply(&self, outcome: Outcome) -> Result<Outcome> {
        match self {
            Postproc::Whole(f) => f(outcome),
            Postproc::PerElement(fns) => {
                let Outcome::Tuple(values) = outcome else {
                    return Err(BindError::invocation(
                        "element-wise postprocessors need a tuple result",
                    ));
                };
                let used = fns
                    .iter()
                    .rposition(Option::is_some)
                    .map_or(0, |last| last + 1);
                if used > values.len() {
                    return Err(BindError::invocation(format!(
                        "{} postprocessors for a result of length {}",
                        used,
                        values.len()
                    )));
                }
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| match fns.get(i).and_then(Option::as_ref) {
                        Some(f) => f(v),
                        None => Ok(v),
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Outcome::Tuple)
            }
        }
    }
}

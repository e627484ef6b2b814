//! Mapping tables - parameter → binding and output source → binding
//!
//! Overrides use a small mini-language given on the command line:
//! `name=expr[,name=expr...]`. On the output side an empty or `null`
//! expression deletes the entry.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};

use super::expr::{parse_binding, Binding, Scope};
use crate::error::{BindError, Result};

// ═══════════════════════════════════════════════════════════════
// INPUT MAPPING
// ═══════════════════════════════════════════════════════════════

/// Parameter name → binding
///
/// Tracks which entries were filled automatically for required parameters,
/// since those behave like plain positional arguments of a single call.
#[derive(Debug, Clone, Default)]
pub struct InputMapping {
    entries: FxHashMap<String, Binding>,
    auto_required: FxHashSet<String>,
}

impl InputMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from declared `name → expression` pairs
    pub fn parse<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut map = Self::new();
        for (name, expr) in pairs {
            map.insert(name, parse_binding(expr.as_ref())?);
        }
        Ok(map)
    }

    /// Insert a declared binding
    pub fn insert(&mut self, name: impl Into<String>, binding: Binding) {
        let name = name.into();
        self.auto_required.remove(&name);
        self.entries.insert(name, binding);
    }

    /// Insert a binding filled in for a required parameter
    pub(crate) fn insert_auto_required(&mut self, name: impl Into<String>, binding: Binding) {
        let name = name.into();
        self.auto_required.insert(name.clone());
        self.entries.insert(name, binding);
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Binding> {
        self.auto_required.remove(name);
        self.entries.remove(name)
    }

    pub fn is_auto_required(&self, name: &str) -> bool {
        self.auto_required.contains(name)
    }

    /// True if any Input-scope binding was filled in automatically
    pub fn has_auto_input(&self) -> bool {
        self.auto_required
            .iter()
            .filter_map(|name| self.entries.get(name))
            .any(|b| b.in_scope(Scope::Input))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a `name=expr[,name=expr...]` override string
    pub fn apply_overrides(&mut self, text: &str) -> Result<()> {
        for (name, expr) in parse_overrides(text)? {
            self.insert(name, parse_binding(expr)?);
        }
        Ok(())
    }

    /// Sorted `name → expression` object for display and logging
    pub fn to_value(&self) -> Value {
        let sorted: BTreeMap<_, _> = self.entries.iter().collect();
        Value::Object(
            sorted
                .into_iter()
                .map(|(k, b)| (k.clone(), binding_value(b)))
                .collect::<Map<_, _>>(),
        )
    }
}

// ═══════════════════════════════════════════════════════════════
// OUTPUT SOURCES
// ═══════════════════════════════════════════════════════════════

/// Where an output value is taken from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputSource {
    /// Element of the result tuple (index 0 is the whole result for scalars)
    Index(usize),
    /// The whole result
    All,
    /// Current timestamp
    Date,
    /// Invocation start timestamp
    DateStart,
    /// Seconds elapsed since invocation start
    Duration,
    /// Accumulated timing ledger
    Timings,
    /// Preprocessed value of an input parameter
    Input(String),
}

impl OutputSource {
    pub fn parse(s: &str) -> Self {
        if let Ok(i) = s.parse::<usize>() {
            return OutputSource::Index(i);
        }
        match s {
            "ALL" => OutputSource::All,
            "DATE" => OutputSource::Date,
            "DATE_START" => OutputSource::DateStart,
            "DURATION" => OutputSource::Duration,
            "TIMINGS" => OutputSource::Timings,
            name => OutputSource::Input(name.to_string()),
        }
    }
}

impl fmt::Display for OutputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSource::Index(i) => write!(f, "{}", i),
            OutputSource::All => write!(f, "ALL"),
            OutputSource::Date => write!(f, "DATE"),
            OutputSource::DateStart => write!(f, "DATE_START"),
            OutputSource::Duration => write!(f, "DURATION"),
            OutputSource::Timings => write!(f, "TIMINGS"),
            OutputSource::Input(name) => write!(f, "{}", name),
        }
    }
}

impl From<usize> for OutputSource {
    fn from(i: usize) -> Self {
        OutputSource::Index(i)
    }
}

impl From<&str> for OutputSource {
    fn from(s: &str) -> Self {
        OutputSource::parse(s)
    }
}

// ═══════════════════════════════════════════════════════════════
// OUTPUT MAPPING
// ═══════════════════════════════════════════════════════════════

/// Output source → binding
///
/// Sorted by source so grid writes and dataset writes happen in a stable order.
#[derive(Debug, Clone, Default)]
pub struct OutputMapping {
    entries: BTreeMap<OutputSource, Binding>,
}

impl OutputMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OutputSource>,
        V: AsRef<str>,
    {
        let mut map = Self::new();
        for (source, expr) in pairs {
            map.insert(source, parse_binding(expr.as_ref())?);
        }
        Ok(map)
    }

    pub fn insert(&mut self, source: impl Into<OutputSource>, binding: Binding) {
        self.entries.insert(source.into(), binding);
    }

    pub fn get(&self, source: &OutputSource) -> Option<&Binding> {
        self.entries.get(source)
    }

    pub fn remove(&mut self, source: &OutputSource) -> Option<Binding> {
        self.entries.remove(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutputSource, &Binding)> {
        self.entries.iter()
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a `source=expr[,source=expr...]` override string
    ///
    /// An empty or `null` expression removes the entry.
    pub fn apply_overrides(&mut self, text: &str) -> Result<()> {
        for (key, expr) in parse_overrides(text)? {
            let source = OutputSource::parse(key);
            let binding = parse_binding(expr)?;
            if expr.trim().is_empty() || binding.is_suppressed() {
                self.entries.remove(&source);
            } else {
                self.entries.insert(source, binding);
            }
        }
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, b)| (k.to_string(), binding_value(b)))
                .collect::<Map<_, _>>(),
        )
    }
}

fn binding_value(b: &Binding) -> Value {
    match b {
        Binding::Literal(v) => v.clone(),
        Binding::Arg(a) => Value::String(a.to_string()),
    }
}

/// Split `key=expr[,key=expr...]` into pairs
///
/// Each item must contain exactly one `=`.
pub fn parse_overrides(text: &str) -> Result<Vec<(&str, &str)>> {
    text.split(',')
        .filter(|item| !item.trim().is_empty())
        .map(|item| {
            if item.matches('=').count() != 1 {
                return Err(BindError::OverrideSyntax {
                    item: item.to_string(),
                });
            }
            let (key, expr) = item.split_once('=').unwrap_or((item, ""));
            let key = key.trim();
            if key.is_empty() {
                return Err(BindError::OverrideSyntax {
                    item: item.to_string(),
                });
            }
            Ok((key, expr.trim()))
        })
        .collect()
}

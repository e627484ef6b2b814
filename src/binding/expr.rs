//! Binding expressions - where a value comes from or goes to
//!
//! Grammar: `<symbol><index|@>[/<subpath>]`
//!
//! | Symbol | Scope  | Subpath meaning              |
//! |--------|--------|------------------------------|
//! | `$`    | Input  | dataset path inside the file |
//! | `%`    | Output | dataset path inside the file |
//! | `#`    | Stream | column number                |
//!
//! Anything not starting with a symbol is a literal: it is evaluated as a
//! JSON literal when possible (`3`, `1.5`, `[1, 2]`, `true`) and kept as the
//! raw string otherwise.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{BindError, Result};

/// Pattern for prefixed binding expressions
static BINDING_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([$%#])(\d+|@)(?:/(.*))?$").unwrap());

/// Positional slot family referenced by a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Input arguments (`$`)
    Input,
    /// Output arguments (`%`)
    Output,
    /// Standard input / standard output (`#`)
    Stream,
}

impl Scope {
    pub fn symbol(self) -> char {
        match self {
            Scope::Input => '$',
            Scope::Output => '%',
            Scope::Stream => '#',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '$' => Some(Scope::Input),
            '%' => Some(Scope::Output),
            '#' => Some(Scope::Stream),
            _ => None,
        }
    }

    /// Human readable name used in messages
    pub fn noun(self) -> &'static str {
        match self {
            Scope::Input => "input",
            Scope::Output => "output",
            Scope::Stream => "stream",
        }
    }
}

/// Which slot(s) of a scope are referenced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// A specific 0-based slot
    Index(usize),
    /// Every slot of the scope, as a sequence (`@`)
    All,
}

/// Reference to a positional command-line slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgRef {
    pub scope: Scope,
    pub slot: Slot,
    /// Dataset path (Input/Output) or column number (Stream)
    pub subpath: Option<String>,
}

impl ArgRef {
    pub fn new(scope: Scope, slot: Slot) -> Self {
        Self {
            scope,
            slot,
            subpath: None,
        }
    }

    pub fn with_subpath(mut self, subpath: impl Into<String>) -> Self {
        self.subpath = Some(subpath.into());
        self
    }

    pub fn index(&self) -> Option<usize> {
        match self.slot {
            Slot::Index(i) => Some(i),
            Slot::All => None,
        }
    }

    pub fn is_all(&self) -> bool {
        self.slot == Slot::All
    }

    pub fn has_subpath(&self) -> bool {
        self.subpath.is_some()
    }

    /// Column number of a stream binding (validated at parse time)
    pub fn column(&self) -> Option<usize> {
        match self.scope {
            Scope::Stream => self.subpath.as_deref().and_then(|s| s.parse().ok()),
            _ => None,
        }
    }
}

impl fmt::Display for ArgRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scope.symbol())?;
        match self.slot {
            Slot::Index(i) => write!(f, "{}", i)?,
            Slot::All => write!(f, "@")?,
        }
        if let Some(sub) = &self.subpath {
            write!(f, "/{}", sub)?;
        }
        Ok(())
    }
}

/// A parsed binding expression
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Constant value (a `null` literal on the output side suppresses the output)
    Literal(Value),
    /// Reference to an argument slot or the stream
    Arg(ArgRef),
}

impl Binding {
    pub fn arg(&self) -> Option<&ArgRef> {
        match self {
            Binding::Arg(a) => Some(a),
            Binding::Literal(_) => None,
        }
    }

    /// True if this binding references the given scope
    pub fn in_scope(&self, scope: Scope) -> bool {
        self.arg().is_some_and(|a| a.scope == scope)
    }

    /// True for `ArgRef{scope, ALL}` with or without subpath
    pub fn is_all_of(&self, scope: Scope) -> bool {
        self.arg().is_some_and(|a| a.scope == scope && a.is_all())
    }

    /// True for `ArgRef{scope, ALL, subpath}`
    pub fn is_all_with_subpath(&self, scope: Scope) -> bool {
        self.arg()
            .is_some_and(|a| a.scope == scope && a.is_all() && a.has_subpath())
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Binding::Literal(Value::Null))
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Literal(v) => write!(f, "{}", v),
            Binding::Arg(a) => write!(f, "{}", a),
        }
    }
}

impl From<ArgRef> for Binding {
    fn from(a: ArgRef) -> Self {
        Binding::Arg(a)
    }
}

/// Evaluate a literal: JSON when it parses, the raw string otherwise
pub fn parse_literal(s: &str) -> Value {
    serde_json::from_str(s.trim()).unwrap_or_else(|_| Value::String(s.to_string()))
}

/// Parse a mapping string into a binding
///
/// Strings starting with `$`, `%` or `#` must follow the grammar; anything
/// else becomes a [`Binding::Literal`].
pub fn parse_binding(s: &str) -> Result<Binding> {
    let Some(first) = s.chars().next() else {
        return Ok(Binding::Literal(Value::String(String::new())));
    };
    let Some(scope) = Scope::from_symbol(first) else {
        return Ok(Binding::Literal(parse_literal(s)));
    };

    let caps = BINDING_PATTERN
        .captures(s)
        .ok_or_else(|| BindError::syntax(s, "expecting a slot index or '@' after the symbol"))?;

    let slot = match &caps[2] {
        "@" => Slot::All,
        digits => Slot::Index(
            digits
                .parse()
                .map_err(|_| BindError::syntax(s, "slot index out of range"))?,
        ),
    };

    let subpath = match caps.get(3).map(|m| m.as_str()) {
        None => None,
        Some("") => return Err(BindError::syntax(s, "empty subpath after '/'")),
        Some(sub) if scope == Scope::Stream => {
            if sub.contains('/') {
                return Err(BindError::syntax(s, "stream bindings take a single column"));
            }
            if sub.parse::<usize>().is_err() {
                return Err(BindError::syntax(s, "stream column must be a non-negative integer"));
            }
            Some(sub.to_string())
        }
        Some(sub) => Some(sub.to_string()),
    };

    Ok(Binding::Arg(ArgRef {
        scope,
        slot,
        subpath,
    }))
}

/// Slot index of a binding in the given scope
///
/// Returns `None` for literals, other scopes and `@` bindings.
pub fn extract_index(binding: &Binding, scope: Scope) -> Option<usize> {
    binding
        .arg()
        .filter(|a| a.scope == scope)
        .and_then(ArgRef::index)
}

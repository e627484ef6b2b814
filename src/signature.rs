//! Static parameter descriptor of a wrapped function
//!
//! Replaces runtime introspection: the tool author declares the parameter
//! names, their defaults and the variadic slots once.
//!
//! ```
//! use bindcli::Signature;
//! use serde_json::json;
//!
//! let sig = Signature::new()
//!     .param("x")
//!     .param_with_default("y", json!(1))
//!     .var_args("rest");
//! assert_eq!(sig.required(), vec!["x"]);
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// One fixed parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    /// `None` means the parameter is required
    pub default: Option<Value>,
}

/// Parameter list plus optional variadic positional/keyword slots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
    var_args: Option<String>,
    var_kwargs: Option<String>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required parameter
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Add a parameter with a default value (becomes a command-line flag)
    pub fn param_with_default(mut self, name: impl Into<String>, default: Value) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: Some(default),
        });
        self
    }

    /// Name the variable positional slot (`*args`)
    pub fn var_args(mut self, name: impl Into<String>) -> Self {
        self.var_args = Some(name.into());
        self
    }

    /// Name the variable keyword slot (`**kwargs`)
    pub fn var_kwargs(mut self, name: impl Into<String>) -> Self {
        self.var_kwargs = Some(name.into());
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn var_args_name(&self) -> Option<&str> {
        self.var_args.as_deref()
    }

    pub fn var_kwargs_name(&self) -> Option<&str> {
        self.var_kwargs.as_deref()
    }

    pub fn has_fixed_params(&self) -> bool {
        !self.params.is_empty()
    }

    /// Names of parameters without default, in declaration order
    pub fn required(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.default.is_none())
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Default values, including `[]` for `*args` and `{}` for `**kwargs`
    pub fn defaults(&self) -> BTreeMap<String, Value> {
        let mut out: BTreeMap<String, Value> = self
            .params
            .iter()
            .filter_map(|p| p.default.clone().map(|d| (p.name.clone(), d)))
            .collect();
        if let Some(name) = &self.var_args {
            out.insert(name.clone(), Value::Array(Vec::new()));
        }
        if let Some(name) = &self.var_kwargs {
            out.insert(name.clone(), Value::Object(Map::new()));
        }
        out
    }

    pub fn default_of(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.default.as_ref())
    }

    pub fn is_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

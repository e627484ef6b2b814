//! Error types with codes and fix suggestions
//!
//! Error code ranges:
//! - BIND-000-009: Mapping syntax errors
//! - BIND-010-019: Configuration errors
//! - BIND-020-029: Argument count errors
//! - BIND-030-039: Dataset store errors
//! - BIND-040-049: Stream / output grid errors
//! - BIND-050-059: Invocation errors
//! - BIND-090-099: IO / serialization errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BindError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
#[derive(Error, Debug)]
pub enum BindError {
    // ═══════════════════════════════════════════
    // MAPPING SYNTAX (000-009)
    // ═══════════════════════════════════════════
    #[error("[BIND-001] Bad mapping '{expr}': {reason}")]
    MappingSyntax { expr: String, reason: String },

    #[error("[BIND-002] Bad mapping override '{item}': expected key=expr")]
    OverrideSyntax { item: String },

    // ═══════════════════════════════════════════
    // CONFIGURATION (010-019)
    // ═══════════════════════════════════════════
    #[error("[BIND-010] Argument '{param}' required but its slot {slot} is already bound")]
    DuplicateBinding { param: String, slot: String },

    #[error("[BIND-011] Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("[BIND-012] {feature} is not implemented")]
    Unimplemented { feature: String },

    #[error("[BIND-013] Option '{option}' for '{param}' conflicts with another option")]
    OptionConflict { option: String, param: String },

    // ═══════════════════════════════════════════
    // ARGUMENT COUNTS (020-029)
    // ═══════════════════════════════════════════
    #[error("[BIND-020] Expecting {expected}, got {actual}")]
    ArgumentCount { expected: String, actual: usize },

    #[error("[BIND-022] Expecting at least {minimum} argument{}, got {actual}", plural(.minimum))]
    MinimumArguments { minimum: usize, actual: usize },

    #[error("[BIND-023] No {scope} argument available for '{expr}'")]
    MissingArgument { scope: String, expr: String },

    // ═══════════════════════════════════════════
    // DATASET STORE (030-039)
    // ═══════════════════════════════════════════
    #[error("[BIND-030] Cannot load dataset \"{container}/{path}\": no such dataset")]
    MissingDataset { container: String, path: String },

    #[error("[BIND-031] Cannot load from \"{container}\": no such file")]
    ContainerNotFound { container: String },

    #[error("[BIND-032] Dataset already exists: {container}/{path}")]
    DatasetExists { container: String, path: String },

    #[error("[BIND-033] Expected a sequence of length {expected} for '{expr}', got {actual}")]
    LengthMismatch {
        expr: String,
        expected: usize,
        actual: usize,
    },

    #[error("[BIND-034] Dataset store error on \"{container}\": {reason}")]
    Store { container: String, reason: String },

    // ═══════════════════════════════════════════
    // STREAM / OUTPUT GRID (040-049)
    // ═══════════════════════════════════════════
    #[error("[BIND-040] Not enough standard input for '{expr}': {reason}")]
    InsufficientStreamData { expr: String, reason: String },

    #[error("[BIND-041] Conflicting standard output structure at row {row}")]
    StructureConflict { row: usize },

    #[error("[BIND-042] Expecting a sequence for '{expr}', got {actual}")]
    NotSequence { expr: String, actual: String },

    // ═══════════════════════════════════════════
    // INVOCATION (050-059)
    // ═══════════════════════════════════════════
    #[error("[BIND-050] Function result has only {len} value{}, index {index} requested", plural(.len))]
    ResultIndex { index: usize, len: usize },

    #[error("[BIND-051] Output source '{source_name}' not found in input data")]
    UnknownSource { source_name: String },

    #[error("[BIND-052] {reason}")]
    Invocation { reason: String },

    // ═══════════════════════════════════════════
    // IO / SERIALIZATION (090-099)
    // ═══════════════════════════════════════════
    #[error("[BIND-090] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[BIND-091] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("[BIND-092] Settings error: {reason}")]
    Settings { reason: String },

    #[error("{0}")]
    Cli(#[from] clap::Error),
}

impl BindError {
    /// Shorthand for errors raised by wrapped functions and processors
    pub fn invocation(reason: impl Into<String>) -> Self {
        Self::Invocation {
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub(crate) fn syntax(expr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MappingSyntax {
            expr: expr.into(),
            reason: reason.into(),
        }
    }

    /// Configuration-class errors are detected before any data is touched
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MappingSyntax { .. }
                | Self::OverrideSyntax { .. }
                | Self::DuplicateBinding { .. }
                | Self::Configuration { .. }
                | Self::Unimplemented { .. }
                | Self::OptionConflict { .. }
                | Self::ArgumentCount { .. }
                | Self::MinimumArguments { .. }
        )
    }

    /// Short error code, e.g. "BIND-030"
    pub fn code(&self) -> &'static str {
        match self {
            Self::MappingSyntax { .. } => "BIND-001",
            Self::OverrideSyntax { .. } => "BIND-002",
            Self::DuplicateBinding { .. } => "BIND-010",
            Self::Configuration { .. } => "BIND-011",
            Self::Unimplemented { .. } => "BIND-012",
            Self::OptionConflict { .. } => "BIND-013",
            Self::ArgumentCount { .. } => "BIND-020",
            Self::MinimumArguments { .. } => "BIND-022",
            Self::MissingArgument { .. } => "BIND-023",
            Self::MissingDataset { .. } => "BIND-030",
            Self::ContainerNotFound { .. } => "BIND-031",
            Self::DatasetExists { .. } => "BIND-032",
            Self::LengthMismatch { .. } => "BIND-033",
            Self::Store { .. } => "BIND-034",
            Self::InsufficientStreamData { .. } => "BIND-040",
            Self::StructureConflict { .. } => "BIND-041",
            Self::NotSequence { .. } => "BIND-042",
            Self::ResultIndex { .. } => "BIND-050",
            Self::UnknownSource { .. } => "BIND-051",
            Self::Invocation { .. } => "BIND-052",
            Self::Io(_) => "BIND-090",
            Self::Json(_) => "BIND-091",
            Self::Settings { .. } => "BIND-092",
            Self::Cli(_) => "BIND-099",
        }
    }
}

fn plural(n: &usize) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}

impl FixSuggestion for BindError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BindError::MappingSyntax { .. } => {
                Some("Use <$|%|#><index|@>[/subpath], e.g. $0/data, %@/result or #0/2")
            }
            BindError::OverrideSyntax { .. } => Some("Use --inmap name=expr[,name=expr...]"),
            BindError::DuplicateBinding { .. } => {
                Some("Bind the required argument explicitly to a free slot")
            }
            BindError::Configuration { .. } => {
                Some("Check that input and output mappings can be paired")
            }
            BindError::Unimplemented { .. } => Some("Run without parallel execution"),
            BindError::OptionConflict { .. } => Some("Declare a distinct short option name"),
            BindError::ArgumentCount { .. } | BindError::MinimumArguments { .. } => {
                Some("Check the usage line with --help")
            }
            BindError::MissingArgument { .. } => {
                Some("Supply as many input/output arguments as the mapping requires")
            }
            BindError::MissingDataset { .. } => {
                Some("Check the dataset path or pass --omit-missing")
            }
            BindError::ContainerNotFound { .. } => Some("Check the file path exists"),
            BindError::DatasetExists { .. } => Some("Pass --overwrite to replace datasets"),
            BindError::LengthMismatch { .. } => {
                Some("Return one value per file when distributing with @")
            }
            BindError::Store { .. } => Some("Check the file contains a JSON object"),
            BindError::InsufficientStreamData { .. } => {
                Some("Check the number of lines and columns on standard input")
            }
            BindError::StructureConflict { .. } => {
                Some("Do not mix whole-row and cell bindings for the same row")
            }
            BindError::NotSequence { .. } => Some("Return a list for @ output bindings"),
            BindError::ResultIndex { .. } | BindError::UnknownSource { .. } => {
                Some("Check the output mapping against the function result")
            }
            BindError::Invocation { .. } => None,
            BindError::Io(_) => Some("Check file path and permissions"),
            BindError::Json(_) => Some("Check the value is valid JSON"),
            BindError::Settings { .. } => Some("Check ~/.config/bindcli/config.toml"),
            BindError::Cli(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_codes() {
        let err = BindError::MinimumArguments {
            minimum: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "[BIND-022] Expecting at least 2 arguments, got 1"
        );
        assert_eq!(err.code(), "BIND-022");
    }

    #[test]
    fn singular_result_index() {
        let err = BindError::ResultIndex { index: 3, len: 1 };
        assert_eq!(
            err.to_string(),
            "[BIND-050] Function result has only 1 value, index 3 requested"
        );
    }

    #[test]
    fn configuration_class() {
        assert!(BindError::configuration("x").is_configuration());
        assert!(BindError::ArgumentCount {
            expected: "an even number of arguments".into(),
            actual: 3
        }
        .is_configuration());
        assert!(!BindError::MissingDataset {
            container: "a.json".into(),
            path: "x".into()
        }
        .is_configuration());
    }

    #[test]
    fn every_data_error_has_suggestion() {
        let err = BindError::StructureConflict { row: 2 };
        assert!(err.fix_suggestion().is_some());
        assert!(BindError::invocation("boom").fix_suggestion().is_none());
    }
}

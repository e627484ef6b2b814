//! Execution Mode Selector

use std::fmt;

use super::cardinality::Cardinality;
use crate::error::{BindError, Result};

/// How often the wrapped function runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// One call over all supplied data
    AllAtOnce,
    /// One call per chunk, in order
    Sequential,
    /// One call per chunk, concurrently (not implemented)
    Parallel,
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecMode::AllAtOnce => write!(f, "once"),
            ExecMode::Sequential => write!(f, "seq"),
            ExecMode::Parallel => write!(f, "para"),
        }
    }
}

/// Pick the execution mode from cardinalities and independence
///
/// Chunked execution needs paired counts (equal, or one side zero) and an
/// independent mapping.
pub fn select_mode(
    tnin: Cardinality,
    tnout: Cardinality,
    indep: bool,
    parallel: bool,
) -> Result<ExecMode> {
    let paired = tnout == tnin || tnout.is_zero() || tnin.is_zero();
    match (paired, indep) {
        (true, true) if parallel => Ok(ExecMode::Parallel),
        (true, true) => Ok(ExecMode::Sequential),
        (true, false) if parallel => Err(BindError::configuration(
            "parallel execution requires independent bindings",
        )),
        (true, false) => Ok(ExecMode::AllAtOnce),
        (false, true) => Err(BindError::configuration(
            "independent execution impossible with cross-referencing bindings",
        )),
        (false, false) => Ok(ExecMode::AllAtOnce),
    }
}

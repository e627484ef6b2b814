//! Argument Partitioner - split positional tokens into inputs and outputs

use super::cardinality::Cardinality;
use crate::error::{BindError, Result};

/// Input and output argument lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgSplit {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl ArgSplit {
    fn at(args: &[String], mark: usize) -> Self {
        let (inputs, outputs) = args.split_at(mark);
        Self {
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
        }
    }
}

/// Split `args` according to the theoretical counts
///
/// In independent mode surplus tokens are tolerated for chunk iteration.
pub fn partition(
    args: &[String],
    tnin: Cardinality,
    tnout: Cardinality,
    indep: bool,
) -> Result<ArgSplit> {
    let nargs = args.len();
    match (tnin, tnout) {
        (Cardinality::Unbounded, Cardinality::Unbounded) => {
            if nargs % 2 != 0 {
                return Err(BindError::ArgumentCount {
                    expected: "an even number of arguments".to_string(),
                    actual: nargs,
                });
            }
            Ok(ArgSplit::at(args, nargs / 2))
        }
        (Cardinality::Unbounded, Cardinality::Finite(k)) => {
            if nargs < k {
                return Err(BindError::MinimumArguments {
                    minimum: k,
                    actual: nargs,
                });
            }
            Ok(ArgSplit::at(args, nargs - k))
        }
        (Cardinality::Finite(n), Cardinality::Unbounded) => {
            if nargs < n {
                return Err(BindError::MinimumArguments {
                    minimum: n,
                    actual: nargs,
                });
            }
            Ok(ArgSplit::at(args, n))
        }
        (Cardinality::Finite(n), Cardinality::Finite(k)) => {
            if !indep && nargs != n + k {
                return Err(BindError::ArgumentCount {
                    expected: format!(
                        "exactly {} argument{}",
                        n + k,
                        if n + k == 1 { "" } else { "s" }
                    ),
                    actual: nargs,
                });
            }
            Ok(ArgSplit::at(args, n.min(nargs)))
        }
    }
}

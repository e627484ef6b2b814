//! Plan Module - what an invocation needs before any data is touched
//!
//! - `cardinality`: theoretical argument counts and independence
//! - `mode`: execution mode selection
//! - `partition`: input/output split of positional arguments
//! - `usage`: usage line derived from the mappings

mod cardinality;
mod mode;
mod partition;
mod usage;

use std::fmt;

use tracing::debug;

pub use cardinality::{
    independence, theoretical_input_count, theoretical_output_count, Cardinality,
};
pub use mode::{select_mode, ExecMode};
pub use partition::{partition, ArgSplit};
pub use usage::auto_usage;

use crate::binding::{InputMapping, OutputMapping};
use crate::error::Result;

/// Result of analyzing a pair of mappings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub indep: bool,
    pub tnin: Cardinality,
    pub tnout: Cardinality,
    pub mode: ExecMode,
}

impl Plan {
    /// Run the analyzer and the mode selector
    pub fn analyze(inmap: &InputMapping, outmap: &OutputMapping, parallel: bool) -> Result<Self> {
        let indep = independence(inmap, outmap);
        let tnin = theoretical_input_count(inmap, indep);
        let tnout = theoretical_output_count(outmap, indep);
        let mode = select_mode(tnin, tnout, indep, parallel)?;
        debug!(%tnin, %tnout, indep, %mode, "execution plan");
        Ok(Self {
            indep,
            tnin,
            tnout,
            mode,
        })
    }

    pub fn partition(&self, args: &[String]) -> Result<ArgSplit> {
        partition(args, self.tnin, self.tnout, self.indep)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dependence = match (self.mode, self.indep) {
            (ExecMode::Parallel, _) => "para",
            (_, true) => "indep",
            (_, false) => "dep",
        };
        write!(f, "{}>{} {} {}", self.tnin, self.tnout, dependence, self.mode)
    }
}

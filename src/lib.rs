//! bindcli - turn plain functions into command-line tools
//!
//! A wrapped function declares where each parameter comes from and where each
//! result goes to, using short binding expressions:
//!
//! | Expression | Meaning                                        |
//! |------------|------------------------------------------------|
//! | `$0`       | first input argument (the token itself)        |
//! | `$0/data`  | dataset `data` inside the first input file     |
//! | `$@/data`  | dataset `data` of every input file             |
//! | `%1/out`   | dataset `out` inside the second output file    |
//! | `#0/2`     | third column of the first standard-input line  |
//! | `#@`       | every standard-input line                      |
//!
//! From these mappings the engine derives how many positional arguments the
//! tool takes and whether it runs once over all of them or once per chunk.

pub mod binding;
pub mod call;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod plan;
pub mod runtime;
pub mod signature;
pub mod store;
pub mod tool;

pub use binding::{
    parse_binding, ArgRef, Binding, InputMapping, OutputMapping, OutputSource, Scope, Slot,
};
pub use call::{CallArgs, Outcome, Postproc};
pub use config::{Configuration, Settings};
pub use error::{BindError, FixSuggestion, Result};
pub use plan::{Cardinality, ExecMode, Plan};
pub use runtime::Io;
pub use signature::Signature;
pub use store::{DatasetStore, JsonFileStore, MemoryStore, OverwritePolicy};
pub use tool::{Tool, ToolBuilder};

/// Install the stderr log subscriber (`RUST_LOG`, default `warn`)
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

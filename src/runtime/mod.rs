//! Runtime Module - executing a plan against real data
//!
//! Contains the runtime execution components:
//! - `executor`: load/store of bindings (datasets, tokens, standard streams)
//! - `runner`: the five-phase pipeline, once or per chunk
//! - `grid`: standard-output row/cell buffer
//! - `stream`: standard-input line source
//! - `state`: per-run mutable state and injectable I/O
//! - `timing`, `progress`: ledger and progress bar
//!
//! This module represents the "how" - runtime execution.
//! For the static analysis of mappings, see the `plan` module.

mod executor;
mod grid;
mod progress;
mod runner;
mod state;
mod stream;
mod timing;

pub use executor::{ChunkLoad, Executor, InData};
pub use grid::{render, OutputGrid};
pub use progress::{reporter, Bar, Progress, Silent};
pub use runner::{Dump, Flow, Pipeline};
pub use state::{ctime_now, Io, RunState};
pub use stream::{cells, LineSource};
pub use timing::{Phase, Timings};

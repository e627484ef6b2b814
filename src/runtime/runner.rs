//! Execution Loop
//!
//! Five phases per invocation: load → preprocess → call → postprocess → store.
//! `AllAtOnce` runs them once over every argument; `Sequential` runs them
//! once per chunk (one input argument, one output argument, one line).

use std::time::Instant;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, info};

use super::executor::{ChunkLoad, Executor, InData};
use super::progress::Progress;
use super::state::{Io, RunState};
use super::timing::Phase;
use crate::binding::{auto_outmap, validate_outmap, Binding, Scope, Slot};
use crate::call::{CallArgs, Callable, Outcome, Postproc, ValueFn};
use crate::error::{BindError, Result};
use crate::plan::{ArgSplit, ExecMode, Plan};

/// Intermediate data an info switch prints before stopping the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dump {
    /// Defaults, flags and loaded bindings before preprocessing
    Predata,
    /// Input data after preprocessing
    Indata,
    /// Positional arguments of the call
    Inargs,
    /// Keyword arguments of the call
    Inkwargs,
    /// Raw function result
    Outdata,
    /// Result after postprocessing
    Postdata,
}

/// How a run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Every planned invocation ran
    Completed { calls: usize },
    /// A required output file is absent and the must-exist policy is on
    Skipped,
    /// An info switch printed its data
    Dumped,
}

enum Step {
    Stored,
    Dumped,
}

/// Everything one run needs besides the mutable state
pub struct Pipeline<'a> {
    pub exec: Executor<'a>,
    pub func: &'a Callable,
    pub preproc: &'a FxHashMap<String, ValueFn>,
    pub postproc: Option<&'a Postproc>,
    /// Values given for flag parameters on the command line
    pub flags: &'a InData,
    /// `--outmap` overrides, re-applied when the output mapping is derived
    pub outmap_overrides: Option<&'a str>,
    pub dump: Option<Dump>,
}

fn print_json(io: &mut Io, value: &Value) -> Result<()> {
    io.print_line(&serde_json::to_string(value)?)
}

impl<'a> Pipeline<'a> {
    /// Run according to the plan
    pub fn run(
        &self,
        plan: &Plan,
        state: &mut RunState,
        split: &ArgSplit,
        progress: &mut dyn Progress,
        io: &mut Io,
    ) -> Result<Flow> {
        info!(plan = %plan, inputs = split.inputs.len(), outputs = split.outputs.len(), "running");
        match plan.mode {
            ExecMode::AllAtOnce => self.run_once(state, split, io),
            ExecMode::Sequential => self.run_sequential(plan, state, split, progress, io),
            ExecMode::Parallel => Err(BindError::Unimplemented {
                feature: "parallel execution".to_string(),
            }),
        }
    }

    fn run_once(&self, state: &mut RunState, split: &ArgSplit, io: &mut Io) -> Result<Flow> {
        let outputs: Vec<&str> = split.outputs.iter().map(String::as_str).collect();
        if let Some(missing) = self.missing_output(state, &outputs) {
            info!(file = missing, "output file missing, skipping");
            return Ok(Flow::Skipped);
        }

        let t_loop = Instant::now();
        let t = Instant::now();
        let loaded = self.exec.load_once(state, &split.inputs, io)?;
        state.timings.record(Phase::Load, t);

        let Some((outcome, indata)) = self.invoke(state, loaded, io)? else {
            return Ok(Flow::Dumped);
        };
        self.settle_outmap(state, &outcome)?;

        let t = Instant::now();
        self.exec
            .store_once(state, &outcome, &indata, &split.inputs, &split.outputs, io)?;
        state.timings.record(Phase::Save, t);
        state.timings.record(Phase::Loop, t_loop);
        Ok(Flow::Completed { calls: 1 })
    }

    fn run_sequential(
        &self,
        plan: &Plan,
        state: &mut RunState,
        split: &ArgSplit,
        progress: &mut dyn Progress,
        io: &mut Io,
    ) -> Result<Flow> {
        let nloop = iteration_bound(plan, split);
        let eternal = is_eternal(state, plan.indep);
        debug!(nloop, eternal, "sequential loop");
        progress.start((!eternal).then_some(nloop as u64));

        let mut calls = 0;
        let mut chunk = 0;
        while eternal || chunk < nloop {
            let t_loop = Instant::now();
            let inarg = split.inputs.get(chunk).map(String::as_str);
            let outarg = split.outputs.get(chunk).map(String::as_str);
            chunk += 1;

            if let Some(missing) = self.missing_output(state, outarg.as_slice()) {
                info!(file = missing, chunk, "output file missing, skipping chunk");
                progress.step();
                continue;
            }

            let t = Instant::now();
            let loaded = match self.exec.load_chunk(state, inarg, io)? {
                ChunkLoad::Data(data) => data,
                ChunkLoad::EndOfStream => {
                    debug!(chunk, "end of standard input");
                    break;
                }
            };
            state.timings.record(Phase::Load, t);

            match self.call_and_store(state, loaded, inarg, outarg, io)? {
                Step::Stored => calls += 1,
                Step::Dumped => {
                    progress.finish();
                    return Ok(Flow::Dumped);
                }
            }
            state.timings.record(Phase::Loop, t_loop);
            progress.step();
        }
        progress.finish();
        Ok(Flow::Completed { calls })
    }

    fn call_and_store(
        &self,
        state: &mut RunState,
        loaded: InData,
        inarg: Option<&str>,
        outarg: Option<&str>,
        io: &mut Io,
    ) -> Result<Step> {
        let Some((outcome, indata)) = self.invoke(state, loaded, io)? else {
            return Ok(Step::Dumped);
        };
        self.settle_outmap(state, &outcome)?;

        let t = Instant::now();
        self.exec
            .store_chunk(state, &outcome, &indata, inarg, outarg, io)?;
        state.timings.record(Phase::Save, t);
        Ok(Step::Stored)
    }

    /// Preprocess, call and postprocess; `None` when an info switch fired
    fn invoke(
        &self,
        state: &mut RunState,
        loaded: InData,
        io: &mut Io,
    ) -> Result<Option<(Outcome, InData)>> {
        let mut predata = self.exec.sig.defaults();
        predata.extend(self.flags.iter().map(|(k, v)| (k.clone(), v.clone())));
        predata.extend(loaded);
        if self.dump == Some(Dump::Predata) {
            print_json(io, &Value::Object(predata.into_iter().collect()))?;
            return Ok(None);
        }

        let t = Instant::now();
        let indata = self.preprocess(predata)?;
        state.timings.record(Phase::Preproc, t);
        if self.dump == Some(Dump::Indata) {
            print_json(io, &Value::Object(indata.into_iter().collect()))?;
            return Ok(None);
        }

        let args = CallArgs::from_indata(self.exec.sig, indata.clone())?;
        match self.dump {
            Some(Dump::Inargs) => {
                print_json(io, &Value::Array(args.positional))?;
                return Ok(None);
            }
            Some(Dump::Inkwargs) => {
                print_json(io, &Value::Object(args.keywords))?;
                return Ok(None);
            }
            _ => {}
        }

        let t = Instant::now();
        let outcome = (self.func)(&args)?;
        state.timings.record(Phase::Call, t);
        if self.dump == Some(Dump::Outdata) {
            print_json(io, &outcome.whole())?;
            return Ok(None);
        }

        let t = Instant::now();
        let outcome = match self.postproc {
            Some(post) => post.apply(outcome)?,
            None => outcome,
        };
        state.timings.record(Phase::Postproc, t);
        if self.dump == Some(Dump::Postdata) {
            print_json(io, &outcome.whole())?;
            return Ok(None);
        }

        Ok(Some((outcome, indata)))
    }

    fn preprocess(&self, mut data: InData) -> Result<InData> {
        for (name, value) in data.iter_mut() {
            if let Some(f) = self.preproc.get(name) {
                *value = f(std::mem::take(value))?;
            }
        }
        Ok(data)
    }

    /// Derive the output mapping from the first result if none was declared
    fn settle_outmap(&self, state: &mut RunState, outcome: &Outcome) -> Result<()> {
        if !state.outmap.is_empty() {
            return Ok(());
        }
        auto_outmap(&mut state.outmap, outcome);
        if let Some(text) = self.outmap_overrides {
            state.outmap.apply_overrides(text)?;
        }
        validate_outmap(&state.outmap)
    }

    /// First output file named by an indexed `%i/path` binding that does not exist
    fn missing_output<'s>(&self, state: &RunState, outputs: &[&'s str]) -> Option<&'s str> {
        if !self.exec.cfg.must_exist {
            return None;
        }
        state
            .outmap
            .bindings()
            .filter_map(Binding::arg)
            .filter(|arg| arg.scope == Scope::Output && arg.has_subpath())
            .filter_map(|arg| match arg.slot {
                Slot::Index(i) => outputs.get(i).copied(),
                Slot::All => None,
            })
            .find(|file| !self.exec.store.has_container(file))
    }
}

/// Number of chunks when the loop is bounded
///
/// At least one chunk runs when neither side takes arguments; supplied
/// tokens still extend the loop.
fn iteration_bound(plan: &Plan, split: &ArgSplit) -> usize {
    let floor = usize::from(plan.tnin.is_zero() && plan.tnout.is_zero());
    [
        floor,
        plan.tnin.finite().unwrap_or(0),
        plan.tnout.finite().unwrap_or(0),
        split.inputs.len(),
        split.outputs.len(),
    ]
    .into_iter()
    .max()
    .unwrap_or(1)
}

/// True if the loop runs until standard input is exhausted
fn is_eternal(state: &RunState, indep: bool) -> bool {
    let stream = |b: &Binding| b.in_scope(Scope::Stream);
    state.inmap.bindings().any(|b| b.is_all_of(Scope::Stream))
        || (indep && state.inmap.bindings().any(stream))
}

//! Data Binding Executor
//!
//! Resolves bindings to values (load) and values to destinations (store),
//! either over the whole invocation or for a single chunk.
//!
//! | Binding      | Load                               | Store                           |
//! |--------------|------------------------------------|---------------------------------|
//! | literal      | the value                          | `null` suppresses, else error   |
//! | `$i`, `$@`   | raw token(s)                       | error                           |
//! | `$i/p`       | dataset `p` of input file `i`      | write dataset back              |
//! | `$@/p`       | dataset `p` of every input file    | distribute a sequence           |
//! | `%i/p`       | error                              | dataset `p` of output file `i`  |
//! | `#r`, `#r/c` | line / cell of standard input      | line / cell of standard output  |
//! | `#@`, `#@/c` | all lines / one column             | all rows / one column           |

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use super::grid::OutputGrid;
use super::state::{ctime_now, Io, RunState};
use super::stream::cells;
use crate::binding::{ArgRef, Binding, OutputMapping, OutputSource, Scope, Slot};
use crate::call::Outcome;
use crate::config::Configuration;
use crate::error::{BindError, Result};
use crate::signature::Signature;
use crate::store::{save_dataset, DatasetStore};

/// Parameter name → loaded value
pub type InData = BTreeMap<String, Value>;

/// Outcome of loading one chunk
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkLoad {
    Data(InData),
    /// Standard input is exhausted; the loop stops without invoking
    EndOfStream,
}

/// Immutable collaborators of the executor
pub struct Executor<'a> {
    pub cfg: &'a Configuration,
    pub sig: &'a Signature,
    pub store: &'a dyn DatasetStore,
    pub prog: &'a str,
}

fn missing_argument(arg: &ArgRef) -> BindError {
    BindError::MissingArgument {
        scope: arg.scope.noun().to_string(),
        expr: arg.to_string(),
    }
}

fn chunk_only_first(arg: &ArgRef) -> BindError {
    BindError::configuration(format!(
        "'{}' cannot be resolved one chunk at a time",
        arg
    ))
}

fn insufficient(arg: &ArgRef, reason: String) -> BindError {
    BindError::InsufficientStreamData {
        expr: arg.to_string(),
        reason,
    }
}

fn cell_of(arg: &ArgRef, line: &str, sep: &str, row: usize, col: usize) -> Result<Value> {
    let values = cells(line, sep);
    values
        .get(col)
        .map(|c| Value::String(c.to_string()))
        .ok_or_else(|| {
            insufficient(
                arg,
                format!("line {} has {} column(s), column {} requested", row, values.len(), col),
            )
        })
}

fn sequence<'v>(arg: &ArgRef, value: &'v Value) -> Result<&'v Vec<Value>> {
    value.as_array().ok_or_else(|| BindError::NotSequence {
        expr: arg.to_string(),
        actual: value.to_string(),
    })
}

impl<'a> Executor<'a> {
    // ═══════════════════════════════════════════════════════════════
    // LOAD
    // ═══════════════════════════════════════════════════════════════

    /// Load every input binding over all input arguments
    ///
    /// Standard input is read completely up front if any stream binding exists.
    pub fn load_once(&self, state: &RunState, inargs: &[String], io: &mut Io) -> Result<InData> {
        let lines = if state.inmap.bindings().any(|b| b.in_scope(Scope::Stream)) {
            io.stdin.read_all()?
        } else {
            Vec::new()
        };

        let mut indata = InData::new();
        for (name, binding) in state.inmap.iter() {
            let value = match binding {
                Binding::Literal(v) => v.clone(),
                Binding::Arg(arg) => match arg.scope {
                    Scope::Stream => self.stream_once(arg, &lines)?,
                    Scope::Input => self.input_once(name, arg, inargs)?,
                    Scope::Output => return Err(output_on_input_side(arg)),
                },
            };
            indata.insert(name.to_string(), value);
        }
        Ok(indata)
    }

    fn stream_once(&self, arg: &ArgRef, lines: &[String]) -> Result<Value> {
        let sep = self.cfg.stdin_sep.as_str();
        match (arg.slot, arg.column()) {
            (Slot::All, None) => Ok(Value::Array(
                lines.iter().cloned().map(Value::String).collect(),
            )),
            (Slot::All, Some(col)) => lines
                .iter()
                .enumerate()
                .map(|(row, line)| cell_of(arg, line, sep, row, col))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            (Slot::Index(row), col) => {
                let line = lines.get(row).ok_or_else(|| {
                    insufficient(
                        arg,
                        format!("expecting at least {} line(s), got {}", row + 1, lines.len()),
                    )
                })?;
                match col {
                    Some(col) => cell_of(arg, line, sep, row, col),
                    None => Ok(Value::String(line.clone())),
                }
            }
        }
    }

    fn input_once(&self, name: &str, arg: &ArgRef, inargs: &[String]) -> Result<Value> {
        match (arg.slot, arg.subpath.as_deref()) {
            (Slot::All, None) => Ok(Value::Array(
                inargs.iter().cloned().map(Value::String).collect(),
            )),
            (Slot::Index(i), None) => inargs
                .get(i)
                .map(|t| Value::String(t.clone()))
                .ok_or_else(|| missing_argument(arg)),
            (Slot::All, Some(path)) => {
                let mut values = Vec::with_capacity(inargs.len());
                for container in inargs {
                    match self.store.get(container, path) {
                        Ok(v) => values.push(v),
                        Err(BindError::MissingDataset { .. }) if self.cfg.omit_missing => {
                            warn!(container = %container, path, "omitting missing dataset");
                        }
                        Err(e) => return Err(e),
                    }
                }
                Ok(Value::Array(values))
            }
            (Slot::Index(i), Some(path)) => {
                let container = inargs.get(i).ok_or_else(|| missing_argument(arg))?;
                self.dataset_or_default(name, container, path)
            }
        }
    }

    /// Read one dataset, falling back to the parameter default when it is missing
    fn dataset_or_default(&self, name: &str, container: &str, path: &str) -> Result<Value> {
        if !self.store.has_container(container) {
            return Err(BindError::ContainerNotFound {
                container: container.to_string(),
            });
        }
        match self.store.get(container, path) {
            Err(BindError::MissingDataset { .. }) if self.sig.default_of(name).is_some() => {
                debug!(param = name, container, path, "dataset missing, using default");
                Ok(self.sig.default_of(name).cloned().unwrap_or(Value::Null))
            }
            other => other,
        }
    }

    /// Load the input bindings of one chunk
    ///
    /// Consumes exactly one line of standard input if any stream binding exists.
    pub fn load_chunk(
        &self,
        state: &RunState,
        inarg: Option<&str>,
        io: &mut Io,
    ) -> Result<ChunkLoad> {
        let line = if state.inmap.bindings().any(|b| b.in_scope(Scope::Stream)) {
            match io.stdin.read_line()? {
                Some(line) => Some(line),
                None => return Ok(ChunkLoad::EndOfStream),
            }
        } else {
            None
        };

        let mut indata = InData::new();
        for (name, binding) in state.inmap.iter() {
            let value = match binding {
                Binding::Literal(v) => v.clone(),
                Binding::Arg(arg) => {
                    if arg.slot != Slot::Index(0) {
                        return Err(chunk_only_first(arg));
                    }
                    match arg.scope {
                        Scope::Stream => {
                            let line = line.as_deref().unwrap_or_default();
                            match arg.column() {
                                Some(col) => cell_of(arg, line, &self.cfg.stdin_sep, 0, col)?,
                                None => Value::String(line.trim().to_string()),
                            }
                        }
                        Scope::Input => match (&arg.subpath, inarg) {
                            (None, Some(token)) => Value::String(token.to_string()),
                            (None, None) => Value::Null,
                            (Some(path), Some(container)) => {
                                self.dataset_or_default(name, container, path)?
                            }
                            (Some(_), None) => return Err(missing_argument(arg)),
                        },
                        Scope::Output => return Err(output_on_input_side(arg)),
                    }
                }
            };
            indata.insert(name.to_string(), value);
        }
        Ok(ChunkLoad::Data(indata))
    }

    // ═══════════════════════════════════════════════════════════════
    // STORE
    // ═══════════════════════════════════════════════════════════════

    /// Value an output source stands for
    pub fn source_value(
        &self,
        source: &OutputSource,
        outcome: &Outcome,
        indata: &InData,
        state: &RunState,
    ) -> Result<Value> {
        match source {
            OutputSource::Index(i) => outcome.get(*i),
            OutputSource::All => Ok(outcome.whole()),
            OutputSource::Date => Ok(Value::String(ctime_now())),
            OutputSource::DateStart => Ok(Value::String(state.date_start.clone())),
            OutputSource::Duration => Ok(serde_json::json!(state.elapsed())),
            OutputSource::Timings => Ok(serde_json::to_value(&state.timings)?),
            OutputSource::Input(name) => {
                indata
                    .get(name)
                    .cloned()
                    .ok_or_else(|| BindError::UnknownSource {
                        source_name: name.clone(),
                    })
            }
        }
    }

    fn resolved_outputs(
        &self,
        outmap: &OutputMapping,
        outcome: &Outcome,
        indata: &InData,
        state: &RunState,
    ) -> Result<Vec<(ArgRef, Value)>> {
        let mut out = Vec::with_capacity(outmap.len());
        for (source, binding) in outmap.iter() {
            match binding {
                Binding::Literal(Value::Null) => continue,
                Binding::Literal(v) => {
                    return Err(BindError::configuration(format!(
                        "output {} is bound to the literal {}",
                        source, v
                    )))
                }
                Binding::Arg(arg) => {
                    let value = self.source_value(source, outcome, indata, state)?;
                    out.push((arg.clone(), value));
                }
            }
        }
        Ok(out)
    }

    fn save(
        &self,
        state: &mut RunState,
        io: &mut Io,
        container: &str,
        path: &str,
        value: Value,
    ) -> Result<()> {
        save_dataset(
            self.store,
            container,
            path,
            value,
            &mut state.overwrite,
            io.confirm.as_mut(),
            self.prog,
        )?;
        Ok(())
    }

    /// Store every output over all arguments, then print the grid
    pub fn store_once(
        &self,
        state: &mut RunState,
        outcome: &Outcome,
        indata: &InData,
        inargs: &[String],
        outargs: &[String],
        io: &mut Io,
    ) -> Result<()> {
        let outputs = self.resolved_outputs(&state.outmap, outcome, indata, state)?;
        let mut grid = OutputGrid::new();

        for (arg, value) in outputs {
            match arg.scope {
                Scope::Stream => match (arg.slot, arg.column()) {
                    (Slot::All, None) => {
                        for (row, item) in sequence(&arg, &value)?.iter().enumerate() {
                            grid.set_row(row, item)?;
                        }
                    }
                    (Slot::All, Some(col)) => {
                        for (row, item) in sequence(&arg, &value)?.iter().enumerate() {
                            grid.set_cell(row, col, item)?;
                        }
                    }
                    (Slot::Index(row), None) => grid.set_row(row, &value)?,
                    (Slot::Index(row), Some(col)) => grid.set_cell(row, col, &value)?,
                },
                Scope::Input | Scope::Output => {
                    let files = if arg.scope == Scope::Input { inargs } else { outargs };
                    let Some(path) = arg.subpath.as_deref() else {
                        return Err(BindError::configuration(format!(
                            "output binding '{}' needs a dataset path",
                            arg
                        )));
                    };
                    match arg.slot {
                        Slot::All => {
                            let items = sequence(&arg, &value)?;
                            if items.len() != files.len() {
                                return Err(BindError::LengthMismatch {
                                    expr: arg.to_string(),
                                    expected: files.len(),
                                    actual: items.len(),
                                });
                            }
                            for (container, item) in files.iter().zip(items.iter()) {
                                self.save(state, io, container, path, item.clone())?;
                            }
                        }
                        Slot::Index(i) => {
                            let container = files.get(i).ok_or_else(|| missing_argument(&arg))?;
                            self.save(state, io, container, path, value)?;
                        }
                    }
                }
            }
        }

        for line in grid.lines(&self.cfg.stdout_sep) {
            io.print_line(&line)?;
        }
        Ok(())
    }

    /// Store the outputs of one chunk; prints at most one line
    pub fn store_chunk(
        &self,
        state: &mut RunState,
        outcome: &Outcome,
        indata: &InData,
        inarg: Option<&str>,
        outarg: Option<&str>,
        io: &mut Io,
    ) -> Result<()> {
        let outputs = self.resolved_outputs(&state.outmap, outcome, indata, state)?;
        let mut grid = OutputGrid::new();

        for (arg, value) in outputs {
            if arg.slot != Slot::Index(0) {
                return Err(chunk_only_first(&arg));
            }
            match arg.scope {
                Scope::Stream => match arg.column() {
                    Some(col) => grid.set_cell(0, col, &value)?,
                    None => grid.set_row(0, &value)?,
                },
                Scope::Input | Scope::Output => {
                    let file = if arg.scope == Scope::Input { inarg } else { outarg };
                    let Some(path) = arg.subpath.as_deref() else {
                        return Err(BindError::configuration(format!(
                            "output binding '{}' needs a dataset path",
                            arg
                        )));
                    };
                    let container = file.ok_or_else(|| missing_argument(&arg))?;
                    self.save(state, io, container, path, value)?;
                }
            }
        }

        if let Some(line) = grid.lines(&self.cfg.stdout_sep).first() {
            if !line.is_empty() {
                io.print_line(line)?;
            }
        }
        Ok(())
    }
}

fn output_on_input_side(arg: &ArgRef) -> BindError {
    BindError::configuration(format!(
        "output binding '{}' is not allowed in the input mapping",
        arg
    ))
}

//! Tool - a wrapped function plus everything needed to run it from a shell
//!
//! ```text
//! argv ─► cli::parse ─► Configuration ─► resolve_inmap ─► Plan
//!                                                          │
//!          exit code ◄─ timings report ◄─ Pipeline::run ◄──┘
//! ```

use std::fs;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::binding::{resolve_inmap, validate_outmap, InputMapping, OutputMapping, OutputSource};
use crate::call::{CallArgs, Callable, Hook, Outcome, Postproc, ValueFn};
use crate::cli::{self, FlagParam, Info};
use crate::config::{Configuration, Settings};
use crate::error::{BindError, FixSuggestion, Result};
use crate::plan::{auto_usage, independence, ExecMode, Plan};
use crate::runtime::{reporter, Executor, Flow, Io, Pipeline, RunState};
use crate::signature::Signature;
use crate::store::{DatasetStore, JsonFileStore, OverwritePolicy};

/// A function exposed as a command-line tool
pub struct Tool {
    name: String,
    about: Option<String>,
    usage: Option<String>,
    sig: Signature,
    func: Callable,
    inmap: InputMapping,
    outmap: OutputMapping,
    preproc: FxHashMap<String, ValueFn>,
    postproc: Option<Postproc>,
    first: Option<Hook>,
    last: Option<Hook>,
    shorts: FxHashMap<String, char>,
    config: Configuration,
    /// Settings file layer; `None` reads the user settings file when run from a shell
    file_settings: Option<Settings>,
}

// ============================================================================
// BUILDER
// ============================================================================

/// Fluent builder for [`Tool`]
pub struct ToolBuilder {
    tool: Tool,
    inputs: Vec<(String, String)>,
    outputs: Vec<(OutputSource, String)>,
}

impl ToolBuilder {
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.tool.about = Some(about.into());
        self
    }

    /// Replace the generated usage line
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.tool.usage = Some(usage.into());
        self
    }

    pub fn signature(mut self, sig: Signature) -> Self {
        self.tool.sig = sig;
        self
    }

    /// Bind a parameter to a binding expression or literal
    pub fn input(mut self, param: impl Into<String>, expr: impl Into<String>) -> Self {
        self.inputs.push((param.into(), expr.into()));
        self
    }

    /// Bind a result element (or another output source) to a destination
    pub fn output(mut self, source: impl Into<OutputSource>, expr: impl Into<String>) -> Self {
        self.outputs.push((source.into(), expr.into()));
        self
    }

    /// Preprocess one parameter (see [`crate::convert`] for ready-made ones)
    pub fn preproc(mut self, param: impl Into<String>, f: ValueFn) -> Self {
        self.tool.preproc.insert(param.into(), f);
        self
    }

    /// Postprocess the whole result
    pub fn postproc(
        mut self,
        f: impl Fn(Outcome) -> Result<Outcome> + Send + Sync + 'static,
    ) -> Self {
        self.tool.postproc = Some(Postproc::Whole(Arc::new(f)));
        self
    }

    /// Postprocess a tuple result element by element
    pub fn postproc_each(mut self, funcs: Vec<Option<ValueFn>>) -> Self {
        self.tool.postproc = Some(Postproc::PerElement(funcs));
        self
    }

    /// Setup hook, run once before the first invocation
    pub fn first(mut self, hook: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        self.tool.first = Some(Arc::new(hook));
        self
    }

    /// Teardown hook, run once after the last invocation
    pub fn last(mut self, hook: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        self.tool.last = Some(Arc::new(hook));
        self
    }

    /// Short option letter for a flag parameter
    pub fn short(mut self, param: impl Into<String>, letter: char) -> Self {
        self.tool.shorts.insert(param.into(), letter);
        self
    }

    pub fn overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.tool.config.overwrite = policy;
        self
    }

    pub fn bar(mut self, enabled: bool) -> Self {
        self.tool.config.bar = enabled;
        self
    }

    pub fn stdin_sep(mut self, sep: impl Into<String>) -> Self {
        self.tool.config.stdin_sep = sep.into();
        self
    }

    pub fn stdout_sep(mut self, sep: impl Into<String>) -> Self {
        self.tool.config.stdout_sep = sep.into();
        self
    }

    pub fn omit_missing(mut self, enabled: bool) -> Self {
        self.tool.config.omit_missing = enabled;
        self
    }

    pub fn parallel(mut self, enabled: bool) -> Self {
        self.tool.config.parallel = enabled;
        self
    }

    pub fn must_exist(mut self, enabled: bool) -> Self {
        self.tool.config.must_exist = enabled;
        self
    }

    pub fn timings(mut self, enabled: bool) -> Self {
        self.tool.config.timings = enabled;
        self
    }

    /// Use these settings instead of the user settings file
    pub fn settings(mut self, settings: Settings) -> Self {
        self.tool.file_settings = Some(settings);
        self
    }

    /// Parse the declared mappings
    pub fn build(mut self) -> Result<Tool> {
        self.tool.inmap = InputMapping::parse(self.inputs)?;
        self.tool.outmap = OutputMapping::parse(self.outputs)?;
        validate_outmap(&self.tool.outmap)?;
        Ok(self.tool)
    }
}

// ============================================================================
// TOOL
// ============================================================================

impl Tool {
    pub fn builder(
        name: impl Into<String>,
        func: impl Fn(&CallArgs) -> Result<Outcome> + Send + Sync + 'static,
    ) -> ToolBuilder {
        ToolBuilder {
            tool: Tool {
                name: name.into(),
                about: None,
                usage: None,
                sig: Signature::new(),
                func: Arc::new(func),
                inmap: InputMapping::new(),
                outmap: OutputMapping::new(),
                preproc: FxHashMap::default(),
                postproc: None,
                first: None,
                last: None,
                shorts: FxHashMap::default(),
                config: Configuration::default(),
                file_settings: None,
            },
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.sig
    }

    /// Default-valued parameters not bound by the input mapping
    pub fn flag_params(&self, inmap: &InputMapping) -> Vec<FlagParam> {
        self.sig
            .params()
            .iter()
            .filter(|p| !inmap.contains(&p.name))
            .filter_map(|p| {
                let flag = FlagParam::new(p.name.clone(), p.default.clone()?);
                Some(match self.shorts.get(&p.name) {
                    Some(&c) => flag.with_short(c),
                    None => flag,
                })
            })
            .collect()
    }

    /// Usage line, generated from the declared mappings unless overridden
    pub fn usage_line(&self) -> Result<String> {
        if let Some(usage) = &self.usage {
            return Ok(usage.clone());
        }
        let inmap = resolve_inmap(self.inmap.clone(), &self.sig)?;
        let indep = independence(&inmap, &self.outmap);
        Ok(auto_usage(&self.name, &inmap, &self.outmap, indep))
    }

    /// Run from a shell: terminal streams, JSON-file datasets, user settings
    ///
    /// Prints `<name>: <error>` to stderr and returns 1 on failure.
    pub fn execute<I, T>(&self, argv: I) -> ExitCode
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let outcome = match &self.file_settings {
            Some(settings) => Ok(settings.clone()),
            None => Settings::load(),
        }
        .and_then(|file| {
            let mut io = Io::terminal();
            self.run_layered(argv, &file, &mut io, &JsonFileStore::new())
        });
        match outcome {
            Ok(code) => ExitCode::from(code),
            Err(e) => {
                eprintln!("{}: {}", self.name.red().bold(), e);
                if let Some(fix) = e.fix_suggestion() {
                    debug!(fix, "suggestion");
                }
                ExitCode::from(1)
            }
        }
    }

    /// Entry point for a binary wrapping a single tool
    pub fn main(&self) -> ExitCode {
        crate::init_tracing();
        self.execute(std::env::args().skip(1))
    }

    /// Run with injected streams and store; returns the exit code
    pub fn run_from<I, T>(&self, argv: I, io: &mut Io, store: &dyn DatasetStore) -> Result<u8>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let file = self.file_settings.clone().unwrap_or_default();
        self.run_layered(argv, &file, io, store)
    }

    fn run_layered<I, T>(
        &self,
        argv: I,
        file: &Settings,
        io: &mut Io,
        store: &dyn DatasetStore,
    ) -> Result<u8>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();

        // ═══════════════════════════════════════════
        // OPTIONS
        // ═══════════════════════════════════════════
        let declared = resolve_inmap(self.inmap.clone(), &self.sig)?;
        let flag_params = self.flag_params(&declared);
        let cmd = cli::command(
            &self.name,
            self.about.as_deref(),
            &self.usage_line()?,
            &flag_params,
        )?;
        let parsed = match cli::parse(cmd, &self.name, &flag_params, argv.iter().cloned()) {
            Ok(parsed) => parsed,
            Err(BindError::Cli(e))
                if matches!(
                    e.kind(),
                    clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
                ) =>
            {
                write!(io.stdout, "{}", e.render())?;
                return Ok(0);
            }
            Err(e) => return Err(e),
        };
        let cfg = self.config.clone().layered(file).layered(&parsed.settings);

        if let Some(path) = &cfg.cmd_log {
            let mut line = self.name.clone();
            for arg in &argv {
                line.push(' ');
                line.push_str(arg);
            }
            line.push('\n');
            fs::write(path, line)?;
            debug!(path = %path.display(), "logged command line");
        }

        // ═══════════════════════════════════════════
        // MAPPINGS + PLAN
        // ═══════════════════════════════════════════
        let mut inmap = self.inmap.clone();
        if let Some(text) = &parsed.inmap {
            inmap.apply_overrides(text)?;
        }
        let inmap = resolve_inmap(inmap, &self.sig)?;
        let mut outmap = self.outmap.clone();
        if let Some(text) = &parsed.outmap {
            outmap.apply_overrides(text)?;
        }
        validate_outmap(&outmap)?;
        let plan = Plan::analyze(&inmap, &outmap, cfg.parallel)?;

        let dump = match parsed.info {
            Some(Info::Data(dump)) => Some(dump),
            Some(info) => {
                self.print_info(info, &plan, &inmap, &outmap, io)?;
                return Ok(0);
            }
            None => None,
        };

        let split = plan.partition(&parsed.args)?;
        debug!(inputs = ?split.inputs, outputs = ?split.outputs, "partitioned arguments");

        // ═══════════════════════════════════════════
        // RUN
        // ═══════════════════════════════════════════
        let mut state = RunState::new(inmap, outmap, cfg.overwrite);
        state.timings.prepare = state.elapsed();

        if let Some(hook) = &self.first {
            let t = Instant::now();
            hook()?;
            state.timings.first = t.elapsed().as_secs_f64();
        }

        let pipeline = Pipeline {
            exec: Executor {
                cfg: &cfg,
                sig: &self.sig,
                store,
                prog: &self.name,
            },
            func: &self.func,
            preproc: &self.preproc,
            postproc: self.postproc.as_ref(),
            flags: &parsed.flags,
            outmap_overrides: parsed.outmap.as_deref(),
            dump,
        };
        let mut progress = reporter(cfg.bar && plan.mode == ExecMode::Sequential);
        let flow = pipeline.run(&plan, &mut state, &split, progress.as_mut(), io)?;

        if let Some(hook) = &self.last {
            let t = Instant::now();
            hook()?;
            state.timings.last = t.elapsed().as_secs_f64();
        }
        state.timings.total = state.elapsed();
        info!(?flow, total = state.timings.total, "run finished");

        if cfg.timings && flow != Flow::Dumped {
            for line in state.timings.summary().lines() {
                io.print_line(line)?;
            }
        }
        Ok(0)
    }

    fn print_info(
        &self,
        info: Info,
        plan: &Plan,
        inmap: &InputMapping,
        outmap: &OutputMapping,
        io: &mut Io,
    ) -> Result<()> {
        let line = match info {
            Info::Summary => format!("{} {}", self.name, plan),
            Info::Fdefaults => serde_json::to_string(&self.sig.defaults())?,
            Info::Preproc => {
                let mut names: Vec<&str> = self.preproc.keys().map(String::as_str).collect();
                names.sort_unstable();
                serde_json::to_string(&names)?
            }
            Info::Postproc => match &self.postproc {
                Some(post) => format!("{:?}", post),
                None => "none".to_string(),
            },
            Info::Inmap => inmap.to_value().to_string(),
            Info::Outmap => outmap.to_value().to_string(),
            Info::Data(_) => return Ok(()),
        };
        io.print_line(&line)
    }
}

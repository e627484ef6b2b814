//! Option parser for wrapped tools
//!
//! Built with the clap builder API because the option set depends on the
//! wrapped function: every default-valued parameter that is not bound in the
//! input mapping becomes a flag next to the reserved run options.

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::binding::parse_literal;
use crate::config::Settings;
use crate::error::{BindError, Result};
use crate::runtime::{Dump, InData};
use crate::store::OverwritePolicy;

/// Long names taken by the run options
const RESERVED_LONG: &[&str] = &[
    "help",
    "overwrite",
    "no-overwrite",
    "bar",
    "no-bar",
    "insep",
    "outsep",
    "omit-missing",
    "no-omit-missing",
    "must-exist",
    "timings",
    "cmd",
    "cmdfile",
    "inmap",
    "outmap",
    "info",
    "args",
];

/// Short letters taken by the run options
const RESERVED_SHORT: &[char] = &['h', 'O', 'B', 'M', 'E', 'T', 'C', 'F', 'I'];

/// Info switches that stop the run before anything is stored
const INFO_SWITCHES: &[(&str, &str)] = &[
    ("info-fdefaults", "Print the parameter defaults"),
    ("info-preproc", "Print the preprocessed parameters"),
    ("info-postproc", "Print the postprocessing setup"),
    ("info-inmap", "Print the resolved input mapping"),
    ("info-outmap", "Print the declared output mapping"),
    ("info-predata", "Print the input data before preprocessing"),
    ("info-indata", "Print the input data after preprocessing"),
    ("info-inargs", "Print the positional call arguments"),
    ("info-inkwargs", "Print the keyword call arguments"),
    ("info-outdata", "Print the raw result"),
    ("info-postdata", "Print the postprocessed result"),
];

/// Requested info switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Info {
    /// One line: name, cardinalities, dependence, mode
    Summary,
    Fdefaults,
    Preproc,
    Postproc,
    Inmap,
    Outmap,
    /// Printed from inside the pipeline
    Data(Dump),
}

impl Info {
    fn from_switch(id: &str) -> Option<Self> {
        Some(match id {
            "info" => Self::Summary,
            "info-fdefaults" => Self::Fdefaults,
            "info-preproc" => Self::Preproc,
            "info-postproc" => Self::Postproc,
            "info-inmap" => Self::Inmap,
            "info-outmap" => Self::Outmap,
            "info-predata" => Self::Data(Dump::Predata),
            "info-indata" => Self::Data(Dump::Indata),
            "info-inargs" => Self::Data(Dump::Inargs),
            "info-inkwargs" => Self::Data(Dump::Inkwargs),
            "info-outdata" => Self::Data(Dump::Outdata),
            "info-postdata" => Self::Data(Dump::Postdata),
            _ => return None,
        })
    }
}

/// Parameter exposed as a command-line flag
#[derive(Debug, Clone, PartialEq)]
pub struct FlagParam {
    pub name: String,
    pub default: Value,
    pub short: Option<char>,
}

impl FlagParam {
    /// Flag with the first letter of the name as short option
    pub fn new(name: impl Into<String>, default: Value) -> Self {
        let name = name.into();
        let short = name.chars().next().filter(char::is_ascii_alphabetic);
        Self {
            name,
            default,
            short,
        }
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    fn long(&self) -> String {
        self.name.replace('_', "-")
    }

    fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone()).long(self.long());
        if let Some(c) = self.short {
            arg = arg.short(c);
        }
        match &self.default {
            Value::Bool(flag) => arg
                .action(ArgAction::SetTrue)
                .help(format!("Toggle {} (default: {})", self.name, flag)),
            Value::Number(n) if n.is_i64() || n.is_u64() => arg
                .value_name("INT")
                .allow_negative_numbers(true)
                .value_parser(parse_int)
                .help(format!("(default: {})", n)),
            Value::Number(n) => arg
                .value_name("FLOAT")
                .allow_negative_numbers(true)
                .value_parser(parse_float)
                .help(format!("(default: {})", n)),
            Value::String(s) => arg
                .value_name("STR")
                .help(format!("(default: {:?})", s)),
            other => arg
                .value_name("VALUE")
                .value_parser(parse_value)
                .help(format!("(default: {})", other)),
        }
    }

    /// Value given on the command line, if any
    fn value_of(&self, matches: &ArgMatches) -> Option<Value> {
        match &self.default {
            Value::Bool(flag) => matches.get_flag(&self.name).then_some(Value::Bool(!flag)),
            Value::String(_) => matches
                .get_one::<String>(&self.name)
                .map(|s| Value::String(s.clone())),
            _ => matches.get_one::<Value>(&self.name).cloned(),
        }
    }
}

fn parse_int(s: &str) -> std::result::Result<Value, String> {
    s.trim()
        .parse::<i64>()
        .map(Value::from)
        .map_err(|e| format!("expecting an integer: {}", e))
}

fn parse_float(s: &str) -> std::result::Result<Value, String> {
    s.trim()
        .parse::<f64>()
        .map(Value::from)
        .map_err(|e| format!("expecting a number: {}", e))
}

fn parse_value(s: &str) -> std::result::Result<Value, String> {
    Ok(parse_literal(s))
}

/// Everything the option parser extracted from one command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parsed {
    /// Run options, the highest configuration layer
    pub settings: Settings,
    pub inmap: Option<String>,
    pub outmap: Option<String>,
    pub info: Option<Info>,
    /// Values for flag parameters that were given
    pub flags: InData,
    /// Residual positional tokens
    pub args: Vec<String>,
}

fn switch(id: &'static str, short: Option<char>, help: &'static str) -> Arg {
    let arg = Arg::new(id).long(id).action(ArgAction::SetTrue).help(help);
    match short {
        Some(c) => arg.short(c),
        None => arg,
    }
}

fn reserved_args() -> Vec<Arg> {
    vec![
        switch("overwrite", Some('O'), "Overwrite existing datasets without asking")
            .conflicts_with("no-overwrite"),
        switch("no-overwrite", None, "Never overwrite existing datasets"),
        switch("bar", Some('B'), "Show a progress bar").conflicts_with("no-bar"),
        switch("no-bar", None, "Hide the progress bar"),
        Arg::new("insep")
            .long("insep")
            .value_name("SEP")
            .help("Column separator of standard input"),
        Arg::new("outsep")
            .long("outsep")
            .value_name("SEP")
            .help("Column separator of standard output"),
        switch("omit-missing", Some('M'), "Skip missing datasets when collecting")
            .conflicts_with("no-omit-missing"),
        switch("no-omit-missing", None, "Fail on missing datasets"),
        switch("must-exist", Some('E'), "Skip the run if an output file is missing"),
        switch("timings", Some('T'), "Print a timing report"),
        switch("cmd", Some('C'), "Log the command line to <prog>.cmd"),
        Arg::new("cmdfile")
            .short('F')
            .long("cmdfile")
            .value_name("FILE")
            .value_parser(clap::value_parser!(PathBuf))
            .help("Log the command line to FILE"),
        Arg::new("inmap")
            .long("inmap")
            .value_name("KEY=EXPR,...")
            .help("Override input bindings"),
        Arg::new("outmap")
            .long("outmap")
            .value_name("KEY=EXPR,...")
            .help("Override output bindings"),
        switch("info", Some('I'), "Print the execution plan and exit"),
    ]
}

/// Build the command for a tool
///
/// Fails with `OptionConflict` when two options share a short letter or a
/// flag parameter shadows a run option.
pub fn command(
    prog: &str,
    about: Option<&str>,
    usage: &str,
    params: &[FlagParam],
) -> Result<Command> {
    let mut cmd = Command::new(prog.to_string())
        .override_usage(usage.to_string())
        .args(reserved_args());
    if let Some(about) = about {
        cmd = cmd.about(about.to_string());
    }
    for &(id, help) in INFO_SWITCHES {
        cmd = cmd.arg(switch(id, None, help));
    }
    let mut group: Vec<&str> = INFO_SWITCHES.iter().map(|(id, _)| *id).collect();
    group.push("info");
    cmd = cmd.group(ArgGroup::new("info-switch").args(group).multiple(false));

    let mut shorts: FxHashSet<char> = RESERVED_SHORT.iter().copied().collect();
    let mut longs: FxHashSet<String> = RESERVED_LONG.iter().map(|s| s.to_string()).collect();
    longs.extend(INFO_SWITCHES.iter().map(|(id, _)| id.to_string()));
    for param in params {
        let conflict = |option: String| BindError::OptionConflict {
            option,
            param: param.name.clone(),
        };
        if !longs.insert(param.long()) {
            return Err(conflict(format!("--{}", param.long())));
        }
        if let Some(c) = param.short {
            if !shorts.insert(c) {
                return Err(conflict(format!("-{}", c)));
            }
        }
        cmd = cmd.arg(param.to_arg());
    }

    Ok(cmd.arg(
        Arg::new("args")
            .num_args(0..)
            .allow_negative_numbers(true)
            .action(ArgAction::Append)
            .value_name("ARGS"),
    ))
}

/// Parse a command line (without the program name)
pub fn parse<I, T>(cmd: Command, prog: &str, params: &[FlagParam], argv: I) -> Result<Parsed>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let argv = std::iter::once(prog.to_string()).chain(argv.into_iter().map(Into::into));
    let matches = cmd.try_get_matches_from(argv)?;

    let flag = |id: &str| matches.get_flag(id);
    let choose = |on: &str, off: &str| match (flag(on), flag(off)) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };

    let cmd_log = match matches.get_one::<PathBuf>("cmdfile") {
        Some(path) => Some(path.clone()),
        None => flag("cmd").then(|| PathBuf::from(format!("{}.cmd", prog))),
    };

    let settings = Settings {
        overwrite: choose("overwrite", "no-overwrite").map(|on| {
            if on {
                OverwritePolicy::Always
            } else {
                OverwritePolicy::Never
            }
        }),
        bar: choose("bar", "no-bar"),
        insep: matches.get_one::<String>("insep").cloned(),
        outsep: matches.get_one::<String>("outsep").cloned(),
        omit_missing: choose("omit-missing", "no-omit-missing"),
        must_exist: flag("must-exist").then_some(true),
        timings: flag("timings").then_some(true),
        cmd_log,
    };

    let info = std::iter::once("info")
        .chain(INFO_SWITCHES.iter().map(|(id, _)| *id))
        .find(|id| flag(*id))
        .and_then(Info::from_switch);

    let flags = params
        .iter()
        .filter_map(|p| p.value_of(&matches).map(|v| (p.name.clone(), v)))
        .collect();

    Ok(Parsed {
        settings,
        inmap: matches.get_one::<String>("inmap").cloned(),
        outmap: matches.get_one::<String>("outmap").cloned(),
        info,
        flags,
        args: matches
            .get_many::<String>("args")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
    })
}

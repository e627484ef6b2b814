//! bindcli - demo tools built from plain functions

use std::process::ExitCode;

use bindcli::convert::{list_of, Dtype};
use bindcli::{BindError, CallArgs, OutputSource, Outcome, Result, Signature, Tool};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "bindcli")]
#[command(about = "Plain functions wrapped as command-line tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add up numbers given as arguments
    #[command(disable_help_flag = true)]
    Sum {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Mean of the numbers on standard input (one per line)
    #[command(disable_help_flag = true)]
    Mean {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Join the fields of each standard-input line
    #[command(disable_help_flag = true)]
    Paste {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Multiply dataset `data` of each input file into the paired output file
    #[command(disable_help_flag = true)]
    Scale {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn numbers(value: Option<&Value>) -> Vec<f64> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default()
}

fn sum_tool() -> Result<Tool> {
    Tool::builder("sum", |args: &CallArgs| {
        let start = args.get("start").and_then(Value::as_f64).unwrap_or(0.0);
        let total: f64 = args.var_args().iter().filter_map(Value::as_f64).sum();
        Ok(Outcome::Single(json!(start + total)))
    })
    .about("Add up numbers given as arguments")
    .signature(Signature::new().param_with_default("start", json!(0.0)).var_args("values"))
    .input("values", "$@")
    .preproc("values", list_of(Dtype::Float))
    .build()
}

fn mean_tool() -> Result<Tool> {
    Tool::builder("mean", |args: &CallArgs| {
        let values = numbers(args.get("values"));
        if values.is_empty() {
            return Err(BindError::invocation("no numbers on standard input"));
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Ok(Outcome::Tuple(vec![json!(mean), json!(values.len())]))
    })
    .about("Mean of the numbers on standard input (one per line)")
    .signature(Signature::new().param("values"))
    .input("values", "#@/0")
    .output(0usize, "#0/0")
    .output(1usize, "#0/1")
    .preproc("values", list_of(Dtype::Float))
    .build()
}

fn paste_tool() -> Result<Tool> {
    Tool::builder("paste", |args: &CallArgs| {
        let glue = args.get("glue").and_then(Value::as_str).unwrap_or_default();
        let fields: Vec<&str> = args
            .get("fields")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        Ok(Outcome::Single(Value::String(fields.join(glue))))
    })
    .about("Join the fields of each standard-input line")
    .signature(Signature::new().param("fields").param_with_default("glue", json!("")))
    .input("fields", "#0")
    .output(0usize, "#0")
    .preproc("fields", list_of(Dtype::Str))
    .build()
}

fn scale_tool() -> Result<Tool> {
    Tool::builder("scale", |args: &CallArgs| {
        let factor = args.get("factor").and_then(Value::as_f64).unwrap_or(1.0);
        let scaled: Vec<f64> = numbers(args.get("data")).iter().map(|v| v * factor).collect();
        Ok(Outcome::Single(json!(scaled)))
    })
    .about("Multiply dataset `data` of each input file into the paired output file")
    .signature(Signature::new().param("data").param_with_default("factor", json!(2.0)))
    .input("data", "$0/data")
    .output(0usize, "%0/data")
    .output(OutputSource::Date, "%0/created")
    .build()
}

/// `<tool>: <error>`, the same shape `Tool::execute` reports with
fn failure_line(name: &str, e: &BindError) -> String {
    format!("{}: {}", name.red().bold(), e)
}

fn main() -> ExitCode {
    bindcli::init_tracing();

    let cli = Cli::parse();
    let (name, tool, args) = match cli.command {
        Commands::Sum { args } => ("sum", sum_tool(), args),
        Commands::Mean { args } => ("mean", mean_tool(), args),
        Commands::Paste { args } => ("paste", paste_tool(), args),
        Commands::Scale { args } => ("scale", scale_tool(), args),
    };

    match tool {
        Ok(tool) => tool.execute(args),
        Err(e) => {
            eprintln!("{}", failure_line(name, &e));
            ExitCode::from(1)
        }
    }
}

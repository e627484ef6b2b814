//! # End-to-end scenarios against the library
//!
//! ## Test Categories
//!
//! 1. Plan scenarios - mappings → cardinalities → mode
//! 2. Execution scenarios - in-memory store, injected standard streams
//! 3. JSON-file store - real files in a temp directory, overwrite prompt

use bindcli::binding::resolve_inmap;
use bindcli::call::ValueFn;
use bindcli::plan::{theoretical_input_count, theoretical_output_count};
use bindcli::store::Answer;
use bindcli::{
    BindError, Cardinality, CallArgs, DatasetStore, ExecMode, InputMapping, Io, JsonFileStore,
    MemoryStore, OutputMapping, OutputSource, Outcome, OverwritePolicy, Plan, Result, Signature,
    Tool,
};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// TEST HELPERS
// ============================================================================

fn run(tool: &Tool, argv: &[&str], stdin: &str, store: &dyn DatasetStore) -> Result<String> {
    let mut out = Vec::new();
    {
        let mut io = Io::new(Cursor::new(stdin.to_string()), &mut out);
        tool.run_from(argv.iter().copied(), &mut io, store)?;
    }
    Ok(String::from_utf8(out).unwrap())
}

fn identity_tool(calls: Arc<AtomicUsize>) -> bindcli::ToolBuilder {
    Tool::builder("id", move |args: &CallArgs| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Outcome::Single(args.positional[0].clone()))
    })
    .signature(Signature::new().param("x"))
    .overwrite(OverwritePolicy::Always)
}

// ============================================================================
// 1. PLAN SCENARIOS
// ============================================================================

#[test]
fn required_and_flag_parameters_run_once() {
    let sig = Signature::new().param("x").param_with_default("y", json!(1));
    let inmap = resolve_inmap(InputMapping::new(), &sig).unwrap();
    assert_eq!(inmap.get("x").map(ToString::to_string).as_deref(), Some("$0"));
    assert!(inmap.get("y").is_none());

    let plan = Plan::analyze(&inmap, &OutputMapping::new(), false).unwrap();
    assert_eq!((plan.tnin, plan.tnout), (Cardinality::Finite(1), Cardinality::Finite(0)));
    assert_eq!(plan.mode, ExecMode::AllAtOnce);
}

#[test]
fn auto_assigned_required_parameters_count_inputs() {
    for k in 1..5 {
        let sig = (0..k).fold(Signature::new(), |s, i| s.param(format!("p{}", i)));
        let inmap = resolve_inmap(InputMapping::new(), &sig).unwrap();
        assert_eq!(theoretical_input_count(&inmap, false), Cardinality::Finite(k));
    }
}

#[test]
fn write_back_to_all_inputs_has_no_output_slots() {
    let outmap = OutputMapping::parse([(0usize, "$@/result"), (1usize, "#0")]).unwrap();
    assert_eq!(theoretical_output_count(&outmap, false), Cardinality::Finite(0));
    assert_eq!(theoretical_output_count(&outmap, true), Cardinality::Finite(0));
}

#[test]
fn paired_files_without_subpath_plan_sequential() {
    let inmap = InputMapping::parse([("x", "$0")]).unwrap();
    let outmap = OutputMapping::parse([(0usize, "%0")]).unwrap();
    let plan = Plan::analyze(&inmap, &outmap, false).unwrap();
    assert!(plan.indep);
    assert_eq!(plan.mode, ExecMode::Sequential);
}

#[test]
fn cross_referencing_bindings_cannot_run_in_parallel() {
    let inmap = InputMapping::parse([("x", "$0"), ("y", "$1")]).unwrap();
    let err = Plan::analyze(&inmap, &OutputMapping::new(), true).unwrap_err();
    assert!(err.is_configuration());
}

// ============================================================================
// 2. EXECUTION SCENARIOS
// ============================================================================

#[test]
fn aggregate_over_all_files_writes_back_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Value::Null));
    let (c, s) = (calls.clone(), seen.clone());
    let tool = Tool::builder("norm", move |args: &CallArgs| {
        c.fetch_add(1, Ordering::SeqCst);
        let x = args.positional[0].clone();
        *s.lock().unwrap() = x.clone();
        let total: f64 = x.as_array().into_iter().flatten().filter_map(Value::as_f64).sum();
        let shares: Vec<Value> = x
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_f64)
            .map(|v| json!(v / total))
            .collect();
        Ok(Outcome::Single(Value::Array(shares)))
    })
    .signature(Signature::new().param("x"))
    .input("x", "$@/data")
    .output(0usize, "$@/result")
    .overwrite(OverwritePolicy::Always)
    .build()
    .unwrap();

    let store = MemoryStore::new()
        .with("a", "data", json!(1.0))
        .with("b", "data", json!(3.0));
    assert_eq!(run(&tool, &["a", "b"], "", &store).unwrap(), "");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*seen.lock().unwrap(), json!([1.0, 3.0]));
    assert_eq!(store.get("a", "result").unwrap(), json!(0.25));
    assert_eq!(store.get("b", "result").unwrap(), json!(0.75));
}

#[test]
fn paired_files_invoke_once_per_pair() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tool = identity_tool(calls.clone())
        .input("x", "$0")
        .output(0usize, "%0/source")
        .build()
        .unwrap();
    let store = MemoryStore::new();
    run(&tool, &["i1", "i2", "i3", "o1", "o2", "o3"], "", &store).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(store.get("o2", "source").unwrap(), json!("i2"));
}

#[test]
fn omit_missing_collects_what_exists() {
    let tool = Tool::builder("count", |args: &CallArgs| {
        Ok(Outcome::Single(json!(args.positional[0].as_array().map_or(0, Vec::len))))
    })
    .signature(Signature::new().param("x"))
    .input("x", "$@/data")
    .output(0usize, "#0")
    .omit_missing(true)
    .build()
    .unwrap();
    let store = MemoryStore::new().with("a", "data", json!(1));
    store.create("b");
    assert_eq!(run(&tool, &["a", "b"], "", &store).unwrap(), "1\n");
}

#[test]
fn missing_dataset_is_fatal_without_omit() {
    let tool = identity_tool(Arc::default())
        .input("x", "$@/data")
        .output(0usize, "#0")
        .build()
        .unwrap();
    let store = MemoryStore::new().with("a", "data", json!(1));
    store.create("b");
    let err = run(&tool, &["a", "b"], "", &store).unwrap_err();
    assert!(matches!(err, BindError::MissingDataset { .. }));
}

#[test]
fn tuple_result_fills_one_row_of_cells() {
    let tool = Tool::builder("divmod", |args: &CallArgs| {
        let a = args.positional[0].as_str().unwrap_or("0").parse::<i64>().unwrap_or(0);
        let b = args.positional[1].as_str().unwrap_or("1").parse::<i64>().unwrap_or(1);
        Ok(Outcome::Tuple(vec![json!(a / b), json!(a % b)]))
    })
    .signature(Signature::new().param("a").param("b"))
    .stdout_sep("\t")
    .build()
    .unwrap();
    assert_eq!(run(&tool, &["17", "5"], "", &MemoryStore::new()).unwrap(), "3\t2\n");
}

#[test]
fn element_wise_postprocessing() {
    let times_ten: ValueFn = Arc::new(|v: Value| Ok(json!(v.as_i64().unwrap_or(0) * 10)));
    let tool = Tool::builder("pair", |_: &CallArgs| Ok(Outcome::Tuple(vec![json!(2), json!("x")])))
        .postproc_each(vec![Some(times_ten)])
        .output(0usize, "#0/0")
        .output(1usize, "#0/1")
        .build()
        .unwrap();
    assert_eq!(run(&tool, &[], "", &MemoryStore::new()).unwrap(), "20 x\n");
}

#[test]
fn stream_columns_and_pass_through_sources() {
    let tool = Tool::builder("swap", |args: &CallArgs| {
        Ok(Outcome::Single(args.positional[1].clone()))
    })
    .signature(Signature::new().param("a").param("b"))
    .input("a", "#0/0")
    .input("b", "#0/1")
    .output(0usize, "#0/0")
    .output("a", "#0/1")
    .build()
    .unwrap();
    let out = run(&tool, &[], "1 2\n3 4\n", &MemoryStore::new()).unwrap();
    assert_eq!(out, "2 1\n4 3\n");
}

#[test]
fn blank_stream_line_yields_empty_cell() {
    let tool = identity_tool(Arc::default()).input("x", "#@/0").build().unwrap();
    let out = run(&tool, &["--info-indata"], "1\n\n2\n", &MemoryStore::new()).unwrap();
    assert_eq!(out, "{\"x\":[\"1\",\"\",\"2\"]}\n");
}

#[test]
fn suppressed_output_prints_nothing() {
    let tool = identity_tool(Arc::default())
        .input("x", "#0")
        .output(0usize, "null")
        .build()
        .unwrap();
    assert_eq!(run(&tool, &[], "a\nb\n", &MemoryStore::new()).unwrap(), "");
}

#[test]
fn outmap_override_removes_derived_output() {
    let tool = identity_tool(Arc::default()).build().unwrap();
    let out = run(&tool, &["--outmap", "0=", "hello"], "", &MemoryStore::new()).unwrap();
    assert_eq!(out, "");
}

#[test]
fn insufficient_stream_data_is_fatal() {
    let tool = identity_tool(Arc::default())
        .input("x", "#3")
        .output(0usize, "#0")
        .build()
        .unwrap();
    let err = run(&tool, &[], "only\n", &MemoryStore::new()).unwrap_err();
    assert!(matches!(err, BindError::InsufficientStreamData { .. }));
}

#[test]
fn info_predata_shows_defaults_flags_and_loaded() {
    let tool = Tool::builder("f", |_: &CallArgs| Ok(Outcome::None))
        .signature(Signature::new().param("x").param_with_default("n", json!(2)))
        .build()
        .unwrap();
    let out = run(&tool, &["--info-predata", "-n", "5", "tok"], "", &MemoryStore::new()).unwrap();
    assert_eq!(out, "{\"n\":5,\"x\":\"tok\"}\n");
}

#[test]
fn all_and_output_scope_conflict() {
    let err = Tool::builder("bad", |_: &CallArgs| Ok(Outcome::None))
        .output(0usize, "$@/a")
        .output(1usize, "%0/b")
        .build()
        .err();
    assert!(err.is_some_and(|e| e.is_configuration()));
}

#[test]
fn unknown_output_source_fails() {
    let tool = Tool::builder("f", |_: &CallArgs| Ok(Outcome::Single(json!(1))))
        .output(OutputSource::from("ghost"), "#0")
        .build()
        .unwrap();
    let err = run(&tool, &[], "", &MemoryStore::new()).unwrap_err();
    assert!(matches!(err, BindError::UnknownSource { .. }));
}

// ============================================================================
// 3. JSON-FILE STORE
// ============================================================================

#[test]
fn json_files_round_trip_through_tool() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.json");
    std::fs::write(&input, r#"{"group": {"values": [1, 2, 3]}}"#).unwrap();
    let output = dir.path().join("out.json");

    let tool = Tool::builder("total", |args: &CallArgs| {
        let total: i64 = args.positional[0]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_i64)
            .sum();
        Ok(Outcome::Single(json!(total)))
    })
    .signature(Signature::new().param("values"))
    .input("values", "$0/group/values")
    .output(0usize, "%0/stats/total")
    .output(OutputSource::Duration, "%0/stats/seconds")
    .overwrite(OverwritePolicy::Never)
    .build()
    .unwrap();

    let i = input.to_string_lossy().to_string();
    let o = output.to_string_lossy().to_string();
    run(&tool, &[i.as_str(), o.as_str()], "", &JsonFileStore::new()).unwrap();
    let written: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["stats"]["total"], json!(6));
    assert!(written["stats"]["seconds"].is_f64());

    let err = run(&tool, &[i.as_str(), o.as_str()], "", &JsonFileStore::new()).unwrap_err();
    assert!(matches!(err, BindError::DatasetExists { .. }));
}

#[test]
fn prompt_declined_keeps_dataset() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("f.json");
    std::fs::write(&file, r#"{"x": "old"}"#).unwrap();
    let path = file.to_string_lossy().to_string();

    let tool = Tool::builder("put", |_: &CallArgs| Ok(Outcome::Single(json!("new"))))
        .output(0usize, "%0/x")
        .overwrite(OverwritePolicy::Prompt)
        .build()
        .unwrap();

    let mut prompts = Vec::new();
    let mut out = Vec::new();
    {
        let mut io = Io::new(Cursor::new(""), &mut out).with_confirm(|p: &str| -> Result<Answer> {
            prompts.push(p.to_string());
            Ok(Answer::No)
        });
        tool.run_from([path.as_str()], &mut io, &JsonFileStore::new()).unwrap();
    }
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("put: overwrite"));
    let kept: Value = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(kept["x"], json!("old"));
}

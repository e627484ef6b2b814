//! Quick benchmark of binding parsing and plan analysis

use bindcli::binding::{parse_binding, resolve_inmap, InputMapping, OutputMapping};
use bindcli::runtime::OutputGrid;
use bindcli::{Plan, Signature};
use serde_json::json;
use std::time::Instant;

const ITERATIONS: usize = 100_000;

fn report(label: &str, start: Instant) {
    let elapsed = start.elapsed();
    println!(
        "{:<28} {:>10.2?} total  {:>8.0} ns/iter",
        label,
        elapsed,
        elapsed.as_nanos() as f64 / ITERATIONS as f64
    );
}

fn main() {
    let exprs = ["$0", "$@/group/data", "%1/result", "#0/2", "#@", "[1, 2, 3]", "plain"];

    println!("Binding Performance Test");
    println!("========================\n");

    let start = Instant::now();
    for i in 0..ITERATIONS {
        let _ = parse_binding(exprs[i % exprs.len()]);
    }
    report("parse_binding", start);

    let sig = Signature::new()
        .param("a")
        .param("b")
        .param("c")
        .param_with_default("scale", json!(1.0));
    let start = Instant::now();
    for _ in 0..ITERATIONS {
        let _ = resolve_inmap(InputMapping::new(), &sig);
    }
    report("resolve_inmap (3 required)", start);

    let inmap = InputMapping::parse([("x", "$0/data"), ("y", "#0/1")]).unwrap_or_default();
    let outmap = OutputMapping::parse([(0usize, "%0/out")]).unwrap_or_default();
    let start = Instant::now();
    for _ in 0..ITERATIONS {
        let _ = Plan::analyze(&inmap, &outmap, false);
    }
    report("Plan::analyze", start);

    let start = Instant::now();
    for i in 0..ITERATIONS / 100 {
        let mut grid = OutputGrid::new();
        for row in 0..100 {
            let _ = grid.set_cell(row, i % 4, &json!(row));
        }
        let _ = grid.lines(" ");
    }
    report("OutputGrid 100 rows", start);
}

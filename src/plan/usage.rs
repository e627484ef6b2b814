//! Usage line derived from the mappings
//!
//! `<prog> [options] <inputs> <outputs>`, e.g.
//! `scale [options] [INPUT_FILE_1 [INPUT_FILE_2 [...]]] OUTPUT_FILE`.

use std::collections::BTreeMap;

use crate::binding::{Binding, InputMapping, OutputMapping, Scope, Slot};

const FILES: &str = "[FILE_1 [FILE_2 [...]]]";
const INPUT_FILES: &str = "[INPUT_FILE_1 [INPUT_FILE_2 [...]]]";
const OUTPUT_FILES: &str = "[OUTPUT_FILE_1 [OUTPUT_FILE_2 [...]]]";

fn repeated(name: &str) -> String {
    let upper = name.to_uppercase();
    format!("[{0}_1 [{0}_2 [...]]]", upper)
}

fn is_input(b: &Binding, slot: Slot, with_subpath: bool) -> bool {
    b.arg().is_some_and(|a| {
        a.scope == Scope::Input && a.slot == slot && a.has_subpath() == with_subpath
    })
}

/// Name of the alphabetically first parameter bound exactly to `slot`
fn plain_param(inmap: &InputMapping, slot: Slot) -> Option<&str> {
    inmap
        .iter()
        .filter(|(_, b)| is_input(b, slot, false))
        .map(|(name, _)| name)
        .min()
}

fn input_part(inmap: &InputMapping, outmap: &OutputMapping, indep: bool) -> String {
    let slot = if indep { Slot::Index(0) } else { Slot::All };
    if inmap.bindings().any(|b| is_input(b, slot, true)) {
        return if outmap.bindings().any(|b| is_input(b, slot, true)) {
            FILES.to_string()
        } else {
            INPUT_FILES.to_string()
        };
    }
    if let Some(name) = plain_param(inmap, slot) {
        return repeated(name);
    }
    if indep {
        return String::new();
    }

    // one word per referenced input slot
    let mut slots: BTreeMap<usize, String> = BTreeMap::new();
    let mut names: Vec<(&str, &Binding)> = inmap.iter().collect();
    names.sort_by_key(|(name, _)| *name);
    for (name, binding) in names {
        let Some(arg) = binding.arg().filter(|a| a.scope == Scope::Input) else {
            continue;
        };
        let Some(index) = arg.index() else { continue };
        let word = if arg.has_subpath() {
            let written_back = outmap.bindings().any(|b| is_input(b, Slot::Index(index), true));
            let word = if written_back { "FILE" } else { "INPUT_FILE" };
            word.to_string()
        } else {
            name.to_uppercase()
        };
        slots.entry(index).or_insert(word);
    }
    slots.into_values().collect::<Vec<_>>().join(" ")
}

fn output_part(outmap: &OutputMapping, indep: bool) -> String {
    let file_args: Vec<_> = outmap
        .bindings()
        .filter_map(|b| b.arg())
        .filter(|a| a.scope == Scope::Output && a.has_subpath())
        .collect();
    if file_args.is_empty() {
        return String::new();
    }
    if indep || file_args.iter().any(|a| a.is_all()) {
        return OUTPUT_FILES.to_string();
    }
    let mut indices: Vec<usize> = file_args.iter().filter_map(|a| a.index()).collect();
    indices.sort_unstable();
    indices.dedup();
    match indices.len() {
        1 => "OUTPUT_FILE".to_string(),
        _ => indices
            .iter()
            .map(|i| format!("OUTPUT_FILE_{}", i))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Usage line for `prog`
pub fn auto_usage(prog: &str, inmap: &InputMapping, outmap: &OutputMapping, indep: bool) -> String {
    let parts: Vec<String> = [input_part(inmap, outmap, indep), output_part(outmap, indep)]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        format!("{} [options]", prog)
    } else {
        format!("{} [options] {}", prog, parts.join(" "))
    }
}

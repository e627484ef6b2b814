//! Cardinality & Independence Analyzer
//!
//! Derives from the mappings alone how many input/output arguments an
//! invocation needs, and whether the function may run once per chunk.

use std::fmt;

use crate::binding::{Binding, InputMapping, OutputMapping, Scope, Slot};

/// Number of argument slots a mapping demands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Finite(usize),
    Unbounded,
}

impl Cardinality {
    pub fn finite(self) -> Option<usize> {
        match self {
            Cardinality::Finite(n) => Some(n),
            Cardinality::Unbounded => None,
        }
    }

    pub fn is_zero(self) -> bool {
        self == Cardinality::Finite(0)
    }

    pub fn is_unbounded(self) -> bool {
        self == Cardinality::Unbounded
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Finite(n) => write!(f, "{}", n),
            Cardinality::Unbounded => write!(f, "inf"),
        }
    }
}

fn max_index<'a>(bindings: impl Iterator<Item = &'a Binding>, scope: Scope) -> Option<usize> {
    bindings
        .filter_map(|b| b.arg())
        .filter(|a| a.scope == scope)
        .filter_map(|a| a.index())
        .max()
}

/// Input argument slots demanded by the input mapping
pub fn theoretical_input_count(inmap: &InputMapping, indep: bool) -> Cardinality {
    if inmap.bindings().any(|b| b.is_all_of(Scope::Input)) {
        return Cardinality::Unbounded;
    }
    if !inmap.bindings().any(|b| b.in_scope(Scope::Input)) {
        return Cardinality::Finite(0);
    }
    if indep {
        return Cardinality::Unbounded;
    }
    Cardinality::Finite(max_index(inmap.bindings(), Scope::Input).map_or(0, |m| m + 1))
}

/// Output argument slots demanded by the output mapping
///
/// Writing back into all input files (`$@/path`) consumes no output slot.
pub fn theoretical_output_count(outmap: &OutputMapping, indep: bool) -> Cardinality {
    if outmap.bindings().any(|b| b.is_all_of(Scope::Output)) {
        return Cardinality::Unbounded;
    }
    if outmap
        .bindings()
        .any(|b| b.is_all_with_subpath(Scope::Input))
    {
        return Cardinality::Finite(0);
    }
    if indep && outmap.bindings().any(|b| b.in_scope(Scope::Output)) {
        return Cardinality::Unbounded;
    }
    Cardinality::Finite(max_index(outmap.bindings(), Scope::Output).map_or(0, |m| m + 1))
}

/// Whether the function can run once per input/output chunk
///
/// False as soon as a binding spans every slot of a scope, references a slot
/// past the first, or was filled in automatically for a required parameter.
pub fn independence(inmap: &InputMapping, outmap: &OutputMapping) -> bool {
    if inmap.has_auto_input() {
        return false;
    }
    for arg in inmap.bindings().chain(outmap.bindings()).filter_map(|b| b.arg()) {
        if arg.slot == Slot::All {
            return false;
        }
        if arg.scope == Scope::Output && !arg.has_subpath() {
            continue;
        }
        if arg.index().is_some_and(|i| i >= 1) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::resolve_inmap;
    use crate::signature::Signature;
    use serde_json::json;

    fn inmap(pairs: &[(&str, &str)]) -> InputMapping {
        InputMapping::parse(pairs.iter().copied()).unwrap()
    }

    fn outmap(pairs: &[(usize, &str)]) -> OutputMapping {
        OutputMapping::parse(pairs.iter().copied()).unwrap()
    }

    // ═══════════════════════════════════════════════════════════════
    // Independence
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn empty_mapping_is_independent() {
        assert!(independence(&InputMapping::new(), &OutputMapping::new()));
    }

    #[test]
    fn index_one_makes_dependent() {
        assert!(!independence(&inmap(&[("x", "$1")]), &OutputMapping::new()));
        assert!(!independence(&InputMapping::new(), &outmap(&[(0, "%1/r")])));
        assert!(!independence(&inmap(&[("x", "#1")]), &OutputMapping::new()));
    }

    #[test]
    fn all_binding_makes_dependent() {
        assert!(!independence(&inmap(&[("x", "$@/d")]), &OutputMapping::new()));
        assert!(!independence(&InputMapping::new(), &outmap(&[(0, "#@")])));
    }

    #[test]
    fn declared_first_slot_is_independent() {
        assert!(independence(&inmap(&[("x", "$0")]), &outmap(&[(0, "%0/r")])));
    }

    #[test]
    fn auto_assigned_required_is_dependent() {
        let sig = Signature::new().param("x").param_with_default("y", json!(1));
        let map = resolve_inmap(InputMapping::new(), &sig).unwrap();
        assert!(!independence(&map, &OutputMapping::new()));
    }

    // ═══════════════════════════════════════════════════════════════
    // Counts
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn input_count_for_required_params() {
        let sig = Signature::new().param("a").param("b").param("c");
        let map = resolve_inmap(InputMapping::new(), &sig).unwrap();
        assert_eq!(theoretical_input_count(&map, false), Cardinality::Finite(3));
    }

    #[test]
    fn input_count_unbounded_for_all() {
        assert_eq!(
            theoretical_input_count(&inmap(&[("x", "$@/d")]), false),
            Cardinality::Unbounded
        );
        assert_eq!(
            theoretical_input_count(&inmap(&[("x", "$@")]), false),
            Cardinality::Unbounded
        );
    }

    #[test]
    fn input_count_zero_without_input_scope() {
        assert_eq!(
            theoretical_input_count(&inmap(&[("x", "#0"), ("n", "3")]), true),
            Cardinality::Finite(0)
        );
    }

    #[test]
    fn independent_input_is_unbounded() {
        assert_eq!(
            theoretical_input_count(&inmap(&[("x", "$0")]), true),
            Cardinality::Unbounded
        );
    }

    #[test]
    fn output_count_zero_when_writing_back() {
        let map = outmap(&[(0, "$@/result"), (1, "#0")]);
        assert_eq!(theoretical_output_count(&map, false), Cardinality::Finite(0));
        assert_eq!(theoretical_output_count(&map, true), Cardinality::Finite(0));
    }

    #[test]
    fn output_count_from_max_index() {
        let map = outmap(&[(0, "%0/a"), (1, "%2/b"), (2, "#0")]);
        assert_eq!(theoretical_output_count(&map, false), Cardinality::Finite(3));
        assert_eq!(
            theoretical_output_count(&outmap(&[(0, "%@/a")]), false),
            Cardinality::Unbounded
        );
    }

    #[test]
    fn independent_output_is_unbounded() {
        assert_eq!(
            theoretical_output_count(&outmap(&[(0, "%0/r")]), true),
            Cardinality::Unbounded
        );
        assert_eq!(
            theoretical_output_count(&outmap(&[(0, "#0")]), true),
            Cardinality::Finite(0)
        );
    }
}

//! Mapping Resolver - completes the declared mappings
//!
//! Input side (before any data is touched):
//! 1. Required parameters without a binding get `$<position>` in declaration order
//! 2. `*args` gets `$@` when there are no fixed parameters
//! 3. `**kwargs` gets `$0` when there are no fixed or variadic parameters
//!
//! Output side (after the first invocation): an empty output mapping is filled
//! from the shape of the result.

use tracing::debug;

use super::expr::{ArgRef, Binding, Scope, Slot};
use super::mapping::{InputMapping, OutputMapping, OutputSource};
use crate::call::Outcome;
use crate::error::{BindError, Result};
use crate::signature::Signature;

/// Fill in bindings for required and variadic parameters
pub fn resolve_inmap(mut inmap: InputMapping, sig: &Signature) -> Result<InputMapping> {
    for (ind, name) in sig.required().into_iter().enumerate() {
        if inmap.contains(name) {
            continue;
        }
        let claimed = inmap.bindings().any(|b| {
            b.arg()
                .is_some_and(|a| a.scope == Scope::Input && a.slot == Slot::Index(ind))
        });
        if claimed {
            return Err(BindError::DuplicateBinding {
                param: name.to_string(),
                slot: format!("${}", ind),
            });
        }
        debug!(param = name, slot = ind, "auto-assigned required parameter");
        inmap.insert_auto_required(name, ArgRef::new(Scope::Input, Slot::Index(ind)).into());
    }

    if let Some(name) = sig.var_args_name() {
        if !inmap.contains(name)
            && !sig.has_fixed_params()
            && !inmap.bindings().any(|b| b.is_all_of(Scope::Input))
        {
            debug!(param = name, "bound variadic positional slot to $@");
            inmap.insert(name, ArgRef::new(Scope::Input, Slot::All).into());
        }
    }

    if let Some(name) = sig.var_kwargs_name() {
        let zero_claimed = inmap.bindings().any(|b| {
            b.arg()
                .is_some_and(|a| a.scope == Scope::Input && a.slot == Slot::Index(0))
        });
        if !inmap.contains(name)
            && !sig.has_fixed_params()
            && sig.var_args_name().is_none()
            && !zero_claimed
        {
            debug!(param = name, "bound variadic keyword slot to $0");
            inmap.insert_auto_required(name, ArgRef::new(Scope::Input, Slot::Index(0)).into());
        }
    }

    validate_inmap(&inmap)?;
    Ok(inmap)
}

/// Reject bindings that make no sense on the input side
pub fn validate_inmap(inmap: &InputMapping) -> Result<()> {
    for (name, binding) in inmap.iter() {
        if binding.in_scope(Scope::Output) {
            return Err(BindError::configuration(format!(
                "output binding '{}' of '{}' is not allowed in the input mapping",
                binding, name
            )));
        }
    }
    Ok(())
}

/// Reject bindings that make no sense on the output side
///
/// A `null` literal suppresses the output and is accepted. Any other literal
/// has nowhere to go.
pub fn validate_outmap(outmap: &OutputMapping) -> Result<()> {
    for (source, binding) in outmap.iter() {
        match binding {
            Binding::Literal(v) if v.is_null() => {}
            Binding::Literal(v) => {
                return Err(BindError::configuration(format!(
                    "output {} is bound to the literal {}, expecting $, % or # binding",
                    source, v
                )))
            }
            Binding::Arg(a) if a.scope != Scope::Stream && !a.has_subpath() => {
                return Err(BindError::configuration(format!(
                    "output binding '{}' needs a dataset path",
                    a
                )))
            }
            Binding::Arg(_) => {}
        }
    }

    let distributes_to_inputs = outmap
        .bindings()
        .any(|b| b.is_all_with_subpath(Scope::Input));
    if distributes_to_inputs && outmap.bindings().any(|b| b.in_scope(Scope::Output)) {
        return Err(BindError::configuration(
            "writing back to all input files cannot be combined with output file bindings",
        ));
    }
    Ok(())
}

/// Fill an empty output mapping from the shape of the result
///
/// A tuple of `n` values becomes `n` cells of the first standard output line,
/// a single value becomes the whole line. `None` leaves the mapping alone.
pub fn auto_outmap(outmap: &mut OutputMapping, outcome: &Outcome) {
    if !outmap.is_empty() {
        return;
    }
    match outcome {
        Outcome::None => {}
        Outcome::Single(_) => {
            outmap.insert(
                OutputSource::Index(0),
                ArgRef::new(Scope::Stream, Slot::Index(0)).into(),
            );
        }
        Outcome::Tuple(values) => {
            for i in 0..values.len() {
                outmap.insert(
                    OutputSource::Index(i),
                    ArgRef::new(Scope::Stream, Slot::Index(0))
                        .with_subpath(i.to_string())
                        .into(),
                );
            }
        }
    }
    if !outmap.is_empty() {
        debug!(outmap = %outmap.to_value(), "derived output mapping from result");
    }
}

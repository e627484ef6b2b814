//! Binding Module - where parameters come from and results go to
//!
//! - `expr`: binding expressions (`$0/data`, `%@/result`, `#0/2`, literals)
//! - `mapping`: mapping tables and the `--inmap/--outmap` override syntax
//! - `resolve`: auto-fill of required/variadic parameters and result outputs
//!
//! Data flow:
//! ```text
//! declared mapping + --inmap overrides
//!                 ↓
//!        resolve_inmap (Signature)
//!                 ↓
//!   InputMapping → cardinality / mode / partition
//!                 ↓
//!          invocation result
//!                 ↓
//!   auto_outmap + --outmap overrides → OutputMapping
//! ```

mod expr;
mod mapping;
mod resolve;

pub use expr::{extract_index, parse_binding, parse_literal, ArgRef, Binding, Scope, Slot};
pub use mapping::{parse_overrides, InputMapping, OutputMapping, OutputSource};
pub use resolve::{auto_outmap, resolve_inmap, validate_inmap, validate_outmap};

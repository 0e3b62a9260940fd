// SPDX-License-Identifier: MIT OR Apache-2.0

//! relay-kanren: a symbolic inference engine over an indexed fact base.
//!
//! ENGINE PILLARS:
//! 1. **Terms & substitution**: a tagged-variant value model (atoms,
//!    variables, wildcards, compounds) and the apply/compose/occurs
//!    algebra over it.
//! 2. **Unify & match**: two-sided most-general unification and one-sided
//!    pattern matching, both occurs-checked.
//! 3. **Fact base & rules**: an indexed, insertion-ordered fact set and
//!    safety-validated `when`/`then` rules.
//! 4. **Inference**: forward chaining to a fixed point with configurable
//!    conflict resolution, and a depth-bounded, cycle-checked backward
//!    prover with negation as failure.
//!
//! The [`Engine`] facade ties these together behind a value-oriented API;
//! see its module documentation for the full operation surface.

pub mod backward;
pub mod config;
pub mod engine;
pub mod error;
pub mod factbase;
pub mod forward;
pub mod interner;
pub mod rule;
pub mod subst;
pub mod term;
pub mod unify;

pub use backward::{Proof, ProveOptions};
pub use config::{ConflictResolution, EngineConfig, Strategy};
pub use engine::{Engine, EngineStats, ExplainedProof, TraceEvent};
pub use error::{EngineError, Result};
pub use factbase::FactBase;
pub use forward::{Firing, ForwardReport};
pub use rule::Rule;
pub use subst::Substitution;
pub use term::{Atom, Term, Variable};

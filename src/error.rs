// SPDX-License-Identifier: MIT OR Apache-2.0

//! The engine's error taxonomy (§3.8, §7).
//!
//! Grounded on `beagle-events::error::EventError` (a `thiserror`-derived
//! enum plus a crate-local `Result` alias) for the library-crate error
//! shape. Unify/match failures are never represented here — they are plain
//! `Option::None` values per §7. `DepthLimitExceeded` and
//! `OccursCheckFailure` from the distilled spec's taxonomy are
//! deliberately *not* variants: depth exhaustion is silent, advisory
//! pruning surfaced only through `EngineStats`/trace events, and the
//! occurs check never escapes `unify`/`extend` as an error.

use thiserror::Error;

/// Errors a fallible engine operation can surface (§7).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A fact was not a non-empty compound.
    #[error("fact must be a non-empty compound, got: {0}")]
    NotAFact(String),

    /// A rule's `then` sequence was empty.
    #[error("rule {0:?} has no consequents (`then` must be non-empty)")]
    EmptyConsequents(Option<String>),

    /// A rule had a `then`-variable not bound by any `when`-pattern
    /// (and `when` was non-empty), or `when` was empty and `then` was
    /// not ground (§3.4's safety condition).
    #[error("rule {0:?} is unsafe: variable ?{1} in `then` is not bound by `when`")]
    UnsafeRule(Option<String>, String),

    /// A configuration key was not recognized, or its value was the
    /// wrong shape/out of range for that key (§3.6).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The forward chainer exhausted `max-steps` before reaching a
    /// fixed point (§4.7.1, §7).
    #[error("forward chaining exceeded max-steps ({0}) before reaching a fixed point")]
    StepLimitExceeded(u64),

    /// An internal invariant was violated; this indicates a bug.
    #[error("internal invariant violation: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

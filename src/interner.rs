// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide symbol interner.
//!
//! §3.7 requires two independent, concurrent-read-safe namespaces: one for
//! relation/atom symbols (`:alice`) and one for variable names (`?x`), so
//! that a symbol and a variable sharing spelling never alias. Both are
//! backed by [`lasso::ThreadedRodeo`], which already gives lock-free reads
//! after a spelling has been interned once; interning a brand-new spelling
//! takes its internal exclusive path.

use lasso::{Spur, ThreadedRodeo};
use std::sync::OnceLock;

/// A handle to an interned symbol atom spelling (e.g. `alice` for `:alice`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(Spur);

/// A handle to an interned variable name spelling (e.g. `x` for `?x`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarName(Spur);

struct Interner {
    symbols: ThreadedRodeo,
    vars: ThreadedRodeo,
}

static INTERNER: OnceLock<Interner> = OnceLock::new();

fn interner() -> &'static Interner {
    INTERNER.get_or_init(|| Interner {
        symbols: ThreadedRodeo::new(),
        vars: ThreadedRodeo::new(),
    })
}

/// Intern a symbol atom spelling, returning a stable handle.
pub fn intern_symbol(spelling: &str) -> Symbol {
    Symbol(interner().symbols.get_or_intern(spelling))
}

/// Resolve a previously interned symbol handle back to its spelling.
pub fn resolve_symbol(sym: Symbol) -> &'static str {
    interner().symbols.resolve(&sym.0)
}

/// Intern a variable name spelling (without the leading `?` marker).
pub fn intern_var(spelling: &str) -> VarName {
    VarName(interner().vars.get_or_intern(spelling))
}

/// Resolve a previously interned variable handle back to its spelling.
pub fn resolve_var(name: VarName) -> &'static str {
    interner().vars.resolve(&name.0)
}

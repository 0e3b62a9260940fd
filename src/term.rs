// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terms: the value model of §3.1.
//!
//! A [`Term`] is one of four variants — atom, variable, wildcard, compound —
//! matching the tagged-variant dispatch strategy noted in §9 ("Source uses
//! dynamic dispatch on term shape"). Atoms avoid heap allocation where
//! possible: integers, floats, booleans and null are inline; symbols are
//! interned handles; strings and compounds are reference-counted so cloning
//! a term during substitution/unification is cheap.

use crate::interner::{self, Symbol, VarName};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A floating-point value compared and hashed by bit pattern (§3.1: "Atoms
/// are compared by value... Floating-point atoms compare and hash by bit
/// pattern... rather than by IEEE-754 `==`").
#[derive(Debug, Clone, Copy)]
pub struct FloatBits(pub f64);

impl PartialEq for FloatBits {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatBits {}

impl std::hash::Hash for FloatBits {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for FloatBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The scalar kinds an atom can carry (§3.1).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Atom {
    Symbol(Symbol),
    Int(i64),
    Float(FloatBits),
    Str(Arc<str>),
    Bool(bool),
    Null,
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Symbol(s) => write!(f, ":{}", interner::resolve_symbol(*s)),
            Atom::Int(i) => write!(f, "{}", i),
            Atom::Float(x) => write!(f, "{}", x),
            Atom::Str(s) => write!(f, "{:?}", s.as_ref()),
            Atom::Bool(b) => write!(f, "{}", b),
            Atom::Null => write!(f, "null"),
        }
    }
}

/// A logic variable, identified by an interned name (§3.1). `?x` and `?X`
/// intern to distinct handles because interning is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable(pub VarName);

impl Variable {
    pub fn named(name: &str) -> Self {
        Variable(interner::intern_var(name))
    }

    pub fn name(&self) -> &'static str {
        interner::resolve_var(self.0)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name())
    }
}

/// A recursive term value: atom, variable, wildcard, or compound (§3.1).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Atom(Atom),
    Var(Variable),
    Wildcard,
    /// An ordered finite sequence of terms. `Arc<[Term]>` keeps clones
    /// during substitution cheap; by convention element 0 is the relation
    /// head, but that is a convention of rules/queries, not structure.
    Compound(Arc<[Term]>),
}

impl Term {
    pub fn symbol(spelling: &str) -> Term {
        Term::Atom(Atom::Symbol(interner::intern_symbol(spelling)))
    }

    pub fn int(v: i64) -> Term {
        Term::Atom(Atom::Int(v))
    }

    pub fn float(v: f64) -> Term {
        Term::Atom(Atom::Float(FloatBits(v)))
    }

    pub fn string(v: impl Into<Arc<str>>) -> Term {
        Term::Atom(Atom::Str(v.into()))
    }

    pub fn boolean(v: bool) -> Term {
        Term::Atom(Atom::Bool(v))
    }

    pub fn null() -> Term {
        Term::Atom(Atom::Null)
    }

    pub fn var(name: &str) -> Term {
        Term::Var(Variable::named(name))
    }

    pub fn wildcard() -> Term {
        Term::Wildcard
    }

    pub fn compound(items: impl Into<Vec<Term>>) -> Term {
        Term::Compound(Arc::from(items.into()))
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Term::Atom(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Term::Wildcard)
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Term::Compound(_))
    }

    /// Length of a compound; `None` for non-compounds.
    pub fn len(&self) -> Option<usize> {
        match self {
            Term::Compound(items) => Some(items.len()),
            _ => None,
        }
    }

    pub fn is_empty_compound(&self) -> bool {
        matches!(self, Term::Compound(items) if items.is_empty())
    }

    /// Element access into a compound; `None` out of bounds or on non-compounds.
    pub fn elem(&self, i: usize) -> Option<&Term> {
        match self {
            Term::Compound(items) => items.get(i),
            _ => None,
        }
    }

    /// First element of a compound, the conventional relation head (§3.1, §3.2).
    pub fn head_term(&self) -> Option<&Term> {
        self.elem(0)
    }

    /// Remaining elements after the first, as a slice.
    pub fn tail(&self) -> &[Term] {
        match self {
            Term::Compound(items) if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }

    pub fn as_compound_slice(&self) -> Option<&[Term]> {
        match self {
            Term::Compound(items) => Some(items),
            _ => None,
        }
    }

    /// The relation symbol of a fact-shaped compound: its head, when that
    /// head is itself a symbol atom (§3.2). Facts whose first element is
    /// not a symbol atom have no head.
    pub fn relation_symbol(&self) -> Option<Symbol> {
        match self.head_term() {
            Some(Term::Atom(Atom::Symbol(s))) => Some(*s),
            _ => None,
        }
    }

    /// A compound is ground iff it (and every transitive leaf) contains no
    /// variable and no wildcard (§3.2). Non-compounds are trivially ground.
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Var(_) | Term::Wildcard => false,
            Term::Atom(_) => true,
            Term::Compound(items) => items.iter().all(Term::is_ground),
        }
    }

    /// A fact is a ground, non-empty compound (§3.2).
    pub fn is_fact(&self) -> bool {
        matches!(self, Term::Compound(items) if !items.is_empty()) && self.is_ground()
    }

    /// The set of variables occurring anywhere in this term, in
    /// first-occurrence (left-to-right, depth-first) order with no
    /// duplicates (§4.1).
    pub fn extract_vars(&self) -> IndexSet<Variable> {
        let mut out = IndexSet::new();
        self.extract_vars_into(&mut out);
        out
    }

    fn extract_vars_into(&self, out: &mut IndexSet<Variable>) {
        match self {
            Term::Var(v) => {
                out.insert(*v);
            }
            Term::Compound(items) => {
                for item in items.iter() {
                    item.extract_vars_into(out);
                }
            }
            Term::Atom(_) | Term::Wildcard => {}
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(a) => write!(f, "{}", a),
            Term::Var(v) => write!(f, "{}", v),
            Term::Wildcard => write!(f, "?"),
            Term::Compound(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Wire representation used for JSON (de)serialization (§6): compounds as
/// ordered term lists, atoms tagged by kind, variables as `?name`, wildcard
/// as a bare `?`. This is the crate's canonical persisted form; it does not
/// introduce a bespoke textual grammar, since that would be rule-authoring
/// sugar out of scope per §1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
enum TermWire {
    Symbol(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    Var(String),
    Wildcard,
    Compound(Vec<TermWire>),
}

impl From<&Term> for TermWire {
    fn from(t: &Term) -> Self {
        match t {
            Term::Atom(Atom::Symbol(s)) => TermWire::Symbol(interner::resolve_symbol(*s).to_string()),
            Term::Atom(Atom::Int(i)) => TermWire::Int(*i),
            Term::Atom(Atom::Float(x)) => TermWire::Float(x.0),
            Term::Atom(Atom::Str(s)) => TermWire::Str(s.to_string()),
            Term::Atom(Atom::Bool(b)) => TermWire::Bool(*b),
            Term::Atom(Atom::Null) => TermWire::Null,
            Term::Var(v) => TermWire::Var(v.name().to_string()),
            Term::Wildcard => TermWire::Wildcard,
            Term::Compound(items) => TermWire::Compound(items.iter().map(TermWire::from).collect()),
        }
    }
}

impl From<TermWire> for Term {
    fn from(w: TermWire) -> Self {
        match w {
            TermWire::Symbol(s) => Term::symbol(&s),
            TermWire::Int(i) => Term::int(i),
            TermWire::Float(x) => Term::float(x),
            TermWire::Str(s) => Term::string(s),
            TermWire::Bool(b) => Term::boolean(b),
            TermWire::Null => Term::null(),
            TermWire::Var(name) => Term::var(&name),
            TermWire::Wildcard => Term::wildcard(),
            TermWire::Compound(items) => Term::compound(items.into_iter().map(Term::from).collect::<Vec<_>>()),
        }
    }
}

impl Serialize for Term {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        TermWire::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Term {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        TermWire::deserialize(deserializer).map(Term::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_is_value_based() {
        assert_eq!(Term::symbol("alice"), Term::symbol("alice"));
        assert_ne!(Term::symbol("alice"), Term::symbol("bob"));
        assert_eq!(Term::int(1), Term::int(1));
        assert_eq!(Term::float(1.5), Term::float(1.5));
    }

    #[test]
    fn nan_float_is_self_equal_by_bit_pattern() {
        let nan = Term::float(f64::NAN);
        assert_eq!(nan, nan.clone());
    }

    #[test]
    fn case_sensitive_variable_names_are_distinct() {
        assert_ne!(Term::var("x"), Term::var("X"));
    }

    #[test]
    fn wildcard_is_singleton_shaped_but_not_a_variable() {
        let w = Term::wildcard();
        assert!(w.is_wildcard());
        assert!(!w.is_variable());
    }

    #[test]
    fn ground_compound_is_a_fact_empty_compound_is_not() {
        let fact = Term::compound(vec![Term::symbol("likes"), Term::symbol("alice"), Term::symbol("bob")]);
        assert!(fact.is_fact());
        assert!(!Term::compound(Vec::<Term>::new()).is_fact());
        let open = Term::compound(vec![Term::symbol("likes"), Term::var("x")]);
        assert!(!open.is_fact());
    }

    #[test]
    fn extract_vars_is_first_occurrence_ordered_and_deduped() {
        let t = Term::compound(vec![
            Term::var("y"),
            Term::symbol("k"),
            Term::var("x"),
            Term::var("y"),
        ]);
        let vars: Vec<_> = t.extract_vars().into_iter().collect();
        assert_eq!(vars, vec![Variable::named("y"), Variable::named("x")]);
    }

    #[test]
    fn relation_symbol_requires_symbol_head() {
        let fact = Term::compound(vec![Term::symbol("likes"), Term::symbol("alice")]);
        assert!(fact.relation_symbol().is_some());
        let headless = Term::compound(vec![Term::int(1), Term::symbol("alice")]);
        assert!(headless.relation_symbol().is_none());
    }

    #[test]
    fn json_round_trip_preserves_shape() {
        let t = Term::compound(vec![
            Term::symbol("likes"),
            Term::var("x"),
            Term::wildcard(),
            Term::int(42),
            Term::string("hi"),
        ]);
        let json = serde_json::to_string(&t).unwrap();
        let back: Term = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! The indexed fact base (§3.5, §4.6).
//!
//! Grounded on `kanren::core::FactDB`'s `facts`/`get_facts`/`fact_count`,
//! generalized into a real secondary index. Uses `indexmap::IndexSet`
//! in place of the teacher's `HashSet<LogicFact>` so that `all` and each
//! `by_head` bucket iterate in stable insertion order, which §4.4's
//! `match-all` and §3.5 require for reproducible runs; grounded on
//! `brurucy-micro-datalog`, a Datalog engine in the pack that depends on
//! `indexmap` for the same reason.

use crate::error::EngineError;
use crate::interner::Symbol;
use crate::subst::Substitution;
use crate::term::Term;
use crate::unify::match_all;
use indexmap::{IndexMap, IndexSet};

/// A mutable, indexed collection of facts (§3.5).
#[derive(Debug, Clone, Default)]
pub struct FactBase {
    all: IndexSet<Term>,
    by_head: IndexMap<Symbol, IndexSet<Term>>,
}

impl FactBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// `assert(fact)` (§4.6): idempotent; rejects non-compound / empty
    /// compound arguments. Returns whether the fact was novel.
    pub fn assert(&mut self, fact: Term) -> Result<bool, EngineError> {
        if !fact.is_compound() || fact.is_empty_compound() {
            return Err(EngineError::NotAFact(fact.to_string()));
        }
        if !fact.is_ground() {
            return Err(EngineError::NotAFact(fact.to_string()));
        }
        if self.all.contains(&fact) {
            return Ok(false);
        }
        if let Some(head) = fact.relation_symbol() {
            self.by_head.entry(head).or_default().insert(fact.clone());
        }
        self.all.insert(fact);
        Ok(true)
    }

    /// `retract(fact)` (§4.6): removes from both indexes; no-op if absent.
    /// Returns whether the fact existed.
    pub fn retract(&mut self, fact: &Term) -> bool {
        if !self.all.shift_remove(fact) {
            return false;
        }
        if let Some(head) = fact.relation_symbol() {
            if let Some(bucket) = self.by_head.get_mut(&head) {
                bucket.shift_remove(fact);
            }
        }
        true
    }

    pub fn contains(&self, fact: &Term) -> bool {
        self.all.contains(fact)
    }

    pub fn clear(&mut self) {
        self.all.clear();
        self.by_head.clear();
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// All facts, in stable insertion order (§3.5).
    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.all.iter()
    }

    /// `by-relation(head)` (§4.6): the facts sharing a relation symbol,
    /// possibly empty.
    pub fn by_relation(&self, head: Symbol) -> Vec<&Term> {
        match self.by_head.get(&head) {
            Some(bucket) => bucket.iter().collect(),
            None => Vec::new(),
        }
    }

    /// `query(pattern, σ₀)` (§4.6): `match-all` against `by_head[head]`
    /// when the pattern's head is a ground symbol atom, else against `all`.
    pub fn query(&self, pattern: &Term, sigma0: &Substitution) -> Vec<Substitution> {
        match pattern.relation_symbol() {
            Some(head) => match_all(pattern, self.by_relation(head), sigma0),
            None => match_all(pattern, self.iter(), sigma0),
        }
    }

    /// Like [`FactBase::query`], but also returns the specific fact each
    /// resulting substitution matched against. Used by the forward chainer
    /// (§4.7.2) to track which facts an activation depends on, for the
    /// `recency` conflict-resolution tie-break (§4.7.3).
    pub fn query_tracked(&self, pattern: &Term, sigma0: &Substitution) -> Vec<(Substitution, Term)> {
        let candidates: Vec<&Term> = match pattern.relation_symbol() {
            Some(head) => self.by_relation(head),
            None => self.iter().collect(),
        };
        candidates
            .into_iter()
            .filter_map(|f| {
                crate::unify::match_pattern(pattern, f, sigma0).map(|sigma| (sigma, f.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn likes(a: &str, b: &str) -> Term {
        Term::compound(vec![Term::symbol("likes"), Term::symbol(a), Term::symbol(b)])
    }

    #[test]
    fn assert_rejects_non_compound_and_empty_compound() {
        let mut fb = FactBase::new();
        assert!(fb.assert(Term::symbol("alice")).is_err());
        assert!(fb.assert(Term::compound(Vec::<Term>::new())).is_err());
    }

    #[test]
    fn assert_rejects_non_ground_fact() {
        let mut fb = FactBase::new();
        let open = Term::compound(vec![Term::symbol("likes"), Term::var("x")]);
        assert!(fb.assert(open).is_err());
    }

    #[test]
    fn assert_is_idempotent() {
        let mut fb = FactBase::new();
        let f = likes("alice", "bob");
        assert_eq!(fb.assert(f.clone()).unwrap(), true);
        assert_eq!(fb.assert(f.clone()).unwrap(), false);
        assert_eq!(fb.len(), 1);
    }

    #[test]
    fn retract_is_idempotent() {
        let mut fb = FactBase::new();
        let f = likes("alice", "bob");
        fb.assert(f.clone()).unwrap();
        assert_eq!(fb.retract(&f), true);
        assert_eq!(fb.retract(&f), false);
        assert!(!fb.contains(&f));
    }

    #[test]
    fn by_head_index_matches_all_for_each_head() {
        let mut fb = FactBase::new();
        fb.assert(likes("alice", "bob")).unwrap();
        fb.assert(likes("bob", "carol")).unwrap();
        fb.assert(Term::compound(vec![Term::symbol("parent"), Term::symbol("x"), Term::symbol("y")]))
            .unwrap();

        let likes_sym = likes("a", "b").relation_symbol().unwrap();
        let bucket = fb.by_relation(likes_sym);
        assert_eq!(bucket.len(), 2);
        assert!(bucket.iter().all(|f| f.relation_symbol() == Some(likes_sym)));
    }

    #[test]
    fn query_narrows_by_ground_head_and_matches_insertion_order() {
        let mut fb = FactBase::new();
        fb.assert(likes("alice", "bob")).unwrap();
        fb.assert(likes("alice", "carol")).unwrap();
        let pattern = Term::compound(vec![Term::symbol("likes"), Term::symbol("alice"), Term::var("x")]);
        let results = fb.query(&pattern, &Substitution::new());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].apply(&Term::var("x")), Term::symbol("bob"));
        assert_eq!(results[1].apply(&Term::var("x")), Term::symbol("carol"));
    }

    #[test]
    fn clear_empties_both_indexes() {
        let mut fb = FactBase::new();
        fb.assert(likes("alice", "bob")).unwrap();
        fb.clear();
        assert!(fb.is_empty());
        assert_eq!(fb.by_relation(likes("a", "b").relation_symbol().unwrap()).len(), 0);
    }
}

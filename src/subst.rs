// SPDX-License-Identifier: MIT OR Apache-2.0

//! Substitution algebra: `apply`/`compose`/`extend`/`occurs` (§4.2, §4.3).
//!
//! Grounded on the teacher's `Substitution::walk`/`unify`, split so the
//! chasing/occurs-check machinery is independently testable and reusable
//! by both [`crate::unify`]'s two-sided unification and its one-sided
//! pattern match, matching the `walk`/`occurs_check` split found in
//! `terohuttunen-proto-vulcan`'s `state/substitution.rs`.

use crate::term::{Term, Variable};
use std::collections::HashMap;

/// A finite mapping from variables to terms (§3.3). The empty substitution
/// denotes "already identical" in unification contexts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    bindings: HashMap<Variable, Term>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn get(&self, v: Variable) -> Option<&Term> {
        self.bindings.get(&v)
    }

    pub fn contains(&self, v: Variable) -> bool {
        self.bindings.contains_key(&v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.bindings.iter()
    }

    /// Chase a single variable through the map one hop at a time, without
    /// recursing into compounds. Non-variables and unbound variables are
    /// returned unchanged. This is the primitive `apply` recurses on.
    fn walk<'a>(&'a self, term: &'a Term) -> &'a Term {
        let mut current = term;
        while let Term::Var(v) = current {
            match self.bindings.get(v) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// `apply(term, σ)` (§4.2): chase variables, recurse elementwise into
    /// compounds, return atoms and wildcards unchanged. Termination is
    /// guaranteed by the occurs invariant enforced at every `extend`.
    pub fn apply(&self, term: &Term) -> Term {
        match self.walk(term) {
            Term::Compound(items) => {
                Term::compound(items.iter().map(|t| self.apply(t)).collect::<Vec<_>>())
            }
            other => other.clone(),
        }
    }

    /// `occurs(v, t, σ)` (§4.3): true iff, after chasing `t` through σ, `v`
    /// appears anywhere within. Mandatory at every binding step; omission
    /// would permit infinite terms.
    pub fn occurs(&self, v: Variable, t: &Term) -> bool {
        match self.walk(t) {
            Term::Var(other) => *other == v,
            Term::Compound(items) => items.iter().any(|item| self.occurs(v, item)),
            Term::Atom(_) | Term::Wildcard => false,
        }
    }

    /// `extend(σ, v, t)` (§4.2): binds `v -> apply(t, σ)` after an occurs
    /// check on the resolved value. Returns `None` on occurs-check failure
    /// (§7: `OccursCheckFailure` is never surfaced to the caller as an
    /// error — it is simply "no binding").
    pub fn extend(&self, v: Variable, t: &Term) -> Option<Substitution> {
        let resolved = self.apply(t);
        if self.occurs(v, &resolved) {
            return None;
        }
        let mut next = self.clone();
        next.bindings.insert(v, resolved);
        Some(next)
    }

    /// `compose(σ1, σ2)` (§4.2): every binding in `σ2` is resolved against
    /// `σ1` and then overlaid onto it, so `σ2`'s bindings take precedence
    /// for shared keys.
    pub fn compose(&self, other: &Substitution) -> Substitution {
        let mut result = self.clone();
        for (k, v) in other.bindings.iter() {
            result.bindings.insert(*k, self.apply(v));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_is_identity_on_empty_substitution() {
        let sigma = Substitution::new();
        let t = Term::compound(vec![Term::symbol("f"), Term::var("x")]);
        assert_eq!(sigma.apply(&t), t);
    }

    #[test]
    fn apply_chases_bound_variables_recursively() {
        let sigma = Substitution::new()
            .extend(Variable::named("x"), &Term::var("y"))
            .unwrap()
            .extend(Variable::named("y"), &Term::symbol("alice"))
            .unwrap();
        assert_eq!(sigma.apply(&Term::var("x")), Term::symbol("alice"));
    }

    #[test]
    fn apply_recurses_into_compound_elements() {
        let sigma = Substitution::new()
            .extend(Variable::named("x"), &Term::symbol("alice"))
            .unwrap();
        let t = Term::compound(vec![Term::symbol("likes"), Term::var("x"), Term::var("y")]);
        let applied = sigma.apply(&t);
        assert_eq!(
            applied,
            Term::compound(vec![Term::symbol("likes"), Term::symbol("alice"), Term::var("y")])
        );
    }

    #[test]
    fn apply_is_idempotent() {
        let sigma = Substitution::new()
            .extend(Variable::named("x"), &Term::var("y"))
            .unwrap()
            .extend(Variable::named("y"), &Term::symbol("alice"))
            .unwrap();
        let t = Term::compound(vec![Term::var("x"), Term::var("x")]);
        let once = sigma.apply(&t);
        let twice = sigma.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn extend_rejects_direct_self_reference() {
        let sigma = Substitution::new();
        let x = Variable::named("x");
        assert!(sigma.extend(x, &Term::var("x")).is_none());
    }

    #[test]
    fn extend_rejects_occurs_in_compound() {
        let sigma = Substitution::new();
        let x = Variable::named("x");
        let t = Term::compound(vec![Term::symbol("list"), Term::var("x")]);
        assert!(sigma.extend(x, &t).is_none());
    }

    #[test]
    fn extend_accepts_non_occurring_binding() {
        let sigma = Substitution::new();
        let x = Variable::named("x");
        let t = Term::compound(vec![Term::symbol("list"), Term::symbol("alice")]);
        let sigma2 = sigma.extend(x, &t).unwrap();
        assert_eq!(sigma2.apply(&Term::var("x")), t);
    }

    #[test]
    fn compose_prefers_second_substitution_bindings() {
        let x = Variable::named("x");
        let sigma1 = Substitution::new().extend(x, &Term::symbol("alice")).unwrap();
        let sigma2 = Substitution::new().extend(x, &Term::symbol("bob")).unwrap();
        let composed = sigma1.compose(&sigma2);
        assert_eq!(composed.apply(&Term::var("x")), Term::symbol("bob"));
    }

    #[test]
    fn compose_resolves_sigma2_values_against_sigma1() {
        let x = Variable::named("x");
        let y = Variable::named("y");
        let sigma1 = Substitution::new().extend(x, &Term::symbol("alice")).unwrap();
        let sigma2 = Substitution::new().extend(y, &Term::var("x")).unwrap();
        let composed = sigma1.compose(&sigma2);
        assert_eq!(composed.apply(&Term::var("y")), Term::symbol("alice"));
    }
}

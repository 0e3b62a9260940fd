// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-sided unification and one-sided pattern match (§4.4, §4.5).
//!
//! Grounded on the teacher's `Substitution::unify` (Robinson-style with an
//! occurs check) and `FactDB::match_body`/`query` for the one-sided match
//! direction, generalized to the full wildcard/compound-shape rules of
//! §4.4-§4.5.

use crate::subst::Substitution;
use crate::term::Term;

/// `unify(t1, t2, σ₀)` (§4.5): the most general unifier of `t1` and `t2`
/// under `σ₀`, or `None` on failure. Any other unifier is an instance of
/// the result.
pub fn unify(t1: &Term, t2: &Term, sigma0: &Substitution) -> Option<Substitution> {
    let a = sigma0.apply(t1);
    let b = sigma0.apply(t2);

    // Structural equality also covers wildcard-vs-wildcard: two distinct
    // wildcard occurrences never alias each other, but unifying them still
    // trivially succeeds without recording a binding.
    if a == b {
        return Some(sigma0.clone());
    }

    match (&a, &b) {
        (Term::Wildcard, _) | (_, Term::Wildcard) => Some(sigma0.clone()),
        (Term::Var(v), _) => {
            if sigma0.occurs(*v, &b) {
                None
            } else {
                sigma0.extend(*v, &b)
            }
        }
        (_, Term::Var(v)) => {
            if sigma0.occurs(*v, &a) {
                None
            } else {
                sigma0.extend(*v, &a)
            }
        }
        (Term::Compound(xs), Term::Compound(ys)) if xs.len() == ys.len() => {
            let mut sigma = sigma0.clone();
            for (x, y) in xs.iter().zip(ys.iter()) {
                sigma = unify(x, y, &sigma)?;
            }
            Some(sigma)
        }
        _ => None,
    }
}

/// `unify*(t1, …, tn)` (§4.5): unify in left-fold order, equivalent to
/// threading a running substitution through consecutive binary unifications.
pub fn unify_many(terms: &[Term], sigma0: &Substitution) -> Option<Substitution> {
    let mut sigma = sigma0.clone();
    for pair in terms.windows(2) {
        sigma = unify(&pair[0], &pair[1], &sigma)?;
    }
    Some(sigma)
}

/// `match(pattern, fact, σ₀)` (§4.4): one-sided pattern match. `pattern`
/// may contain variables and wildcards; `fact` must be ground. Walks both
/// in lockstep per the table in §4.4.
pub fn match_pattern(pattern: &Term, fact: &Term, sigma0: &Substitution) -> Option<Substitution> {
    match pattern {
        Term::Wildcard => Some(sigma0.clone()),
        Term::Var(v) => match sigma0.get(*v) {
            Some(bound) if bound == fact => Some(sigma0.clone()),
            Some(_) => None,
            None => sigma0.extend(*v, fact),
        },
        Term::Atom(_) => {
            if pattern == fact {
                Some(sigma0.clone())
            } else {
                None
            }
        }
        Term::Compound(ps) => match fact {
            Term::Compound(fs) if ps.len() == fs.len() => {
                let mut sigma = sigma0.clone();
                for (p, f) in ps.iter().zip(fs.iter()) {
                    sigma = match_pattern(p, f, &sigma)?;
                }
                Some(sigma)
            }
            _ => None,
        },
    }
}

/// `match-all(pattern, facts, σ₀)` (§4.4): every σ such that
/// `match(pattern, f, σ₀) = σ` for some `f ∈ facts`, in the candidates'
/// stable iteration order.
pub fn match_all<'a>(
    pattern: &Term,
    facts: impl IntoIterator<Item = &'a Term>,
    sigma0: &Substitution,
) -> Vec<Substitution> {
    facts
        .into_iter()
        .filter_map(|f| match_pattern(pattern, f, sigma0))
        .collect()
}

/// `bind(pattern, σ)` (§4.4): alias for `apply`; yields a ground term iff
/// every variable in `pattern` is bound in `σ`.
pub fn bind(pattern: &Term, sigma: &Substitution) -> Term {
    sigma.apply(pattern)
}

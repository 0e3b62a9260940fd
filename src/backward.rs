// SPDX-License-Identifier: MIT OR Apache-2.0

//! The backward prover: depth-bounded, cycle-checked goal-driven proof
//! search with full two-sided unification at the rule-head/goal boundary
//! (§4.8).
//!
//! New relative to the teacher, which has no backward chainer at all —
//! only forward chaining over a fact database. The general shape (goal
//! stack, unify against facts, unify against rule heads, recurse on
//! bodies) is grounded on `mayhemheroes-modus`'s `sld.rs` (SLD resolution),
//! and the depth-bounded, cycle-checked recursive search pattern and
//! variable-renaming-apart-per-use on `terohuttunen-proto-vulcan`'s
//! frame/`Rename` handling.

use crate::config::{EngineConfig, Strategy};
use crate::factbase::FactBase;
use crate::rule::Rule;
use crate::subst::Substitution;
use crate::term::{Term, Variable};
use crate::unify::unify;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};

/// A proof-tree node (§4.8.1): either a direct fact match, or a rule
/// application whose antecedents were each proved in turn.
#[derive(Debug, Clone)]
pub enum Proof {
    Fact {
        goal: Term,
        bindings: Substitution,
        fact: Term,
    },
    Rule {
        goal: Term,
        bindings: Substitution,
        rule_index: usize,
        children: Vec<Proof>,
    },
}

impl Proof {
    pub fn bindings(&self) -> &Substitution {
        match self {
            Proof::Fact { bindings, .. } | Proof::Rule { bindings, .. } => bindings,
        }
    }

    pub fn goal(&self) -> &Term {
        match self {
            Proof::Fact { goal, .. } | Proof::Rule { goal, .. } => goal,
        }
    }
}

/// Options accepted by `prove`/`ask` (§4.8.5); `None` falls back to the
/// engine's configured `max_depth`/`strategy`.
#[derive(Debug, Clone, Default)]
pub struct ProveOptions {
    pub limit: Option<usize>,
}

/// Recognizes `[:not g]` goals (§4.8.3).
fn as_negation(goal: &Term) -> Option<Term> {
    if goal.len() != Some(2) {
        return None;
    }
    match goal.relation_symbol() {
        Some(sym) if crate::interner::resolve_symbol(sym) == "not" => goal.elem(1).cloned(),
        _ => None,
    }
}

/// Rename every variable in a rule's `when`/`then` patterns apart, so that
/// recursive uses of the same rule at different recursion depths never
/// alias each other's variables.
fn freshen_rule(rule: &Rule, salt: u64) -> (Vec<Term>, Vec<Term>) {
    let mut vars: IndexSet<Variable> = IndexSet::new();
    for p in rule.when.iter().chain(rule.then.iter()) {
        vars.extend(p.extract_vars());
    }
    let renames: HashMap<Variable, Variable> = vars
        .into_iter()
        .map(|v| (v, Variable::named(&format!("{}#{salt}", v.name()))))
        .collect();
    let when = rule.when.iter().map(|p| rename_vars(p, &renames)).collect();
    let then = rule.then.iter().map(|p| rename_vars(p, &renames)).collect();
    (when, then)
}

fn rename_vars(t: &Term, renames: &HashMap<Variable, Variable>) -> Term {
    match t {
        Term::Var(v) => Term::Var(*renames.get(v).unwrap_or(v)),
        Term::Compound(items) => Term::compound(items.iter().map(|i| rename_vars(i, renames)).collect::<Vec<_>>()),
        other => other.clone(),
    }
}

/// Shared mutable search context threaded through the recursion.
struct Ctx<'a> {
    fb: &'a FactBase,
    rules: &'a [Rule],
    config: &'a EngineConfig,
    depth_limit_hit: bool,
    fresh_counter: u64,
}

/// `prove(goal, σ, depth)` (§4.8.2), depth-first: all fact-branch proofs
/// then all rule-branch proofs, rule-by-rule in order.
fn prove_df(goal: &Term, sigma: &Substitution, depth: u32, stack: &mut Vec<(usize, Term)>, ctx: &mut Ctx) -> Vec<Proof> {
    if depth > ctx.config.max_depth {
        ctx.depth_limit_hit = true;
        return Vec::new();
    }

    let goal_applied = sigma.apply(goal);

    if let Some(inner) = as_negation(&goal_applied) {
        let sub_proofs = prove_df(&inner, sigma, depth + 1, stack, ctx);
        return if sub_proofs.is_empty() {
            vec![Proof::Fact {
                goal: goal_applied.clone(),
                bindings: sigma.clone(),
                fact: goal_applied,
            }]
        } else {
            Vec::new()
        };
    }

    let mut results = Vec::new();

    // Fact branch (§4.8.2 step 3).
    let candidates: Vec<&Term> = match goal_applied.relation_symbol() {
        Some(head) => ctx.fb.by_relation(head),
        None => ctx.fb.iter().collect(),
    };
    for fact in candidates {
        if let Some(sigma2) = unify(&goal_applied, fact, sigma) {
            results.push(Proof::Fact {
                goal: goal_applied.clone(),
                bindings: sigma2,
                fact: fact.clone(),
            });
        }
    }

    // Rule branch (§4.8.2 step 4).
    for rule_index in 0..ctx.rules.len() {
        ctx.fresh_counter += 1;
        let (when, then) = freshen_rule(&ctx.rules[rule_index], ctx.fresh_counter);
        for consequent in &then {
            let Some(sigma_c) = unify(&goal_applied, consequent, sigma) else {
                continue;
            };
            let frame = (rule_index, goal_applied.clone());
            if stack.contains(&frame) {
                continue; // loop-check (§4.8.4): re-entering an entered frame fails this path.
            }
            stack.push(frame);
            for (final_sigma, children) in prove_conjunction(&when, &sigma_c, depth + 1, stack, ctx) {
                results.push(Proof::Rule {
                    goal: goal_applied.clone(),
                    bindings: final_sigma,
                    rule_index,
                    children,
                });
            }
            stack.pop();
        }
    }

    results
}

/// Prove a conjunction of antecedents left-to-right, threading the
/// substitution returned by each into the next (§4.8.2 step 4).
fn prove_conjunction(ants: &[Term], sigma0: &Substitution, depth: u32, stack: &mut Vec<(usize, Term)>, ctx: &mut Ctx) -> Vec<(Substitution, Vec<Proof>)> {
    if ants.is_empty() {
        return vec![(sigma0.clone(), Vec::new())];
    }
    let mut out = Vec::new();
    for p in prove_df(&ants[0], sigma0, depth, stack, ctx) {
        let sigma1 = p.bindings().clone();
        for (final_sigma, mut rest_children) in prove_conjunction(&ants[1..], &sigma1, depth, stack, ctx) {
            let mut children = vec![p.clone()];
            children.append(&mut rest_children);
            out.push((final_sigma, children));
        }
    }
    out
}

/// Breadth-first ordering (§4.8.2 step 5): fact-branch proofs first (they
/// have no further recursion to interleave), then the rule branch's
/// per-rule-choice proof lists interleaved round-robin instead of
/// concatenated rule-by-rule.
fn prove_bf(goal: &Term, sigma: &Substitution, depth: u32, stack: &mut Vec<(usize, Term)>, ctx: &mut Ctx) -> Vec<Proof> {
    if depth > ctx.config.max_depth {
        ctx.depth_limit_hit = true;
        return Vec::new();
    }
    let goal_applied = sigma.apply(goal);

    if let Some(inner) = as_negation(&goal_applied) {
        let sub_proofs = prove_bf(&inner, sigma, depth + 1, stack, ctx);
        return if sub_proofs.is_empty() {
            vec![Proof::Fact {
                goal: goal_applied.clone(),
                bindings: sigma.clone(),
                fact: goal_applied,
            }]
        } else {
            Vec::new()
        };
    }

    let mut fact_proofs = Vec::new();
    let candidates: Vec<&Term> = match goal_applied.relation_symbol() {
        Some(head) => ctx.fb.by_relation(head),
        None => ctx.fb.iter().collect(),
    };
    for fact in candidates {
        if let Some(sigma2) = unify(&goal_applied, fact, sigma) {
            fact_proofs.push(Proof::Fact {
                goal: goal_applied.clone(),
                bindings: sigma2,
                fact: fact.clone(),
            });
        }
    }

    let mut per_rule: Vec<Vec<Proof>> = Vec::new();
    for rule_index in 0..ctx.rules.len() {
        ctx.fresh_counter += 1;
        let (when, then) = freshen_rule(&ctx.rules[rule_index], ctx.fresh_counter);
        let mut this_rule = Vec::new();
        for consequent in &then {
            let Some(sigma_c) = unify(&goal_applied, consequent, sigma) else {
                continue;
            };
            let frame = (rule_index, goal_applied.clone());
            if stack.contains(&frame) {
                continue;
            }
            stack.push(frame);
            for (final_sigma, children) in prove_conjunction_bf(&when, &sigma_c, depth + 1, stack, ctx) {
                this_rule.push(Proof::Rule {
                    goal: goal_applied.clone(),
                    bindings: final_sigma,
                    rule_index,
                    children,
                });
            }
            stack.pop();
        }
        if !this_rule.is_empty() {
            per_rule.push(this_rule);
        }
    }

    let mut results = fact_proofs.drain(..).collect::<Vec<_>>();
    let mut idx = 0;
    loop {
        let mut any = false;
        for bucket in &per_rule {
            if let Some(p) = bucket.get(idx) {
                results.push(p.clone());
                any = true;
            }
        }
        if !any {
            break;
        }
        idx += 1;
    }
    results
}

fn prove_conjunction_bf(ants: &[Term], sigma0: &Substitution, depth: u32, stack: &mut Vec<(usize, Term)>, ctx: &mut Ctx) -> Vec<(Substitution, Vec<Proof>)> {
    if ants.is_empty() {
        return vec![(sigma0.clone(), Vec::new())];
    }
    let mut out = Vec::new();
    for p in prove_bf(&ants[0], sigma0, depth, stack, ctx) {
        let sigma1 = p.bindings().clone();
        for (final_sigma, mut rest_children) in prove_conjunction_bf(&ants[1..], &sigma1, depth, stack, ctx) {
            let mut children = vec![p.clone()];
            children.append(&mut rest_children);
            out.push((final_sigma, children));
        }
    }
    out
}

/// A renaming-stable fingerprint of a proof's derivation: which concrete
/// fact, or which rule applied to which fingerprinted sub-proofs, produced
/// it. Two calls to `freshen_rule` give the same logical rule application
/// different variable spellings (the salt is a monotonic counter, never
/// reset within a `prove_id` run), so literal substitution-map equality
/// would treat the same derivation re-found at a deeper cap as "new" every
/// round. Matched facts are always the original ground terms from the fact
/// base, never renamed, so keying on them instead is stable across rounds
/// while still distinguishing genuinely different derivations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Fingerprint {
    Fact(Term),
    Rule(usize, Vec<Fingerprint>),
}

fn fingerprint(proof: &Proof) -> Fingerprint {
    match proof {
        Proof::Fact { fact, .. } => Fingerprint::Fact(fact.clone()),
        Proof::Rule { rule_index, children, .. } => {
            Fingerprint::Rule(*rule_index, children.iter().map(fingerprint).collect())
        }
    }
}

/// The `(goal', σ')` pair a proof is de-duplicated on (§4.8.2 step 5): the
/// reified goal together with the proof's derivation [`Fingerprint`], which
/// stands in for σ' — the fingerprint determines σ' exactly (the same
/// facts/rules applied in the same shape always resolve to the same
/// bindings), without the instability of comparing σ' literally across
/// independently-freshened reruns. This keeps distinct proof trees that
/// happen to agree on the goal's own variables but differ in their
/// rule-internal witnesses from collapsing into a single result.
fn proof_identity(goal: &Term, proof: &Proof) -> (Term, Fingerprint) {
    (proof.bindings().apply(goal), fingerprint(proof))
}

/// Iterative deepening (§4.8.2 step 5): re-run depth-first with caps
/// `0, 1, …, max_depth`, de-duplicating by the `(goal', σ')` pair of each
/// proof (see [`proof_identity`]).
fn prove_id(goal: &Term, ctx: &mut Ctx) -> Vec<Proof> {
    let mut seen: HashSet<(Term, Fingerprint)> = HashSet::new();
    let mut results = Vec::new();
    let max_depth = ctx.config.max_depth;
    for cap in 0..=max_depth {
        let mut capped = ctx.config.clone();
        capped.max_depth = cap;
        let mut round_ctx = Ctx {
            fb: ctx.fb,
            rules: ctx.rules,
            config: &capped,
            depth_limit_hit: false,
            fresh_counter: ctx.fresh_counter,
        };
        let mut stack = Vec::new();
        for proof in prove_df(goal, &Substitution::new(), 0, &mut stack, &mut round_ctx) {
            let key = proof_identity(goal, &proof);
            if seen.insert(key) {
                results.push(proof);
            }
        }
        ctx.fresh_counter = round_ctx.fresh_counter;
        if cap == max_depth {
            ctx.depth_limit_hit = round_ctx.depth_limit_hit;
        }
    }
    results
}

/// `prove(goal, opts)` (§4.8.2, §4.8.5): all proofs of `goal` up to
/// `config.max_depth`, ordered per `config.strategy`. Returns the proof
/// list together with whether any branch was pruned by the depth bound.
pub fn prove(goal: &Term, fb: &FactBase, rules: &[Rule], config: &EngineConfig) -> (Vec<Proof>, bool) {
    let mut ctx = Ctx {
        fb,
        rules,
        config,
        depth_limit_hit: false,
        fresh_counter: 0,
    };
    let proofs = match config.strategy {
        Strategy::DepthFirst => {
            let mut stack = Vec::new();
            prove_df(goal, &Substitution::new(), 0, &mut stack, &mut ctx)
        }
        Strategy::BreadthFirst => {
            let mut stack = Vec::new();
            prove_bf(goal, &Substitution::new(), 0, &mut stack, &mut ctx)
        }
        Strategy::IterativeDeepening => prove_id(goal, &mut ctx),
    };
    (proofs, ctx.depth_limit_hit)
}

/// `prove-one(goal, opts)` (§4.8.5): the first proof, if any.
pub fn prove_one(goal: &Term, fb: &FactBase, rules: &[Rule], config: &EngineConfig) -> (Option<Proof>, bool) {
    let (mut proofs, hit) = prove(goal, fb, rules, config);
    (if proofs.is_empty() { None } else { Some(proofs.remove(0)) }, hit)
}

/// `ask(goal, opts)` (§4.8.5): only the bindings restricted to the
/// variables occurring in `goal`, optionally capped by `limit`.
pub fn ask(goal: &Term, fb: &FactBase, rules: &[Rule], config: &EngineConfig, opts: &ProveOptions) -> (Vec<Substitution>, bool) {
    let (proofs, hit) = prove(goal, fb, rules, config);
    let goal_vars = goal.extract_vars();
    let mut out = Vec::new();
    for p in proofs {
        let mut restricted = Substitution::new();
        for v in &goal_vars {
            let value = p.bindings().apply(&Term::Var(*v));
            restricted = restricted.extend(*v, &value).unwrap_or(restricted);
        }
        out.push(restricted);
        if let Some(limit) = opts.limit {
            if out.len() >= limit {
                break;
            }
        }
    }
    (out, hit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn person(name: &str) -> Term {
        Term::compound(vec![Term::symbol("person"), Term::symbol(name)])
    }

    #[test]
    fn backward_enumeration_matches_spec_scenario_s5() {
        let mut fb = FactBase::new();
        fb.assert(person("alice")).unwrap();
        fb.assert(person("bob")).unwrap();
        let goal = Term::compound(vec![Term::symbol("person"), Term::var("who")]);
        let (bindings, hit) = ask(&goal, &fb, &[], &EngineConfig::default(), &ProveOptions::default());
        assert!(!hit);
        let names: HashSet<String> = bindings
            .iter()
            .map(|b| b.apply(&Term::var("who")).to_string())
            .collect();
        assert_eq!(names, HashSet::from([":alice".to_string(), ":bob".to_string()]));
    }

    #[test]
    fn recursive_rule_with_cycle_guard_still_finds_direct_fact() {
        let mut fb = FactBase::new();
        fb.assert(Term::compound(vec![Term::symbol("p"), Term::symbol("a"), Term::symbol("b")]))
            .unwrap();
        let rule = Rule::new(
            vec![Term::compound(vec![Term::symbol("p"), Term::var("x"), Term::var("y")])],
            vec![Term::compound(vec![Term::symbol("p"), Term::var("x"), Term::var("y")])],
        )
        .unwrap();
        let mut config = EngineConfig::default();
        config.max_depth = 5;
        let goal = Term::compound(vec![Term::symbol("p"), Term::symbol("a"), Term::symbol("b")]);
        let (proofs, _) = prove(&goal, &fb, &[rule], &config);
        assert!(!proofs.is_empty());
    }

    #[test]
    fn negation_as_failure_succeeds_when_goal_unprovable() {
        let fb = FactBase::new();
        let goal = Term::compound(vec![
            Term::symbol("not"),
            Term::compound(vec![Term::symbol("person"), Term::symbol("alice")]),
        ]);
        let (proofs, _) = prove(&goal, &fb, &[], &EngineConfig::default());
        assert_eq!(proofs.len(), 1);
    }

    #[test]
    fn negation_as_failure_fails_when_goal_provable() {
        let mut fb = FactBase::new();
        fb.assert(person("alice")).unwrap();
        let goal = Term::compound(vec![Term::symbol("not"), person("alice")]);
        let (proofs, _) = prove(&goal, &fb, &[], &EngineConfig::default());
        assert!(proofs.is_empty());
    }

    #[test]
    fn depth_limit_sets_advisory_flag_without_erroring() {
        let mut fb = FactBase::new();
        fb.assert(Term::compound(vec![Term::symbol("p"), Term::symbol("a")])).unwrap();
        let rule = Rule::new(
            vec![Term::compound(vec![Term::symbol("p"), Term::var("x")])],
            vec![Term::compound(vec![Term::symbol("q"), Term::var("x")])],
        )
        .unwrap();
        let mut config = EngineConfig::default();
        config.max_depth = 0;
        let goal = Term::compound(vec![Term::symbol("q"), Term::var("x")]);
        let (_, hit) = prove(&goal, &fb, &[rule], &config);
        assert!(hit);
    }

    #[test]
    fn breadth_first_and_iterative_deepening_still_find_the_same_facts() {
        let mut fb = FactBase::new();
        fb.assert(person("alice")).unwrap();
        fb.assert(person("bob")).unwrap();
        let goal = Term::compound(vec![Term::symbol("person"), Term::var("who")]);

        let mut bf_config = EngineConfig::default();
        bf_config.strategy = Strategy::BreadthFirst;
        let (bf_proofs, _) = prove(&goal, &fb, &[], &bf_config);
        assert_eq!(bf_proofs.len(), 2);

        let mut id_config = EngineConfig::default();
        id_config.strategy = Strategy::IterativeDeepening;
        let (id_proofs, _) = prove(&goal, &fb, &[], &id_config);
        assert_eq!(id_proofs.len(), 2);
    }

    #[test]
    fn iterative_deepening_keeps_distinct_proof_trees_with_the_same_goal_binding() {
        // Two independently-derived routes to the same `same(:a)` binding:
        // one via `p`, one via `q`. They agree on the goal's own variable
        // but differ in which fact/rule-internal binding proved it, so
        // de-duplication must not collapse them into a single result.
        let mut fb = FactBase::new();
        fb.assert(Term::compound(vec![Term::symbol("p"), Term::symbol("a")])).unwrap();
        fb.assert(Term::compound(vec![Term::symbol("q"), Term::symbol("a")])).unwrap();
        let via_p = Rule::new(
            vec![Term::compound(vec![Term::symbol("p"), Term::var("x")])],
            vec![Term::compound(vec![Term::symbol("same"), Term::var("x")])],
        )
        .unwrap();
        let via_q = Rule::new(
            vec![Term::compound(vec![Term::symbol("q"), Term::var("x")])],
            vec![Term::compound(vec![Term::symbol("same"), Term::var("x")])],
        )
        .unwrap();
        let goal = Term::compound(vec![Term::symbol("same"), Term::symbol("a")]);

        let mut df_config = EngineConfig::default();
        df_config.strategy = Strategy::DepthFirst;
        let (df_proofs, _) = prove(&goal, &fb, &[via_p.clone(), via_q.clone()], &df_config);
        assert_eq!(df_proofs.len(), 2);

        let mut id_config = EngineConfig::default();
        id_config.strategy = Strategy::IterativeDeepening;
        let (id_proofs, _) = prove(&goal, &fb, &[via_p, via_q], &id_config);
        assert_eq!(id_proofs.len(), 2);
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! The forward chainer: agenda construction, conflict resolution, and
//! saturation to a fixed point (§4.7).
//!
//! Grounded on `kanren::core::FactDB::forward_chain`/`match_body`,
//! generalized from "first-match-wins, fire every match every round" into
//! the full agenda/activation/conflict-resolution model of §4.7. The
//! teacher has no tie-breaking at all; the chains here (`priority`,
//! `specificity`, `recency`, `mrs`, `mevis`, `random`) are new. `random`
//! draws from a `rand::rngs::StdRng` seeded by `EngineConfig::random_seed`,
//! grounded on `terohuttunen-proto-vulcan`'s dependency on `rand` for
//! reproducible stochastic search in a neighbouring miniKanren-family crate.

use crate::config::{ConflictResolution, EngineConfig};
use crate::error::EngineError;
use crate::factbase::FactBase;
use crate::rule::Rule;
use crate::subst::Substitution;
use crate::term::Term;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::collections::HashMap;

/// One `(rule, σ)` activation ready to fire in a round (§4.7.1).
#[derive(Debug, Clone)]
struct Activation {
    rule_index: usize,
    consequents: Vec<Term>,
    priority: i64,
    specificity: usize,
    recency: u64,
    insertion_order: usize,
}

/// A single rule firing, for reporting and tracing.
#[derive(Debug, Clone)]
pub struct Firing {
    pub rule_index: usize,
    pub rule_name: Option<String>,
    pub asserted: Vec<Term>,
}

/// The outcome of a `run_forward` call (§6: `ForwardReport`).
#[derive(Debug, Clone, Default)]
pub struct ForwardReport {
    pub rounds: u64,
    pub derived: u64,
    pub firings: Vec<Firing>,
}

/// Compute the set of matching substitutions for a rule's antecedents via
/// the left-fold join of §4.7.2, tracking the facts each one consumed (for
/// the `recency` tie-break).
fn match_antecedents(when: &[Term], fb: &FactBase) -> Vec<(Substitution, Vec<Term>)> {
    let mut acc = vec![(Substitution::new(), Vec::new())];
    for pattern in when {
        let mut next = Vec::new();
        for (sigma, facts) in &acc {
            for (sigma2, matched_fact) in fb.query_tracked(pattern, sigma) {
                let mut facts2 = facts.clone();
                facts2.push(matched_fact);
                next.push((sigma2, facts2));
            }
        }
        acc = next;
        if acc.is_empty() {
            break;
        }
    }
    acc
}

/// Build this round's agenda: every novel activation across all rules.
fn build_agenda(
    rules: &[Rule],
    fb: &FactBase,
    asserted_at: &HashMap<Term, u64>,
) -> Vec<Activation> {
    let mut agenda = Vec::new();
    for (rule_index, rule) in rules.iter().enumerate() {
        for (sigma, facts) in match_antecedents(&rule.when, fb) {
            let consequents: Vec<Term> = rule.then.iter().map(|c| sigma.apply(c)).collect();
            // Only ground consequents can become facts (§4.7.1).
            if !consequents.iter().all(Term::is_ground) {
                continue;
            }
            let novel = consequents.iter().any(|c| !fb.contains(c));
            if !novel {
                continue;
            }
            let recency = facts
                .iter()
                .map(|f| asserted_at.get(f).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            let insertion_order = agenda.len();
            agenda.push(Activation {
                rule_index,
                consequents,
                priority: rule.priority,
                specificity: rule.specificity(),
                recency,
                insertion_order,
            });
        }
    }
    agenda
}

/// Order the agenda per §4.7.3. `priority` always dominates; the
/// configured chain supplies the secondary key(s); insertion order is the
/// final tie-breaker in every chain, so the result is always a total order.
fn order_agenda(agenda: &mut [Activation], config: &EngineConfig, round: u64) {
    let random_keys: Vec<u64> = if config.conflict_resolution == ConflictResolution::Random {
        let mut rng = StdRng::seed_from_u64(config.random_seed ^ round);
        agenda.iter().map(|_| rng.next_u64()).collect()
    } else {
        Vec::new()
    };

    agenda.sort_by(|a, b| {
        b.priority.cmp(&a.priority).then_with(|| match config.conflict_resolution {
            ConflictResolution::Priority => std::cmp::Ordering::Equal,
            ConflictResolution::Specificity => b.specificity.cmp(&a.specificity),
            ConflictResolution::Recency => b.recency.cmp(&a.recency),
            ConflictResolution::Mrs => b.recency.cmp(&a.recency).then_with(|| b.specificity.cmp(&a.specificity)),
            ConflictResolution::Mevis => b.specificity.cmp(&a.specificity).then_with(|| b.recency.cmp(&a.recency)),
            ConflictResolution::Random => random_keys[a.insertion_order].cmp(&random_keys[b.insertion_order]),
        }).then_with(|| a.insertion_order.cmp(&b.insertion_order))
    });
}

/// `run-forward` (§4.7): saturate `fb` under `rules` up to `config.max_steps`
/// rounds. Returns a [`StepLimitExceeded`](EngineError::StepLimitExceeded)
/// if the fixed point is not reached in time.
pub fn run_forward(fb: &mut FactBase, rules: &[Rule], config: &EngineConfig) -> Result<ForwardReport, EngineError> {
    let mut report = ForwardReport::default();
    let mut asserted_at: HashMap<Term, u64> = fb.iter().map(|f| (f.clone(), 0)).collect();
    let mut seq: u64 = 1;

    loop {
        let mut agenda = build_agenda(rules, fb, &asserted_at);
        if agenda.is_empty() {
            return Ok(report);
        }

        if report.rounds >= config.max_steps {
            return Err(EngineError::StepLimitExceeded(config.max_steps));
        }

        order_agenda(&mut agenda, config, report.rounds);

        for activation in &agenda {
            let mut asserted_here = Vec::new();
            for consequent in &activation.consequents {
                match fb.assert(consequent.clone()) {
                    Ok(true) => {
                        asserted_at.insert(consequent.clone(), seq);
                        seq += 1;
                        asserted_here.push(consequent.clone());
                    }
                    Ok(false) => {}
                    Err(e) => return Err(e),
                }
            }
            if !asserted_here.is_empty() {
                report.derived += asserted_here.len() as u64;
                report.firings.push(Firing {
                    rule_index: activation.rule_index,
                    rule_name: rules[activation.rule_index].name.clone(),
                    asserted: asserted_here,
                });
            }
        }

        report.rounds += 1;
    }
}

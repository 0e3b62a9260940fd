// SPDX-License-Identifier: MIT OR Apache-2.0

//! The engine facade: owns a fact base, rule set, and configuration
//! behind the value-oriented API of §6.
//!
//! Grounded on `kanren::core::LogicEngine`, which wraps a `FactDB` behind
//! `ingest_report`/`load_standard_rules`/`analyze` convenience methods.
//! `Engine` generalizes that shape into the full method surface of §6's
//! operations table, adds `EngineStats`/`TraceEvent` instrumentation (new
//! relative to the teacher, which has none), and replaces the
//! vulnerability-specific `ingest_report`/`analyze` pair with the general
//! `assert`/`retract`/`run_forward`/`prove`/`ask`/`explain` surface.

use crate::backward::{self, Proof, ProveOptions};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::factbase::FactBase;
use crate::forward::{self, ForwardReport};
use crate::rule::Rule;
use crate::subst::Substitution;
use crate::term::Term;
use std::collections::HashMap;

/// An event recorded when `config.trace` is enabled (§3.9).
#[derive(Debug, Clone)]
pub enum TraceEvent {
    FactAsserted(Term),
    FactRetracted(Term),
    RuleFired { rule_index: usize, rule_name: Option<String>, asserted: Vec<Term> },
    ProofAttempt { goal: Term, found: bool },
    DepthLimitHit,
}

/// Counters accumulated over the lifetime of an `Engine` (§3.9, §6).
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    pub fact_count: usize,
    pub rule_count: usize,
    pub forward_rounds: u64,
    pub forward_derived: u64,
    pub backward_proofs: u64,
    pub depth_limit_hit: bool,
}

/// A proof tree decorated with provenance metadata (§4.8.5).
#[derive(Debug, Clone)]
pub enum ExplainedProof {
    Fact {
        goal: Term,
        bindings: Substitution,
        fact: Term,
        asserted_round: Option<u64>,
    },
    Rule {
        goal: Term,
        bindings: Substitution,
        rule_name: Option<String>,
        priority: i64,
        children: Vec<ExplainedProof>,
    },
}

/// The top-level engine (§6). Single-threaded, exclusively owned mutable
/// state: a fact base, a rule list, and a configuration record.
#[derive(Debug, Default)]
pub struct Engine {
    facts: FactBase,
    rules: Vec<Rule>,
    config: EngineConfig,
    stats: EngineStats,
    fact_rounds: HashMap<Term, u64>,
    trace_log: Vec<TraceEvent>,
}

impl Engine {
    /// `Engine::new` (§6): construct from optional initial facts, rules,
    /// and configuration. Fails on the first unsafe rule or malformed fact.
    pub fn new(facts: Vec<Term>, rules: Vec<Rule>, config: EngineConfig) -> Result<Self> {
        let mut engine = Engine {
            facts: FactBase::new(),
            rules: Vec::new(),
            config,
            stats: EngineStats::default(),
            fact_rounds: HashMap::new(),
            trace_log: Vec::new(),
        };
        for fact in facts {
            engine.assert(fact)?;
        }
        for rule in rules {
            engine.add_rule(rule)?;
        }
        Ok(engine)
    }

    /// `assert(fact)` (§6): returns whether the fact was novel.
    pub fn assert(&mut self, fact: Term) -> Result<bool> {
        let novel = self.facts.assert(fact.clone())?;
        if novel {
            self.fact_rounds.entry(fact.clone()).or_insert(0);
            if self.config.trace {
                self.trace_log.push(TraceEvent::FactAsserted(fact));
            }
        }
        self.stats.fact_count = self.facts.len();
        Ok(novel)
    }

    /// `retract(fact)` (§6): returns whether the fact existed.
    pub fn retract(&mut self, fact: &Term) -> bool {
        let existed = self.facts.retract(fact);
        if existed {
            self.fact_rounds.remove(fact);
            if self.config.trace {
                self.trace_log.push(TraceEvent::FactRetracted(fact.clone()));
            }
        }
        self.stats.fact_count = self.facts.len();
        existed
    }

    /// `facts` (§6): every asserted fact, in stable insertion order.
    pub fn facts(&self) -> impl Iterator<Item = &Term> {
        self.facts.iter()
    }

    /// `add_rule(rule)` (§6): validates safety before accepting.
    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        rule.check_safety()?;
        self.rules.push(rule);
        self.stats.rule_count = self.rules.len();
        Ok(())
    }

    /// `rules` (§6).
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// `run_forward` (§6): saturate the fact base to a fixed point.
    pub fn run_forward(&mut self) -> Result<ForwardReport> {
        let report = forward::run_forward(&mut self.facts, &self.rules, &self.config)?;
        self.stats.fact_count = self.facts.len();
        self.stats.forward_rounds += report.rounds;
        self.stats.forward_derived += report.derived;
        for firing in &report.firings {
            for fact in &firing.asserted {
                self.fact_rounds.insert(fact.clone(), self.stats.forward_rounds);
            }
            if self.config.trace {
                self.trace_log.push(TraceEvent::RuleFired {
                    rule_index: firing.rule_index,
                    rule_name: firing.rule_name.clone(),
                    asserted: firing.asserted.clone(),
                });
            }
        }
        Ok(report)
    }

    fn note_proof_attempt(&mut self, goal: &Term, found: bool, depth_limit_hit: bool) {
        self.stats.backward_proofs += 1;
        if depth_limit_hit {
            self.stats.depth_limit_hit = true;
            if self.config.trace {
                self.trace_log.push(TraceEvent::DepthLimitHit);
            }
        }
        if self.config.trace {
            self.trace_log.push(TraceEvent::ProofAttempt { goal: goal.clone(), found });
        }
    }

    /// `prove(goal, opts?)` (§6): every proof up to `max-depth`.
    pub fn prove(&mut self, goal: &Term) -> Vec<Proof> {
        let (proofs, depth_limit_hit) = backward::prove(goal, &self.facts, &self.rules, &self.config);
        self.note_proof_attempt(goal, !proofs.is_empty(), depth_limit_hit);
        proofs
    }

    /// `prove_one(goal, opts?)` (§6): the first proof, if any.
    pub fn prove_one(&mut self, goal: &Term) -> Option<Proof> {
        let (proof, depth_limit_hit) = backward::prove_one(goal, &self.facts, &self.rules, &self.config);
        self.note_proof_attempt(goal, proof.is_some(), depth_limit_hit);
        proof
    }

    /// `ask(goal, opts?)` (§6): goal-restricted bindings of every proof.
    pub fn ask(&mut self, goal: &Term, opts: &ProveOptions) -> Vec<Substitution> {
        let (bindings, depth_limit_hit) = backward::ask(goal, &self.facts, &self.rules, &self.config, opts);
        self.note_proof_attempt(goal, !bindings.is_empty(), depth_limit_hit);
        bindings
    }

    /// `explain(goal)` (§6, §4.8.5): the first proof, decorated with the
    /// wall-round each contributing fact was first asserted and, for rule
    /// nodes, the rule's name and priority.
    pub fn explain(&mut self, goal: &Term) -> Option<ExplainedProof> {
        let proof = self.prove_one(goal)?;
        Some(self.decorate(&proof))
    }

    fn decorate(&self, proof: &Proof) -> ExplainedProof {
        match proof {
            Proof::Fact { goal, bindings, fact } => ExplainedProof::Fact {
                goal: goal.clone(),
                bindings: bindings.clone(),
                fact: fact.clone(),
                asserted_round: self.fact_rounds.get(fact).copied(),
            },
            Proof::Rule { goal, bindings, rule_index, children } => ExplainedProof::Rule {
                goal: goal.clone(),
                bindings: bindings.clone(),
                rule_name: self.rules.get(*rule_index).and_then(|r| r.name.clone()),
                priority: self.rules.get(*rule_index).map(|r| r.priority).unwrap_or(0),
                children: children.iter().map(|c| self.decorate(c)).collect(),
            },
        }
    }

    /// `configure(key, value)` (§6).
    pub fn configure(&mut self, key: &str, value: &str) -> Result<()> {
        self.config.set(key, value)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// `stats` (§6, §3.9).
    pub fn stats(&self) -> EngineStats {
        self.stats.clone()
    }

    /// The ordered in-memory trace log, populated only while `trace` is
    /// enabled in the configuration (§3.9).
    pub fn trace_log(&self) -> &[TraceEvent] {
        &self.trace_log
    }

    /// `clear` (§6): empties facts, rules, and stats; configuration is
    /// preserved.
    pub fn clear(&mut self) {
        self.facts.clear();
        self.rules.clear();
        self.fact_rounds.clear();
        self.trace_log.clear();
        self.stats = EngineStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn likes(a: &str, b: &str) -> Term {
        Term::compound(vec![Term::symbol("likes"), Term::symbol(a), Term::symbol(b)])
    }

    #[test]
    fn assert_and_run_forward_update_stats() {
        let mut engine = Engine::new(vec![likes("alice", "bob")], vec![], EngineConfig::default()).unwrap();
        let rule = Rule::new(
            vec![Term::compound(vec![Term::symbol("likes"), Term::var("x"), Term::var("y")])],
            vec![Term::compound(vec![Term::symbol("likes"), Term::var("y"), Term::var("x")])],
        )
        .unwrap();
        engine.add_rule(rule).unwrap();

        let report = engine.run_forward().unwrap();
        assert_eq!(report.derived, 1);
        let stats = engine.stats();
        assert_eq!(stats.fact_count, 2);
        assert_eq!(stats.rule_count, 1);
        assert_eq!(stats.forward_derived, 1);
    }

    #[test]
    fn prove_one_and_explain_report_rule_metadata() {
        let mut engine = Engine::new(
            vec![Term::compound(vec![Term::symbol("parent"), Term::symbol("alice"), Term::symbol("bob")])],
            vec![],
            EngineConfig::default(),
        )
        .unwrap();
        let rule = Rule::new(
            vec![Term::compound(vec![Term::symbol("parent"), Term::var("x"), Term::var("y")])],
            vec![Term::compound(vec![Term::symbol("ancestor"), Term::var("x"), Term::var("y")])],
        )
        .unwrap()
        .named("parent-is-ancestor");
        engine.add_rule(rule).unwrap();

        let goal = Term::compound(vec![Term::symbol("ancestor"), Term::var("who"), Term::symbol("bob")]);
        let explained = engine.explain(&goal).unwrap();
        match explained {
            ExplainedProof::Rule { rule_name, .. } => {
                assert_eq!(rule_name.as_deref(), Some("parent-is-ancestor"));
            }
            _ => panic!("expected a rule proof"),
        }
        assert_eq!(engine.stats().backward_proofs, 1);
    }

    #[test]
    fn retract_removes_fact_and_clear_resets_everything() {
        let mut engine = Engine::new(vec![likes("alice", "bob")], vec![], EngineConfig::default()).unwrap();
        assert!(engine.retract(&likes("alice", "bob")));
        assert!(!engine.retract(&likes("alice", "bob")));
        engine.clear();
        assert_eq!(engine.stats().fact_count, 0);
        assert_eq!(engine.facts().count(), 0);
    }

    #[test]
    fn configure_rejects_bad_values() {
        let mut engine = Engine::new(vec![], vec![], EngineConfig::default()).unwrap();
        assert!(engine.configure("max-depth", "not-a-number").is_err());
        engine.configure("max-depth", "3").unwrap();
        assert_eq!(engine.config().max_depth, 3);
    }

    #[test]
    fn trace_log_records_events_only_when_enabled() {
        let mut config = EngineConfig::default();
        config.trace = true;
        let mut engine = Engine::new(vec![], vec![], config).unwrap();
        engine.assert(likes("alice", "bob")).unwrap();
        assert_eq!(engine.trace_log().len(), 1);
    }
}

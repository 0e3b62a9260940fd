// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rules (§3.4): antecedent/consequent patterns, safety validation.
//!
//! Grounded on `kanren::core::LogicRule`/`RuleMetadata`, generalized from a
//! single-head/body-conjunction shape into the full `when`/`then`/`name`/
//! `priority` record of §3.4, with the variable-occurrence safety check
//! the teacher's `LogicRule` never performed (the teacher accepted any
//! rule unconditionally).

use crate::error::EngineError;
use crate::term::Term;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A rule: `when` antecedents imply `then` consequents (§3.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub when: Vec<Term>,
    pub then: Vec<Term>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub priority: i64,
}

impl Rule {
    /// Construct and validate a rule (§3.4's safety condition).
    pub fn new(when: Vec<Term>, then: Vec<Term>) -> Result<Self, EngineError> {
        Self::validate(&when, &then, &None)?;
        Ok(Rule {
            when,
            then,
            name: None,
            priority: 0,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Re-validate after construction (e.g. fixtures deserialized directly
    /// from JSON bypass `Rule::new`).
    pub fn check_safety(&self) -> Result<(), EngineError> {
        Self::validate(&self.when, &self.then, &self.name)
    }

    fn validate(when: &[Term], then: &[Term], name: &Option<String>) -> Result<(), EngineError> {
        if then.is_empty() {
            return Err(EngineError::EmptyConsequents(name.clone()));
        }
        if when.is_empty() {
            for t in then {
                if !t.is_ground() {
                    let offender = t
                        .extract_vars()
                        .into_iter()
                        .next()
                        .map(|v| v.name().to_string())
                        .unwrap_or_else(|| "_".to_string());
                    return Err(EngineError::UnsafeRule(name.clone(), offender));
                }
            }
        } else {
            let when_vars: IndexSet<_> = when.iter().flat_map(|p| p.extract_vars()).collect();
            for t in then {
                for v in t.extract_vars() {
                    if !when_vars.contains(&v) {
                        return Err(EngineError::UnsafeRule(name.clone(), v.name().to_string()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Number of antecedent patterns; used by the `specificity` tie-break
    /// (§4.7.3: "more antecedent patterns first").
    pub fn specificity(&self) -> usize {
        self.when.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_with_unbound_then_variable_is_rejected() {
        let when = vec![Term::compound(vec![Term::symbol("p"), Term::var("x")])];
        let then = vec![Term::compound(vec![Term::symbol("q"), Term::var("y")])];
        assert!(matches!(Rule::new(when, then), Err(EngineError::UnsafeRule(_, _))));
    }

    #[test]
    fn rule_with_empty_when_requires_ground_then() {
        let then = vec![Term::compound(vec![Term::symbol("q"), Term::var("y")])];
        assert!(matches!(Rule::new(vec![], then), Err(EngineError::UnsafeRule(_, _))));

        let ground_then = vec![Term::compound(vec![Term::symbol("q"), Term::symbol("a")])];
        assert!(Rule::new(vec![], ground_then).is_ok());
    }

    #[test]
    fn rule_with_empty_then_is_rejected() {
        let when = vec![Term::compound(vec![Term::symbol("p"), Term::var("x")])];
        assert!(matches!(Rule::new(when, vec![]), Err(EngineError::EmptyConsequents(_))));
    }

    #[test]
    fn safe_rule_is_accepted() {
        let when = vec![Term::compound(vec![Term::symbol("parent"), Term::var("x"), Term::var("y")])];
        let then = vec![Term::compound(vec![Term::symbol("ancestor"), Term::var("x"), Term::var("y")])];
        assert!(Rule::new(when, then).is_ok());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine configuration (§3.6).
//!
//! Grounded on the teacher's ad hoc `SearchStrategy` enum in
//! `kanren::strategy`, replaced with the spec's own recognized-options
//! table rather than the teacher's file-prioritization semantics.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Backward-search order (§3.6, §4.8.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    DepthFirst,
    BreadthFirst,
    IterativeDeepening,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::DepthFirst
    }
}

/// Forward-chaining conflict-resolution tie-break chain (§4.7.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictResolution {
    Priority,
    Recency,
    Specificity,
    Random,
    /// Recency, then specificity.
    Mrs,
    /// Specificity, then recency.
    Mevis,
}

impl Default for ConflictResolution {
    fn default() -> Self {
        ConflictResolution::Priority
    }
}

/// The engine's configuration record (§3.6). Immutable in effect after
/// construction except through `Engine::configure`, which must
/// happen-before any inference call that should observe the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub strategy: Strategy,
    pub max_depth: u32,
    pub max_steps: u64,
    pub conflict_resolution: ConflictResolution,
    pub trace: bool,
    pub random_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            strategy: Strategy::default(),
            max_depth: 10,
            max_steps: 1000,
            conflict_resolution: ConflictResolution::default(),
            trace: false,
            random_seed: 0,
        }
    }
}

impl EngineConfig {
    /// Apply a single `key`/`value` update, as exercised by
    /// `Engine::configure` (§6). Keys and values use the same spellings as
    /// the JSON wire form (kebab-case).
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), EngineError> {
        match key {
            "strategy" => {
                self.strategy = parse_kebab(value).ok_or_else(|| {
                    EngineError::InvalidConfig(format!("unrecognized strategy: {value}"))
                })?;
            }
            "max-depth" => {
                self.max_depth = value
                    .parse()
                    .map_err(|_| EngineError::InvalidConfig(format!("max-depth must be a non-negative integer, got: {value}")))?;
            }
            "max-steps" => {
                self.max_steps = value
                    .parse()
                    .map_err(|_| EngineError::InvalidConfig(format!("max-steps must be a non-negative integer, got: {value}")))?;
            }
            "conflict-resolution" => {
                self.conflict_resolution = parse_kebab(value).ok_or_else(|| {
                    EngineError::InvalidConfig(format!("unrecognized conflict-resolution: {value}"))
                })?;
            }
            "trace" => {
                self.trace = value
                    .parse()
                    .map_err(|_| EngineError::InvalidConfig(format!("trace must be a boolean, got: {value}")))?;
            }
            "random-seed" => {
                self.random_seed = value
                    .parse()
                    .map_err(|_| EngineError::InvalidConfig(format!("random-seed must be a 64-bit integer, got: {value}")))?;
            }
            other => return Err(EngineError::InvalidConfig(format!("unknown config key: {other}"))),
        }
        Ok(())
    }
}

fn parse_kebab<T: serde::de::DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).ok()
}

//! Engine configuration.
//!
//! Read from a JSON file whose keys are camelCase; every key is optional:
//!
//! ```json
//! { "maxInstantiationDepth": 50, "maxInstantiationIterations": 100000, "joinStrategy": "fail" }
//! ```

use crate::infer::JoinStrategy;
use crate::recursion::RecursionProfile;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use tsgen_common::limits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    /// Nested generic applications allowed before `RecursiveGenericExpansionLimit`.
    #[serde(default = "default_max_instantiation_depth")]
    pub max_instantiation_depth: u32,
    /// Total expansion attempts allowed per top-level instantiation.
    #[serde(default = "default_max_instantiation_iterations")]
    pub max_instantiation_iterations: u32,
    #[serde(default)]
    pub join_strategy: JoinStrategy,
}

fn default_max_instantiation_depth() -> u32 {
    limits::MAX_INSTANTIATION_DEPTH
}

fn default_max_instantiation_iterations() -> u32 {
    limits::MAX_GUARD_ITERATIONS
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_instantiation_depth: default_max_instantiation_depth(),
            max_instantiation_iterations: default_max_instantiation_iterations(),
            join_strategy: JoinStrategy::default(),
        }
    }
}

impl SolverConfig {
    /// Limits for the expansion guard of an instantiation engine.
    pub fn expansion_profile(&self) -> RecursionProfile {
        let preset = RecursionProfile::TypeApplication;
        if self.max_instantiation_depth == preset.max_depth()
            && self.max_instantiation_iterations == preset.max_iterations()
        {
            return preset;
        }
        RecursionProfile::Custom {
            max_depth: self.max_instantiation_depth,
            max_iterations: self.max_instantiation_iterations,
        }
    }
}

pub fn parse_solver_config(source: &str) -> Result<SolverConfig> {
    let config: SolverConfig =
        serde_json::from_str(source).context("failed to parse solver config JSON")?;
    if config.max_instantiation_depth == 0 {
        bail!("maxInstantiationDepth must be at least 1");
    }
    if config.max_instantiation_iterations < config.max_instantiation_depth {
        bail!(
            "maxInstantiationIterations ({}) is smaller than maxInstantiationDepth ({})",
            config.max_instantiation_iterations,
            config.max_instantiation_depth
        );
    }
    Ok(config)
}

pub fn load_solver_config(path: &Path) -> Result<SolverConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read solver config: {}", path.display()))?;
    parse_solver_config(&source)
        .with_context(|| format!("failed to parse solver config: {}", path.display()))
}

#[cfg(test)]
#[path = "../tests/config_tests.rs"]
mod tests;

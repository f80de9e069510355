//! TOML configuration parsing for SfcSim.
//!
//! Defines the configuration schema for a simulation run: the policy to use,
//! the cache strategy applied to every NFV-capable node, the topology and the
//! trace source. The chosen policy and cache strategy are resolved from this
//! struct explicitly; nothing is registered globally.

use crate::network::{CachePolicy, NetworkState};
use crate::topology::{Topology, TopologyDescriptor};
use crate::vnf_cache::{CapacityMetric, EvictionPolicy};
use serde::{Deserialize, Serialize};
use sfcsim_policies::{NodeRole, Policy, PolicyOptions, SfcError};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Validation(String),
    #[error("Failed to build network: {0}")]
    Network(#[from] SfcError),
    #[error("Simulation failed: {0}")]
    Simulation(SfcError),
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub cache: CacheSection,
    pub topology: TopologyDescriptor,
    #[serde(default)]
    pub trace: TraceSection,
    #[serde(default)]
    pub policy: PolicySection,
}

/// General simulation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSection {
    /// Human-readable name for this simulation.
    #[serde(default = "default_sim_name")]
    pub name: String,
    /// Policy used by `run` when none is given on the command line.
    #[serde(default = "default_policy")]
    pub policy: String,
}

fn default_sim_name() -> String {
    "simulation".to_string()
}

fn default_policy() -> String {
    "greedy_online".to_string()
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            name: default_sim_name(),
            policy: default_policy(),
        }
    }
}

/// Cache strategy applied to every NFV-capable node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    /// "slots" or "cpu".
    #[serde(default)]
    pub metric: CapacityMetric,
    /// Default capacity, in units of `metric`.
    #[serde(default = "default_capacity")]
    pub capacity: f64,
    /// "fifo" or "reject".
    #[serde(default)]
    pub eviction: EvictionPolicy,
}

fn default_capacity() -> f64 {
    4.0
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            metric: CapacityMetric::default(),
            capacity: default_capacity(),
            eviction: EvictionPolicy::default(),
        }
    }
}

/// Trace source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSection {
    /// Only "compact_jsonl" is supported.
    #[serde(default = "default_trace_format")]
    pub format: String,
    /// Path to the trace file. The CLI's `--trace` takes precedence.
    pub path: Option<String>,
}

fn default_trace_format() -> String {
    "compact_jsonl".to_string()
}

impl Default for TraceSection {
    fn default() -> Self {
        Self {
            format: default_trace_format(),
            path: None,
        }
    }
}

/// Policy tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySection {
    /// Candidate paths evaluated by the budget-aware policy.
    #[serde(default = "default_tap_max_candidates")]
    pub tap_max_candidates: usize,
}

fn default_tap_max_candidates() -> usize {
    8
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            tap_max_candidates: default_tap_max_candidates(),
        }
    }
}

impl SimConfig {
    /// Configuration with defaults for everything but the topology.
    pub fn with_topology(topology: TopologyDescriptor) -> Self {
        Self {
            simulation: SimulationSection::default(),
            cache: CacheSection::default(),
            topology,
            trace: TraceSection::default(),
            policy: PolicySection::default(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !sfcsim_policies::available_policies().contains(&self.simulation.policy.as_str()) {
            return Err(ConfigError::Validation(format!(
                "unknown policy '{}'",
                self.simulation.policy
            )));
        }
        if !self.cache.capacity.is_finite() || self.cache.capacity <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "cache capacity must be > 0, got {}",
                self.cache.capacity
            )));
        }
        for node in &self.topology.nodes {
            if let Some(capacity) = node.capacity {
                if !capacity.is_finite() || capacity <= 0.0 {
                    return Err(ConfigError::Validation(format!(
                        "node {} capacity must be > 0, got {}",
                        node.id, capacity
                    )));
                }
            }
            if node.role != NodeRole::NfvCapable
                && (node.capacity.is_some() || !node.vnfs.is_empty())
            {
                return Err(ConfigError::Validation(format!(
                    "node {} is not NFV-capable and cannot host VNFs",
                    node.id
                )));
            }
        }
        if self.policy.tap_max_candidates == 0 {
            return Err(ConfigError::Validation(
                "tap_max_candidates must be > 0".to_string(),
            ));
        }
        if self.trace.format != "compact_jsonl" {
            return Err(ConfigError::Validation(format!(
                "unsupported trace format '{}'",
                self.trace.format
            )));
        }
        Topology::from_descriptor(&self.topology)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        Ok(())
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            metric: self.cache.metric,
            capacity: self.cache.capacity,
            eviction: self.cache.eviction,
        }
    }

    pub fn policy_options(&self) -> PolicyOptions {
        PolicyOptions {
            tap_max_candidates: self.policy.tap_max_candidates,
        }
    }

    /// Build a fresh network state. Every call returns independent caches.
    pub fn build_network(&self) -> Result<NetworkState, ConfigError> {
        Ok(NetworkState::from_descriptor(
            &self.topology,
            self.cache_policy(),
        )?)
    }

    /// Instantiate the named policy with this configuration's options.
    pub fn build_policy(&self, name: &str) -> Result<Box<dyn Policy>, ConfigError> {
        sfcsim_policies::build_policy(name, &self.policy_options()).ok_or_else(|| {
            ConfigError::Validation(format!(
                "unknown policy '{}' (available: {})",
                name,
                sfcsim_policies::available_policies().join(", ")
            ))
        })
    }
}

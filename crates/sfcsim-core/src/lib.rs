//! SfcSim — Discrete-event simulator for service function chain admission
//! and VNF placement.
//!
//! This crate provides the simulation side of SfcSim: the immutable network
//! topology with its shortest-path table, the per-node VNF caches, the
//! controller through which policies drive each request, and the collectors
//! that turn session events into a report. Placement policies from
//! `sfcsim-policies` are plugged in to decide each request's fate.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐     ┌───────────┐     ┌──────────────┐
//! │  Trace   │────▶│  Engine   │────▶│  Collectors  │
//! │ Ingestion│     │ (Arrivals)│     │   (Report)   │
//! └──────────┘     └─────┬─────┘     └──────▲───────┘
//!                        │                  │
//!                ┌───────┴───────┐          │
//!                │    Policy     │          │
//!                │ (Placement)   │          │
//!                └───────┬───────┘          │
//!                        │                  │
//!                ┌───────▼───────┐          │
//!                │  Controller   │──────────┘
//!                │   (Session)   │
//!                └───────┬───────┘
//!          ┌─────────────┼─────────────┐
//!          ▼             ▼             ▼
//!    ┌──────────┐  ┌──────────┐  ┌──────────┐
//!    │ Topology │  │NFV node 1│  │NFV node N│
//!    │ (paths)  │  │VNF cache │  │VNF cache │
//!    └──────────┘  └──────────┘  └──────────┘
//! ```

pub mod clock;
pub mod collector;
pub mod config;
pub mod controller;
pub mod engine;
pub mod metrics;
pub mod network;
pub mod session;
pub mod topology;
pub mod trace;
pub mod vnf_cache;

// Re-export key types for convenience.
pub use clock::SimClock;
pub use collector::{Collector, CollectorProxy};
pub use config::{ConfigError, SimConfig};
pub use controller::NetworkController;
pub use engine::{RequestOutcome, SimulationEngine};
pub use metrics::SimulationReport;
pub use network::{CachePolicy, NetworkState};
pub use session::Session;
pub use topology::{Topology, TopologyDescriptor};
pub use trace::{load_trace, write_compact_jsonl};
pub use vnf_cache::{CacheStats, CapacityMetric, EvictionPolicy, VnfCache};

use sfcsim_policies::{Policy, SfcRequest};

/// Run a complete simulation with the given config, trace, and policy.
///
/// The network is built fresh from `config`, so repeated calls never share
/// cache state.
pub fn run_simulation(
    config: &SimConfig,
    requests: Vec<SfcRequest>,
    policy: Box<dyn Policy>,
) -> Result<SimulationReport, ConfigError> {
    let network = config.build_network()?;
    let mut engine =
        SimulationEngine::new(network, policy).with_name(config.simulation.name.clone());
    engine
        .load_trace(requests)
        .map_err(ConfigError::Simulation)?;
    engine.run().map_err(ConfigError::Simulation)
}

/// Run a comparison of multiple policies on the same trace and config.
pub fn compare_policies(
    config: &SimConfig,
    requests: &[SfcRequest],
    policy_names: &[&str],
) -> Result<Vec<SimulationReport>, ConfigError> {
    policy_names
        .iter()
        .map(|name| {
            let policy = config.build_policy(name)?;
            run_simulation(config, requests.to_vec(), policy)
        })
        .collect()
}

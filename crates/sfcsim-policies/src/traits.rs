//! Policy trait definitions.
//!
//! All placement policies implement the [`Policy`] trait. A policy receives a
//! request, a read-only [`TopologyView`] and a [`Controller`] through which it
//! drives the request's session (hops, cache lookups, placements) and returns
//! an [`Outcome`].

use crate::error::SfcError;
use crate::vnf::VnfType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Node identifier within a topology.
pub type NodeId = u32;

/// Role a node plays in the topology. Assigned once at construction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Requests enter the network here.
    Ingress,
    /// Requests leave the network here.
    Egress,
    /// May host a bounded cache of instantiated VNFs.
    NfvCapable,
    /// Plain forwarding node.
    #[default]
    Forwarding,
}

/// Link classification.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    #[default]
    Internal,
    External,
}

/// A service function chain request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfcRequest {
    /// Unique request identifier.
    pub id: u64,
    /// Arrival time in simulation time units.
    pub timestamp: f64,
    /// Required VNFs, in chain order.
    pub vnfs: Vec<VnfType>,
    /// Maximum tolerable accumulated delay (links + processing).
    pub delay_budget: f64,
    pub ingress: NodeId,
    pub egress: NodeId,
}

impl SfcRequest {
    /// Required VNFs with duplicates removed, keeping first-appearance order.
    pub fn requirements(&self) -> Vec<VnfType> {
        let mut seen = Vec::with_capacity(self.vnfs.len());
        for &vnf in &self.vnfs {
            if !seen.contains(&vnf) {
                seen.push(vnf);
            }
        }
        seen
    }

    /// Aggregate CPU cost of the distinct requirements.
    pub fn total_cpu(&self) -> f64 {
        crate::vnf::total_cpu(&self.requirements())
    }

    /// Aggregate processing delay of the distinct requirements.
    pub fn total_processing_delay(&self) -> f64 {
        crate::vnf::total_processing_delay(&self.requirements())
    }
}

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Accumulated delay went over the budget.
    BudgetExceeded,
    /// The path ended with required VNFs still unprocessed.
    UnmetRequirements,
    /// No candidate path could carry the request.
    NoFeasiblePath,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::BudgetExceeded => "budget_exceeded",
            RejectReason::UnmetRequirements => "unmet_requirements",
            RejectReason::NoFeasiblePath => "no_feasible_path",
        };
        f.write_str(s)
    }
}

/// Decision returned by a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Accepted,
    Rejected(RejectReason),
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted)
    }
}

/// Read-only queries over a precomputed network topology.
///
/// Implementations must be cheap to share; policies never mutate topology.
/// Queries about unknown nodes or edges fail with [`SfcError::NotFound`].
pub trait TopologyView {
    /// Precomputed shortest path (by link delay), endpoints included.
    fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<Vec<NodeId>, SfcError>;

    /// Link-delay length of the shortest path between two nodes.
    fn path_distance(&self, from: NodeId, to: NodeId) -> Result<f64, SfcError>;

    fn link_delay(&self, u: NodeId, v: NodeId) -> Result<f64, SfcError>;

    fn link_type(&self, u: NodeId, v: NodeId) -> Result<LinkType, SfcError>;

    fn node_role(&self, node: NodeId) -> Result<NodeRole, SfcError>;

    fn is_nfv_capable(&self, node: NodeId) -> Result<bool, SfcError> {
        Ok(self.node_role(node)? == NodeRole::NfvCapable)
    }

    /// Number of distinct neighbours of a node.
    fn degree(&self, node: NodeId) -> Result<usize, SfcError>;

    /// All NFV-capable nodes in ascending id order.
    fn nfv_nodes(&self) -> Vec<NodeId>;
}

/// Mediates between a policy and the mutable network state.
///
/// Session-scoped operations fail with [`SfcError::NoActiveSession`] when no
/// session is open. At most one session is open at a time.
pub trait Controller {
    /// Open a session for `request`.
    fn start_session(&mut self, timestamp: f64, request: &SfcRequest) -> Result<(), SfcError>;

    /// Record traversal of edge `(u, v)` and charge its delay.
    fn forward_hop(&mut self, u: NodeId, v: NodeId) -> Result<(), SfcError>;

    /// Whether `vnf` is instantiated at `node`. Counts as a cache lookup.
    fn lookup_vnf(&mut self, node: NodeId, vnf: VnfType) -> Result<bool, SfcError>;

    /// Membership test that leaves statistics and observers untouched.
    fn has_vnf(&self, node: NodeId, vnf: VnfType) -> Result<bool, SfcError>;

    /// Instantiate `vnf` at `node`. Fails with [`SfcError::CacheFull`] when it cannot be admitted.
    fn place_vnf(&mut self, node: NodeId, vnf: VnfType) -> Result<(), SfcError>;

    /// Mark `vnf` as applied at `node`, charging its processing delay once.
    fn mark_processed(&mut self, node: NodeId, vnf: VnfType) -> Result<(), SfcError>;

    /// Remember that `vnf` was not found along the path so far.
    fn record_missed(&mut self, vnf: VnfType) -> Result<(), SfcError>;

    /// Report that the current request's chain was fully served.
    fn sfc_hit(&mut self) -> Result<(), SfcError>;

    /// Close the session with its final outcome.
    fn end_session(&mut self, success: bool) -> Result<(), SfcError>;

    fn accumulated_delay(&self) -> Result<f64, SfcError>;

    fn is_processed(&self, vnf: VnfType) -> Result<bool, SfcError>;

    /// Requirements not yet processed, in chain order.
    fn outstanding(&self) -> Result<Vec<VnfType>, SfcError>;

    fn all_processed(&self) -> Result<bool, SfcError> {
        Ok(self.outstanding()?.is_empty())
    }

    fn missed(&self) -> Result<Vec<VnfType>, SfcError>;

    /// Free capacity at `node`, in the units of that node's cache metric.
    fn residual_capacity(&self, node: NodeId) -> Result<f64, SfcError>;

    /// Capacity a new placement at `node` may claim, accounting for the
    /// cache's eviction strategy. Defaults to the residual.
    fn admissible_capacity(&self, node: NodeId) -> Result<f64, SfcError> {
        self.residual_capacity(node)
    }

    /// Capacity `vnf` would occupy at `node`, in the same units.
    fn capacity_demand(&self, node: NodeId, vnf: VnfType) -> Result<f64, SfcError>;
}

/// The core placement policy trait.
///
/// The simulator calls [`Policy::process_event`] once per request, in
/// timestamp order.
pub trait Policy: Send {
    fn process_event(
        &mut self,
        timestamp: f64,
        request: &SfcRequest,
        topology: &dyn TopologyView,
        controller: &mut dyn Controller,
    ) -> Result<Outcome, SfcError>;

    /// Human-readable name for reports.
    fn name(&self) -> &str;

    /// Optional: policy-specific metrics to include in output.
    fn custom_metrics(&self) -> HashMap<String, f64> {
        HashMap::new()
    }
}

/// Sum of link delays along a path.
pub fn path_delay(topology: &dyn TopologyView, path: &[NodeId]) -> Result<f64, SfcError> {
    path.windows(2)
        .map(|hop| topology.link_delay(hop[0], hop[1]))
        .sum()
}

/// NFV-capable nodes strictly between the endpoints of a path, in path order.
pub fn interior_nfv_nodes(
    topology: &dyn TopologyView,
    path: &[NodeId],
) -> Result<Vec<NodeId>, SfcError> {
    if path.len() < 3 {
        return Ok(Vec::new());
    }
    let mut nodes = Vec::new();
    for &node in &path[1..path.len() - 1] {
        if topology.is_nfv_capable(node)? {
            nodes.push(node);
        }
    }
    Ok(nodes)
}

//! Greedy policies along the shortest path.
//!
//! [`GreedyNoPlacement`] only uses VNFs that are already instantiated.
//! [`GreedyOnlinePlacement`] additionally instantiates missing VNFs at the
//! NFV-capable node on the path closest to the egress.

use crate::error::SfcError;
use crate::traits::*;
use crate::traversal::{self, HopResolver};
use log::debug;
use std::collections::HashMap;

/// How a placement-aware policy picks the node that receives missing VNFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementRule {
    /// Smallest shortest-path distance to the egress.
    ClosestToEgress,
    /// Largest number of neighbours in the topology.
    HighestDegree,
}

impl PlacementRule {
    /// Pick the placement node among the interior NFV-capable nodes of `path`.
    ///
    /// Ties go to the node encountered first in path order.
    pub fn select(
        self,
        topology: &dyn TopologyView,
        path: &[NodeId],
        egress: NodeId,
    ) -> Result<Option<NodeId>, SfcError> {
        let mut best: Option<(NodeId, f64)> = None;
        for node in interior_nfv_nodes(topology, path)? {
            let score = match self {
                PlacementRule::ClosestToEgress => -topology.path_distance(node, egress)?,
                PlacementRule::HighestDegree => topology.degree(node)? as f64,
            };
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((node, score));
            }
        }
        Ok(best.map(|(node, _)| node))
    }
}

/// Counters kept by placement-aware policies.
#[derive(Debug, Clone, Default)]
pub struct PlacementStats {
    pub attempted: u64,
    pub placed: u64,
    pub refused: u64,
}

impl PlacementStats {
    pub fn record(&mut self, placed: bool) {
        self.attempted += 1;
        if placed {
            self.placed += 1;
        } else {
            self.refused += 1;
        }
    }

    pub fn to_metrics(&self) -> HashMap<String, f64> {
        let mut m = HashMap::new();
        m.insert("placements_attempted".to_string(), self.attempted as f64);
        m.insert("placements_succeeded".to_string(), self.placed as f64);
        m.insert("placements_refused".to_string(), self.refused as f64);
        m
    }
}

/// Resolver that only consumes VNFs already present at a node.
pub(crate) struct LookupOnly;

impl HopResolver for LookupOnly {
    fn resolve(
        &mut self,
        node: NodeId,
        _request: &SfcRequest,
        _topology: &dyn TopologyView,
        controller: &mut dyn Controller,
    ) -> Result<(), SfcError> {
        for vnf in controller.outstanding()? {
            if controller.lookup_vnf(node, vnf)? {
                controller.mark_processed(node, vnf)?;
            }
        }
        Ok(())
    }
}

/// Resolver that looks up VNFs at every node and places the ones still
/// missing once the request reaches the node chosen by `rule`.
pub(crate) struct OnlinePlacement<'a> {
    rule: PlacementRule,
    placement_node: Option<NodeId>,
    stats: &'a mut PlacementStats,
}

impl<'a> OnlinePlacement<'a> {
    pub(crate) fn new(rule: PlacementRule, stats: &'a mut PlacementStats) -> Self {
        Self {
            rule,
            placement_node: None,
            stats,
        }
    }
}

impl HopResolver for OnlinePlacement<'_> {
    fn prepare(
        &mut self,
        request: &SfcRequest,
        path: &[NodeId],
        topology: &dyn TopologyView,
        _controller: &mut dyn Controller,
    ) -> Result<(), SfcError> {
        self.placement_node = self.rule.select(topology, path, request.egress)?;
        debug!(
            "request {} placement node: {:?}",
            request.id, self.placement_node
        );
        Ok(())
    }

    fn resolve(
        &mut self,
        node: NodeId,
        _request: &SfcRequest,
        _topology: &dyn TopologyView,
        controller: &mut dyn Controller,
    ) -> Result<(), SfcError> {
        for vnf in controller.outstanding()? {
            if controller.lookup_vnf(node, vnf)? {
                controller.mark_processed(node, vnf)?;
            } else {
                controller.record_missed(vnf)?;
            }
        }

        if self.placement_node == Some(node) {
            for vnf in controller.outstanding()? {
                let placed = traversal::try_place(controller, node, vnf)?;
                self.stats.record(placed);
            }
        }
        Ok(())
    }
}

/// Greedy policy that never mutates caches.
pub struct GreedyNoPlacement;

impl GreedyNoPlacement {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GreedyNoPlacement {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for GreedyNoPlacement {
    fn process_event(
        &mut self,
        timestamp: f64,
        request: &SfcRequest,
        topology: &dyn TopologyView,
        controller: &mut dyn Controller,
    ) -> Result<Outcome, SfcError> {
        let path = topology.shortest_path(request.ingress, request.egress)?;
        traversal::traverse(
            timestamp,
            request,
            &path,
            topology,
            controller,
            &mut LookupOnly,
        )
    }

    fn name(&self) -> &str {
        "greedy_no_placement"
    }
}

/// Greedy policy with online placement at the node closest to the egress.
pub struct GreedyOnlinePlacement {
    stats: PlacementStats,
}

impl GreedyOnlinePlacement {
    pub fn new() -> Self {
        Self {
            stats: PlacementStats::default(),
        }
    }
}

impl Default for GreedyOnlinePlacement {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for GreedyOnlinePlacement {
    fn process_event(
        &mut self,
        timestamp: f64,
        request: &SfcRequest,
        topology: &dyn TopologyView,
        controller: &mut dyn Controller,
    ) -> Result<Outcome, SfcError> {
        let path = topology.shortest_path(request.ingress, request.egress)?;
        let mut resolver = OnlinePlacement::new(PlacementRule::ClosestToEgress, &mut self.stats);
        traversal::traverse(timestamp, request, &path, topology, controller, &mut resolver)
    }

    fn name(&self) -> &str {
        "greedy_online"
    }

    fn custom_metrics(&self) -> HashMap<String, f64> {
        self.stats.to_metrics()
    }
}

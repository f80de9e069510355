//! Strict chain-order policy.
//!
//! Requirements are consumed in the order the request lists them: a VNF
//! found at a node is only used once every VNF before it in the chain has
//! been processed. Missing VNFs are placed at the NFV-capable node closest
//! to the egress, in chain order, stopping at the first refusal.

use crate::error::SfcError;
use crate::greedy::{PlacementRule, PlacementStats};
use crate::traits::*;
use crate::traversal::{self, HopResolver};
use std::collections::HashMap;

struct InOrder<'a> {
    placement_node: Option<NodeId>,
    stats: &'a mut PlacementStats,
}

impl HopResolver for InOrder<'_> {
    fn prepare(
        &mut self,
        request: &SfcRequest,
        path: &[NodeId],
        topology: &dyn TopologyView,
        _controller: &mut dyn Controller,
    ) -> Result<(), SfcError> {
        self.placement_node =
            PlacementRule::ClosestToEgress.select(topology, path, request.egress)?;
        Ok(())
    }

    fn resolve(
        &mut self,
        node: NodeId,
        _request: &SfcRequest,
        _topology: &dyn TopologyView,
        controller: &mut dyn Controller,
    ) -> Result<(), SfcError> {
        while let Some(&next) = controller.outstanding()?.first() {
            if !controller.lookup_vnf(node, next)? {
                controller.record_missed(next)?;
                break;
            }
            controller.mark_processed(node, next)?;
        }

        if self.placement_node == Some(node) {
            for vnf in controller.outstanding()? {
                let placed = traversal::try_place(controller, node, vnf)?;
                self.stats.record(placed);
                if !placed {
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Processes the chain strictly in order, placing missing VNFs near the egress.
pub struct FirstOrder {
    stats: PlacementStats,
}

impl FirstOrder {
    pub fn new() -> Self {
        Self {
            stats: PlacementStats::default(),
        }
    }
}

impl Default for FirstOrder {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for FirstOrder {
    fn process_event(
        &mut self,
        timestamp: f64,
        request: &SfcRequest,
        topology: &dyn TopologyView,
        controller: &mut dyn Controller,
    ) -> Result<Outcome, SfcError> {
        let path = topology.shortest_path(request.ingress, request.egress)?;
        let mut resolver = InOrder {
            placement_node: None,
            stats: &mut self.stats,
        };
        traversal::traverse(timestamp, request, &path, topology, controller, &mut resolver)
    }

    fn name(&self) -> &str {
        "first_order"
    }

    fn custom_metrics(&self) -> HashMap<String, f64> {
        self.stats.to_metrics()
    }
}

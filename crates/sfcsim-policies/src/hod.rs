//! Highest-order-degree (HOD) placement.
//!
//! Same traversal as the greedy online policy, but missing VNFs go to the
//! best-connected NFV-capable node on the path, which tends to sit on many
//! other shortest paths.

use crate::error::SfcError;
use crate::greedy::{OnlinePlacement, PlacementRule, PlacementStats};
use crate::traits::*;
use crate::traversal;
use std::collections::HashMap;

pub struct HighestOrderDegree {
    stats: PlacementStats,
}

impl HighestOrderDegree {
    pub fn new() -> Self {
        Self {
            stats: PlacementStats::default(),
        }
    }
}

impl Default for HighestOrderDegree {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for HighestOrderDegree {
    fn process_event(
        &mut self,
        timestamp: f64,
        request: &SfcRequest,
        topology: &dyn TopologyView,
        controller: &mut dyn Controller,
    ) -> Result<Outcome, SfcError> {
        let path = topology.shortest_path(request.ingress, request.egress)?;
        let mut resolver = OnlinePlacement::new(PlacementRule::HighestDegree, &mut self.stats);
        traversal::traverse(timestamp, request, &path, topology, controller, &mut resolver)
    }

    fn name(&self) -> &str {
        "hod"
    }

    fn custom_metrics(&self) -> HashMap<String, f64> {
        self.stats.to_metrics()
    }
}

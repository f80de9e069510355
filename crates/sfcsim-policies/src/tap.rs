//! Budget-aware path selection (TAP).
//!
//! Instead of committing to the shortest path, the policy evaluates a small
//! set of candidate paths up front and traverses the first one whose link
//! delay fits the budget and whose NFV nodes can admit every VNF that is
//! not already hosted on it.
//!
//! Candidates are the shortest path plus, for every NFV-capable node `n`,
//! the detour `ingress -> n -> egress` built from two shortest paths,
//! provided it does not revisit a node. They are ordered by link delay with
//! the shortest path winning ties.

use crate::error::SfcError;
use crate::greedy::PlacementStats;
use crate::traits::*;
use crate::traversal::{self, HopResolver};
use crate::vnf::VnfType;
use log::debug;
use std::collections::{HashMap, HashSet};

const DEFAULT_MAX_CANDIDATES: usize = 8;

/// Places missing VNFs at the first node that can take them, unless an
/// instance is already waiting further along the path.
struct FirstFit<'a> {
    nfv_nodes: Vec<NodeId>,
    stats: &'a mut PlacementStats,
}

impl FirstFit<'_> {
    fn hosted_downstream(
        &self,
        node: NodeId,
        vnf: VnfType,
        controller: &dyn Controller,
    ) -> Result<bool, SfcError> {
        let after = self
            .nfv_nodes
            .iter()
            .position(|&n| n == node)
            .map_or(self.nfv_nodes.len(), |i| i + 1);
        for &later in &self.nfv_nodes[after..] {
            if controller.has_vnf(later, vnf)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl HopResolver for FirstFit<'_> {
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

        for vnf in controller.outstanding()? {
            if self.hosted_downstream(node, vnf, controller)? {
                continue;
            }
            let placed = traversal::try_place(controller, node, vnf)?;
            self.stats.record(placed);
            if !placed {
                controller.record_missed(vnf)?;
            }
        }
        Ok(())
    }
}

/// Budget-aware path selection with first-fit placement.
pub struct BudgetAwarePath {
    max_candidates: usize,
    stats: PlacementStats,
    candidates_evaluated: u64,
    infeasible: u64,
}

impl BudgetAwarePath {
    pub fn new() -> Self {
        Self::with_max_candidates(DEFAULT_MAX_CANDIDATES)
    }

    /// Limit the number of candidate paths evaluated per request (at least one).
    pub fn with_max_candidates(max_candidates: usize) -> Self {
        Self {
            max_candidates: max_candidates.max(1),
            stats: PlacementStats::default(),
            candidates_evaluated: 0,
            infeasible: 0,
        }
    }

    /// Candidate paths for `request`, cheapest first.
    pub fn candidate_paths(
        &self,
        request: &SfcRequest,
        topology: &dyn TopologyView,
    ) -> Result<Vec<Vec<NodeId>>, SfcError> {
        let (ingress, egress) = (request.ingress, request.egress);
        let mut paths = vec![topology.shortest_path(ingress, egress)?];

        for node in topology.nfv_nodes() {
            if node == ingress || node == egress {
                continue;
            }
            let head = match topology.shortest_path(ingress, node) {
                Ok(p) => p,
                Err(SfcError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            let tail = match topology.shortest_path(node, egress) {
                Ok(p) => p,
                Err(SfcError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            let mut detour = head;
            detour.extend_from_slice(&tail[1..]);
            if is_simple(&detour) {
                paths.push(detour);
            }
        }

        let mut scored = Vec::with_capacity(paths.len());
        for path in paths {
            let delay = path_delay(topology, &path)?;
            scored.push((delay, path));
        }
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (_, path) in scored {
            if seen.insert(path.clone()) {
                out.push(path);
            }
            if out.len() == self.max_candidates {
                break;
            }
        }
        Ok(out)
    }

    fn qualifies(
        &self,
        path: &[NodeId],
        request: &SfcRequest,
        topology: &dyn TopologyView,
        controller: &dyn Controller,
    ) -> Result<bool, SfcError> {
        if path_delay(topology, path)? > request.delay_budget {
            return Ok(false);
        }

        let nfv = interior_nfv_nodes(topology, path)?;
        let mut missing = Vec::new();
        for vnf in request.requirements() {
            let mut hosted = false;
            for &node in &nfv {
                if controller.has_vnf(node, vnf)? {
                    hosted = true;
                    break;
                }
            }
            if !hosted {
                missing.push(vnf);
            }
        }
        if missing.is_empty() {
            return Ok(true);
        }
        let Some(&first) = nfv.first() else {
            return Ok(false);
        };

        let mut room = 0.0;
        for &node in &nfv {
            room += controller.admissible_capacity(node)?;
        }
        let mut demand = 0.0;
        for &vnf in &missing {
            demand += controller.capacity_demand(first, vnf)?;
        }
        Ok(room >= demand)
    }
}

impl Default for BudgetAwarePath {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for BudgetAwarePath {
    fn process_event(
        &mut self,
        timestamp: f64,
        request: &SfcRequest,
        topology: &dyn TopologyView,
        controller: &mut dyn Controller,
    ) -> Result<Outcome, SfcError> {
        let mut chosen = None;
        for path in self.candidate_paths(request, topology)? {
            self.candidates_evaluated += 1;
            if self.qualifies(&path, request, topology, controller)? {
                chosen = Some(path);
                break;
            }
        }

        let Some(path) = chosen else {
            self.infeasible += 1;
            return traversal::reject_without_traversal(
                timestamp,
                request,
                controller,
                RejectReason::NoFeasiblePath,
            );
        };
        debug!("request {} takes path {:?}", request.id, path);

        let mut resolver = FirstFit {
            nfv_nodes: interior_nfv_nodes(topology, &path)?,
            stats: &mut self.stats,
        };
        traversal::traverse(timestamp, request, &path, topology, controller, &mut resolver)
    }

    fn name(&self) -> &str {
        "tap"
    }

    fn custom_metrics(&self) -> HashMap<String, f64> {
        let mut m = self.stats.to_metrics();
        m.insert(
            "candidates_evaluated".to_string(),
            self.candidates_evaluated as f64,
        );
        m.insert("no_feasible_path".to_string(), self.infeasible as f64);
        m
    }
}

fn is_simple(path: &[NodeId]) -> bool {
    let mut seen = HashSet::with_capacity(path.len());
    path.iter().all(|n| seen.insert(*n))
}

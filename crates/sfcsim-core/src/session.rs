//! Per-request traversal context.

use serde::{Deserialize, Serialize};
use sfcsim_policies::{NodeId, SfcError, SfcRequest, VnfType};

/// Mutable state of one request while it traverses the network.
///
/// The processed map is keyed by the request's distinct requirements in
/// first-appearance order; an entry never goes back to unprocessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    request_id: u64,
    timestamp: f64,
    delay_budget: f64,
    ingress: NodeId,
    egress: NodeId,
    processed: Vec<(VnfType, bool)>,
    accumulated_delay: f64,
    missed: Vec<VnfType>,
    hops: Vec<(NodeId, NodeId)>,
}

impl Session {
    pub fn new(timestamp: f64, request: &SfcRequest) -> Self {
        Self {
            request_id: request.id,
            timestamp,
            delay_budget: request.delay_budget,
            ingress: request.ingress,
            egress: request.egress,
            processed: request
                .requirements()
                .into_iter()
                .map(|vnf| (vnf, false))
                .collect(),
            accumulated_delay: 0.0,
            missed: Vec::new(),
            hops: Vec::new(),
        }
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn ingress(&self) -> NodeId {
        self.ingress
    }

    pub fn egress(&self) -> NodeId {
        self.egress
    }

    pub fn accumulated_delay(&self) -> f64 {
        self.accumulated_delay
    }

    pub fn within_budget(&self) -> bool {
        self.accumulated_delay <= self.delay_budget
    }

    /// Record a traversed edge and charge its delay.
    pub fn record_hop(&mut self, u: NodeId, v: NodeId, delay: f64) {
        self.hops.push((u, v));
        self.accumulated_delay += delay;
    }

    pub fn hops(&self) -> &[(NodeId, NodeId)] {
        &self.hops
    }

    pub fn requires(&self, vnf: VnfType) -> bool {
        self.processed.iter().any(|(v, _)| *v == vnf)
    }

    /// Mark `vnf` processed, charging its processing delay the first time.
    ///
    /// Returns whether this call changed anything.
    pub fn mark_processed(&mut self, vnf: VnfType) -> Result<bool, SfcError> {
        let entry = self
            .processed
            .iter_mut()
            .find(|(v, _)| *v == vnf)
            .ok_or(SfcError::InvalidVnf {
                request_id: self.request_id,
                vnf,
            })?;
        if entry.1 {
            return Ok(false);
        }
        entry.1 = true;
        self.accumulated_delay += vnf.processing_delay();
        Ok(true)
    }

    pub fn is_processed(&self, vnf: VnfType) -> bool {
        self.processed.iter().any(|&(v, done)| v == vnf && done)
    }

    /// Requirements not yet processed, in chain order.
    pub fn outstanding(&self) -> Vec<VnfType> {
        self.processed
            .iter()
            .filter(|(_, done)| !done)
            .map(|(v, _)| *v)
            .collect()
    }

    pub fn all_processed(&self) -> bool {
        self.processed.iter().all(|(_, done)| *done)
    }

    pub fn record_missed(&mut self, vnf: VnfType) {
        if !self.missed.contains(&vnf) {
            self.missed.push(vnf);
        }
    }

    pub fn missed(&self) -> &[VnfType] {
        &self.missed
    }
}

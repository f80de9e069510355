//! Observers of session lifecycle events.
//!
//! The controller reports every session event to a [`CollectorProxy`], which
//! fans it out to the registered [`Collector`]s. Every callback has a no-op
//! default, so a collector only implements the events it cares about. Once
//! the run is over each collector writes its aggregate into the
//! [`SimulationReport`].

use crate::metrics::{
    coefficient_of_variation, jains_fairness_index, LinkLoad, Percentiles, SimulationReport,
    VnfActivity,
};
use crate::topology::Topology;
use sfcsim_policies::{NodeId, SfcRequest, VnfType};
use std::collections::BTreeMap;

/// Session lifecycle observer.
pub trait Collector {
    fn name(&self) -> &str;

    fn start_session(&mut self, _timestamp: f64, _request: &SfcRequest) {}

    /// A hop `(u, v)` was taken, costing `delay`.
    fn request_hop(&mut self, _u: NodeId, _v: NodeId, _delay: f64) {}

    /// A lookup found `vnf` at `node`.
    fn vnf_hit(&mut self, _node: NodeId, _vnf: VnfType) {}

    /// `vnf` was instantiated at `node`.
    fn vnf_placed(&mut self, _node: NodeId, _vnf: VnfType) {}

    /// `vnf` was applied to the request at `node`.
    fn vnf_processed(&mut self, _node: NodeId, _vnf: VnfType) {}

    fn sfc_hit(&mut self, _request_id: u64) {}

    fn end_session(&mut self, _success: bool) {}

    /// Write this collector's aggregates into `report`.
    fn results(&self, _report: &mut SimulationReport) {}
}

/// Fans every event out to a list of collectors.
#[derive(Default)]
pub struct CollectorProxy {
    collectors: Vec<Box<dyn Collector>>,
}

impl CollectorProxy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Proxy with every built-in collector attached.
    pub fn with_defaults(topology: &Topology) -> Self {
        let mut proxy = Self::new();
        proxy.attach(Box::new(AcceptanceCollector::default()));
        proxy.attach(Box::new(LatencyCollector::default()));
        proxy.attach(Box::new(LinkLoadCollector::new(topology)));
        proxy.attach(Box::new(VnfActivityCollector::default()));
        proxy
    }

    pub fn attach(&mut self, collector: Box<dyn Collector>) {
        self.collectors.push(collector);
    }

    pub fn names(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }
}

impl Collector for CollectorProxy {
    fn name(&self) -> &str {
        "proxy"
    }

    fn start_session(&mut self, timestamp: f64, request: &SfcRequest) {
        for c in &mut self.collectors {
            c.start_session(timestamp, request);
        }
    }

    fn request_hop(&mut self, u: NodeId, v: NodeId, delay: f64) {
        for c in &mut self.collectors {
            c.request_hop(u, v, delay);
        }
    }

    fn vnf_hit(&mut self, node: NodeId, vnf: VnfType) {
        for c in &mut self.collectors {
            c.vnf_hit(node, vnf);
        }
    }

    fn vnf_placed(&mut self, node: NodeId, vnf: VnfType) {
        for c in &mut self.collectors {
            c.vnf_placed(node, vnf);
        }
    }

    fn vnf_processed(&mut self, node: NodeId, vnf: VnfType) {
        for c in &mut self.collectors {
            c.vnf_processed(node, vnf);
        }
    }

    fn sfc_hit(&mut self, request_id: u64) {
        for c in &mut self.collectors {
            c.sfc_hit(request_id);
        }
    }

    fn end_session(&mut self, success: bool) {
        for c in &mut self.collectors {
            c.end_session(success);
        }
    }

    fn results(&self, report: &mut SimulationReport) {
        for c in &self.collectors {
            c.results(report);
        }
    }
}

/// Counts sessions, acceptances and SFC hits.
#[derive(Debug, Default)]
pub struct AcceptanceCollector {
    sessions: u64,
    accepted: u64,
    rejected: u64,
    sfc_hits: u64,
}

impl Collector for AcceptanceCollector {
    fn name(&self) -> &str {
        "acceptance"
    }

    fn start_session(&mut self, _timestamp: f64, _request: &SfcRequest) {
        self.sessions += 1;
    }

    fn sfc_hit(&mut self, _request_id: u64) {
        self.sfc_hits += 1;
    }

    fn end_session(&mut self, success: bool) {
        if success {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
    }

    fn results(&self, report: &mut SimulationReport) {
        report.total_requests = self.sessions;
        report.accepted_requests = self.accepted;
        report.rejected_requests = self.rejected;
        report.sfc_hits = self.sfc_hits;
        report.acceptance_ratio = if self.sessions > 0 {
            self.accepted as f64 / self.sessions as f64
        } else {
            0.0
        };
    }
}

/// Accumulated delay and hop count of accepted requests.
#[derive(Debug, Default)]
pub struct LatencyCollector {
    current_delay: f64,
    current_hops: u64,
    delays: Vec<f64>,
    hops: Vec<u64>,
}

impl Collector for LatencyCollector {
    fn name(&self) -> &str {
        "latency"
    }

    fn start_session(&mut self, _timestamp: f64, _request: &SfcRequest) {
        self.current_delay = 0.0;
        self.current_hops = 0;
    }

    fn request_hop(&mut self, _u: NodeId, _v: NodeId, delay: f64) {
        self.current_delay += delay;
        self.current_hops += 1;
    }

    fn vnf_processed(&mut self, _node: NodeId, vnf: VnfType) {
        self.current_delay += vnf.processing_delay();
    }

    fn end_session(&mut self, success: bool) {
        if success {
            self.delays.push(self.current_delay);
            self.hops.push(self.current_hops);
        }
    }

    fn results(&self, report: &mut SimulationReport) {
        report.delay = Percentiles::from_values(&self.delays);
        report.mean_hops = if self.hops.is_empty() {
            0.0
        } else {
            self.hops.iter().sum::<u64>() as f64 / self.hops.len() as f64
        };
    }
}

/// Traversal count per directed link, including links never used.
#[derive(Debug, Default)]
pub struct LinkLoadCollector {
    loads: BTreeMap<(NodeId, NodeId), u64>,
}

impl LinkLoadCollector {
    pub fn new(topology: &Topology) -> Self {
        Self {
            loads: topology.links().into_iter().map(|(k, _)| (k, 0)).collect(),
        }
    }
}

impl Collector for LinkLoadCollector {
    fn name(&self) -> &str {
        "link_load"
    }

    fn request_hop(&mut self, u: NodeId, v: NodeId, _delay: f64) {
        *self.loads.entry((u, v)).or_insert(0) += 1;
    }

    fn results(&self, report: &mut SimulationReport) {
        let counts: Vec<u64> = self.loads.values().copied().collect();
        report.link_loads = self
            .loads
            .iter()
            .map(|(&(from, to), &traversals)| LinkLoad {
                from,
                to,
                traversals,
            })
            .collect();
        report.link_load_cv = coefficient_of_variation(&counts);
        report.jains_fairness_index = jains_fairness_index(&counts);
    }
}

/// Hits, placements and processing per VNF type.
#[derive(Debug, Default)]
pub struct VnfActivityCollector {
    activity: BTreeMap<VnfType, VnfActivity>,
}

impl VnfActivityCollector {
    fn entry(&mut self, vnf: VnfType) -> &mut VnfActivity {
        self.activity.entry(vnf).or_insert(VnfActivity {
            vnf,
            hits: 0,
            placements: 0,
            processed: 0,
        })
    }
}

impl Collector for VnfActivityCollector {
    fn name(&self) -> &str {
        "vnf_activity"
    }

    fn vnf_hit(&mut self, _node: NodeId, vnf: VnfType) {
        self.entry(vnf).hits += 1;
    }

    fn vnf_placed(&mut self, _node: NodeId, vnf: VnfType) {
        self.entry(vnf).placements += 1;
    }

    fn vnf_processed(&mut self, _node: NodeId, vnf: VnfType) {
        self.entry(vnf).processed += 1;
    }

    fn results(&self, report: &mut SimulationReport) {
        report.vnf_activity = self.activity.values().cloned().collect();
    }
}

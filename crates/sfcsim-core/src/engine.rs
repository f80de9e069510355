//! Discrete-event simulation engine.
//!
//! The engine keeps a priority queue of request arrivals sorted by timestamp.
//! Each iteration pops the next arrival, advances the virtual clock and hands
//! the request to the policy, which drives it through the controller. Requests
//! never overlap: a session is always closed before the next one opens.

use crate::clock::SimClock;
use crate::collector::{Collector, CollectorProxy};
use crate::controller::NetworkController;
use crate::metrics::SimulationReport;
use crate::network::NetworkState;
use crate::topology::Topology;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sfcsim_policies::{NodeId, NodeRole, Outcome, Policy, SfcError, SfcRequest, TopologyView};
use std::collections::BinaryHeap;
use std::sync::Arc;

/// A timestamped arrival for the priority queue.
#[derive(Debug, Clone)]
struct TimedEvent {
    time: f64,
    sequence: u64,
    request: SfcRequest,
}

impl PartialEq for TimedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for TimedEvent {}

impl PartialOrd for TimedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimedEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap; we want min-heap
        other
            .time
            .total_cmp(&self.time)
            .then(other.sequence.cmp(&self.sequence))
    }
}

/// What happened to one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub request_id: u64,
    pub timestamp: f64,
    pub outcome: Outcome,
    /// Accumulated delay when the session closed.
    pub delay: f64,
    pub hops: Vec<(NodeId, NodeId)>,
}

/// The main simulation engine.
pub struct SimulationEngine {
    /// Virtual clock.
    pub clock: SimClock,
    /// Arrival queue (min-heap by time).
    event_queue: BinaryHeap<TimedEvent>,
    /// Sequence counter for tie-breaking.
    sequence: u64,
    topology: Arc<Topology>,
    controller: NetworkController,
    policy: Box<dyn Policy>,
    outcomes: Vec<RequestOutcome>,
    /// Total events processed.
    pub events_processed: u64,
    name: String,
}

impl SimulationEngine {
    /// Create an engine with the built-in collectors attached.
    pub fn new(network: NetworkState, policy: Box<dyn Policy>) -> Self {
        let collector = CollectorProxy::with_defaults(network.topology());
        Self::with_collector(network, policy, collector)
    }

    pub fn with_collector(
        network: NetworkState,
        policy: Box<dyn Policy>,
        collector: CollectorProxy,
    ) -> Self {
        let topology = Arc::clone(network.topology());
        Self {
            clock: SimClock::new(),
            event_queue: BinaryHeap::new(),
            sequence: 0,
            topology,
            controller: NetworkController::with_collector(network, collector),
            policy,
            outcomes: Vec::new(),
            events_processed: 0,
            name: "simulation".to_string(),
        }
    }

    /// Set the simulation name used in the report.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Queue a request at its own timestamp. Once the run has started,
    /// arrivals earlier than the clock are refused.
    pub fn schedule(&mut self, request: SfcRequest) -> Result<(), SfcError> {
        if !request.timestamp.is_finite() {
            return Err(SfcError::InvalidRequest(format!(
                "request {} has non-finite timestamp {}",
                request.id, request.timestamp
            )));
        }
        if self.events_processed > 0 && request.timestamp < self.clock.now() {
            return Err(SfcError::InvalidRequest(format!(
                "request {} arrives at {}, before the clock ({})",
                request.id,
                request.timestamp,
                self.clock.now()
            )));
        }
        if request.delay_budget.is_nan() || request.delay_budget < 0.0 {
            return Err(SfcError::InvalidRequest(format!(
                "request {} has invalid delay budget {}",
                request.id, request.delay_budget
            )));
        }
        self.check_endpoint(request.id, request.ingress, NodeRole::Ingress);
        self.check_endpoint(request.id, request.egress, NodeRole::Egress);

        self.event_queue.push(TimedEvent {
            time: request.timestamp,
            sequence: self.sequence,
            request,
        });
        self.sequence += 1;
        Ok(())
    }

    /// Load a trace (list of requests) into the event queue.
    pub fn load_trace(&mut self, requests: Vec<SfcRequest>) -> Result<(), SfcError> {
        for req in requests {
            self.schedule(req)?;
        }
        Ok(())
    }

    fn check_endpoint(&self, request_id: u64, node: NodeId, expected: NodeRole) {
        if let Ok(role) = self.topology.node_role(node) {
            if role != expected {
                warn!(
                    "request {}: node {} is {:?}, expected {:?}",
                    request_id, node, role, expected
                );
            }
        }
    }

    /// Process the next arrival, if any.
    pub fn step(&mut self) -> Result<Option<&RequestOutcome>, SfcError> {
        let Some(event) = self.event_queue.pop() else {
            return Ok(None);
        };
        if self.events_processed == 0 {
            self.clock = SimClock::starting_at(event.time);
        } else {
            self.clock.advance_to(event.time);
        }

        let request = event.request;
        let outcome = self.policy.process_event(
            event.time,
            &request,
            &*self.topology,
            &mut self.controller,
        )?;
        self.events_processed += 1;

        let (delay, hops) = match self.controller.last_session() {
            Some(s) if s.request_id() == request.id => (s.accumulated_delay(), s.hops().to_vec()),
            _ => (0.0, Vec::new()),
        };
        debug!(
            "t={} request {} -> {:?} (delay {})",
            event.time, request.id, outcome, delay
        );
        self.outcomes.push(RequestOutcome {
            request_id: request.id,
            timestamp: event.time,
            outcome,
            delay,
            hops,
        });
        Ok(self.outcomes.last())
    }

    /// Run the simulation until all arrivals are processed.
    pub fn run(&mut self) -> Result<SimulationReport, SfcError> {
        while self.step()?.is_some() {}
        let report = self.report();
        info!(
            "{} [{}]: {} requests, {} accepted, {} rejected, p50 delay {:.1}",
            report.name,
            report.policy,
            report.total_requests,
            report.accepted_requests,
            report.rejected_requests,
            report.delay.p50
        );
        Ok(report)
    }

    /// Aggregate everything observed so far.
    pub fn report(&self) -> SimulationReport {
        let mut report = SimulationReport {
            name: self.name.clone(),
            policy: self.policy.name().to_string(),
            duration: self.clock.elapsed(),
            ..Default::default()
        };
        self.controller.collector().results(&mut report);
        for o in &self.outcomes {
            if let Outcome::Rejected(reason) = o.outcome {
                *report
                    .rejection_reasons
                    .entry(reason.to_string())
                    .or_insert(0) += 1;
            }
        }
        report.cache_stats = self.controller.network().cache_stats();
        report.custom_metrics = self.policy.custom_metrics();
        report
    }

    /// Per-request outcomes in processing order.
    pub fn outcomes(&self) -> &[RequestOutcome] {
        &self.outcomes
    }

    pub fn network(&self) -> &NetworkState {
        self.controller.network()
    }

    pub fn controller(&self) -> &NetworkController {
        &self.controller
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Get the number of pending events.
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}

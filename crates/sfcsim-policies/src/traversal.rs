//! Hop-by-hop traversal shared by every policy.
//!
//! A request moves through `Init → Traversing → {Completing | Exhausted}`.
//! Policies differ only in the [`HopResolver`] invoked when the request
//! reaches an NFV-capable node on its path.

use crate::error::SfcError;
use crate::traits::*;
use log::{debug, trace};

/// State of a request's traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    /// Session not yet opened.
    Init,
    /// About to take the hop starting at `path[hop]`.
    Traversing { hop: usize },
    /// Path consumed with every requirement processed.
    Completing,
    /// Terminal rejection.
    Exhausted(RejectReason),
}

/// Per-variant behaviour at NFV-capable nodes.
pub trait HopResolver {
    /// Called once after the session opens, before the first hop.
    fn prepare(
        &mut self,
        _request: &SfcRequest,
        _path: &[NodeId],
        _topology: &dyn TopologyView,
        _controller: &mut dyn Controller,
    ) -> Result<(), SfcError> {
        Ok(())
    }

    /// Try to satisfy outstanding requirements at `node`.
    fn resolve(
        &mut self,
        node: NodeId,
        request: &SfcRequest,
        topology: &dyn TopologyView,
        controller: &mut dyn Controller,
    ) -> Result<(), SfcError>;
}

/// Drive `request` along `path`, returning its outcome.
///
/// Every session opened here is closed here, whatever the outcome. Errors
/// other than the ones a resolver swallows propagate to the caller, after
/// the session has been closed as a failure.
pub fn traverse(
    timestamp: f64,
    request: &SfcRequest,
    path: &[NodeId],
    topology: &dyn TopologyView,
    controller: &mut dyn Controller,
    resolver: &mut dyn HopResolver,
) -> Result<Outcome, SfcError> {
    let mut open = false;
    let result = drive(timestamp, request, path, topology, controller, resolver, &mut open);
    if result.is_err() && open {
        // The original error wins over any failure to close.
        let _ = controller.end_session(false);
    }
    result
}

fn drive(
    timestamp: f64,
    request: &SfcRequest,
    path: &[NodeId],
    topology: &dyn TopologyView,
    controller: &mut dyn Controller,
    resolver: &mut dyn HopResolver,
    open: &mut bool,
) -> Result<Outcome, SfcError> {
    let mut state = TraversalState::Init;
    loop {
        state = match state {
            TraversalState::Init => {
                controller.start_session(timestamp, request)?;
                *open = true;
                resolver.prepare(request, path, topology, controller)?;
                TraversalState::Traversing { hop: 0 }
            }
            TraversalState::Traversing { hop } if hop + 1 >= path.len() => {
                if controller.all_processed()? {
                    TraversalState::Completing
                } else {
                    TraversalState::Exhausted(RejectReason::UnmetRequirements)
                }
            }
            TraversalState::Traversing { hop } => {
                let (u, v) = (path[hop], path[hop + 1]);
                controller.forward_hop(u, v)?;
                trace!("request {} hop {} -> {}", request.id, u, v);

                if over_budget(request, controller)? {
                    TraversalState::Exhausted(RejectReason::BudgetExceeded)
                } else {
                    if v != request.egress && topology.is_nfv_capable(v)? {
                        resolver.resolve(v, request, topology, controller)?;
                    }
                    if over_budget(request, controller)? {
                        TraversalState::Exhausted(RejectReason::BudgetExceeded)
                    } else {
                        TraversalState::Traversing { hop: hop + 1 }
                    }
                }
            }
            TraversalState::Completing => {
                if over_budget(request, controller)? {
                    TraversalState::Exhausted(RejectReason::BudgetExceeded)
                } else {
                    controller.sfc_hit()?;
                    *open = false;
                    controller.end_session(true)?;
                    return Ok(Outcome::Accepted);
                }
            }
            TraversalState::Exhausted(reason) => {
                debug!("request {} rejected: {}", request.id, reason);
                *open = false;
                controller.end_session(false)?;
                return Ok(Outcome::Rejected(reason));
            }
        };
    }
}

/// Open and immediately close a session for a request that was rejected
/// before any path was committed, so observers still see it.
pub fn reject_without_traversal(
    timestamp: f64,
    request: &SfcRequest,
    controller: &mut dyn Controller,
    reason: RejectReason,
) -> Result<Outcome, SfcError> {
    controller.start_session(timestamp, request)?;
    debug!("request {} rejected before traversal: {}", request.id, reason);
    controller.end_session(false)?;
    Ok(Outcome::Rejected(reason))
}

fn over_budget(request: &SfcRequest, controller: &dyn Controller) -> Result<bool, SfcError> {
    Ok(controller.accumulated_delay()? > request.delay_budget)
}

/// Attempt to place `vnf` at `node`, marking it processed on success.
///
/// Returns `Ok(false)` when the cache refused it; other errors propagate.
pub fn try_place(
    controller: &mut dyn Controller,
    node: NodeId,
    vnf: crate::vnf::VnfType,
) -> Result<bool, SfcError> {
    match controller.place_vnf(node, vnf) {
        Ok(()) => {
            controller.mark_processed(node, vnf)?;
            Ok(true)
        }
        Err(err) if err.is_recoverable() => {
            debug!("placement of {} at node {} refused: {}", vnf, node, err);
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

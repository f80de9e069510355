//! The [`Controller`] implementation that policies drive.
//!
//! [`NetworkController`] owns the per-run [`NetworkState`], the currently
//! open [`Session`] (at most one) and the collectors that observe it. Every
//! mutation a policy performs goes through here, so cache statistics and
//! collector callbacks stay consistent with what the session saw.

use crate::collector::{Collector, CollectorProxy};
use crate::network::NetworkState;
use crate::session::Session;
use log::debug;
use sfcsim_policies::{Controller, NodeId, SfcError, SfcRequest, TopologyView, VnfType};

pub struct NetworkController {
    network: NetworkState,
    session: Option<Session>,
    last_session: Option<Session>,
    collector: CollectorProxy,
}

impl NetworkController {
    /// Controller with the built-in collectors attached.
    pub fn new(network: NetworkState) -> Self {
        let collector = CollectorProxy::with_defaults(network.topology());
        Self::with_collector(network, collector)
    }

    pub fn with_collector(network: NetworkState, collector: CollectorProxy) -> Self {
        Self {
            network,
            session: None,
            last_session: None,
            collector,
        }
    }

    pub fn network(&self) -> &NetworkState {
        &self.network
    }

    pub fn collector(&self) -> &CollectorProxy {
        &self.collector
    }

    /// The most recently closed session.
    pub fn last_session(&self) -> Option<&Session> {
        self.last_session.as_ref()
    }

    pub fn has_active_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn into_parts(self) -> (NetworkState, CollectorProxy) {
        (self.network, self.collector)
    }

    fn session(&self) -> Result<&Session, SfcError> {
        self.session.as_ref().ok_or(SfcError::NoActiveSession)
    }

    fn session_mut(&mut self) -> Result<&mut Session, SfcError> {
        self.session.as_mut().ok_or(SfcError::NoActiveSession)
    }
}

impl Controller for NetworkController {
    fn start_session(&mut self, timestamp: f64, request: &SfcRequest) -> Result<(), SfcError> {
        if let Some(active) = &self.session {
            return Err(SfcError::SessionAlreadyActive {
                active: active.request_id(),
            });
        }
        debug!(
            "t={} open session for request {} ({} -> {})",
            timestamp, request.id, request.ingress, request.egress
        );
        self.session = Some(Session::new(timestamp, request));
        self.collector.start_session(timestamp, request);
        Ok(())
    }

    fn forward_hop(&mut self, u: NodeId, v: NodeId) -> Result<(), SfcError> {
        self.session()?;
        let delay = self.network.topology().link_delay(u, v)?;
        self.session_mut()?.record_hop(u, v, delay);
        self.collector.request_hop(u, v, delay);
        Ok(())
    }

    fn lookup_vnf(&mut self, node: NodeId, vnf: VnfType) -> Result<bool, SfcError> {
        self.session()?;
        self.network.topology().node_role(node)?;
        let hit = match self.network.cache_mut(node) {
            Ok(cache) => cache.lookup(vnf),
            Err(_) => false,
        };
        if hit {
            self.collector.vnf_hit(node, vnf);
        }
        Ok(hit)
    }

    fn has_vnf(&self, node: NodeId, vnf: VnfType) -> Result<bool, SfcError> {
        self.network.has_vnf(node, vnf)
    }

    fn place_vnf(&mut self, node: NodeId, vnf: VnfType) -> Result<(), SfcError> {
        self.session()?;
        let cache = self.network.cache_mut(node)?;
        if cache.has(vnf) {
            return Ok(());
        }
        cache.add(vnf)?;
        debug!("placed {} at node {}", vnf, node);
        self.collector.vnf_placed(node, vnf);
        Ok(())
    }

    fn mark_processed(&mut self, node: NodeId, vnf: VnfType) -> Result<(), SfcError> {
        if self.session_mut()?.mark_processed(vnf)? {
            self.collector.vnf_processed(node, vnf);
        }
        Ok(())
    }

    fn record_missed(&mut self, vnf: VnfType) -> Result<(), SfcError> {
        self.session_mut()?.record_missed(vnf);
        Ok(())
    }

    fn sfc_hit(&mut self) -> Result<(), SfcError> {
        let request_id = self.session()?.request_id();
        self.collector.sfc_hit(request_id);
        Ok(())
    }

    fn end_session(&mut self, success: bool) -> Result<(), SfcError> {
        let session = self.session.take().ok_or(SfcError::NoActiveSession)?;
        debug!(
            "close session for request {}: success={} delay={}",
            session.request_id(),
            success,
            session.accumulated_delay()
        );
        self.collector.end_session(success);
        self.last_session = Some(session);
        Ok(())
    }

    fn accumulated_delay(&self) -> Result<f64, SfcError> {
        Ok(self.session()?.accumulated_delay())
    }

    fn is_processed(&self, vnf: VnfType) -> Result<bool, SfcError> {
        Ok(self.session()?.is_processed(vnf))
    }

    fn outstanding(&self) -> Result<Vec<VnfType>, SfcError> {
        Ok(self.session()?.outstanding())
    }

    fn all_processed(&self) -> Result<bool, SfcError> {
        Ok(self.session()?.all_processed())
    }

    fn missed(&self) -> Result<Vec<VnfType>, SfcError> {
        Ok(self.session()?.missed().to_vec())
    }

    fn residual_capacity(&self, node: NodeId) -> Result<f64, SfcError> {
        self.network.topology().node_role(node)?;
        Ok(self.network.cache(node).map(|c| c.residual()).unwrap_or(0.0))
    }

    fn admissible_capacity(&self, node: NodeId) -> Result<f64, SfcError> {
        self.network.topology().node_role(node)?;
        Ok(self.network.cache(node).map(|c| c.admissible()).unwrap_or(0.0))
    }

    fn capacity_demand(&self, node: NodeId, vnf: VnfType) -> Result<f64, SfcError> {
        Ok(self.network.cache(node)?.demand(vnf))
    }
}

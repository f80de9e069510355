//! Mutable network state: the topology plus one VNF cache per NFV-capable node.

use crate::topology::{Topology, TopologyDescriptor};
use crate::vnf_cache::{CacheStats, CapacityMetric, EvictionPolicy, VnfCache};
use log::debug;
use serde::{Deserialize, Serialize};
use sfcsim_policies::{NodeId, NodeRole, SfcError, TopologyView, VnfType};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Construction-time cache parameters applied to every NFV-capable node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachePolicy {
    pub metric: CapacityMetric,
    pub capacity: f64,
    pub eviction: EvictionPolicy,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            metric: CapacityMetric::Slots,
            capacity: 4.0,
            eviction: EvictionPolicy::Fifo,
        }
    }
}

/// Per-run network state. Each simulation run owns its own instance; caches
/// are never shared between runs.
#[derive(Debug, Clone)]
pub struct NetworkState {
    topology: Arc<Topology>,
    caches: BTreeMap<NodeId, VnfCache>,
    policy: CachePolicy,
}

impl NetworkState {
    /// Give every NFV-capable node of `topology` an empty cache.
    pub fn new(topology: Arc<Topology>, policy: CachePolicy) -> Result<Self, SfcError> {
        let mut caches = BTreeMap::new();
        for node in topology.nfv_nodes() {
            let cache = VnfCache::new(node, policy.capacity, policy.metric, policy.eviction)?;
            caches.insert(node, cache);
        }
        Ok(Self {
            topology,
            caches,
            policy,
        })
    }

    /// Build topology and caches from a descriptor, applying per-node
    /// capacity overrides and pre-instantiated VNFs.
    pub fn from_descriptor(
        desc: &TopologyDescriptor,
        policy: CachePolicy,
    ) -> Result<Self, SfcError> {
        let topology = Arc::new(Topology::from_descriptor(desc)?);
        let mut state = Self::new(topology, policy)?;

        for node in &desc.nodes {
            let has_overrides = node.capacity.is_some() || !node.vnfs.is_empty();
            if node.role != NodeRole::NfvCapable {
                if has_overrides {
                    return Err(SfcError::InvalidTopology(format!(
                        "node {} is {:?} and cannot host VNFs",
                        node.id, node.role
                    )));
                }
                continue;
            }
            if let Some(capacity) = node.capacity {
                let cache = VnfCache::new(node.id, capacity, policy.metric, policy.eviction)?;
                state.caches.insert(node.id, cache);
            }
            for &vnf in &node.vnfs {
                state.preload(node.id, vnf)?;
            }
        }
        Ok(state)
    }

    /// Instantiate `vnf` at `node` before the simulation starts. Never evicts.
    pub fn preload(&mut self, node: NodeId, vnf: VnfType) -> Result<(), SfcError> {
        let cache = self.cache_mut(node)?;
        if cache.has(vnf) {
            return Ok(());
        }
        if cache.used_capacity() + cache.demand(vnf) > cache.capacity() {
            return Err(SfcError::InvalidCapacity(format!(
                "pre-instantiated VNFs exceed the capacity of node {}",
                node
            )));
        }
        cache.add(vnf)?;
        debug!("node {}: pre-instantiated {}", node, vnf);
        Ok(())
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.policy
    }

    /// Cache of an NFV-capable node.
    pub fn cache(&self, node: NodeId) -> Result<&VnfCache, SfcError> {
        self.caches
            .get(&node)
            .ok_or_else(|| SfcError::NotFound(format!("no VNF cache at node {}", node)))
    }

    pub fn cache_mut(&mut self, node: NodeId) -> Result<&mut VnfCache, SfcError> {
        self.caches
            .get_mut(&node)
            .ok_or_else(|| SfcError::NotFound(format!("no VNF cache at node {}", node)))
    }

    /// Whether `vnf` is instantiated at `node`. Non-NFV nodes never host
    /// anything; unknown nodes are an error.
    pub fn has_vnf(&self, node: NodeId, vnf: VnfType) -> Result<bool, SfcError> {
        self.topology.node_role(node)?;
        Ok(self.caches.get(&node).is_some_and(|c| c.has(vnf)))
    }

    pub fn caches(&self) -> impl Iterator<Item = &VnfCache> {
        self.caches.values()
    }

    /// Snapshot of every cache, oldest entry first.
    pub fn cache_contents(&self) -> BTreeMap<NodeId, Vec<VnfType>> {
        self.caches
            .iter()
            .map(|(&node, cache)| (node, cache.contents()))
            .collect()
    }

    pub fn cache_stats(&self) -> Vec<CacheStats> {
        self.caches.values().map(|c| c.stats()).collect()
    }
}

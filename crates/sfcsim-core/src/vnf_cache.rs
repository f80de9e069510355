//! Bounded per-node store of instantiated VNFs.
//!
//! Models the set of VNF instances an NFV-capable node keeps running:
//! - Capacity measured either in slots (one per VNF) or as a CPU-cost sum
//! - FIFO eviction (oldest instance goes first) or outright rejection when full
//! - No duplicates: adding a VNF that is already present is a no-op
//! - Hit/miss/insertion/eviction counters for reporting

use log::debug;
use serde::{Deserialize, Serialize};
use sfcsim_policies::{NodeId, SfcError, VnfType};
use std::collections::{HashSet, VecDeque};

/// Unit in which a cache's capacity is measured.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMetric {
    /// Every instance occupies one slot.
    #[default]
    Slots,
    /// Every instance occupies its catalogue CPU cost.
    #[serde(rename = "cpu")]
    CpuSum,
}

/// What happens when an insertion does not fit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Evict oldest-inserted instances until the new one fits.
    #[default]
    Fifo,
    /// Refuse the insertion.
    Reject,
}

/// Statistics snapshot for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub node: NodeId,
    pub metric: CapacityMetric,
    pub capacity: f64,
    pub used: f64,
    pub entries: usize,
    pub utilization: f64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub insertions: u64,
    pub evictions: u64,
    pub rejections: u64,
}

/// VNF cache owned by a single NFV-capable node.
#[derive(Debug, Clone)]
pub struct VnfCache {
    node: NodeId,
    capacity: f64,
    metric: CapacityMetric,
    eviction: EvictionPolicy,
    members: HashSet<VnfType>,
    /// Insertion order (front = oldest).
    order: VecDeque<VnfType>,
    used: f64,
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub rejections: u64,
}

impl VnfCache {
    /// Create an empty cache. Capacity must be finite and positive.
    pub fn new(
        node: NodeId,
        capacity: f64,
        metric: CapacityMetric,
        eviction: EvictionPolicy,
    ) -> Result<Self, SfcError> {
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(SfcError::InvalidCapacity(format!(
                "node {} capacity must be > 0, got {}",
                node, capacity
            )));
        }
        Ok(Self {
            node,
            capacity,
            metric,
            eviction,
            members: HashSet::new(),
            order: VecDeque::new(),
            used: 0.0,
            hits: 0,
            misses: 0,
            insertions: 0,
            evictions: 0,
            rejections: 0,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn metric(&self) -> CapacityMetric {
        self.metric
    }

    pub fn eviction(&self) -> EvictionPolicy {
        self.eviction
    }

    /// Capacity one instance of `vnf` occupies in this cache's metric.
    pub fn demand(&self, vnf: VnfType) -> f64 {
        match self.metric {
            CapacityMetric::Slots => 1.0,
            CapacityMetric::CpuSum => vnf.cpu_cost(),
        }
    }

    /// Membership test without touching the counters.
    pub fn has(&self, vnf: VnfType) -> bool {
        self.members.contains(&vnf)
    }

    /// Membership test that counts as a cache hit or miss.
    pub fn lookup(&mut self, vnf: VnfType) -> bool {
        let found = self.has(vnf);
        if found {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Insert `vnf`, evicting under FIFO if needed.
    ///
    /// Fails with [`SfcError::CacheFull`] when the instance cannot fit: under
    /// [`EvictionPolicy::Reject`] whenever the cache lacks room, under FIFO
    /// only if the instance alone exceeds the whole capacity.
    pub fn add(&mut self, vnf: VnfType) -> Result<(), SfcError> {
        if self.has(vnf) {
            return Ok(());
        }

        let demand = self.demand(vnf);
        if demand > self.capacity
            || (self.eviction == EvictionPolicy::Reject && self.used + demand > self.capacity)
        {
            self.rejections += 1;
            debug!(
                "node {}: rejected {} (used {}/{})",
                self.node, vnf, self.used, self.capacity
            );
            return Err(SfcError::CacheFull {
                node: self.node,
                vnf,
            });
        }

        while self.used + demand > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.members.remove(&oldest);
            self.used -= self.demand(oldest);
            self.evictions += 1;
            debug!("node {}: evicted {} to make room for {}", self.node, oldest, vnf);
        }

        self.members.insert(vnf);
        self.order.push_back(vnf);
        self.used += demand;
        self.insertions += 1;
        Ok(())
    }

    /// Remove `vnf` if present. Returns whether anything was removed.
    pub fn evict(&mut self, vnf: VnfType) -> bool {
        if !self.members.remove(&vnf) {
            return false;
        }
        self.order.retain(|&v| v != vnf);
        self.used -= self.demand(vnf);
        true
    }

    /// Current usage in this cache's metric.
    pub fn used_capacity(&self) -> f64 {
        self.used
    }

    /// Remaining room in this cache's metric.
    pub fn residual(&self) -> f64 {
        (self.capacity - self.used).max(0.0)
    }

    /// Room a new instance may claim: the whole capacity under FIFO, since
    /// older entries give way, and only the residual under Reject.
    pub fn admissible(&self) -> f64 {
        match self.eviction {
            EvictionPolicy::Fifo => self.capacity,
            EvictionPolicy::Reject => self.residual(),
        }
    }

    /// Usage as a fraction of capacity (0.0 - 1.0).
    pub fn utilization(&self) -> f64 {
        self.used / self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Instantiated VNFs, oldest first.
    pub fn contents(&self) -> Vec<VnfType> {
        self.order.iter().copied().collect()
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }

    /// Get a statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            node: self.node,
            metric: self.metric,
            capacity: self.capacity,
            used: self.used,
            entries: self.len(),
            utilization: self.utilization(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: self.hit_rate(),
            insertions: self.insertions,
            evictions: self.evictions,
            rejections: self.rejections,
        }
    }
}

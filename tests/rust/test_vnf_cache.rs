/// Integration tests for the per-node VNF cache.
use sfcsim_core::vnf_cache::{CapacityMetric, EvictionPolicy, VnfCache};
use sfcsim_policies::{SfcError, VnfType};

fn vnf(id: u8) -> VnfType {
    VnfType::from_id(id).unwrap()
}

/// Deterministic mix of adds and evicts touching every VNF type.
fn operation_sequence() -> Vec<(bool, VnfType)> {
    (0..200usize)
        .map(|i| {
            let id = ((i * 5 + i / 7) % 8) as u8 + 1;
            (i % 4 != 3, vnf(id))
        })
        .collect()
}

#[test]
fn test_fifo_evicts_oldest() {
    let mut cache = VnfCache::new(1, 2.0, CapacityMetric::Slots, EvictionPolicy::Fifo).unwrap();
    cache.add(vnf(1)).unwrap();
    cache.add(vnf(2)).unwrap();
    cache.add(vnf(3)).unwrap();

    assert!(!cache.has(vnf(1)));
    assert!(cache.has(vnf(2)));
    assert!(cache.has(vnf(3)));
    assert_eq!(cache.contents(), vec![vnf(2), vnf(3)]);
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_capacity_invariant_holds_for_every_configuration() {
    let configs = [
        (CapacityMetric::Slots, EvictionPolicy::Fifo, 3.0),
        (CapacityMetric::Slots, EvictionPolicy::Reject, 3.0),
        (CapacityMetric::CpuSum, EvictionPolicy::Fifo, 12.0),
        (CapacityMetric::CpuSum, EvictionPolicy::Reject, 12.0),
    ];
    for (metric, eviction, capacity) in configs {
        let mut cache = VnfCache::new(1, capacity, metric, eviction).unwrap();
        for (is_add, v) in operation_sequence() {
            if is_add {
                let _ = cache.add(v);
            } else {
                cache.evict(v);
            }
            assert!(
                cache.used_capacity() <= cache.capacity(),
                "{:?}/{:?} over capacity: {}",
                metric,
                eviction,
                cache.used_capacity()
            );
            let contents = cache.contents();
            let expected: f64 = contents.iter().map(|&v| cache.demand(v)).sum();
            assert_eq!(cache.used_capacity(), expected);
        }
    }
}

#[test]
fn test_no_duplicates() {
    let mut cache = VnfCache::new(1, 4.0, CapacityMetric::Slots, EvictionPolicy::Fifo).unwrap();
    for _ in 0..5 {
        cache.add(VnfType::Ids).unwrap();
    }
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.used_capacity(), 1.0);
    assert_eq!(cache.stats().insertions, 1);
}

#[test]
fn test_reject_strategy_leaves_cache_untouched() {
    let mut cache =
        VnfCache::new(4, 5.0, CapacityMetric::CpuSum, EvictionPolicy::Reject).unwrap();
    cache.add(VnfType::Nat).unwrap();
    cache.add(VnfType::Firewall).unwrap();

    assert_eq!(
        cache.add(VnfType::LoadBalancer),
        Err(SfcError::CacheFull {
            node: 4,
            vnf: VnfType::LoadBalancer
        })
    );
    assert_eq!(cache.contents(), vec![VnfType::Nat, VnfType::Firewall]);
    assert_eq!(cache.stats().rejections, 1);
    assert_eq!(cache.residual(), 0.0);
}

#[test]
fn test_oversized_instance_rejected_under_fifo() {
    let mut cache = VnfCache::new(1, 6.0, CapacityMetric::CpuSum, EvictionPolicy::Fifo).unwrap();
    cache.add(VnfType::Nat).unwrap();
    assert!(matches!(
        cache.add(VnfType::Dpi),
        Err(SfcError::CacheFull { .. })
    ));
    assert!(cache.has(VnfType::Nat));
}

#[test]
fn test_evict_and_readd() {
    let mut cache = VnfCache::new(1, 2.0, CapacityMetric::Slots, EvictionPolicy::Reject).unwrap();
    cache.add(VnfType::Nat).unwrap();
    cache.add(VnfType::Dpi).unwrap();
    assert!(cache.evict(VnfType::Nat));
    assert!(!cache.evict(VnfType::Nat));
    cache.add(VnfType::Encrypt).unwrap();
    assert_eq!(cache.contents(), vec![VnfType::Dpi, VnfType::Encrypt]);
}

#[test]
fn test_invalid_capacity() {
    for capacity in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            VnfCache::new(1, capacity, CapacityMetric::Slots, EvictionPolicy::Fifo),
            Err(SfcError::InvalidCapacity(_))
        ));
    }
}

#[test]
fn test_lookup_statistics() {
    let mut cache = VnfCache::new(1, 2.0, CapacityMetric::Slots, EvictionPolicy::Fifo).unwrap();
    cache.add(VnfType::Nat).unwrap();
    assert!(cache.lookup(VnfType::Nat));
    assert!(!cache.lookup(VnfType::Ids));
    assert!(cache.has(VnfType::Nat));

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hit_rate, 0.5);
    assert_eq!(stats.utilization, 0.5);
}

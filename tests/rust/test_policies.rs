/// Integration tests for the placement policies running against the real
/// topology, caches and controller.
use sfcsim_core::config::SimConfig;
use sfcsim_core::engine::SimulationEngine;
use sfcsim_core::topology::TopologyDescriptor;
use sfcsim_core::vnf_cache::EvictionPolicy;
use sfcsim_policies::*;

fn request(id: u64, vnfs: &[VnfType], budget: f64, ingress: NodeId, egress: NodeId) -> SfcRequest {
    SfcRequest {
        id,
        timestamp: id as f64,
        vnfs: vnfs.to_vec(),
        delay_budget: budget,
        ingress,
        egress,
    }
}

fn run(config: &SimConfig, policy: &str, requests: Vec<SfcRequest>) -> SimulationEngine {
    let mut engine = SimulationEngine::new(
        config.build_network().unwrap(),
        config.build_policy(policy).unwrap(),
    );
    engine.load_trace(requests).unwrap();
    engine.run().unwrap();
    engine
}

/// 0 - 1 - 2 - 3 with two extra stubs (4, 5) hanging off node 1.
fn hub_config() -> SimConfig {
    let desc = TopologyDescriptor::new(false)
        .node(0, NodeRole::Ingress)
        .node(1, NodeRole::NfvCapable)
        .node(2, NodeRole::NfvCapable)
        .node(3, NodeRole::Egress)
        .node(4, NodeRole::Forwarding)
        .node(5, NodeRole::Forwarding)
        .link(0, 1, 1.0)
        .link(1, 2, 1.0)
        .link(2, 3, 1.0)
        .link(1, 4, 1.0)
        .link(1, 5, 1.0);
    SimConfig::with_topology(desc)
}

/// Diamond 0 - 1 - 3 (delays 1, 1) and 0 - 2 - 3 (delays 2, 2); node 1 is
/// full with a Firewall that cannot be evicted.
fn diamond_config() -> SimConfig {
    let mut desc = TopologyDescriptor::new(false)
        .node(0, NodeRole::Ingress)
        .node(1, NodeRole::NfvCapable)
        .node(2, NodeRole::NfvCapable)
        .node(3, NodeRole::Egress)
        .link(0, 1, 1.0)
        .link(1, 3, 1.0)
        .link(0, 2, 2.0)
        .link(2, 3, 2.0);
    desc.nodes[1].vnfs = vec![VnfType::Firewall];
    let mut config = SimConfig::with_topology(desc);
    config.cache.capacity = 1.0;
    config.cache.eviction = EvictionPolicy::Reject;
    config
}

#[test]
fn test_registry_builds_every_policy() {
    let config = hub_config();
    for name in available_policies() {
        let policy = config.build_policy(name).unwrap();
        assert_eq!(policy.name(), name);
    }
    assert!(policy_by_name("round_robin").is_none());
}

#[test]
fn test_hod_places_at_best_connected_node() {
    let config = hub_config();
    let req = || vec![request(1, &[VnfType::Ids], 100.0, 0, 3)];

    let hod = run(&config, "hod", req());
    assert_eq!(hod.outcomes()[0].outcome, Outcome::Accepted);
    assert_eq!(hod.network().cache_contents()[&1], vec![VnfType::Ids]);
    assert!(hod.network().cache_contents()[&2].is_empty());

    let online = run(&config, "greedy_online", req());
    assert_eq!(online.outcomes()[0].outcome, Outcome::Accepted);
    assert!(online.network().cache_contents()[&1].is_empty());
    assert_eq!(online.network().cache_contents()[&2], vec![VnfType::Ids]);
}

#[test]
fn test_equally_near_nodes_resolved_by_path_order() {
    // Zero-delay link makes nodes 1 and 2 equally close to the egress.
    let config = SimConfig::with_topology(TopologyDescriptor::line(&[1.0, 0.0, 1.0]));
    let engine = run(
        &config,
        "greedy_online",
        vec![request(1, &[VnfType::Nat], 50.0, 0, 3)],
    );
    assert_eq!(engine.network().cache_contents()[&1], vec![VnfType::Nat]);
    assert!(engine.network().cache_contents()[&2].is_empty());
}

#[test]
fn test_first_order_ignores_out_of_order_instance() {
    let mut desc = TopologyDescriptor::line(&[1.0, 1.0, 1.0]);
    desc.nodes[1].vnfs = vec![VnfType::Nat];
    desc.nodes[2].vnfs = vec![VnfType::Firewall];
    let config = SimConfig::with_topology(desc);
    let req = || vec![request(1, &[VnfType::Firewall, VnfType::Nat], 100.0, 0, 3)];

    let strict = run(&config, "first_order", req());
    assert_eq!(strict.outcomes()[0].outcome, Outcome::Accepted);
    assert_eq!(
        strict.network().cache_contents()[&2],
        vec![VnfType::Firewall, VnfType::Nat]
    );

    let unordered = run(&config, "greedy_no_placement", req());
    assert_eq!(unordered.outcomes()[0].outcome, Outcome::Accepted);
    assert_eq!(unordered.network().cache_contents()[&2], vec![VnfType::Firewall]);
}

#[test]
fn test_tap_detours_around_full_node() {
    let config = diamond_config();
    let engine = run(&config, "tap", vec![request(1, &[VnfType::Nat], 50.0, 0, 3)]);

    let outcome = &engine.outcomes()[0];
    assert_eq!(outcome.outcome, Outcome::Accepted);
    assert_eq!(outcome.hops, vec![(0, 2), (2, 3)]);
    assert_eq!(outcome.delay, 19.0);
    assert_eq!(engine.network().cache_contents()[&2], vec![VnfType::Nat]);
}

#[test]
fn test_tap_keeps_admitting_once_fifo_caches_fill() {
    let mut config = SimConfig::with_topology(TopologyDescriptor::line(&[1.0, 1.0]));
    config.cache.capacity = 1.0;
    let requests = [VnfType::Nat, VnfType::Firewall, VnfType::Ids]
        .iter()
        .enumerate()
        .map(|(i, &v)| request(i as u64, &[v], 100.0, 0, 2))
        .collect();
    let engine = run(&config, "tap", requests);

    for outcome in engine.outcomes() {
        assert_eq!(outcome.outcome, Outcome::Accepted, "request {}", outcome.request_id);
    }
    assert_eq!(engine.network().cache_contents()[&1], vec![VnfType::Ids]);
}

#[test]
fn test_greedy_stuck_on_full_shortest_path() {
    let config = diamond_config();
    let engine = run(
        &config,
        "greedy_online",
        vec![request(1, &[VnfType::Nat], 50.0, 0, 3)],
    );
    assert_eq!(
        engine.outcomes()[0].outcome,
        Outcome::Rejected(RejectReason::UnmetRequirements)
    );
}

#[test]
fn test_tap_no_feasible_path() {
    let config = diamond_config();
    let mut engine = SimulationEngine::new(
        config.build_network().unwrap(),
        config.build_policy("tap").unwrap(),
    );
    engine
        .schedule(request(1, &[VnfType::Nat], 1.0, 0, 3))
        .unwrap();
    let report = engine.run().unwrap();

    let outcome = &engine.outcomes()[0];
    assert_eq!(
        outcome.outcome,
        Outcome::Rejected(RejectReason::NoFeasiblePath)
    );
    assert!(outcome.hops.is_empty());
    assert_eq!(report.total_requests, 1);
    assert_eq!(report.rejection_reasons["no_feasible_path"], 1);
    assert_eq!(report.custom_metrics["no_feasible_path"], 1.0);
    assert_eq!(report.custom_metrics["candidates_evaluated"], 2.0);
}

#[test]
fn test_no_placement_policy_never_mutates_caches() {
    let config = diamond_config();
    let requests = (0..5)
        .map(|i| request(i, &[VnfType::ALL[i as usize]], 100.0, 0, 3))
        .collect();
    let engine = run(&config, "greedy_no_placement", requests);

    let caches = engine.network().cache_contents();
    assert_eq!(caches[&1], vec![VnfType::Firewall]);
    assert!(caches[&2].is_empty());
    let accepted: Vec<u64> = engine
        .outcomes()
        .iter()
        .filter(|o| o.outcome.is_accepted())
        .map(|o| o.request_id)
        .collect();
    assert_eq!(accepted, vec![1]);
}

#[test]
fn test_unknown_endpoint_propagates_for_every_policy() {
    let config = hub_config();
    for name in available_policies() {
        let mut engine = SimulationEngine::new(
            config.build_network().unwrap(),
            config.build_policy(name).unwrap(),
        );
        engine
            .schedule(request(1, &[VnfType::Nat], 50.0, 0, 99))
            .unwrap();
        assert!(
            matches!(engine.run(), Err(SfcError::NotFound(_))),
            "policy {}",
            name
        );
        assert!(!engine.controller().has_active_session());
    }
}

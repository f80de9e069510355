/// Integration tests for the simulation engine.
use sfcsim_core::config::{ConfigError, SimConfig};
use sfcsim_core::controller::NetworkController;
use sfcsim_core::engine::SimulationEngine;
use sfcsim_core::topology::TopologyDescriptor;
use sfcsim_core::vnf_cache::EvictionPolicy;
use sfcsim_policies::*;

/// A (ingress) - B (NFV, capacity 1) - C (egress), 2 time units per link.
fn three_node_config() -> SimConfig {
    SimConfig::from_str(
        r#"
[simulation]
name = "three-node"

[cache]
capacity = 1

[[topology.nodes]]
id = 0
role = "ingress"

[[topology.nodes]]
id = 1
role = "nfv_capable"

[[topology.nodes]]
id = 2
role = "egress"

[[topology.links]]
from = 0
to = 1
delay = 2

[[topology.links]]
from = 1
to = 2
delay = 2
"#,
    )
    .unwrap()
}

/// Two disjoint routes between ingress 0 and egress 5:
/// 0 - 1 - 2 - 5 (delays 1, 1, 1) and 0 - 3 - 4 - 5 (delays 2, 2, 2).
fn mesh_config() -> SimConfig {
    let desc = TopologyDescriptor::new(false)
        .node(0, NodeRole::Ingress)
        .node(1, NodeRole::NfvCapable)
        .node(2, NodeRole::NfvCapable)
        .node(3, NodeRole::NfvCapable)
        .node(4, NodeRole::NfvCapable)
        .node(5, NodeRole::Egress)
        .link(0, 1, 1.0)
        .link(1, 2, 1.0)
        .link(2, 5, 1.0)
        .link(0, 3, 2.0)
        .link(3, 4, 2.0)
        .link(4, 5, 2.0)
        .link(1, 3, 1.0);
    let mut config = SimConfig::with_topology(desc);
    config.cache.capacity = 2.0;
    config.validate().unwrap();
    config
}

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

fn mixed_workload(n: u64) -> Vec<SfcRequest> {
    (0..n)
        .map(|i| {
            let a = VnfType::ALL[(i % 8) as usize];
            let b = VnfType::ALL[((i * 3 + 2) % 8) as usize];
            request(i, &[a, b], 60.0 + (i % 4) as f64 * 20.0, 0, 5)
        })
        .collect()
}

#[test]
fn test_online_placement_on_empty_cache() {
    let config = three_node_config();
    let mut engine = SimulationEngine::new(
        config.build_network().unwrap(),
        config.build_policy("greedy_online").unwrap(),
    );
    engine
        .schedule(request(1, &[VnfType::Nat], 50.0, 0, 2))
        .unwrap();
    let report = engine.run().unwrap();

    let outcome = &engine.outcomes()[0];
    assert_eq!(outcome.outcome, Outcome::Accepted);
    assert_eq!(outcome.delay, 19.0);
    assert_eq!(engine.network().cache_contents()[&1], vec![VnfType::Nat]);
    assert_eq!(report.accepted_requests, 1);
    assert_eq!(report.sfc_hits, 1);
    assert_eq!(report.custom_metrics["placements_succeeded"], 1.0);
}

#[test]
fn test_full_reject_cache_rejects_request() {
    let mut config = three_node_config();
    config.cache.eviction = EvictionPolicy::Reject;
    config.topology.nodes[1].vnfs = vec![VnfType::Firewall];

    let mut engine = SimulationEngine::new(
        config.build_network().unwrap(),
        config.build_policy("greedy_online").unwrap(),
    );
    engine
        .schedule(request(1, &[VnfType::Nat], 50.0, 0, 2))
        .unwrap();
    let report = engine.run().unwrap();

    assert_eq!(
        engine.outcomes()[0].outcome,
        Outcome::Rejected(RejectReason::UnmetRequirements)
    );
    assert_eq!(engine.network().cache_contents()[&1], vec![VnfType::Firewall]);
    assert_eq!(report.rejected_requests, 1);
    assert_eq!(report.custom_metrics["placements_refused"], 1.0);
    assert_eq!(report.cache_stats[0].rejections, 1);
}

#[test]
fn test_two_vnfs_at_different_nodes_without_placement() {
    let mut desc = TopologyDescriptor::line(&[2.0, 2.0, 2.0]);
    desc.nodes[1].vnfs = vec![VnfType::Nat];
    desc.nodes[2].vnfs = vec![VnfType::Firewall];
    let config = SimConfig::with_topology(desc);

    let mut engine = SimulationEngine::new(
        config.build_network().unwrap(),
        config.build_policy("greedy_no_placement").unwrap(),
    );
    engine
        .schedule(request(1, &[VnfType::Nat, VnfType::Firewall], 50.0, 0, 3))
        .unwrap();
    engine.run().unwrap();

    let outcome = &engine.outcomes()[0];
    assert_eq!(outcome.outcome, Outcome::Accepted);
    assert_eq!(outcome.delay, 6.0 + 15.0 + 20.0);
}

#[test]
fn test_acceptance_when_everything_is_present() {
    // Every requirement hosted on the path; accepted whenever the budget covers
    // links plus processing, rejected otherwise.
    let mut desc = TopologyDescriptor::line(&[1.0, 1.0, 1.0]);
    desc.nodes[1].vnfs = vec![VnfType::Ids, VnfType::Nat];
    desc.nodes[2].vnfs = vec![VnfType::Dpi];
    let config = SimConfig::with_topology(desc);
    let vnfs = [VnfType::Dpi, VnfType::Ids, VnfType::Nat];
    let needed = 3.0 + 35.0 + 30.0 + 15.0;

    for (i, budget) in [needed - 1.0, needed, needed + 10.0].into_iter().enumerate() {
        let mut engine = SimulationEngine::new(
            config.build_network().unwrap(),
            config.build_policy("greedy_no_placement").unwrap(),
        );
        engine.schedule(request(i as u64, &vnfs, budget, 0, 3)).unwrap();
        engine.run().unwrap();
        assert_eq!(
            engine.outcomes()[0].outcome.is_accepted(),
            budget >= needed,
            "budget {}",
            budget
        );
    }
}

#[test]
fn test_session_exclusivity_through_controller() {
    let config = three_node_config();
    let mut controller = NetworkController::new(config.build_network().unwrap());
    let req = request(1, &[VnfType::Nat], 50.0, 0, 2);

    controller.start_session(0.0, &req).unwrap();
    assert_eq!(
        controller.start_session(0.0, &req),
        Err(SfcError::SessionAlreadyActive { active: 1 })
    );
    controller.end_session(false).unwrap();
    assert_eq!(controller.end_session(false), Err(SfcError::NoActiveSession));
}

#[test]
fn test_deterministic_runs() {
    let config = mesh_config();
    for name in available_policies() {
        let run = || {
            let mut engine = SimulationEngine::new(
                config.build_network().unwrap(),
                config.build_policy(name).unwrap(),
            );
            engine.load_trace(mixed_workload(60)).unwrap();
            engine.run().unwrap();
            (
                engine.outcomes().to_vec(),
                engine.network().cache_contents(),
            )
        };
        let (outcomes_a, caches_a) = run();
        let (outcomes_b, caches_b) = run();
        assert_eq!(outcomes_a, outcomes_b, "policy {} not deterministic", name);
        assert_eq!(caches_a, caches_b, "policy {} not deterministic", name);
    }
}

#[test]
fn test_full_simulation_all_policies() {
    let config = mesh_config();
    let requests = mixed_workload(80);
    let reports =
        sfcsim_core::compare_policies(&config, &requests, &available_policies()).unwrap();

    assert_eq!(reports.len(), 5);
    for report in &reports {
        assert_eq!(report.total_requests, 80, "policy {}", report.policy);
        assert_eq!(
            report.accepted_requests + report.rejected_requests,
            80,
            "policy {}",
            report.policy
        );
        let rejected: u64 = report.rejection_reasons.values().sum();
        assert_eq!(rejected, report.rejected_requests);
        for stats in &report.cache_stats {
            assert!(stats.used <= stats.capacity);
        }
    }

    let no_placement = &reports[0];
    assert_eq!(no_placement.policy, "greedy_no_placement");
    assert_eq!(no_placement.accepted_requests, 0);
    let online = &reports[1];
    assert!(online.accepted_requests > 0);
}

#[test]
fn test_runs_do_not_share_caches() {
    let config = three_node_config();
    let requests = vec![request(1, &[VnfType::Nat], 50.0, 0, 2)];

    let first = sfcsim_core::run_simulation(
        &config,
        requests.clone(),
        config.build_policy("greedy_online").unwrap(),
    )
    .unwrap();
    let second = sfcsim_core::run_simulation(
        &config,
        requests,
        config.build_policy("greedy_no_placement").unwrap(),
    )
    .unwrap();

    assert_eq!(first.accepted_requests, 1);
    // The second run starts from an empty cache again.
    assert_eq!(second.accepted_requests, 0);
}

#[test]
fn test_report_link_loads() {
    let config = three_node_config();
    let requests = (0..4)
        .map(|i| request(i, &[VnfType::Nat], 50.0, 0, 2))
        .collect();
    let report = sfcsim_core::run_simulation(
        &config,
        requests,
        config.build_policy("greedy_online").unwrap(),
    )
    .unwrap();

    assert_eq!(report.link_loads.len(), 4);
    let forward: u64 = report
        .link_loads
        .iter()
        .filter(|l| l.from < l.to)
        .map(|l| l.traversals)
        .sum();
    assert_eq!(forward, 8);
    assert_eq!(report.mean_hops, 2.0);
    assert_eq!(report.duration, 3.0);
    assert_eq!(report.name, "three-node");
}

#[test]
fn test_run_time_failure_is_a_simulation_error() {
    let config = three_node_config();
    let requests = vec![request(1, &[VnfType::Nat], 50.0, 0, 9)];
    let result = sfcsim_core::run_simulation(
        &config,
        requests,
        config.build_policy("greedy_online").unwrap(),
    );
    assert!(matches!(
        result,
        Err(ConfigError::Simulation(SfcError::NotFound(_)))
    ));

    let bad_arrival = vec![request(1, &[VnfType::Nat], 50.0, 0, 2)]
        .into_iter()
        .map(|mut r| {
            r.timestamp = f64::INFINITY;
            r
        })
        .collect();
    let result = sfcsim_core::run_simulation(
        &config,
        bad_arrival,
        config.build_policy("greedy_online").unwrap(),
    );
    assert!(matches!(
        result,
        Err(ConfigError::Simulation(SfcError::InvalidRequest(_)))
    ));
}

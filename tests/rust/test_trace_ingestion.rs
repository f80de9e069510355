/// Integration tests for trace ingestion.
use sfcsim_core::config::SimConfig;
use sfcsim_core::trace::{self, TraceError};
use sfcsim_policies::{SfcRequest, VnfType};
use std::path::PathBuf;

fn repo_file(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(relative)
}

#[test]
fn test_load_example_trace() {
    let requests =
        trace::load_trace(&repo_file("traces/example_trace.jsonl"), "compact_jsonl").unwrap();
    assert!(!requests.is_empty());

    // Verify sorted by arrival time
    for i in 1..requests.len() {
        assert!(requests[i].timestamp >= requests[i - 1].timestamp);
    }
}

#[test]
fn test_example_config_runs_example_trace() {
    let config = SimConfig::from_file(&repo_file("configs/example.toml")).unwrap();
    let path = repo_file(config.trace.path.as_deref().unwrap());
    let requests = trace::load_trace(&path, &config.trace.format).unwrap();
    let total = requests.len() as u64;

    let policy = config.build_policy(&config.simulation.policy).unwrap();
    let report = sfcsim_core::run_simulation(&config, requests, policy).unwrap();
    assert_eq!(report.total_requests, total);
    assert!(report.accepted_requests > 0);
}

#[test]
fn test_write_and_read_trace() {
    let tmp_dir = std::env::temp_dir();
    let tmp_path = tmp_dir.join("sfcsim_test_trace.jsonl");

    let requests = vec![
        SfcRequest {
            id: 0,
            timestamp: 0.0,
            vnfs: vec![VnfType::Nat, VnfType::WanOptimizer],
            delay_budget: 90.0,
            ingress: 0,
            egress: 4,
        },
        SfcRequest {
            id: 1,
            timestamp: 1.25,
            vnfs: vec![],
            delay_budget: 10.0,
            ingress: 1,
            egress: 4,
        },
    ];

    trace::write_compact_jsonl(&requests, &tmp_path).unwrap();
    let loaded = trace::load_trace(&tmp_path, "compact_jsonl").unwrap();
    let _ = std::fs::remove_file(&tmp_path);

    assert_eq!(loaded, requests);
}

#[test]
fn test_missing_file() {
    let result = trace::load_trace(&repo_file("traces/does_not_exist.jsonl"), "compact_jsonl");
    assert!(matches!(result, Err(TraceError::Io(_))));
}

#[test]
fn test_missing_field_is_parse_error() {
    let data = "{\"ts\": 1.0, \"ingress\": 0, \"budget\": 5}\n";
    let result = trace::parse_compact_jsonl(std::io::BufReader::new(data.as_bytes()));
    assert!(matches!(result, Err(TraceError::JsonParse { line: 1, .. })));
}

//! Aggregated results of a simulation run.
//!
//! Collectors fill a [`SimulationReport`] once the event stream is
//! exhausted; this module also holds the statistics helpers they share and
//! the table formatting used by the CLI.

use crate::vnf_cache::CacheStats;
use serde::{Deserialize, Serialize};
use sfcsim_policies::{NodeId, VnfType};
use std::collections::{BTreeMap, HashMap};

/// Percentile values for a distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Percentiles {
    /// Compute percentiles from a slice of values.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;

        Self {
            p50: percentile_sorted(&sorted, 50.0),
            p75: percentile_sorted(&sorted, 75.0),
            p90: percentile_sorted(&sorted, 90.0),
            p95: percentile_sorted(&sorted, 95.0),
            p99: percentile_sorted(&sorted, 99.0),
            min: sorted[0],
            max: sorted[n - 1],
            mean,
        }
    }
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Traversal count of one directed link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkLoad {
    pub from: NodeId,
    pub to: NodeId,
    pub traversals: u64,
}

/// Activity of one VNF type across all nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VnfActivity {
    pub vnf: VnfType,
    pub hits: u64,
    pub placements: u64,
    pub processed: u64,
}

/// Aggregated results for an entire simulation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Simulation name from the configuration.
    pub name: String,
    /// Policy name.
    pub policy: String,
    /// Time between the first and the last arrival.
    pub duration: f64,

    // Admission
    pub total_requests: u64,
    pub accepted_requests: u64,
    pub rejected_requests: u64,
    pub sfc_hits: u64,
    pub acceptance_ratio: f64,
    pub rejection_reasons: BTreeMap<String, u64>,

    // Latency of accepted requests (links + processing)
    pub delay: Percentiles,
    pub mean_hops: f64,

    // Link load
    pub link_loads: Vec<LinkLoad>,
    pub link_load_cv: f64,
    pub jains_fairness_index: f64,

    // VNFs and caches
    pub vnf_activity: Vec<VnfActivity>,
    pub cache_stats: Vec<CacheStats>,

    // Custom policy metrics
    pub custom_metrics: HashMap<String, f64>,
}

/// Coefficient of variation (std / mean).
pub(crate) fn coefficient_of_variation(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<u64>() as f64 / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.sqrt() / mean
}

/// Jain's fairness index: (sum(x_i))^2 / (n * sum(x_i^2)).
pub(crate) fn jains_fairness_index(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    let sum_sq: f64 = values.iter().map(|&v| (v as f64).powi(2)).sum();
    if sum_sq == 0.0 {
        return 1.0;
    }
    (sum * sum) / (n * sum_sq)
}

/// Format a report as a pretty-printed table string.
pub fn format_table(report: &SimulationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n{:=<70}\n",
        format!("  {} Results  ", report.policy)
    ));
    out.push_str(&format!(
        "  Duration: {:.1} | Requests: {} ({} rejected)\n",
        report.duration, report.total_requests, report.rejected_requests
    ));
    out.push_str(&format!("{:-<70}\n", "  Admission  "));
    out.push_str(&format!(
        "  Accepted: {} ({:.1}%)  SFC hits: {}\n",
        report.accepted_requests,
        report.acceptance_ratio * 100.0,
        report.sfc_hits
    ));
    for (reason, count) in &report.rejection_reasons {
        out.push_str(&format!("  Rejected ({}): {}\n", reason, count));
    }
    out.push_str(&format!("{:-<70}\n", "  Delay  "));
    out.push_str(&format!(
        "  Accepted delay  P50={:>8.1}  P90={:>8.1}  P99={:>8.1}  mean={:>8.1}\n",
        report.delay.p50, report.delay.p90, report.delay.p99, report.delay.mean
    ));
    out.push_str(&format!("  Mean hops: {:.2}\n", report.mean_hops));
    out.push_str(&format!("{:-<70}\n", "  Link load  "));
    out.push_str(&format!(
        "  Load CV: {:.3}  Jain's index: {:.4}\n",
        report.link_load_cv, report.jains_fairness_index
    ));
    out.push_str(&format!("{:-<70}\n", "  Caches  "));
    for stats in &report.cache_stats {
        out.push_str(&format!(
            "  node {:>4}: {:>5.1}/{:<5.1} hit rate {:>5.1}%  evictions {}  rejections {}\n",
            stats.node,
            stats.used,
            stats.capacity,
            stats.hit_rate * 100.0,
            stats.evictions,
            stats.rejections
        ));
    }
    if !report.custom_metrics.is_empty() {
        out.push_str(&format!("{:-<70}\n", "  Policy  "));
        let mut keys: Vec<&String> = report.custom_metrics.keys().collect();
        keys.sort();
        for key in keys {
            out.push_str(&format!("  {}: {}\n", key, report.custom_metrics[key]));
        }
    }
    out.push_str(&format!("{:=<70}\n", ""));
    out
}

/// Format a comparison table of multiple policy results.
pub fn format_comparison_table(results: &[SimulationReport]) -> String {
    if results.is_empty() {
        return String::from("No results to compare.\n");
    }

    let mut out = String::new();
    out.push_str(&format!("\n{:=<84}\n", "  Policy Comparison  "));
    out.push_str(&format!(
        "{:<22} {:>9} {:>9} {:>9} {:>9} {:>10} {:>10}\n",
        "Policy", "Accepted", "Rejected", "Accept%", "Delay p50", "Delay p99", "Jain's"
    ));
    out.push_str(&format!("{:-<84}\n", ""));

    for r in results {
        out.push_str(&format!(
            "{:<22} {:>9} {:>9} {:>8.1}% {:>9.1} {:>10.1} {:>10.4}\n",
            r.policy,
            r.accepted_requests,
            r.rejected_requests,
            r.acceptance_ratio * 100.0,
            r.delay.p50,
            r.delay.p99,
            r.jains_fairness_index,
        ));
    }
    out.push_str(&format!("{:=<84}\n", ""));
    out
}

//! Trace ingestion for SfcSim.
//!
//! The only supported input format is **compact JSONL**: one JSON object per
//! line describing a single SFC request:
//!
//! ```text
//! {"id": 7, "ts": 12.5, "ingress": 0, "egress": 3, "budget": 80, "vnfs": ["nat", 2]}
//! ```
//!
//! `id` is optional (records without one are numbered by position). VNFs may
//! be given by catalogue name or numeric id. Blank lines and lines starting
//! with `#` are ignored.

use serde::{Deserialize, Serialize};
use sfcsim_policies::{NodeId, SfcRequest, VnfType};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to read trace file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON at line {line}: {source}")]
    JsonParse {
        line: usize,
        source: serde_json::Error,
    },
    #[error("Unsupported trace format: {0}")]
    UnsupportedFormat(String),
    #[error("Unknown VNF '{name}' at line {line}")]
    UnknownVnf { line: usize, name: String },
}

/// A VNF reference as written in a trace: name or numeric id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VnfRef {
    Id(u8),
    Name(String),
}

impl VnfRef {
    fn resolve(&self) -> Option<VnfType> {
        match self {
            VnfRef::Id(id) => VnfType::from_id(*id),
            VnfRef::Name(name) => VnfType::from_name(name),
        }
    }
}

impl std::fmt::Display for VnfRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VnfRef::Id(id) => write!(f, "{}", id),
            VnfRef::Name(name) => f.write_str(name),
        }
    }
}

/// A compact JSONL trace record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactTraceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Arrival timestamp.
    pub ts: f64,
    pub ingress: NodeId,
    pub egress: NodeId,
    /// Delay budget.
    pub budget: f64,
    /// Required VNFs in chain order.
    #[serde(default)]
    pub vnfs: Vec<VnfRef>,
}

/// Load a trace from a file in the given format.
pub fn load_trace(path: &Path, format: &str) -> Result<Vec<SfcRequest>, TraceError> {
    match format {
        "compact_jsonl" | "jsonl" => load_compact_jsonl(path),
        other => Err(TraceError::UnsupportedFormat(other.to_string())),
    }
}

/// Load a compact JSONL trace file.
pub fn load_compact_jsonl(path: &Path) -> Result<Vec<SfcRequest>, TraceError> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    parse_compact_jsonl(reader)
}

/// Parse compact JSONL from any reader.
pub fn parse_compact_jsonl<R: Read>(reader: BufReader<R>) -> Result<Vec<SfcRequest>, TraceError> {
    let mut requests = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record: CompactTraceRecord =
            serde_json::from_str(trimmed).map_err(|e| TraceError::JsonParse {
                line: line_num + 1,
                source: e,
            })?;
        let request = record_to_request(requests.len() as u64, line_num + 1, record)?;
        requests.push(request);
    }

    // Stable: equal timestamps keep file order
    requests.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    Ok(requests)
}

/// Convert a compact trace record to an SfcRequest.
fn record_to_request(
    position: u64,
    line: usize,
    record: CompactTraceRecord,
) -> Result<SfcRequest, TraceError> {
    let vnfs = record
        .vnfs
        .iter()
        .map(|r| {
            r.resolve().ok_or_else(|| TraceError::UnknownVnf {
                line,
                name: r.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SfcRequest {
        id: record.id.unwrap_or(position),
        timestamp: record.ts,
        vnfs,
        delay_budget: record.budget,
        ingress: record.ingress,
        egress: record.egress,
    })
}

/// Write requests to compact JSONL format.
pub fn write_compact_jsonl(requests: &[SfcRequest], path: &Path) -> Result<(), TraceError> {
    use std::io::Write;
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);

    for req in requests {
        let record = CompactTraceRecord {
            id: Some(req.id),
            ts: req.timestamp,
            ingress: req.ingress,
            egress: req.egress,
            budget: req.delay_budget,
            vnfs: req
                .vnfs
                .iter()
                .map(|v| VnfRef::Name(v.name().to_string()))
                .collect(),
        };
        serde_json::to_writer(&mut writer, &record)
            .map_err(|e| TraceError::JsonParse { line: 0, source: e })?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

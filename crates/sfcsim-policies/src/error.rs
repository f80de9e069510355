//! Error type shared by the policy interface and the simulation core.

use crate::traits::NodeId;
use crate::vnf::VnfType;
use thiserror::Error;

/// Errors raised while evaluating a request against the network.
///
/// Only [`SfcError::CacheFull`] is expected during normal operation; policies
/// fold it into their acceptance decision. Every other variant signals
/// malformed input or a misuse of the [`Controller`](crate::Controller)
/// contract and aborts the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SfcError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Cache at node {node} cannot admit {vnf}")]
    CacheFull { node: NodeId, vnf: VnfType },
    #[error("A session is already active for request {active}")]
    SessionAlreadyActive { active: u64 },
    #[error("No active session")]
    NoActiveSession,
    #[error("{vnf} is not required by request {request_id}")]
    InvalidVnf { request_id: u64, vnf: VnfType },
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SfcError {
    /// Whether this error only affects the current request's outcome.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SfcError::CacheFull { .. })
    }
}

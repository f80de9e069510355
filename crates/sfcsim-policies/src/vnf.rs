//! Static VNF catalogue.
//!
//! Every VNF type has a fixed CPU cost (charged against CPU-sum caches) and a
//! fixed processing delay (charged to a session when the VNF is applied).
//! This table is the only place those numbers live.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A virtual network function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VnfType {
    Nat = 1,
    Firewall = 2,
    Ids = 3,
    WanOptimizer = 4,
    LoadBalancer = 5,
    Encrypt = 6,
    Decrypt = 7,
    Dpi = 8,
}

impl VnfType {
    /// All catalogue entries in id order.
    pub const ALL: [VnfType; 8] = [
        VnfType::Nat,
        VnfType::Firewall,
        VnfType::Ids,
        VnfType::WanOptimizer,
        VnfType::LoadBalancer,
        VnfType::Encrypt,
        VnfType::Decrypt,
        VnfType::Dpi,
    ];

    /// Numeric identifier (1-based).
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Look up a type by its numeric identifier.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.id() == id)
    }

    /// Look up a type by its catalogue name. Dashes and underscores are interchangeable.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.name() == normalized)
    }

    pub fn name(self) -> &'static str {
        match self {
            VnfType::Nat => "nat",
            VnfType::Firewall => "firewall",
            VnfType::Ids => "ids",
            VnfType::WanOptimizer => "wan_optimizer",
            VnfType::LoadBalancer => "load_balancer",
            VnfType::Encrypt => "encrypt",
            VnfType::Decrypt => "decrypt",
            VnfType::Dpi => "dpi",
        }
    }

    /// CPU units an instance of this VNF occupies.
    pub fn cpu_cost(self) -> f64 {
        match self {
            VnfType::Nat => 2.0,
            VnfType::Firewall => 3.0,
            VnfType::Ids => 6.0,
            VnfType::WanOptimizer => 5.0,
            VnfType::LoadBalancer => 2.0,
            VnfType::Encrypt => 4.0,
            VnfType::Decrypt => 4.0,
            VnfType::Dpi => 7.0,
        }
    }

    /// Delay added to a request processed by this VNF.
    pub fn processing_delay(self) -> f64 {
        match self {
            VnfType::Nat => 15.0,
            VnfType::Firewall => 20.0,
            VnfType::Ids => 30.0,
            VnfType::WanOptimizer => 25.0,
            VnfType::LoadBalancer => 10.0,
            VnfType::Encrypt => 20.0,
            VnfType::Decrypt => 20.0,
            VnfType::Dpi => 35.0,
        }
    }
}

impl fmt::Display for VnfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Total CPU cost of a set of VNFs.
pub fn total_cpu(vnfs: &[VnfType]) -> f64 {
    vnfs.iter().map(|v| v.cpu_cost()).sum()
}

/// Total processing delay of a set of VNFs.
pub fn total_processing_delay(vnfs: &[VnfType]) -> f64 {
    vnfs.iter().map(|v| v.processing_delay()).sum()
}

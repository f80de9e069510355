//! Built-in placement policies for SfcSim.
//!
//! This crate provides the [`Policy`] trait, the seams a policy drives
//! ([`TopologyView`], [`Controller`]) and several built-in implementations
//! for service function chain admission:
//!
//! | Policy | Strategy | Mutates caches |
//! |--------|----------|----------------|
//! | [`GreedyNoPlacement`] | Use VNFs already on the shortest path | No |
//! | [`GreedyOnlinePlacement`] | Place missing VNFs closest to the egress | Yes |
//! | [`FirstOrder`] | Process the chain strictly in order | Yes |
//! | [`HighestOrderDegree`] | Place missing VNFs at the best-connected node | Yes |
//! | [`BudgetAwarePath`] | Pick the first path that fits budget and capacity | Yes |

pub mod error;
pub mod first_order;
pub mod greedy;
pub mod hod;
pub mod tap;
pub mod traits;
pub mod traversal;
pub mod vnf;

pub use error::SfcError;
pub use first_order::FirstOrder;
pub use greedy::{GreedyNoPlacement, GreedyOnlinePlacement, PlacementRule};
pub use hod::HighestOrderDegree;
pub use tap::BudgetAwarePath;
pub use traits::*;
pub use vnf::VnfType;

/// Tunables for policies that take parameters.
#[derive(Debug, Clone)]
pub struct PolicyOptions {
    /// Maximum number of candidate paths the budget-aware policy evaluates.
    pub tap_max_candidates: usize,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self {
            tap_max_candidates: 8,
        }
    }
}

/// Create a policy by name with default options.
pub fn policy_by_name(name: &str) -> Option<Box<dyn Policy>> {
    build_policy(name, &PolicyOptions::default())
}

/// Create a policy by name.
pub fn build_policy(name: &str, options: &PolicyOptions) -> Option<Box<dyn Policy>> {
    match name {
        "greedy_no_placement" => Some(Box::new(GreedyNoPlacement::new())),
        "greedy_online" => Some(Box::new(GreedyOnlinePlacement::new())),
        "first_order" => Some(Box::new(FirstOrder::new())),
        "hod" => Some(Box::new(HighestOrderDegree::new())),
        "tap" => Some(Box::new(BudgetAwarePath::with_max_candidates(
            options.tap_max_candidates,
        ))),
        _ => None,
    }
}

/// List all available built-in policy names.
pub fn available_policies() -> Vec<&'static str> {
    vec![
        "greedy_no_placement",
        "greedy_online",
        "first_order",
        "hod",
        "tap",
    ]
}

//! Coordinator - central allocation arbiter
//!
//! Implements the collect → rank → commit negotiation protocol and the
//! periodic surplus/deficit rebalancing pass.
//!
//! See `negotiation.rs` and `rebalance.rs` for the two halves.

pub mod negotiation;
pub mod rebalance;

// Re-export main types for convenience
pub use negotiation::{AllocationOutcome, AllocationStrategy, Bid, Coordinator};
pub use rebalance::{run_rebalance_pass, RebalanceConfig, RebalanceResult};

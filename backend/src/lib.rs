//! Healthcare Simulator Core - Rust Engine
//!
//! Discrete-step healthcare resource allocation simulator with
//! deterministic execution.
//!
//! # Architecture
//!
//! - **models**: Domain types (Hospital, Patient, Message)
//! - **coordinator**: Allocation negotiation and rebalancing
//! - **environment**: Main simulation loop and snapshots
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All resource values are i64 (whole units)
//! 2. All randomness is deterministic (seeded RNG)
//! 3. Every negotiation leaves a message trail in the coordinator's log

// Module declarations
pub mod coordinator;
pub mod environment;
pub mod models;
pub mod rng;

// Re-exports for convenience
pub use coordinator::{
    run_rebalance_pass, AllocationOutcome, AllocationStrategy, Bid, Coordinator, RebalanceConfig,
    RebalanceResult,
};
pub use environment::{
    Environment, EnvironmentConfig, EnvironmentSnapshot, HospitalConfig, PatientConfig,
    SimulationError, StepResult, SystemMetrics,
};
pub use models::{
    hospital::{
        AdmissionPolicy, AlwaysCompatible, CompatibilityPolicy, Hospital, HospitalError,
        ReplenishmentConfig, Specialty,
    },
    message::{Message, MessageLog, Payload, Recipient, COORDINATOR_ID},
    patient::{Patient, Severity},
};
pub use rng::RngManager;

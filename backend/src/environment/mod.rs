//! Environment module
//!
//! Owns the registries and drives the per-step workflow; snapshots give
//! drivers a serializable view of the state.

pub mod engine;
pub mod snapshot;

pub use engine::{
    Environment, EnvironmentConfig, HospitalConfig, PatientConfig, SimulationError, StepResult,
    SystemMetrics,
};
pub use snapshot::{EnvironmentSnapshot, HospitalSnapshot, PatientSnapshot};

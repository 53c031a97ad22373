//! Domain models for the allocation simulator

pub mod hospital;
pub mod message;
pub mod patient;

// Re-exports
pub use hospital::{
    AdmissionPolicy, AlwaysCompatible, CompatibilityPolicy, Hospital, HospitalError,
    ReplenishmentConfig, Specialty,
};
pub use message::{Message, MessageLog, Payload, Recipient, COORDINATOR_ID};
pub use patient::{Patient, Severity};

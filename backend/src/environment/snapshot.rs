//! Point-in-time serializable views of the environment
//!
//! Snapshots decouple export from live state: they copy the fields a
//! driver or analysis tool needs and serialize with serde, so the live
//! structs keep their private fields and the export format stays stable.

use serde::{Deserialize, Serialize};

use crate::environment::engine::{Environment, SystemMetrics};
use crate::models::hospital::{Hospital, Specialty};
use crate::models::message::Message;
use crate::models::patient::{Patient, Severity};

/// Serializable view of one hospital
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalSnapshot {
    pub id: String,
    pub specialty: Specialty,
    pub initial_capacity: i64,
    pub current_balance: i64,
}

impl From<&Hospital> for HospitalSnapshot {
    fn from(hospital: &Hospital) -> Self {
        Self {
            id: hospital.id().to_string(),
            specialty: hospital.specialty(),
            initial_capacity: hospital.initial_capacity(),
            current_balance: hospital.current_balance(),
        }
    }
}

/// Serializable view of one patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub id: String,
    pub severity: Severity,
    pub current_demand: i64,
    pub unmet_demand: i64,
}

impl From<&Patient> for PatientSnapshot {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id().to_string(),
            severity: patient.severity(),
            current_demand: patient.current_demand(),
            unmet_demand: patient.unmet_demand(),
        }
    }
}

/// Full environment state at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Completed steps at capture time
    pub step: usize,

    pub hospitals: Vec<HospitalSnapshot>,
    pub patients: Vec<PatientSnapshot>,
    pub metrics: SystemMetrics,

    /// Most recent messages from the coordinator's log
    pub recent_messages: Vec<Message>,
}

impl Environment {
    /// Capture a serializable snapshot of the current state
    ///
    /// `message_tail` bounds how many of the most recent messages are
    /// included; the full log stays in the coordinator.
    pub fn snapshot(&self, message_tail: usize) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            step: self.current_step(),
            hospitals: self.hospitals().iter().map(HospitalSnapshot::from).collect(),
            patients: self.patients().iter().map(PatientSnapshot::from).collect(),
            metrics: self.metrics().clone(),
            recent_messages: self.message_log().tail(message_tail).to_vec(),
        }
    }
}

//! Patient (consumer) model
//!
//! Represents a patient generating stochastic demand for treatment
//! resources. Severity is fixed at creation and keys the demand band;
//! demand itself is redrawn every step and immediately submitted for
//! allocation, so a patient never carries a demand that was not
//! negotiated.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinator::{AllocationOutcome, Coordinator};
use crate::models::hospital::Hospital;
use crate::models::message::Message;
use crate::rng::RngManager;

/// Patient severity class, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// All severities, in declaration order (for uniform random assignment)
    pub fn all() -> [Severity; 3] {
        [Severity::Low, Severity::Medium, Severity::High]
    }

    /// Demand band for this severity, as a half-open range `[min, max)`
    pub fn demand_range(&self) -> (i64, i64) {
        match self {
            Severity::Low => (5, 20),
            Severity::Medium => (20, 100),
            Severity::High => (100, 200),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        write!(f, "{}", name)
    }
}

/// Represents a patient (consumer) in the allocation system
///
/// # Example
/// ```
/// use healthcare_simulator_core_rs::models::{Patient, Severity};
///
/// let patient = Patient::new("patient_1".to_string(), Severity::High);
/// assert_eq!(patient.current_demand(), 0);
/// assert_eq!(patient.unmet_demand(), 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    /// Unique patient identifier (e.g., "patient_1")
    id: String,

    /// Severity class keying the demand band, fixed at creation
    severity: Severity,

    /// Demand drawn in the most recent step (i64 units)
    current_demand: i64,

    /// Equals `current_demand` when the most recent allocation attempt
    /// failed, 0 otherwise
    unmet_demand: i64,
}

impl Patient {
    /// Create a new patient with no demand yet
    pub fn new(id: String, severity: Severity) -> Self {
        Self {
            id,
            severity,
            current_demand: 0,
            unmet_demand: 0,
        }
    }

    /// Get patient ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the severity class
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the demand drawn in the most recent step (i64 units)
    pub fn current_demand(&self) -> i64 {
        self.current_demand
    }

    /// Get the unmet demand from the most recent step (i64 units)
    pub fn unmet_demand(&self) -> i64 {
        self.unmet_demand
    }

    /// Draw this step's demand and submit it for allocation.
    ///
    /// One atomic operation: draw uniformly from the severity band,
    /// announce it with a `MEDICAL_NEEDS` message, run the coordinator's
    /// negotiation, and record the unmet amount if it failed. There is no
    /// intermediate state in which a demand exists without an allocation
    /// attempt.
    pub fn generate_demand(
        &mut self,
        hospitals: &mut [Hospital],
        coordinator: &mut Coordinator,
        rng: &mut RngManager,
        step: usize,
    ) -> AllocationOutcome {
        let (min, max) = self.severity.demand_range();
        let amount = rng.range(min, max);
        self.current_demand = amount;

        debug!(patient = %self.id, severity = %self.severity, amount, "demand drawn");
        coordinator.record(Message::medical_needs(step, &self.id, amount, self.severity));

        let outcome = coordinator.negotiate(&self.id, self.severity, amount, hospitals, step);
        self.unmet_demand = if outcome.fulfilled { 0 } else { amount };
        outcome
    }
}

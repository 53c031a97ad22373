//! Hospital (provider) model
//!
//! Represents a hospital holding a replenishing pool of treatment resources.
//! Each hospital has:
//! - A fixed initial capacity (reference value, never mutated)
//! - A current balance that allocation debits and replenishment regrows
//! - A specialization tag used in admission scoring
//!
//! Admission follows a two-phase protocol: `quote()` scores a patient
//! against a balance snapshot, `commit()` re-checks the live balance before
//! debiting. The split exists because other patients in the same step may
//! drain the balance between the quote and the coordinator's decision.
//!
//! CRITICAL: All resource values are i64 (whole units)

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::message::{Message, MessageLog};
use crate::models::patient::Severity;

/// Score contribution of the specialization factor when compatible.
const SPECIALTY_MATCH_SCORE: f64 = 1.0;

/// Score contribution of the specialization factor when incompatible.
const SPECIALTY_MISMATCH_SCORE: f64 = 0.3;

/// Errors that can occur during hospital balance operations
#[derive(Debug, Error, PartialEq)]
pub enum HospitalError {
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },
}

/// Clinical specialization of a hospital, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    Emergency,
    IntensiveCare,
    General,
    Pediatric,
    Surgical,
}

impl Specialty {
    /// All specialties, in declaration order (for uniform random assignment)
    pub fn all() -> [Specialty; 5] {
        [
            Specialty::Emergency,
            Specialty::IntensiveCare,
            Specialty::General,
            Specialty::Pediatric,
            Specialty::Surgical,
        ]
    }
}

impl std::fmt::Display for Specialty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Specialty::Emergency => "emergency",
            Specialty::IntensiveCare => "intensive_care",
            Specialty::General => "general",
            Specialty::Pediatric => "pediatric",
            Specialty::Surgical => "surgical",
        };
        write!(f, "{}", name)
    }
}

/// Decides whether a hospital's specialty can serve a patient.
///
/// Pluggable so harnesses can model referral rules; the default accepts
/// every pairing, in which case the mismatch score contribution is never
/// used.
pub trait CompatibilityPolicy {
    fn compatible(&self, specialty: Specialty, severity: Severity) -> bool;
}

/// Default compatibility: every hospital can treat every patient
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysCompatible;

impl CompatibilityPolicy for AlwaysCompatible {
    fn compatible(&self, _specialty: Specialty, _severity: Severity) -> bool {
        true
    }
}

/// Admission scoring weights and acceptance threshold, shared by all
/// hospitals in a run.
///
/// `score = specialization_weight × match + efficiency_weight × (1 - demand/balance)`
///
/// The weights must sum to ≤ 1 so the score stays interpretable as a
/// fraction; a quote is returned only when the score exceeds `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    pub specialization_weight: f64,
    pub efficiency_weight: f64,
    pub threshold: f64,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            specialization_weight: 0.4,
            efficiency_weight: 0.6,
            threshold: 0.5,
        }
    }
}

/// Growth parameters for per-step replenishment.
///
/// `balance = min(balance × growth_rate, capacity × growth_cap)`; the cap
/// also pulls back down a balance that rebalancing pushed above the
/// ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentConfig {
    pub growth_rate: f64,
    pub growth_cap: f64,
}

impl Default for ReplenishmentConfig {
    fn default() -> Self {
        Self {
            growth_rate: 1.1,
            growth_cap: 1.5,
        }
    }
}

/// Represents a hospital (provider) in the allocation system
///
/// # Example
/// ```
/// use healthcare_simulator_core_rs::models::{AdmissionPolicy, Hospital, Specialty};
///
/// let hospital = Hospital::new(
///     "hospital_1".to_string(),
///     1000,
///     Specialty::General,
///     AdmissionPolicy::default(),
/// );
/// assert_eq!(hospital.current_balance(), 1000);
/// assert_eq!(hospital.initial_capacity(), 1000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    /// Unique hospital identifier (e.g., "hospital_1")
    id: String,

    /// Clinical specialization, fixed at creation
    specialty: Specialty,

    /// Reference capacity set at creation, never mutated
    initial_capacity: i64,

    /// Current resource level (i64 units)
    ///
    /// Never negative. May exceed `initial_capacity`: replenishment grows
    /// it up to `growth_cap × capacity`, and rebalancing transfers-in
    /// have no ceiling unless one is configured.
    current_balance: i64,

    /// Admission scoring parameters
    policy: AdmissionPolicy,
}

impl Hospital {
    /// Create a new hospital with a full balance
    ///
    /// # Arguments
    /// * `id` - Unique identifier (e.g., "hospital_1")
    /// * `initial_capacity` - Reference capacity in units (positive)
    /// * `specialty` - Clinical specialization
    /// * `policy` - Admission scoring parameters
    ///
    /// # Panics
    /// Panics if `initial_capacity` is not positive.
    pub fn new(id: String, initial_capacity: i64, specialty: Specialty, policy: AdmissionPolicy) -> Self {
        assert!(initial_capacity > 0, "initial_capacity must be positive");
        Self {
            id,
            specialty,
            initial_capacity,
            current_balance: initial_capacity,
            policy,
        }
    }

    /// Get hospital ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the specialization tag
    pub fn specialty(&self) -> Specialty {
        self.specialty
    }

    /// Get the fixed reference capacity (i64 units)
    pub fn initial_capacity(&self) -> i64 {
        self.initial_capacity
    }

    /// Get current balance (i64 units)
    pub fn current_balance(&self) -> i64 {
        self.current_balance
    }

    /// Get the admission policy in effect
    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Quote phase: score a patient's demand against the current balance.
    ///
    /// Always records an `ADMISSION_BID` message, then applies two gates:
    /// the demand must fit the current balance, and the composite score
    /// must exceed the admission threshold. Returns the score when both
    /// hold; `None` is a normal rejection, not an error.
    ///
    /// The score is non-binding: the balance it saw may be gone by commit
    /// time.
    pub fn quote(
        &self,
        patient_id: &str,
        severity: Severity,
        amount: i64,
        compatibility: &dyn CompatibilityPolicy,
        log: &mut MessageLog,
        step: usize,
    ) -> Option<f64> {
        log.append(Message::admission_bid(
            step,
            &self.id,
            patient_id,
            amount,
            self.specialty,
        ));

        if self.current_balance < amount {
            debug!(
                hospital = %self.id,
                patient = patient_id,
                amount,
                available = self.current_balance,
                "quote rejected: insufficient balance"
            );
            return None;
        }

        let score = self.admission_score(severity, amount, compatibility);
        if score > self.policy.threshold {
            debug!(hospital = %self.id, patient = patient_id, score, "quote accepted");
            Some(score)
        } else {
            debug!(hospital = %self.id, patient = patient_id, score, "quote rejected: below threshold");
            None
        }
    }

    /// Commit phase: debit the quoted amount if the balance still covers it.
    ///
    /// Re-checks the live balance (a quote from earlier in the step may be
    /// stale), debits on success and records a `RESOURCE_ALLOCATED`
    /// message. Returns false with no mutation when the balance no longer
    /// covers the amount.
    pub fn commit(
        &mut self,
        patient_id: &str,
        amount: i64,
        log: &mut MessageLog,
        step: usize,
    ) -> bool {
        match self.debit(amount) {
            Ok(()) => {
                log.append(Message::resource_allocated(step, &self.id, patient_id, amount));
                true
            }
            Err(_) => {
                debug!(
                    hospital = %self.id,
                    patient = patient_id,
                    amount,
                    available = self.current_balance,
                    "commit refused: balance changed since quote"
                );
                false
            }
        }
    }

    /// Per-step replenishment.
    ///
    /// Grows the balance by `growth_rate`, clamped to
    /// `growth_cap × initial_capacity`. No messages, no cross-hospital
    /// coupling; call order among hospitals does not matter.
    pub fn replenish(&mut self, config: &ReplenishmentConfig) {
        let ceiling = (self.initial_capacity as f64 * config.growth_cap).round() as i64;
        let grown = (self.current_balance as f64 * config.growth_rate).round() as i64;
        self.current_balance = grown.min(ceiling);
    }

    /// Add units to the balance (rebalancing transfer-in)
    ///
    /// # Panics
    /// Panics if amount is negative.
    pub fn credit(&mut self, amount: i64) {
        assert!(amount >= 0, "credit amount must be non-negative");
        self.current_balance += amount;
    }

    /// Remove units from the balance, refusing to go negative
    ///
    /// # Returns
    /// `Err(HospitalError::InsufficientBalance)` if the balance does not
    /// cover the amount; the balance is untouched in that case.
    ///
    /// # Panics
    /// Panics if amount is negative.
    pub fn debit(&mut self, amount: i64) -> Result<(), HospitalError> {
        assert!(amount >= 0, "debit amount must be non-negative");
        if self.current_balance < amount {
            return Err(HospitalError::InsufficientBalance {
                required: amount,
                available: self.current_balance,
            });
        }
        self.current_balance -= amount;
        Ok(())
    }

    /// Composite admission score for a demand that passed the balance gate.
    ///
    /// `specialization_weight × match + efficiency_weight × (1 - demand/balance)`
    fn admission_score(
        &self,
        severity: Severity,
        amount: i64,
        compatibility: &dyn CompatibilityPolicy,
    ) -> f64 {
        let match_score = if compatibility.compatible(self.specialty, severity) {
            SPECIALTY_MATCH_SCORE
        } else {
            SPECIALTY_MISMATCH_SCORE
        };
        let efficiency = 1.0 - (amount as f64 / self.current_balance as f64);

        self.policy.specialization_weight * match_score + self.policy.efficiency_weight * efficiency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_hospital(capacity: i64) -> Hospital {
        Hospital::new(
            "hospital_1".to_string(),
            capacity,
            Specialty::General,
            AdmissionPolicy::default(),
        )
    }

    /// Compatibility policy that only matches one specialty, for exercising
    /// the mismatch contribution.
    struct OnlySpecialty(Specialty);

    impl CompatibilityPolicy for OnlySpecialty {
        fn compatible(&self, specialty: Specialty, _severity: Severity) -> bool {
            specialty == self.0
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_new_hospital_starts_full() {
        let hospital = create_hospital(1000);
        assert_eq!(hospital.id(), "hospital_1");
        assert_eq!(hospital.initial_capacity(), 1000);
        assert_eq!(hospital.current_balance(), 1000);
        assert_eq!(hospital.specialty(), Specialty::General);
    }

    #[test]
    #[should_panic(expected = "initial_capacity must be positive")]
    fn test_zero_capacity_rejected() {
        create_hospital(0);
    }

    #[test]
    fn test_quote_accepts_and_scores() {
        let hospital = create_hospital(200);
        let mut log = MessageLog::new();

        let score = hospital.quote("patient_1", Severity::Medium, 40, &AlwaysCompatible, &mut log, 0);

        // 0.4 * 1.0 + 0.6 * (1 - 40/200) = 0.88
        assert_close(score.unwrap(), 0.88);
        assert_eq!(log.of_kind("ADMISSION_BID").len(), 1);
    }

    #[test]
    fn test_quote_rejects_insufficient_balance() {
        let hospital = create_hospital(100);
        let mut log = MessageLog::new();

        let score = hospital.quote("patient_1", Severity::High, 150, &AlwaysCompatible, &mut log, 0);

        assert!(score.is_none());
        // the bid message is recorded even for a rejection
        assert_eq!(log.of_kind("ADMISSION_BID").len(), 1);
    }

    #[test]
    fn test_quote_rejects_below_threshold() {
        let hospital = create_hospital(100);
        let mut log = MessageLog::new();

        // demand == balance → efficiency term 0, score = 0.4 ≤ 0.5
        let score = hospital.quote("patient_1", Severity::High, 100, &AlwaysCompatible, &mut log, 0);

        assert!(score.is_none());
    }

    #[test]
    fn test_quote_mismatch_contribution() {
        let hospital = create_hospital(200);
        let mut log = MessageLog::new();

        let score = hospital.quote(
            "patient_1",
            Severity::Medium,
            40,
            &OnlySpecialty(Specialty::Pediatric),
            &mut log,
            0,
        );

        // 0.4 * 0.3 + 0.6 * (1 - 40/200) = 0.60
        assert_close(score.unwrap(), 0.60);
    }

    #[test]
    fn test_commit_debits_and_confirms() {
        let mut hospital = create_hospital(200);
        let mut log = MessageLog::new();

        assert!(hospital.commit("patient_1", 40, &mut log, 0));
        assert_eq!(hospital.current_balance(), 160);
        assert_eq!(log.of_kind("RESOURCE_ALLOCATED").len(), 1);
    }

    #[test]
    fn test_commit_refuses_without_mutation() {
        let mut hospital = create_hospital(100);
        let mut log = MessageLog::new();

        assert!(!hospital.commit("patient_1", 150, &mut log, 0));
        assert_eq!(hospital.current_balance(), 100);
        assert!(log.of_kind("RESOURCE_ALLOCATED").is_empty());
    }

    #[test]
    fn test_replenish_grows_balance() {
        let mut hospital = create_hospital(1000);
        let mut log = MessageLog::new();
        assert!(hospital.commit("patient_1", 500, &mut log, 0));

        hospital.replenish(&ReplenishmentConfig::default());
        assert_eq!(hospital.current_balance(), 550); // 500 * 1.1
    }

    #[test]
    fn test_replenish_capped_at_growth_ceiling() {
        let mut hospital = create_hospital(1000);

        let config = ReplenishmentConfig::default();
        for _ in 0..10 {
            hospital.replenish(&config);
        }

        assert_eq!(hospital.current_balance(), 1500); // 1.5 × capacity
    }

    #[test]
    fn test_replenish_clamps_down_over_ceiling_balance() {
        let mut hospital = create_hospital(100);
        // transfers-in can push the balance past the growth ceiling
        hospital.credit(100);
        assert_eq!(hospital.current_balance(), 200);

        hospital.replenish(&ReplenishmentConfig::default());
        assert_eq!(hospital.current_balance(), 150);
    }

    #[test]
    fn test_debit_insufficient_reports_amounts() {
        let mut hospital = create_hospital(50);

        let err = hospital.debit(80).unwrap_err();
        assert_eq!(
            err,
            HospitalError::InsufficientBalance {
                required: 80,
                available: 50,
            }
        );
        assert_eq!(hospital.current_balance(), 50);
    }

    #[test]
    fn test_credit_adds_units() {
        let mut hospital = create_hospital(50);
        hospital.credit(25);
        assert_eq!(hospital.current_balance(), 75);
    }
}

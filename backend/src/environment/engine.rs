//! Environment Engine
//!
//! Main simulation loop integrating all components:
//! - Patient demand generation (coupled with negotiation)
//! - Hospital replenishment
//! - Coordinator-driven rebalancing
//! - Metrics aggregation (explicit read-only pass)
//!
//! # Architecture
//!
//! The Environment owns the hospital and patient registries, the
//! coordinator, and the RNG, and drives one discrete step at a time:
//!
//! ```text
//! For each step t:
//! 1. Every patient draws a demand and negotiates (registration order)
//! 2. Every hospital replenishes
//! 3. Coordinator rebalances surplus into deficit hospitals
//! 4. Metrics are recomputed from a read-only scan
//! 5. The step counter advances
//! ```
//!
//! Registries are Vecs in registration order; ranking ties and rebalance
//! orderings fall back on that order, which keeps seeded runs
//! reproducible.
//!
//! # Example
//!
//! ```rust
//! use healthcare_simulator_core_rs::environment::{Environment, EnvironmentConfig};
//!
//! let config = EnvironmentConfig::uniform(2, 3, 1000, 42);
//! let mut env = Environment::new(config).unwrap();
//!
//! let result = env.step();
//! assert_eq!(result.step, 0);
//! assert_eq!(result.allocations_fulfilled + result.allocations_failed, 3);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::coordinator::{AllocationStrategy, Coordinator, RebalanceConfig};
use crate::models::hospital::{AdmissionPolicy, Hospital, ReplenishmentConfig, Specialty};
use crate::models::message::MessageLog;
use crate::models::patient::{Patient, Severity};
use crate::rng::RngManager;

// ============================================================================
// Configuration Types
// ============================================================================

/// Complete environment configuration
///
/// Everything needed to initialize a run. All scoring, replenishment, and
/// rebalancing parameters are defaulted; only the registries must be
/// supplied (or generated with [`EnvironmentConfig::uniform`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Per-hospital configuration, in registration order
    pub hospitals: Vec<HospitalConfig>,

    /// Per-patient configuration, in registration order
    pub patients: Vec<PatientConfig>,

    /// RNG seed for deterministic demand draws and attribute assignment
    #[serde(default)]
    pub rng_seed: u64,

    /// Admission scoring parameters shared by every hospital
    #[serde(default)]
    pub admission: AdmissionPolicy,

    /// Coordinator ranking weights
    #[serde(default)]
    pub strategy: AllocationStrategy,

    /// Per-step replenishment growth parameters
    #[serde(default)]
    pub replenishment: ReplenishmentConfig,

    /// Rebalancing thresholds and transfer fractions
    #[serde(default)]
    pub rebalance: RebalanceConfig,
}

/// Per-hospital configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalConfig {
    /// Unique hospital identifier
    pub id: String,

    /// Reference capacity in units (positive)
    pub capacity: i64,

    /// Specialization; `None` is drawn uniformly at setup
    #[serde(default)]
    pub specialty: Option<Specialty>,
}

/// Per-patient configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientConfig {
    /// Unique patient identifier
    pub id: String,

    /// Severity class; `None` is drawn uniformly at setup
    #[serde(default)]
    pub severity: Option<Severity>,
}

impl EnvironmentConfig {
    /// Count-based configuration: `num_hospitals` hospitals of equal
    /// capacity and `num_patients` patients, ids generated, specialties
    /// and severities left for the seeded RNG to assign at setup.
    pub fn uniform(
        num_hospitals: usize,
        num_patients: usize,
        initial_capacity: i64,
        rng_seed: u64,
    ) -> Self {
        let hospitals = (1..=num_hospitals)
            .map(|n| HospitalConfig {
                id: format!("hospital_{}", n),
                capacity: initial_capacity,
                specialty: None,
            })
            .collect();
        let patients = (1..=num_patients)
            .map(|n| PatientConfig {
                id: format!("patient_{}", n),
                severity: None,
            })
            .collect();

        Self {
            hospitals,
            patients,
            rng_seed,
            admission: AdmissionPolicy::default(),
            strategy: AllocationStrategy::default(),
            replenishment: ReplenishmentConfig::default(),
            rebalance: RebalanceConfig::default(),
        }
    }
}

// ============================================================================
// Errors and Results
// ============================================================================

/// Simulation error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Configuration validation error
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// System-wide performance indicators, recomputed at the end of each step
/// by a read-only scan over both registries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Sum of unmet demand across all patients (i64 units)
    pub total_unmet_demand: i64,

    /// Sum of balances across all hospitals (i64 units)
    pub total_balance: i64,

    /// `(total_balance - total_unmet) / (total_balance + 1)`; the +1
    /// keeps the ratio finite with zero hospitals or zero balance
    pub allocation_efficiency: f64,
}

impl SystemMetrics {
    /// Aggregate metrics from the current registries
    pub fn aggregate(hospitals: &[Hospital], patients: &[Patient]) -> Self {
        let total_unmet_demand: i64 = patients.iter().map(|p| p.unmet_demand()).sum();
        let total_balance: i64 = hospitals.iter().map(|h| h.current_balance()).sum();
        let allocation_efficiency =
            (total_balance - total_unmet_demand) as f64 / (total_balance + 1) as f64;

        Self {
            total_unmet_demand,
            total_balance,
            allocation_efficiency,
        }
    }
}

/// Result of a single step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Step number (0-based)
    pub step: usize,

    /// Negotiations that ended in a successful commit
    pub allocations_fulfilled: usize,

    /// Negotiations that ended unfulfilled
    pub allocations_failed: usize,

    /// Rebalancing transfers executed this step
    pub transfers_executed: usize,

    /// Total units moved by rebalancing this step
    pub transferred_value: i64,

    /// Metrics after this step's aggregation pass
    pub metrics: SystemMetrics,
}

// ============================================================================
// Environment
// ============================================================================

/// Main environment owning all simulation state
///
/// # Determinism
///
/// All randomness goes through the seeded `RngManager`. Same seed + same
/// config = identical allocation decisions, messages, and metrics.
#[derive(Debug)]
pub struct Environment {
    /// Hospital registry, in registration order
    hospitals: Vec<Hospital>,

    /// Patient registry, in registration order
    patients: Vec<Patient>,

    /// Central arbiter; owns the message log
    coordinator: Coordinator,

    /// Deterministic RNG
    rng: RngManager,

    /// Replenishment parameters applied to every hospital
    replenishment: ReplenishmentConfig,

    /// Next step to execute (0-based)
    current_step: usize,

    /// Metrics from the most recent aggregation pass
    metrics: SystemMetrics,
}

impl Environment {
    /// Create a new environment from configuration
    ///
    /// Validates the configuration, then builds both registries. Hospitals
    /// and patients without an explicit specialty/severity get one drawn
    /// from the seeded RNG, so the same seed always produces the same
    /// population.
    ///
    /// # Returns
    ///
    /// * `Ok(Environment)` - ready to step
    /// * `Err(SimulationError)` - configuration validation failed
    ///
    /// # Example
    ///
    /// ```rust
    /// use healthcare_simulator_core_rs::environment::{Environment, EnvironmentConfig};
    ///
    /// let env = Environment::new(EnvironmentConfig::uniform(5, 50, 1000, 7)).unwrap();
    /// assert_eq!(env.hospitals().len(), 5);
    /// assert_eq!(env.patients().len(), 50);
    /// ```
    pub fn new(config: EnvironmentConfig) -> Result<Self, SimulationError> {
        Self::validate_config(&config)?;

        let mut rng = RngManager::new(config.rng_seed);

        let hospitals: Vec<Hospital> = config
            .hospitals
            .iter()
            .map(|hc| {
                let specialty = hc.specialty.unwrap_or_else(|| {
                    let all = Specialty::all();
                    all[rng.pick(all.len())]
                });
                Hospital::new(hc.id.clone(), hc.capacity, specialty, config.admission)
            })
            .collect();

        let patients: Vec<Patient> = config
            .patients
            .iter()
            .map(|pc| {
                let severity = pc.severity.unwrap_or_else(|| {
                    let all = Severity::all();
                    all[rng.pick(all.len())]
                });
                Patient::new(pc.id.clone(), severity)
            })
            .collect();

        let coordinator = Coordinator::new(config.strategy, config.rebalance);
        let metrics = SystemMetrics::aggregate(&hospitals, &patients);

        info!(
            hospitals = hospitals.len(),
            patients = patients.len(),
            seed = config.rng_seed,
            "environment initialized"
        );

        Ok(Self {
            hospitals,
            patients,
            coordinator,
            rng,
            replenishment: config.replenishment,
            current_step: 0,
            metrics,
        })
    }

    /// Validate configuration
    fn validate_config(config: &EnvironmentConfig) -> Result<(), SimulationError> {
        if config.hospitals.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "Must have at least one hospital".to_string(),
            ));
        }

        if config.patients.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "Must have at least one patient".to_string(),
            ));
        }

        let mut seen_ids = HashSet::new();
        for id in config
            .hospitals
            .iter()
            .map(|hc| &hc.id)
            .chain(config.patients.iter().map(|pc| &pc.id))
        {
            if id.is_empty() {
                return Err(SimulationError::InvalidConfig(
                    "Entity ids must be non-empty".to_string(),
                ));
            }
            if !seen_ids.insert(id) {
                return Err(SimulationError::InvalidConfig(format!(
                    "Duplicate entity id: {}",
                    id
                )));
            }
        }

        for hc in &config.hospitals {
            if hc.capacity <= 0 {
                return Err(SimulationError::InvalidConfig(format!(
                    "Hospital {} capacity must be > 0, got {}",
                    hc.id, hc.capacity
                )));
            }
        }

        let admission = &config.admission;
        if admission.specialization_weight < 0.0 || admission.efficiency_weight < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "Admission weights must be non-negative".to_string(),
            ));
        }
        if admission.specialization_weight + admission.efficiency_weight > 1.0 + 1e-9 {
            return Err(SimulationError::InvalidConfig(format!(
                "Admission weights must sum to <= 1.0, got {}",
                admission.specialization_weight + admission.efficiency_weight
            )));
        }
        if !(0.0..=1.0).contains(&admission.threshold) {
            return Err(SimulationError::InvalidConfig(format!(
                "Admission threshold must be in [0, 1], got {}",
                admission.threshold
            )));
        }

        let strategy = &config.strategy;
        if strategy.severity_weight < 0.0
            || strategy.capacity_weight < 0.0
            || strategy.efficiency_weight < 0.0
        {
            return Err(SimulationError::InvalidConfig(
                "Strategy weights must be non-negative".to_string(),
            ));
        }
        let strategy_sum =
            strategy.severity_weight + strategy.capacity_weight + strategy.efficiency_weight;
        if (strategy_sum - 1.0).abs() > 1e-9 {
            return Err(SimulationError::InvalidConfig(format!(
                "Strategy weights must sum to 1.0, got {}",
                strategy_sum
            )));
        }

        if config.replenishment.growth_rate <= 0.0 {
            return Err(SimulationError::InvalidConfig(
                "Replenishment growth_rate must be > 0".to_string(),
            ));
        }
        if config.replenishment.growth_cap < 1.0 {
            return Err(SimulationError::InvalidConfig(
                "Replenishment growth_cap must be >= 1.0".to_string(),
            ));
        }

        let rebalance = &config.rebalance;
        if rebalance.deficit_threshold <= 0.0 {
            return Err(SimulationError::InvalidConfig(
                "Rebalance deficit_threshold must be > 0".to_string(),
            ));
        }
        if rebalance.surplus_threshold <= rebalance.deficit_threshold {
            return Err(SimulationError::InvalidConfig(format!(
                "Rebalance surplus_threshold ({}) must exceed deficit_threshold ({})",
                rebalance.surplus_threshold, rebalance.deficit_threshold
            )));
        }
        if !(0.0..=1.0).contains(&rebalance.transfer_fraction) || rebalance.transfer_fraction == 0.0 {
            return Err(SimulationError::InvalidConfig(
                "Rebalance transfer_fraction must be in (0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&rebalance.restore_fraction) || rebalance.restore_fraction == 0.0 {
            return Err(SimulationError::InvalidConfig(
                "Rebalance restore_fraction must be in (0, 1]".to_string(),
            ));
        }
        if let Some(cap) = rebalance.balance_cap {
            if cap < 1.0 {
                return Err(SimulationError::InvalidConfig(format!(
                    "Rebalance balance_cap must be >= 1.0, got {}",
                    cap
                )));
            }
        }

        Ok(())
    }

    /// Advance the system by one discrete step
    ///
    /// Runs the full per-step workflow and returns its summary. Calling it
    /// N times simulates N steps; there is no replay or undo.
    pub fn step(&mut self) -> StepResult {
        let step = self.current_step;

        // STEP 1: DEMAND GENERATION
        // Every patient draws this step's demand and negotiates it,
        // in registration order
        let mut allocations_fulfilled = 0;
        let mut allocations_failed = 0;
        for i in 0..self.patients.len() {
            let outcome = self.patients[i].generate_demand(
                &mut self.hospitals,
                &mut self.coordinator,
                &mut self.rng,
                step,
            );
            if outcome.fulfilled {
                allocations_fulfilled += 1;
            } else {
                allocations_failed += 1;
            }
        }

        // STEP 2: REPLENISHMENT
        // Order among hospitals does not matter here
        for hospital in &mut self.hospitals {
            hospital.replenish(&self.replenishment);
        }

        // STEP 3: REBALANCING
        let rebalance = self.coordinator.rebalance(&mut self.hospitals, step);

        // STEP 4: METRICS AGGREGATION
        // Read-only scan over both registries
        self.metrics = SystemMetrics::aggregate(&self.hospitals, &self.patients);

        // STEP 5: ADVANCE
        self.current_step += 1;

        info!(
            step,
            unmet = self.metrics.total_unmet_demand,
            efficiency = self.metrics.allocation_efficiency,
            "step complete"
        );

        StepResult {
            step,
            allocations_fulfilled,
            allocations_failed,
            transfers_executed: rebalance.transfers_executed,
            transferred_value: rebalance.transferred_value,
            metrics: self.metrics.clone(),
        }
    }

    /// Run a fixed number of steps, collecting each step's summary
    pub fn run(&mut self, steps: usize) -> Vec<StepResult> {
        (0..steps).map(|_| self.step()).collect()
    }

    /// Hospital registry, in registration order
    pub fn hospitals(&self) -> &[Hospital] {
        &self.hospitals
    }

    /// Patient registry, in registration order
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    /// The coordinator (read access; its log holds the full history)
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// The coordinator's message log
    pub fn message_log(&self) -> &MessageLog {
        self.coordinator.log()
    }

    /// Metrics from the most recent aggregation pass
    pub fn metrics(&self) -> &SystemMetrics {
        &self.metrics
    }

    /// Next step to execute (equals the number of completed steps)
    pub fn current_step(&self) -> usize {
        self.current_step
    }
}

// ============================================================================
// Tests
// ============================================================================

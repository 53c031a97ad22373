//! Bid collection, ranking, and commit protocol.
//!
//! The coordinator is the only path between patients and hospitals: a
//! patient announces a demand, the coordinator polls every hospital for a
//! quote, ranks the bids, and commits the allocation on the winner. It is
//! stateless across negotiations: nothing carries over from one patient
//! to the next except the shared hospital registry and the message log.
//!
//! # Protocol per negotiation
//!
//! 1. **Collect**: `quote()` every hospital; drop rejections.
//! 2. **No-bid terminal**: empty bid set broadcasts `RESOURCE_UNAVAILABLE`
//!    and returns failure. No retry within the step.
//! 3. **Rank**: composite score per bid; stable sort descending, so equal
//!    ranks resolve by hospital registration order.
//! 4. **Commit**: `commit()` on the top bid, then report the outcome to
//!    the patient whether or not the commit held.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coordinator::rebalance::RebalanceConfig;
use crate::models::hospital::{AlwaysCompatible, CompatibilityPolicy, Hospital};
use crate::models::message::{Message, MessageLog};
use crate::models::patient::Severity;

/// Ranking weights for bid evaluation, shared across all negotiations.
///
/// `rank = severity_weight × severity_score + capacity_weight ×
/// capacity_score + efficiency_weight × bid_score`
///
/// The weights must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationStrategy {
    pub severity_weight: f64,
    pub capacity_weight: f64,
    pub efficiency_weight: f64,
}

impl Default for AllocationStrategy {
    fn default() -> Self {
        Self {
            severity_weight: 0.4,
            capacity_weight: 0.3,
            efficiency_weight: 0.3,
        }
    }
}

impl AllocationStrategy {
    /// Urgency factor per severity class
    pub fn severity_score(severity: Severity) -> f64 {
        match severity {
            Severity::Low => 0.2,
            Severity::Medium => 0.5,
            Severity::High => 1.0,
        }
    }

    /// Composite ranking score for one bid.
    ///
    /// `capacity_score` is the hospital's remaining balance as a fraction
    /// of its capacity, capped at 1.0 so an over-replenished hospital gets
    /// no extra ranking benefit.
    pub fn rank(&self, severity: Severity, hospital: &Hospital, bid_score: f64) -> f64 {
        let capacity_score =
            (hospital.current_balance() as f64 / hospital.initial_capacity() as f64).min(1.0);

        self.severity_weight * Self::severity_score(severity)
            + self.capacity_weight * capacity_score
            + self.efficiency_weight * bid_score
    }
}

/// A hospital's scored, non-binding offer for one patient's demand.
///
/// `hospital` is the index into the registry (registration order), valid
/// only for the duration of the negotiation that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bid {
    pub hospital: usize,
    pub score: f64,
}

/// Outcome of one negotiation.
///
/// `hospital_id` is the winning hospital when one was selected, even if
/// its commit then failed; `amount` is the committed amount (0 unless
/// `fulfilled`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    pub fulfilled: bool,
    pub hospital_id: Option<String>,
    pub amount: i64,
}

/// Central arbiter for allocation and rebalancing.
///
/// Owns the message log and the scoring configuration. Constructed and
/// owned by the environment; hospitals and patients reach it only through
/// explicit call parameters, never through shared global state.
pub struct Coordinator {
    strategy: AllocationStrategy,
    rebalance: RebalanceConfig,
    compatibility: Box<dyn CompatibilityPolicy>,
    log: MessageLog,
}

impl Coordinator {
    /// Create a coordinator with the default always-compatible policy
    pub fn new(strategy: AllocationStrategy, rebalance: RebalanceConfig) -> Self {
        Self {
            strategy,
            rebalance,
            compatibility: Box::new(AlwaysCompatible),
            log: MessageLog::new(),
        }
    }

    /// Replace the specialty compatibility policy
    pub fn with_compatibility(mut self, compatibility: Box<dyn CompatibilityPolicy>) -> Self {
        self.compatibility = compatibility;
        self
    }

    /// Get the ranking weights in effect
    pub fn strategy(&self) -> AllocationStrategy {
        self.strategy
    }

    /// Get the rebalancing parameters in effect
    pub fn rebalance_config(&self) -> RebalanceConfig {
        self.rebalance
    }

    /// Read access to the message log
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Append a message to the coordinator's log
    pub fn record(&mut self, message: Message) {
        self.log.append(message);
    }

    pub(crate) fn log_mut(&mut self) -> &mut MessageLog {
        &mut self.log
    }

    /// Run one negotiation for a patient's demand.
    ///
    /// Returns the commit outcome; failure is a normal result (no eligible
    /// hospital, or the winner's balance moved between quote and commit),
    /// never an error.
    pub fn negotiate(
        &mut self,
        patient_id: &str,
        severity: Severity,
        amount: i64,
        hospitals: &mut [Hospital],
        step: usize,
    ) -> AllocationOutcome {
        // Collect: poll every hospital, in registration order
        let mut bids: Vec<Bid> = Vec::new();
        for (index, hospital) in hospitals.iter().enumerate() {
            let quoted = hospital.quote(
                patient_id,
                severity,
                amount,
                self.compatibility.as_ref(),
                &mut self.log,
                step,
            );
            if let Some(score) = quoted {
                bids.push(Bid {
                    hospital: index,
                    score,
                });
            }
        }

        // No-bid terminal: nothing to rank, nothing to retry
        if bids.is_empty() {
            self.log.append(Message::resource_unavailable(step, patient_id));
            warn!(patient = patient_id, amount, "no hospitals available");
            return AllocationOutcome {
                fulfilled: false,
                hospital_id: None,
                amount: 0,
            };
        }

        // Rank: stable sort, so ties keep registration order
        let mut ranked: Vec<(Bid, f64)> = bids
            .iter()
            .map(|bid| {
                let rank = self
                    .strategy
                    .rank(severity, &hospitals[bid.hospital], bid.score);
                (*bid, rank)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        for (position, (bid, rank)) in ranked.iter().enumerate() {
            debug!(
                position = position + 1,
                hospital = hospitals[bid.hospital].id(),
                bid_score = bid.score,
                rank,
                "bid ranked"
            );
        }

        // Commit on the winner; its balance may have moved since the quote
        let (winner, _) = ranked[0];
        let winner_id = hospitals[winner.hospital].id().to_string();
        self.log.append(Message::resource_allocation(
            step,
            &winner_id,
            patient_id,
            amount,
            winner.score,
        ));

        let fulfilled = hospitals[winner.hospital].commit(patient_id, amount, &mut self.log, step);
        self.log
            .append(Message::allocation_result(step, patient_id, fulfilled, &winner_id));
        debug!(
            patient = patient_id,
            hospital = %winner_id,
            amount,
            fulfilled,
            "allocation decided"
        );

        AllocationOutcome {
            fulfilled,
            hospital_id: Some(winner_id),
            amount: if fulfilled { amount } else { 0 },
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("strategy", &self.strategy)
            .field("rebalance", &self.rebalance)
            .field("log_len", &self.log.len())
            .finish()
    }
}

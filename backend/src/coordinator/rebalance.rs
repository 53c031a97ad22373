//! Inter-hospital rebalancing pass.
//!
//! Once per step, after every patient has been processed, resource is moved
//! from hospitals running above capacity to hospitals running below it.
//! Transfers are exactly conservative: every unit debited from a source is
//! credited to a target, so the system total never changes.
//!
//! # Algorithm
//!
//! 1. Partition hospitals by the balance/capacity ratio: surplus above the
//!    surplus threshold (sorted descending by balance), deficit below the
//!    deficit threshold (sorted ascending by balance).
//! 2. For every (surplus, deficit) pair in that nested order, compute the
//!    transfer against the *live* balances and execute it if positive.
//!
//! A source can serve several targets in one pass; no running-total guard
//! exists beyond the shrinking balance itself feeding back into the
//! transfer formula. Targets only receive while below the restore level,
//! which sits well under the deficit threshold.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::hospital::Hospital;
use crate::models::message::{Message, MessageLog};

use super::negotiation::Coordinator;

// ============================================================================
// Configuration Types
// ============================================================================

/// Rebalancing thresholds and transfer fractions.
///
/// All ratios are multiples of a hospital's `initial_capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RebalanceConfig {
    /// Balance ratio above which a hospital is a transfer source
    pub surplus_threshold: f64,

    /// Balance ratio below which a hospital is a transfer target
    pub deficit_threshold: f64,

    /// Fraction of the source's live balance offered per pair
    pub transfer_fraction: f64,

    /// Target level a transfer may restore a deficit hospital up to
    pub restore_fraction: f64,

    /// Optional ceiling on a target's post-transfer balance, as a multiple
    /// of its capacity. `None` leaves transfers-in unbounded, so repeated
    /// passes can push a balance past the replenishment growth cap until
    /// the next replenish pulls it back.
    pub balance_cap: Option<f64>,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            surplus_threshold: 1.2,
            deficit_threshold: 0.8,
            transfer_fraction: 0.10,
            restore_fraction: 0.20,
            balance_cap: None,
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result of one rebalancing pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceResult {
    /// Hospitals above the surplus threshold at pass start
    pub surplus_count: usize,

    /// Hospitals below the deficit threshold at pass start
    pub deficit_count: usize,

    /// Transfers actually executed
    pub transfers_executed: usize,

    /// Total units moved
    pub transferred_value: i64,
}

impl RebalanceResult {
    fn empty(surplus_count: usize, deficit_count: usize) -> Self {
        Self {
            surplus_count,
            deficit_count,
            transfers_executed: 0,
            transferred_value: 0,
        }
    }
}

// ============================================================================
// Rebalancing Pass
// ============================================================================

/// Run one rebalancing pass over the hospital registry.
///
/// Partitioning happens once against the balances at pass start; transfer
/// amounts are recomputed against live balances pair-by-pair. Has no
/// failure mode: with no eligible pairs it is a no-op.
pub fn run_rebalance_pass(
    hospitals: &mut [Hospital],
    config: &RebalanceConfig,
    log: &mut MessageLog,
    step: usize,
) -> RebalanceResult {
    let mut surplus: Vec<usize> = (0..hospitals.len())
        .filter(|&i| {
            hospitals[i].current_balance() as f64
                > hospitals[i].initial_capacity() as f64 * config.surplus_threshold
        })
        .collect();
    surplus.sort_by(|&a, &b| {
        hospitals[b]
            .current_balance()
            .cmp(&hospitals[a].current_balance())
    });

    let mut deficit: Vec<usize> = (0..hospitals.len())
        .filter(|&i| {
            (hospitals[i].current_balance() as f64)
                < hospitals[i].initial_capacity() as f64 * config.deficit_threshold
        })
        .collect();
    deficit.sort_by(|&a, &b| {
        hospitals[a]
            .current_balance()
            .cmp(&hospitals[b].current_balance())
    });

    let mut result = RebalanceResult::empty(surplus.len(), deficit.len());

    for &source in &surplus {
        for &target in &deficit {
            let amount = transfer_amount(&hospitals[source], &hospitals[target], config);
            if amount <= 0 {
                continue;
            }

            if hospitals[source].debit(amount).is_err() {
                continue;
            }
            hospitals[target].credit(amount);

            let source_id = hospitals[source].id().to_string();
            let target_id = hospitals[target].id().to_string();
            log.append(Message::resource_transfer(step, &source_id, &target_id, amount));
            info!(source = %source_id, target = %target_id, amount, "resource transfer");

            result.transfers_executed += 1;
            result.transferred_value += amount;
        }
    }

    result
}

/// Transfer size for one (source, target) pair against live balances.
///
/// `min(transfer_fraction × source.balance,
///      restore_fraction × target.capacity - target.balance)`,
/// additionally clipped to the target's `balance_cap` headroom when one is
/// configured. Non-positive results mean no transfer: the target already
/// sits at or above its restore level.
fn transfer_amount(source: &Hospital, target: &Hospital, config: &RebalanceConfig) -> i64 {
    let offered = (source.current_balance() as f64 * config.transfer_fraction).round() as i64;
    let restore_level = (target.initial_capacity() as f64 * config.restore_fraction).round() as i64;
    let needed = restore_level - target.current_balance();

    let mut amount = offered.min(needed);
    if let Some(cap) = config.balance_cap {
        let ceiling = (target.initial_capacity() as f64 * cap).round() as i64;
        amount = amount.min(ceiling - target.current_balance());
    }
    amount
}

impl Coordinator {
    /// Run the rebalancing pass with this coordinator's configuration,
    /// recording transfers in its message log.
    pub fn rebalance(&mut self, hospitals: &mut [Hospital], step: usize) -> RebalanceResult {
        let config = self.rebalance_config();
        run_rebalance_pass(hospitals, &config, self.log_mut(), step)
    }
}

#![coverage(off)]

//! Selectivity estimation for analyzed comparisons.

use sloopsql_ir::{CompareOp, Expr, SlotId};

/// Fallback selectivity when no column statistics apply.
pub const DEFAULT_SELECTIVITY: f64 = 1.0 / 3.0;

/// Source of per-column statistics.
///
/// Absent statistics are reported as `None`, never as an error; estimation
/// falls back to the heuristic.
pub trait StatsProvider {
    fn distinct_count(&self, slot: SlotId) -> Option<u64>;
}

/// Provider for callers without statistics.
pub struct NoStats;

impl StatsProvider for NoStats {
    fn distinct_count(&self, _slot: SlotId) -> Option<u64> {
        None
    }
}

/// Estimate the fraction of rows an analyzed comparison retains.
///
/// Equality against exactly one column with a known distinct count `d`
/// estimates `1/d`, clamped to `[0, 1]`. Everything else takes the
/// default.
pub fn estimate(op: CompareOp, left: &Expr, right: &Expr, stats: &dyn StatsProvider) -> f64 {
    if !op.is_equivalence() {
        return DEFAULT_SELECTIVITY;
    }
    let mut slots = left.slots();
    slots.extend(right.slots());
    if slots.len() != 1 {
        return DEFAULT_SELECTIVITY;
    }
    let Some(slot) = slots.into_iter().next() else {
        return DEFAULT_SELECTIVITY;
    };
    match stats.distinct_count(slot) {
        Some(distinct) if distinct > 0 => (1.0 / distinct as f64).clamp(0.0, 1.0),
        _ => DEFAULT_SELECTIVITY,
    }
}

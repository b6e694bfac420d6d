//! Period-over-period revenue decomposition.
//!
//! For consecutive periods `p` and `c` (fees as decimal fractions):
//!
//! - fee-rate effect: `(fee_c - fee_p) * volume_p`
//! - volume effect: `fee_p * (volume_c - volume_p)`
//! - mix effect: `(avg_swap_c - avg_swap_p) * swaps_c * fee_c`, zero unless both
//!   `swaps_c > 0` and `avg_swap_p > 0`
//! - external effect: whatever the first three leave unexplained

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::{PeriodRecord, PeriodTable};

const BPS_PER_UNIT: f64 = 10_000.0;

/// Attribution of the revenue change between two consecutive periods.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecompositionResult {
    /// Identifier of the later period of the pair.
    pub period_id: i64,
    pub prev_period_id: i64,
    pub period_start_date: NaiveDate,

    pub total_revenue_change: f64,
    pub fee_rate_effect: f64,
    pub volume_effect: f64,
    pub mix_effect: f64,
    pub external_effect: f64,

    /// Shares of `total_revenue_change` in percent; all zero when it is zero.
    pub fee_rate_pct: f64,
    pub volume_pct: f64,
    pub mix_pct: f64,
    pub external_pct: f64,

    pub prev_revenue: f64,
    pub current_revenue: f64,
    pub prev_fee_bps: f64,
    pub current_fee_bps: f64,
    pub prev_volume: f64,
    pub current_volume: f64,
}

/// Decomposes the revenue change from `previous` to `current`.
pub fn decompose_transition(previous: &PeriodRecord, current: &PeriodRecord) -> DecompositionResult {
    let prev_fee = previous.fee_bps / BPS_PER_UNIT;
    let current_fee = current.fee_bps / BPS_PER_UNIT;

    let total_change = current.fees_usd - previous.fees_usd;
    let fee_rate_effect = (current_fee - prev_fee) * previous.volume_usd;
    let volume_effect = prev_fee * (current.volume_usd - previous.volume_usd);
    let mix_effect = if current.swaps_count > 0 && previous.avg_swap_size_usd > 0.0 {
        (current.avg_swap_size_usd - previous.avg_swap_size_usd)
            * current.swaps_count as f64
            * current_fee
    } else {
        0.0
    };
    let external_effect = total_change - (fee_rate_effect + volume_effect + mix_effect);

    let share = |effect: f64| {
        if total_change != 0.0 {
            effect / total_change * 100.0
        } else {
            0.0
        }
    };
    if total_change == 0.0 {
        debug!(
            "period {}: no revenue change, component shares reported as zero",
            current.period_id
        );
    }

    DecompositionResult {
        period_id: current.period_id,
        prev_period_id: previous.period_id,
        period_start_date: current.period_start_date,
        total_revenue_change: total_change,
        fee_rate_effect,
        volume_effect,
        mix_effect,
        external_effect,
        fee_rate_pct: share(fee_rate_effect),
        volume_pct: share(volume_effect),
        mix_pct: share(mix_effect),
        external_pct: share(external_effect),
        prev_revenue: previous.fees_usd,
        current_revenue: current.fees_usd,
        prev_fee_bps: previous.fee_bps,
        current_fee_bps: current.fee_bps,
        prev_volume: previous.volume_usd,
        current_volume: current.volume_usd,
    }
}

/// Decomposes every adjacent pair of periods after ordering by start date.
///
/// `n` periods yield `n - 1` results; fewer than two periods yield none.
pub fn decompose_revenue(table: &PeriodTable) -> Vec<DecompositionResult> {
    let ordered: Vec<PeriodRecord> = table
        .start_order()
        .into_iter()
        .map(|index| table.record(index))
        .collect();

    let results: Vec<DecompositionResult> = ordered
        .windows(2)
        .map(|pair| decompose_transition(&pair[0], &pair[1]))
        .collect();
    debug!(
        "decomposed {} transitions over {} periods",
        results.len(),
        table.len()
    );
    results
}

/// Bar of a revenue waterfall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaterfallComponent {
    PreviousRevenue,
    FeeRateEffect,
    VolumeEffect,
    MixEffect,
    ExternalEffect,
    CurrentRevenue,
}

impl WaterfallComponent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PreviousRevenue => "Previous Revenue",
            Self::FeeRateEffect => "Fee Rate Effect",
            Self::VolumeEffect => "Volume Effect",
            Self::MixEffect => "Mix Effect",
            Self::ExternalEffect => "External Effect",
            Self::CurrentRevenue => "Current Revenue",
        }
    }
}

/// One row of waterfall data for an external chart layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaterfallStep {
    pub period_id: i64,
    pub period_start_date: NaiveDate,
    pub component: WaterfallComponent,
    pub value: f64,
    /// Running revenue after this step.
    pub cumulative: f64,
    pub is_total: bool,
}

/// Lays out each transition as previous revenue, the four effects, then current revenue.
pub fn waterfall(results: &[DecompositionResult]) -> Vec<WaterfallStep> {
    let mut steps = Vec::with_capacity(results.len() * 6);

    for result in results {
        let mut push = |component, value, cumulative, is_total| {
            steps.push(WaterfallStep {
                period_id: result.period_id,
                period_start_date: result.period_start_date,
                component,
                value,
                cumulative,
                is_total,
            })
        };

        push(
            WaterfallComponent::PreviousRevenue,
            result.prev_revenue,
            result.prev_revenue,
            false,
        );
        let mut cumulative = result.prev_revenue;
        for (component, value) in [
            (WaterfallComponent::FeeRateEffect, result.fee_rate_effect),
            (WaterfallComponent::VolumeEffect, result.volume_effect),
            (WaterfallComponent::MixEffect, result.mix_effect),
            (WaterfallComponent::ExternalEffect, result.external_effect),
        ] {
            cumulative += value;
            push(component, value, cumulative, false);
        }
        push(
            WaterfallComponent::CurrentRevenue,
            result.current_revenue,
            result.current_revenue,
            true,
        );
    }

    steps
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn pair() -> (PeriodRecord, PeriodRecord) {
        let prev = PeriodRecord::new(1, day(15), day(21), 10.0, 1_000_000.0, 1_000.0)
            .with_swaps(1_000, 1_000.0);
        let current = PeriodRecord::new(2, day(22), day(28), 25.0, 800_000.0, 2_000.0)
            .with_swaps(900, 889.0);
        (prev, current)
    }

    #[test]
    fn effects_follow_their_definitions() {
        let (prev, current) = pair();
        let result = decompose_transition(&prev, &current);

        assert_eq!(result.period_id, 2);
        assert_eq!(result.prev_period_id, 1);
        assert_eq!(result.total_revenue_change, 1_000.0);
        assert_relative_eq!(result.fee_rate_effect, 1_500.0, epsilon = 1e-9);
        assert_relative_eq!(result.volume_effect, -200.0, epsilon = 1e-9);
        assert_relative_eq!(result.mix_effect, -111.0 * 900.0 * 0.0025, epsilon = 1e-9);

        let closure = result.fee_rate_effect
            + result.volume_effect
            + result.mix_effect
            + result.external_effect;
        assert_abs_diff_eq!(closure, result.total_revenue_change, epsilon = 1e-6);
        let pct = result.fee_rate_pct + result.volume_pct + result.mix_pct + result.external_pct;
        assert_abs_diff_eq!(pct, 100.0, epsilon = 0.1);
    }

    #[test]
    fn mix_effect_needs_swaps_and_previous_size() {
        let (prev, current) = pair();
        let no_prev_size = prev.clone().with_swaps(1_000, 0.0);
        assert_eq!(decompose_transition(&no_prev_size, &current).mix_effect, 0.0);
        let no_swaps = current.with_swaps(0, 889.0);
        assert_eq!(decompose_transition(&prev, &no_swaps).mix_effect, 0.0);
    }

    #[test]
    fn unchanged_revenue_reports_zero_shares() {
        let (prev, _) = pair();
        let mut same = prev.clone();
        same.period_id = 2;
        same.period_start_date = day(22);
        let result = decompose_transition(&prev, &same);

        assert_eq!(result.total_revenue_change, 0.0);
        assert_eq!(result.fee_rate_pct, 0.0);
        assert_eq!(result.volume_pct, 0.0);
        assert_eq!(result.mix_pct, 0.0);
        assert_eq!(result.external_pct, 0.0);
    }

    #[test]
    fn table_is_ordered_before_pairing() {
        let (prev, current) = pair();
        let later = PeriodRecord::new(3, day(29), day(31), 10.0, 950_000.0, 950.0)
            .with_swaps(950, 1_000.0);
        let table = PeriodTable::from_records(&[later, prev.clone(), current]).unwrap();

        let results = decompose_revenue(&table);
        let ids: Vec<i64> = results.iter().map(|r| r.period_id).collect();
        assert_eq!(ids, vec![2, 3]);

        let single = PeriodTable::from_records(&[prev]).unwrap();
        assert!(decompose_revenue(&single).is_empty());
    }

    #[test]
    fn waterfall_walks_from_previous_to_current_revenue() {
        let (prev, current) = pair();
        let steps = waterfall(&[decompose_transition(&prev, &current)]);

        assert_eq!(steps.len(), 6);
        assert_eq!(steps[0].component, WaterfallComponent::PreviousRevenue);
        assert_eq!(steps[5].component.label(), "Current Revenue");
        assert!(steps[5].is_total);
        assert!(steps[..5].iter().all(|s| !s.is_total));
        assert_abs_diff_eq!(steps[4].cumulative, steps[5].value, epsilon = 1e-6);
    }
}

//! Aggregation of decomposition results across all period transitions.

use serde::{Deserialize, Serialize};

use crate::decomposition::DecompositionResult;

/// Summary over every transition of a decomposition.
///
/// `overall_*_pct` divide each summed effect by the summed total change, while
/// `avg_*_pct` average the per-transition shares. The two differ whenever
/// transitions have different magnitudes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecompositionSummary {
    pub n_periods: usize,
    pub total_revenue_change: f64,
    pub total_fee_rate_effect: f64,
    pub total_volume_effect: f64,
    pub total_mix_effect: f64,
    pub total_external_effect: f64,
    pub overall_fee_rate_pct: f64,
    pub overall_volume_pct: f64,
    pub overall_mix_pct: f64,
    pub overall_external_pct: f64,
    pub avg_fee_rate_pct: f64,
    pub avg_volume_pct: f64,
    pub avg_mix_pct: f64,
    pub avg_external_pct: f64,
}

impl DecompositionSummary {
    /// Recognized keys, in the order returned by [`entries`](Self::entries).
    pub const KEYS: [&'static str; 14] = [
        "n_periods",
        "total_revenue_change",
        "total_fee_rate_effect",
        "total_volume_effect",
        "total_mix_effect",
        "total_external_effect",
        "overall_fee_rate_pct",
        "overall_volume_pct",
        "overall_mix_pct",
        "overall_external_pct",
        "avg_fee_rate_pct",
        "avg_volume_pct",
        "avg_mix_pct",
        "avg_external_pct",
    ];

    /// Looks up a value by its key; `None` for unrecognized keys.
    pub fn get(&self, key: &str) -> Option<f64> {
        let value = match key {
            "n_periods" => self.n_periods as f64,
            "total_revenue_change" => self.total_revenue_change,
            "total_fee_rate_effect" => self.total_fee_rate_effect,
            "total_volume_effect" => self.total_volume_effect,
            "total_mix_effect" => self.total_mix_effect,
            "total_external_effect" => self.total_external_effect,
            "overall_fee_rate_pct" => self.overall_fee_rate_pct,
            "overall_volume_pct" => self.overall_volume_pct,
            "overall_mix_pct" => self.overall_mix_pct,
            "overall_external_pct" => self.overall_external_pct,
            "avg_fee_rate_pct" => self.avg_fee_rate_pct,
            "avg_volume_pct" => self.avg_volume_pct,
            "avg_mix_pct" => self.avg_mix_pct,
            "avg_external_pct" => self.avg_external_pct,
            _ => return None,
        };
        Some(value)
    }

    /// All key/value pairs as a flat mapping.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        Self::KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }
}

/// Sums and averages the decomposition; `None` when there are no transitions.
pub fn summarize(results: &[DecompositionResult]) -> Option<DecompositionSummary> {
    if results.is_empty() {
        return None;
    }

    let sum = |f: fn(&DecompositionResult) -> f64| results.iter().map(f).sum::<f64>();
    let count = results.len() as f64;

    let total_revenue_change = sum(|r| r.total_revenue_change);
    let total_fee_rate_effect = sum(|r| r.fee_rate_effect);
    let total_volume_effect = sum(|r| r.volume_effect);
    let total_mix_effect = sum(|r| r.mix_effect);
    let total_external_effect = sum(|r| r.external_effect);

    let overall = |effect: f64| {
        if total_revenue_change != 0.0 {
            effect / total_revenue_change * 100.0
        } else {
            0.0
        }
    };

    Some(DecompositionSummary {
        n_periods: results.len(),
        total_revenue_change,
        total_fee_rate_effect,
        total_volume_effect,
        total_mix_effect,
        total_external_effect,
        overall_fee_rate_pct: overall(total_fee_rate_effect),
        overall_volume_pct: overall(total_volume_effect),
        overall_mix_pct: overall(total_mix_effect),
        overall_external_pct: overall(total_external_effect),
        avg_fee_rate_pct: sum(|r| r.fee_rate_pct) / count,
        avg_volume_pct: sum(|r| r.volume_pct) / count,
        avg_mix_pct: sum(|r| r.mix_pct) / count,
        avg_external_pct: sum(|r| r.external_pct) / count,
    })
}

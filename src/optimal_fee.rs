//! Revenue-maximizing fee under a constant-elasticity demand curve.
//!
//! With `V(f) = V0 (f / f0)^e`, revenue `f V(f)` has an interior maximum only for
//! elastic demand (`e < -1`), at `f* = f0 * (-1 / e)`. Otherwise revenue keeps rising
//! with the fee and the upper bound wins.

use log::debug;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::bootstrap::{percentile_bounds, BootstrapEstimate};
use crate::options::{FeeBounds, OptimalFeeCiOptions};

/// Revenue-optimal fee in basis points, or `None` when the inputs are not finite.
///
/// `current_volume` is the period volume at the operating point `current_fee_bps`.
pub fn optimal_fee_bps(
    current_volume: f64,
    current_fee_bps: f64,
    price_elasticity: f64,
    bounds: &FeeBounds,
) -> Option<f64> {
    if !price_elasticity.is_finite() || !current_fee_bps.is_finite() {
        return None;
    }

    if price_elasticity >= 0.0 {
        // Volume rises with the fee: no interior optimum.
        return Some(bounds.max_fee_bps);
    }

    // An elasticity of exactly -1 lands here as well. Revenue is flat in the fee at
    // that point, and whether it belongs to the interior branch is left open.
    if price_elasticity >= -1.0 {
        return Some(bounds.max_fee_bps);
    }

    let unconstrained = current_fee_bps * (-1.0 / price_elasticity);
    debug!(
        "elastic demand (e = {price_elasticity:.4}) at volume {current_volume:.2}: \
         unconstrained optimum {unconstrained:.4} bps"
    );
    Some(bounds.clamp(unconstrained))
}

/// Percentile interval around the optimal fee; both bounds absent when no draw succeeded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimalFeeInterval {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    /// Number of draws that produced an optimal fee.
    pub n_draws: usize,
}

/// Propagates elasticity uncertainty into the optimal fee.
///
/// Elasticities are drawn from a normal centred on the bootstrap mean PED with
/// standard deviation `(upper - lower) / 4` of the bootstrap interval; each draw is
/// re-solved and the percentiles of the resulting fees are reported.
pub fn optimal_fee_interval<R: Rng + ?Sized>(
    current_volume: f64,
    current_fee_bps: f64,
    bootstrap: &BootstrapEstimate,
    bounds: &FeeBounds,
    confidence_level: f64,
    options: &OptimalFeeCiOptions,
    rng: &mut R,
) -> OptimalFeeInterval {
    let spread = (bootstrap.ped_ci_upper - bootstrap.ped_ci_lower) / 4.0;

    let samples: Vec<f64> = match Normal::new(bootstrap.price_elasticity_demand, spread) {
        Ok(normal) => (0..options.n_draws)
            .filter_map(|_| {
                let elasticity = normal.sample(rng);
                optimal_fee_bps(current_volume, current_fee_bps, elasticity, bounds)
            })
            .collect(),
        Err(err) => {
            debug!("no optimal-fee draws: invalid normal approximation ({err})");
            Vec::new()
        }
    };

    if samples.is_empty() {
        return OptimalFeeInterval {
            lower: None,
            upper: None,
            n_draws: 0,
        };
    }

    let alpha = 1.0 - confidence_level;
    let (lower, upper) =
        percentile_bounds(&samples, (alpha / 2.0) * 100.0, (1.0 - alpha / 2.0) * 100.0);
    OptimalFeeInterval {
        lower: Some(lower),
        upper: Some(upper),
        n_draws: samples.len(),
    }
}

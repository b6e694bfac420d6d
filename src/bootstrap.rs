//! Percentile bootstrap for the simple-ratio elasticities.
//!
//! Each draw owns a [`SmallRng`] seeded from a sequence produced by a master generator,
//! so draws can run on the rayon pool and still reproduce bit-for-bit for a given seed.

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{Observations, PeriodTable};
use crate::elasticity::{simple_ratio, PointElasticity};
use crate::error::{FeeAnalysisError, Result};
use crate::options::BootstrapOptions;

/// Minimum complete rows before resampling is attempted.
pub const MIN_BOOTSTRAP_ROWS: usize = 3;

/// Bootstrap means and percentile bounds for both elasticities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BootstrapEstimate {
    /// Mean PED across successful draws (not the full-sample estimate).
    pub price_elasticity_demand: f64,
    pub ped_ci_lower: f64,
    pub ped_ci_upper: f64,
    /// Mean revenue elasticity across successful draws.
    pub revenue_elasticity: f64,
    pub revenue_elasticity_ci_lower: f64,
    pub revenue_elasticity_ci_upper: f64,
    /// Number of draws that produced an estimate.
    pub n_bootstrap_samples: usize,
}

/// Runs the bootstrap on every complete row of `table`, seeding from `options.seed`.
pub fn bootstrap_elasticity(
    table: &PeriodTable,
    options: &BootstrapOptions,
) -> Result<BootstrapEstimate> {
    let observations = table.complete_observations()?;
    let mut rng = SmallRng::seed_from_u64(options.seed);
    bootstrap_with_rng(&observations, options, &mut rng)
}

/// Runs the bootstrap with a caller-supplied master generator.
///
/// The generator only hands out one seed per draw; the draws themselves are
/// independent and their results are combined in draw order.
pub fn bootstrap_with_rng<R: Rng + ?Sized>(
    observations: &Observations,
    options: &BootstrapOptions,
    rng: &mut R,
) -> Result<BootstrapEstimate> {
    options.validate()?;

    let n = observations.len();
    if n < MIN_BOOTSTRAP_ROWS {
        return Err(FeeAnalysisError::insufficient(
            "bootstrap",
            MIN_BOOTSTRAP_ROWS,
            n,
        ));
    }

    let seeds: Vec<u64> = (0..options.n_bootstrap).map(|_| rng.gen()).collect();
    let outcomes: Vec<Result<PointElasticity>> = if options.parallel {
        seeds
            .par_iter()
            .map(|&seed| single_draw(observations, seed))
            .collect()
    } else {
        seeds
            .iter()
            .map(|&seed| single_draw(observations, seed))
            .collect()
    };

    let mut ped_samples = Vec::with_capacity(outcomes.len());
    let mut rev_samples = Vec::with_capacity(outcomes.len());
    let mut skipped = 0usize;
    for outcome in outcomes {
        match outcome {
            Ok(point) => {
                ped_samples.push(point.price_elasticity_demand);
                rev_samples.push(point.revenue_elasticity);
            }
            Err(err) if err.is_recoverable_draw() => skipped += 1,
            Err(err) => return Err(err),
        }
    }

    if skipped > 0 {
        warn!(
            "skipped {skipped} of {} bootstrap draws with undefined elasticity",
            options.n_bootstrap
        );
    }

    if ped_samples.len() < options.min_successful {
        return Err(FeeAnalysisError::InsufficientBootstrapSamples {
            successful: ped_samples.len(),
            required: options.min_successful,
        });
    }

    let (lower, upper) = options.percentiles();
    let (ped_ci_lower, ped_ci_upper) = percentile_bounds(&ped_samples, lower, upper);
    let (revenue_elasticity_ci_lower, revenue_elasticity_ci_upper) =
        percentile_bounds(&rev_samples, lower, upper);

    debug!(
        "bootstrap over {n} rows: {} successful draws, PED CI [{ped_ci_lower:.4}, {ped_ci_upper:.4}]",
        ped_samples.len()
    );

    Ok(BootstrapEstimate {
        price_elasticity_demand: mean(&ped_samples),
        ped_ci_lower,
        ped_ci_upper,
        revenue_elasticity: mean(&rev_samples),
        revenue_elasticity_ci_lower,
        revenue_elasticity_ci_upper,
        n_bootstrap_samples: ped_samples.len(),
    })
}

fn single_draw(observations: &Observations, seed: u64) -> Result<PointElasticity> {
    let n = observations.len();
    let mut rng = SmallRng::seed_from_u64(seed);
    let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
    simple_ratio(&observations.resample(&rows))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Lower and upper percentiles of `samples` (percentiles on a 0-100 scale).
pub fn percentile_bounds(samples: &[f64], lower: f64, upper: f64) -> (f64, f64) {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    (percentile(&sorted, lower), percentile(&sorted, upper))
}

/// Linearly interpolated percentile of an ascending slice; NaN for an empty one.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        len => {
            let position = (q / 100.0).clamp(0.0, 1.0) * (len - 1) as f64;
            let below = position.floor() as usize;
            let above = position.ceil() as usize;
            let weight = position - below as f64;
            sorted[below] + (sorted[above] - sorted[below]) * weight
        }
    }
}

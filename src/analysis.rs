//! High-level entry point tying the elasticity and decomposition paths together.

use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::bootstrap::bootstrap_elasticity;
use crate::data::PeriodTable;
use crate::decomposition::{decompose_revenue, DecompositionResult};
use crate::elasticity::{regression_elasticity, simple_elasticity, RegressionCoefficients};
use crate::error::{FeeAnalysisError, Result};
use crate::optimal_fee::{optimal_fee_bps, optimal_fee_interval};
use crate::options::{AnalysisOptions, EstimationMethod};
use crate::summary::{summarize, DecompositionSummary};

/// Offset separating the optimal-fee generator from the bootstrap seed sequence.
const FEE_CI_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// A pricing experiment over a fixed table of periods.
#[derive(Clone, Debug)]
pub struct FeeExperiment {
    periods: PeriodTable,
}

impl FeeExperiment {
    /// Wraps a period table; at least one period is required.
    pub fn new(periods: PeriodTable) -> Result<Self> {
        if periods.is_empty() {
            return Err(FeeAnalysisError::insufficient("fee experiment", 1, 0));
        }
        Ok(Self { periods })
    }

    /// Accessor for the underlying periods.
    pub fn periods(&self) -> &PeriodTable {
        &self.periods
    }

    /// Estimates elasticities, their bootstrap intervals and the revenue-optimal fee.
    pub fn analyze(&self, options: &AnalysisOptions) -> Result<ElasticityResult> {
        options.validate()?;

        let (point, r_squared, n_observations, regression_coefficients) = match &options.method {
            EstimationMethod::Regression { controls } => {
                let fit = regression_elasticity(&self.periods, controls.as_slice())?;
                (
                    fit.point,
                    fit.r_squared,
                    fit.n_observations,
                    Some(fit.coefficients),
                )
            }
            EstimationMethod::SimpleRatio => {
                let point = simple_elasticity(&self.periods)?;
                let n = self.periods.complete_observations()?.len();
                (point, 0.0, n, None)
            }
        };

        let bootstrap = bootstrap_elasticity(&self.periods, &options.bootstrap)?;

        let latest = self
            .periods
            .latest_index()
            .ok_or_else(|| FeeAnalysisError::insufficient("optimal fee", 1, 0))?;
        let current_fee = self.periods.fee_bps()[latest];
        let current_volume = self.periods.volume_usd()[latest];

        let optimal_fee = optimal_fee_bps(
            current_volume,
            current_fee,
            point.price_elasticity_demand,
            &options.bounds,
        );

        let mut rng = SmallRng::seed_from_u64(options.bootstrap.seed ^ FEE_CI_STREAM);
        let fee_interval = optimal_fee_interval(
            current_volume,
            current_fee,
            &bootstrap,
            &options.bounds,
            options.bootstrap.confidence_level,
            &options.fee_ci,
            &mut rng,
        );

        let (mean_fee_change_pct, mean_volume_change_pct, mean_revenue_change_pct) =
            self.periods.mean_pct_changes();

        debug!(
            "elasticity analysis: PED {:.4}, revenue elasticity {:.4}, optimal fee {:?} bps",
            point.price_elasticity_demand, point.revenue_elasticity, optimal_fee
        );

        Ok(ElasticityResult {
            price_elasticity_demand: point.price_elasticity_demand,
            revenue_elasticity: point.revenue_elasticity,
            optimal_fee_bps: optimal_fee,
            ped_ci_lower: bootstrap.ped_ci_lower,
            ped_ci_upper: bootstrap.ped_ci_upper,
            revenue_elasticity_ci_lower: bootstrap.revenue_elasticity_ci_lower,
            revenue_elasticity_ci_upper: bootstrap.revenue_elasticity_ci_upper,
            optimal_fee_ci_lower: fee_interval.lower,
            optimal_fee_ci_upper: fee_interval.upper,
            bootstrap_ped_mean: bootstrap.price_elasticity_demand,
            bootstrap_revenue_elasticity_mean: bootstrap.revenue_elasticity,
            n_bootstrap_samples: bootstrap.n_bootstrap_samples,
            r_squared,
            n_observations,
            regression_coefficients,
            mean_volume_change_pct,
            mean_fee_change_pct,
            mean_revenue_change_pct,
        })
    }

    /// Decomposes the revenue change of every transition in start-date order.
    pub fn decompose(&self) -> Vec<DecompositionResult> {
        decompose_revenue(&self.periods)
    }

    /// Decomposes and summarizes in one step; `None` with fewer than two periods.
    pub fn decomposition_summary(&self) -> Option<DecompositionSummary> {
        summarize(&self.decompose())
    }
}

/// Result of [`FeeExperiment::analyze`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElasticityResult {
    /// PED from the configured estimation method.
    pub price_elasticity_demand: f64,
    pub revenue_elasticity: f64,
    /// Revenue-optimal fee at the most recent period's operating point.
    pub optimal_fee_bps: Option<f64>,

    pub ped_ci_lower: f64,
    pub ped_ci_upper: f64,
    pub revenue_elasticity_ci_lower: f64,
    pub revenue_elasticity_ci_upper: f64,
    pub optimal_fee_ci_lower: Option<f64>,
    pub optimal_fee_ci_upper: Option<f64>,
    /// Mean PED across bootstrap draws; may differ from the point estimate.
    pub bootstrap_ped_mean: f64,
    pub bootstrap_revenue_elasticity_mean: f64,
    pub n_bootstrap_samples: usize,

    /// R² of the volume regression; 0 for the simple-ratio method.
    pub r_squared: f64,
    pub n_observations: usize,
    /// Present only for the regression method.
    pub regression_coefficients: Option<RegressionCoefficients>,

    pub mean_volume_change_pct: Option<f64>,
    pub mean_fee_change_pct: Option<f64>,
    pub mean_revenue_change_pct: Option<f64>,
}

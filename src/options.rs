//! Configuration structures for elasticity analysis, bootstrap resampling and the
//! optimal-fee search.

use serde::{Deserialize, Serialize};

use crate::error::{FeeAnalysisError, Result};

/// Seed used when callers do not supply one.
pub const DEFAULT_SEED: u64 = 42;

/// Strategy used for the elasticity point estimates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EstimationMethod {
    /// Ratio of mean percentage changes.
    SimpleRatio,
    /// Least-squares regression of the percentage changes on the fee change plus
    /// the named control columns.
    Regression { controls: Vec<String> },
}

impl Default for EstimationMethod {
    fn default() -> Self {
        Self::Regression {
            controls: Vec::new(),
        }
    }
}

/// Controls the resampling loop behind the elasticity confidence intervals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BootstrapOptions {
    /// Number of resamples drawn.
    pub n_bootstrap: usize,
    /// Two-sided confidence level of the reported interval.
    pub confidence_level: f64,
    /// Seed of the master generator that hands out per-draw streams.
    pub seed: u64,
    /// Minimum number of usable draws before the interval is trusted.
    pub min_successful: usize,
    /// Spread the draws over the rayon thread pool.
    pub parallel: bool,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            n_bootstrap: 1_000,
            confidence_level: 0.95,
            seed: DEFAULT_SEED,
            min_successful: 100,
            parallel: true,
        }
    }
}

impl BootstrapOptions {
    pub fn with_draws(mut self, n_bootstrap: usize) -> Self {
        self.n_bootstrap = n_bootstrap;
        self
    }

    pub fn with_confidence_level(mut self, confidence_level: f64) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Lower and upper percentiles (0-100) implied by the confidence level.
    pub fn percentiles(&self) -> (f64, f64) {
        let alpha = 1.0 - self.confidence_level;
        ((alpha / 2.0) * 100.0, (1.0 - alpha / 2.0) * 100.0)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(FeeAnalysisError::InvalidOption {
                option: "confidence_level",
                value: self.confidence_level,
            });
        }
        if self.n_bootstrap == 0 {
            return Err(FeeAnalysisError::InvalidOption {
                option: "n_bootstrap",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Admissible fee range for the optimal-fee search, in basis points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeeBounds {
    pub min_fee_bps: f64,
    pub max_fee_bps: f64,
}

impl Default for FeeBounds {
    fn default() -> Self {
        Self {
            min_fee_bps: 1.0,
            max_fee_bps: 50.0,
        }
    }
}

impl FeeBounds {
    pub fn new(min_fee_bps: f64, max_fee_bps: f64) -> Result<Self> {
        let bounds = Self {
            min_fee_bps,
            max_fee_bps,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_fee_bps <= self.max_fee_bps) {
            return Err(FeeAnalysisError::InvalidOption {
                option: "min_fee_bps",
                value: self.min_fee_bps,
            });
        }
        Ok(())
    }

    /// Clamps `fee_bps` into the admissible range.
    pub fn clamp(&self, fee_bps: f64) -> f64 {
        fee_bps.min(self.max_fee_bps).max(self.min_fee_bps)
    }
}

/// Controls the normal-approximation interval around the optimal fee.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimalFeeCiOptions {
    /// Number of elasticity draws re-solved for the optimal fee.
    pub n_draws: usize,
}

impl Default for OptimalFeeCiOptions {
    fn default() -> Self {
        Self { n_draws: 100 }
    }
}

/// Aggregated configuration for a full elasticity analysis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub method: EstimationMethod,
    pub bootstrap: BootstrapOptions,
    pub bounds: FeeBounds,
    pub fee_ci: OptimalFeeCiOptions,
}

impl AnalysisOptions {
    /// Switch to the ratio-of-means estimator.
    pub fn simple_ratio(mut self) -> Self {
        self.method = EstimationMethod::SimpleRatio;
        self
    }

    /// Use regression with the given control columns.
    pub fn with_controls<I, S>(mut self, controls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.method = EstimationMethod::Regression {
            controls: controls.into_iter().map(Into::into).collect(),
        };
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: BootstrapOptions) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_bounds(mut self, bounds: FeeBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set the number of draws used for the optimal-fee interval.
    pub fn with_fee_ci_draws(mut self, n_draws: usize) -> Self {
        self.fee_ci.n_draws = n_draws;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.bootstrap.validate()?;
        self.bounds.validate()
    }
}

//! Price and revenue elasticity estimators.
//!
//! Two interchangeable strategies are provided. [`simple_elasticity`] divides the mean
//! percentage change in volume (or revenue) by the mean percentage change in fee.
//! [`regression_elasticity`] regresses the same percentage changes on the fee change
//! plus optional controls and reads the elasticities off the fee coefficient.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::{Observations, PeriodTable};
use crate::error::{FeeAnalysisError, Result};
use crate::regression::{design_matrix, fit_ols};

/// Minimum complete rows accepted by the regression path.
pub const MIN_REGRESSION_ROWS: usize = 3;

/// Point elasticities produced by either estimator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointElasticity {
    pub price_elasticity_demand: f64,
    pub revenue_elasticity: f64,
}

/// Fitted coefficients of the volume equation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionCoefficients {
    pub intercept: f64,
    /// Coefficient on the fee change, i.e. the price elasticity of demand.
    pub fee: f64,
    /// Coefficients on each control, in the order requested.
    pub controls: Vec<(String, f64)>,
}

/// Output of [`regression_elasticity`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionElasticity {
    pub point: PointElasticity,
    /// R² of the volume equation.
    pub r_squared: f64,
    pub n_observations: usize,
    pub coefficients: RegressionCoefficients,
}

/// Ratio-of-means elasticity on every complete row of `table`.
pub fn simple_elasticity(table: &PeriodTable) -> Result<PointElasticity> {
    let observations = table.complete_observations()?;
    simple_ratio(&observations)
}

/// Ratio-of-means elasticity on prepared observations.
pub fn simple_ratio(observations: &Observations) -> Result<PointElasticity> {
    if observations.is_empty() {
        return Err(FeeAnalysisError::insufficient("simple-ratio elasticity", 1, 0));
    }

    let mean_fee_change = observations.fee_change().mean();
    if mean_fee_change == 0.0 {
        return Err(FeeAnalysisError::DegenerateInput {
            context: "simple-ratio elasticity",
        });
    }

    Ok(PointElasticity {
        price_elasticity_demand: observations.volume_change().mean() / mean_fee_change,
        revenue_elasticity: observations.revenue_change().mean() / mean_fee_change,
    })
}

/// Regression elasticity with the named control columns.
pub fn regression_elasticity<S: AsRef<str>>(
    table: &PeriodTable,
    controls: &[S],
) -> Result<RegressionElasticity> {
    let observations = table.observations(controls)?;
    regress(&observations)
}

/// Regression elasticity on prepared observations.
pub fn regress(observations: &Observations) -> Result<RegressionElasticity> {
    let parameters = observations.controls().ncols() + 2;
    // Strictly more rows than fitted parameters.
    let required = (parameters + 1).max(MIN_REGRESSION_ROWS);
    if observations.len() < required {
        return Err(FeeAnalysisError::insufficient(
            "regression elasticity",
            required,
            observations.len(),
        ));
    }

    let design = design_matrix(observations.fee_change(), observations.controls())?;
    let volume_fit = fit_ols(&design, observations.volume_change())?;
    let revenue_fit = fit_ols(&design, observations.revenue_change())?;

    let beta = &volume_fit.coefficients;
    let coefficients = RegressionCoefficients {
        intercept: beta[0],
        fee: beta[1],
        controls: observations
            .control_names()
            .iter()
            .cloned()
            .zip(beta.iter().skip(2).copied())
            .collect(),
    };

    debug!(
        "regression elasticity on {} rows with {} controls: r2 = {:.4}",
        volume_fit.observations,
        observations.control_names().len(),
        volume_fit.r_squared
    );

    Ok(RegressionElasticity {
        point: PointElasticity {
            price_elasticity_demand: beta[1],
            revenue_elasticity: revenue_fit.coefficients[1],
        },
        r_squared: volume_fit.r_squared,
        n_observations: volume_fit.observations,
        coefficients,
    })
}

use thiserror::Error;

/// Unified error type for `swapfee` operations.
#[derive(Debug, Error)]
pub enum FeeAnalysisError {
    /// Raised when too few complete rows remain for the requested method.
    #[error("insufficient data for {method}: need at least {required} complete rows, found {found}")]
    InsufficientData {
        /// Estimation routine that rejected the input.
        method: &'static str,
        /// Minimum number of complete rows the routine needs.
        required: usize,
        /// Number of complete rows actually available.
        found: usize,
    },

    /// Raised when the mean fee change is exactly zero, leaving elasticity undefined.
    #[error("degenerate input in {context}: mean fee change is zero")]
    DegenerateInput {
        /// Estimation routine that met the zero denominator.
        context: &'static str,
    },

    /// Raised when the regression design matrix is rank-deficient.
    #[error("design matrix in {context} is rank-deficient")]
    SingularSystem {
        /// Operation that attempted the solve.
        context: &'static str,
    },

    /// Raised when the bootstrap loop produced too few usable draws.
    #[error("only {successful} successful bootstrap samples, at least {required} required")]
    InsufficientBootstrapSamples {
        /// Draws that produced an estimate.
        successful: usize,
        /// Minimum number of successful draws.
        required: usize,
    },

    /// Raised when provided columns or matrices have incompatible dimensions.
    #[error("dimension mismatch in {context}: expected {expected} but found {found}")]
    DimensionMismatch {
        /// Human-readable context describing the operation.
        context: &'static str,
        /// The required dimension.
        expected: usize,
        /// The dimension that was actually supplied.
        found: usize,
    },

    /// Raised when a requested column is not present in the period table.
    #[error("column `{column}` is not present in the period table")]
    MissingColumn { column: String },

    /// Raised when two rows share a period identifier.
    #[error("period id {period_id} appears more than once")]
    DuplicatePeriod { period_id: i64 },

    /// Raised when an option value is outside its valid domain.
    #[error("invalid value {value} for option `{option}`")]
    InvalidOption {
        /// Name of the offending option.
        option: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Raised when numerical routines produce NaN.
    #[error("encountered NaN during {context}")]
    NumericalError { context: &'static str },
}

impl FeeAnalysisError {
    /// Helper to format an [`InsufficientData`](FeeAnalysisError::InsufficientData) error.
    pub fn insufficient(method: &'static str, required: usize, found: usize) -> Self {
        Self::InsufficientData {
            method,
            required,
            found,
        }
    }

    /// Helper to format a [`DimensionMismatch`](FeeAnalysisError::DimensionMismatch) error.
    pub fn dimension_mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }

    /// Helper to raise when a least-squares solve meets a rank-deficient system.
    pub fn singular(context: &'static str) -> Self {
        Self::SingularSystem { context }
    }

    /// Helper to format a [`MissingColumn`](FeeAnalysisError::MissingColumn) error.
    pub fn missing_column<S: Into<String>>(column: S) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Whether a failure on a single resample may be skipped by the bootstrap loop.
    pub fn is_recoverable_draw(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData { .. } | Self::DegenerateInput { .. }
        )
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, FeeAnalysisError>;

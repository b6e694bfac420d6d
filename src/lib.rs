//! Fee elasticity estimation and revenue decomposition for periodized swap-fee experiments.
//!
//! A pricing experiment changes the swap fee from one period to the next. Given one
//! row per period, this crate offers tools to
//!
//! - hold the period table in row or columnar form (`data` module),
//! - estimate price and revenue elasticities by ratio of means or least squares
//!   (`elasticity` and `regression` modules),
//! - attach percentile bootstrap intervals (`bootstrap` module),
//! - derive the revenue-optimal fee and its interval (`optimal_fee` module), and
//! - split each period's revenue change into fee-rate, volume, mix and external
//!   effects and aggregate them (`decomposition` and `summary` modules).
//!
//! Everything runs in memory on a table the caller has already materialized. Results
//! are plain serializable structs; storage and rendering are left to the caller.
//!
//! # Quick start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use swapfee::data::{PeriodRecord, PeriodTable};
//! use swapfee::{AnalysisOptions, FeeExperiment};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2025, 8, d).unwrap();
//! let p1 = PeriodRecord::new(1, day(1), day(7), 10.0, 1_000_000.0, 1_000.0)
//!     .with_swaps(1_000, 1_000.0);
//! let p2 = PeriodRecord::new(2, day(8), day(14), 25.0, 800_000.0, 2_000.0)
//!     .with_swaps(900, 889.0)
//!     .with_previous(&p1);
//! let p3 = PeriodRecord::new(3, day(15), day(21), 10.0, 950_000.0, 950.0)
//!     .with_swaps(950, 1_000.0)
//!     .with_previous(&p2);
//! let p4 = PeriodRecord::new(4, day(22), day(28), 15.0, 900_000.0, 1_350.0)
//!     .with_swaps(900, 1_000.0)
//!     .with_previous(&p3);
//!
//! let table = PeriodTable::from_records(&[p1, p2, p3, p4]).expect("validated periods");
//! let experiment = FeeExperiment::new(table).expect("non-empty experiment");
//!
//! let elasticity = experiment
//!     .analyze(&AnalysisOptions::default())
//!     .expect("enough periods");
//! println!("PED: {:.3}", elasticity.price_elasticity_demand);
//!
//! if let Some(summary) = experiment.decomposition_summary() {
//!     println!("fee-rate share: {:.1}%", summary.overall_fee_rate_pct);
//! }
//! ```

pub mod analysis;
pub mod bootstrap;
pub mod data;
pub mod decomposition;
pub mod elasticity;
pub mod error;
pub mod optimal_fee;
pub mod options;
pub mod regression;
pub mod summary;

pub use analysis::{ElasticityResult, FeeExperiment};
pub use bootstrap::BootstrapEstimate;
pub use decomposition::DecompositionResult;
pub use error::{FeeAnalysisError, Result};
pub use options::{AnalysisOptions, BootstrapOptions, EstimationMethod, FeeBounds};
pub use summary::DecompositionSummary;

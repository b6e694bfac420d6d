//! Period-level data containers and the complete-case views used by the estimators.
//!
//! A pricing experiment is described by one row per period. Rows may be supplied
//! either as [`PeriodRecord`]s or column by column through [`PeriodTableBuilder`];
//! both end up in the same columnar [`PeriodTable`], so every routine in the crate
//! accepts either representation.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{FeeAnalysisError, Result};

/// One pricing period as delivered by the warehouse layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub period_id: i64,
    pub period_start_date: NaiveDate,
    pub period_end_date: NaiveDate,
    /// Fee rate in force during the period, in basis points.
    pub fee_bps: f64,
    pub prev_fee_bps: Option<f64>,
    pub volume_usd: f64,
    pub prev_volume_usd: Option<f64>,
    /// Realized fee revenue.
    pub fees_usd: f64,
    pub prev_fees_usd: Option<f64>,
    pub swaps_count: u64,
    pub avg_swap_size_usd: f64,
    pub prev_avg_swap_size_usd: Option<f64>,
    pub pct_change_fee_bps: Option<f64>,
    pub pct_change_volume: Option<f64>,
    pub pct_change_fees: Option<f64>,
    /// Named control regressors; an absent key is a missing value.
    #[serde(default)]
    pub controls: BTreeMap<String, f64>,
}

impl PeriodRecord {
    /// Creates a record carrying only the current-period measurements.
    pub fn new(
        period_id: i64,
        period_start_date: NaiveDate,
        period_end_date: NaiveDate,
        fee_bps: f64,
        volume_usd: f64,
        fees_usd: f64,
    ) -> Self {
        Self {
            period_id,
            period_start_date,
            period_end_date,
            fee_bps,
            prev_fee_bps: None,
            volume_usd,
            prev_volume_usd: None,
            fees_usd,
            prev_fees_usd: None,
            swaps_count: 0,
            avg_swap_size_usd: 0.0,
            prev_avg_swap_size_usd: None,
            pct_change_fee_bps: None,
            pct_change_volume: None,
            pct_change_fees: None,
            controls: BTreeMap::new(),
        }
    }

    /// Sets the swap count and average swap size.
    pub fn with_swaps(mut self, swaps_count: u64, avg_swap_size_usd: f64) -> Self {
        self.swaps_count = swaps_count;
        self.avg_swap_size_usd = avg_swap_size_usd;
        self
    }

    /// Sets precomputed percentage changes for fee, volume and revenue.
    pub fn with_pct_changes(mut self, fee: f64, volume: f64, fees: f64) -> Self {
        self.pct_change_fee_bps = Some(fee);
        self.pct_change_volume = Some(volume);
        self.pct_change_fees = Some(fees);
        self
    }

    /// Attaches a named control value.
    pub fn with_control<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.controls.insert(name.into(), value);
        self
    }

    /// Links this record to the immediately preceding period, filling the `prev_*`
    /// fields and deriving the percentage changes.
    pub fn with_previous(mut self, previous: &PeriodRecord) -> Self {
        self.prev_fee_bps = Some(previous.fee_bps);
        self.prev_volume_usd = Some(previous.volume_usd);
        self.prev_fees_usd = Some(previous.fees_usd);
        self.prev_avg_swap_size_usd = Some(previous.avg_swap_size_usd);
        self.pct_change_fee_bps = pct_change(previous.fee_bps, self.fee_bps);
        self.pct_change_volume = pct_change(previous.volume_usd, self.volume_usd);
        self.pct_change_fees = pct_change(previous.fees_usd, self.fees_usd);
        self
    }
}

/// Percentage change from `previous` to `current`; undefined for a zero base.
pub fn pct_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous * 100.0)
    }
}

/// Columnar period table shared by the elasticity and decomposition paths.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodTable {
    period_ids: Vec<i64>,
    start_dates: Vec<NaiveDate>,
    end_dates: Vec<NaiveDate>,
    fee_bps: Vec<f64>,
    prev_fee_bps: Vec<Option<f64>>,
    volume_usd: Vec<f64>,
    prev_volume_usd: Vec<Option<f64>>,
    fees_usd: Vec<f64>,
    prev_fees_usd: Vec<Option<f64>>,
    swaps_count: Vec<u64>,
    avg_swap_size_usd: Vec<f64>,
    prev_avg_swap_size_usd: Vec<Option<f64>>,
    pct_change_fee_bps: Vec<Option<f64>>,
    pct_change_volume: Vec<Option<f64>>,
    pct_change_fees: Vec<Option<f64>>,
    controls: BTreeMap<String, Vec<Option<f64>>>,
}

impl PeriodTable {
    /// Converts row-oriented records into a validated columnar table.
    pub fn from_records(records: &[PeriodRecord]) -> Result<Self> {
        let n = records.len();
        let mut control_names: Vec<&String> =
            records.iter().flat_map(|r| r.controls.keys()).collect();
        control_names.sort();
        control_names.dedup();

        let mut builder = PeriodTableBuilder::new(
            records.iter().map(|r| r.period_id).collect(),
            records.iter().map(|r| r.period_start_date).collect(),
        )
        .end_dates(records.iter().map(|r| r.period_end_date).collect())
        .fee_bps(records.iter().map(|r| r.fee_bps).collect())
        .prev_fee_bps(records.iter().map(|r| r.prev_fee_bps).collect())
        .volume_usd(records.iter().map(|r| r.volume_usd).collect())
        .prev_volume_usd(records.iter().map(|r| r.prev_volume_usd).collect())
        .fees_usd(records.iter().map(|r| r.fees_usd).collect())
        .prev_fees_usd(records.iter().map(|r| r.prev_fees_usd).collect())
        .swaps_count(records.iter().map(|r| r.swaps_count).collect())
        .avg_swap_size_usd(records.iter().map(|r| r.avg_swap_size_usd).collect())
        .prev_avg_swap_size_usd(records.iter().map(|r| r.prev_avg_swap_size_usd).collect())
        .pct_changes(
            records.iter().map(|r| r.pct_change_fee_bps).collect(),
            records.iter().map(|r| r.pct_change_volume).collect(),
            records.iter().map(|r| r.pct_change_fees).collect(),
        );

        for name in control_names {
            let mut column = Vec::with_capacity(n);
            column.extend(records.iter().map(|r| r.controls.get(name).copied()));
            builder = builder.control(name.clone(), column);
        }

        builder.build()
    }

    /// Number of periods in the table.
    pub fn len(&self) -> usize {
        self.period_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.period_ids.is_empty()
    }

    pub fn period_ids(&self) -> &[i64] {
        &self.period_ids
    }

    pub fn start_dates(&self) -> &[NaiveDate] {
        &self.start_dates
    }

    pub fn fee_bps(&self) -> &[f64] {
        &self.fee_bps
    }

    pub fn volume_usd(&self) -> &[f64] {
        &self.volume_usd
    }

    pub fn fees_usd(&self) -> &[f64] {
        &self.fees_usd
    }

    /// Names of the control columns carried by the table.
    pub fn control_names(&self) -> impl Iterator<Item = &str> {
        self.controls.keys().map(String::as_str)
    }

    /// Returns a control column by name.
    pub fn control(&self, name: &str) -> Option<&[Option<f64>]> {
        self.controls.get(name).map(Vec::as_slice)
    }

    /// Materializes row `index` as a [`PeriodRecord`].
    pub fn record(&self, index: usize) -> PeriodRecord {
        let controls = self
            .controls
            .iter()
            .filter_map(|(name, column)| column[index].map(|value| (name.clone(), value)))
            .collect();

        PeriodRecord {
            period_id: self.period_ids[index],
            period_start_date: self.start_dates[index],
            period_end_date: self.end_dates[index],
            fee_bps: self.fee_bps[index],
            prev_fee_bps: self.prev_fee_bps[index],
            volume_usd: self.volume_usd[index],
            prev_volume_usd: self.prev_volume_usd[index],
            fees_usd: self.fees_usd[index],
            prev_fees_usd: self.prev_fees_usd[index],
            swaps_count: self.swaps_count[index],
            avg_swap_size_usd: self.avg_swap_size_usd[index],
            prev_avg_swap_size_usd: self.prev_avg_swap_size_usd[index],
            pct_change_fee_bps: self.pct_change_fee_bps[index],
            pct_change_volume: self.pct_change_volume[index],
            pct_change_fees: self.pct_change_fees[index],
            controls,
        }
    }

    /// Row-oriented view of the table.
    pub fn records(&self) -> Vec<PeriodRecord> {
        (0..self.len()).map(|index| self.record(index)).collect()
    }

    /// Row indices in ascending `period_start_date` order (stable for ties).
    pub fn start_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&index| self.start_dates[index]);
        order
    }

    /// Index of the most recent period, if any.
    pub fn latest_index(&self) -> Option<usize> {
        self.start_order().last().copied()
    }

    /// Mean of each percentage-change column over its non-missing values, in the order
    /// fee, volume, revenue.
    pub fn mean_pct_changes(&self) -> (Option<f64>, Option<f64>, Option<f64>) {
        (
            mean_present(&self.pct_change_fee_bps),
            mean_present(&self.pct_change_volume),
            mean_present(&self.pct_change_fees),
        )
    }

    /// Complete-case view over the three percentage-change columns alone.
    pub fn complete_observations(&self) -> Result<Observations> {
        self.observations::<&str>(&[])
    }

    /// Builds the complete-case view over the percentage-change columns plus the
    /// requested controls. Non-finite values count as missing.
    pub fn observations<S: AsRef<str>>(&self, control_names: &[S]) -> Result<Observations> {
        let mut control_columns = Vec::with_capacity(control_names.len());
        for name in control_names {
            let column = self
                .controls
                .get(name.as_ref())
                .ok_or_else(|| FeeAnalysisError::missing_column(name.as_ref()))?;
            control_columns.push(column);
        }

        let complete: Vec<usize> = (0..self.len())
            .filter(|&row| {
                is_present(self.pct_change_fee_bps[row])
                    && is_present(self.pct_change_volume[row])
                    && is_present(self.pct_change_fees[row])
                    && control_columns.iter().all(|column| is_present(column[row]))
            })
            .collect();

        let n = complete.len();
        let pick = |column: &[Option<f64>]| {
            DVector::from_iterator(n, complete.iter().map(|&row| column[row].unwrap_or(f64::NAN)))
        };

        let controls = DMatrix::from_fn(n, control_columns.len(), |i, j| {
            control_columns[j][complete[i]].unwrap_or(f64::NAN)
        });

        Ok(Observations {
            fee_change: pick(&self.pct_change_fee_bps[..]),
            volume_change: pick(&self.pct_change_volume[..]),
            revenue_change: pick(&self.pct_change_fees[..]),
            controls,
            control_names: control_names
                .iter()
                .map(|name| name.as_ref().to_string())
                .collect(),
        })
    }
}

impl TryFrom<Vec<PeriodRecord>> for PeriodTable {
    type Error = FeeAnalysisError;

    fn try_from(records: Vec<PeriodRecord>) -> Result<Self> {
        Self::from_records(&records)
    }
}

fn is_present(value: Option<f64>) -> bool {
    matches!(value, Some(x) if x.is_finite())
}

fn mean_present(column: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = column
        .iter()
        .copied()
        .filter(|&value| is_present(value))
        .flatten()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Builder that validates column lengths and period uniqueness before constructing
/// a [`PeriodTable`].
#[derive(Debug)]
pub struct PeriodTableBuilder {
    period_ids: Vec<i64>,
    start_dates: Vec<NaiveDate>,
    end_dates: Option<Vec<NaiveDate>>,
    fee_bps: Option<Vec<f64>>,
    prev_fee_bps: Option<Vec<Option<f64>>>,
    volume_usd: Option<Vec<f64>>,
    prev_volume_usd: Option<Vec<Option<f64>>>,
    fees_usd: Option<Vec<f64>>,
    prev_fees_usd: Option<Vec<Option<f64>>>,
    swaps_count: Option<Vec<u64>>,
    avg_swap_size_usd: Option<Vec<f64>>,
    prev_avg_swap_size_usd: Option<Vec<Option<f64>>>,
    pct_change_fee_bps: Option<Vec<Option<f64>>>,
    pct_change_volume: Option<Vec<Option<f64>>>,
    pct_change_fees: Option<Vec<Option<f64>>>,
    controls: BTreeMap<String, Vec<Option<f64>>>,
}

impl PeriodTableBuilder {
    /// Start building a table from period identifiers and their start dates.
    pub fn new(period_ids: Vec<i64>, start_dates: Vec<NaiveDate>) -> Self {
        Self {
            period_ids,
            start_dates,
            end_dates: None,
            fee_bps: None,
            prev_fee_bps: None,
            volume_usd: None,
            prev_volume_usd: None,
            fees_usd: None,
            prev_fees_usd: None,
            swaps_count: None,
            avg_swap_size_usd: None,
            prev_avg_swap_size_usd: None,
            pct_change_fee_bps: None,
            pct_change_volume: None,
            pct_change_fees: None,
            controls: BTreeMap::new(),
        }
    }

    /// Sets the period end dates; defaults to the start dates.
    pub fn end_dates(mut self, column: Vec<NaiveDate>) -> Self {
        self.end_dates = Some(column);
        self
    }

    pub fn fee_bps(mut self, column: Vec<f64>) -> Self {
        self.fee_bps = Some(column);
        self
    }

    pub fn prev_fee_bps(mut self, column: Vec<Option<f64>>) -> Self {
        self.prev_fee_bps = Some(column);
        self
    }

    pub fn volume_usd(mut self, column: Vec<f64>) -> Self {
        self.volume_usd = Some(column);
        self
    }

    pub fn prev_volume_usd(mut self, column: Vec<Option<f64>>) -> Self {
        self.prev_volume_usd = Some(column);
        self
    }

    pub fn fees_usd(mut self, column: Vec<f64>) -> Self {
        self.fees_usd = Some(column);
        self
    }

    pub fn prev_fees_usd(mut self, column: Vec<Option<f64>>) -> Self {
        self.prev_fees_usd = Some(column);
        self
    }

    pub fn swaps_count(mut self, column: Vec<u64>) -> Self {
        self.swaps_count = Some(column);
        self
    }

    pub fn avg_swap_size_usd(mut self, column: Vec<f64>) -> Self {
        self.avg_swap_size_usd = Some(column);
        self
    }

    pub fn prev_avg_swap_size_usd(mut self, column: Vec<Option<f64>>) -> Self {
        self.prev_avg_swap_size_usd = Some(column);
        self
    }

    /// Sets the three precomputed percentage-change columns.
    pub fn pct_changes(
        mut self,
        fee: Vec<Option<f64>>,
        volume: Vec<Option<f64>>,
        fees: Vec<Option<f64>>,
    ) -> Self {
        self.pct_change_fee_bps = Some(fee);
        self.pct_change_volume = Some(volume);
        self.pct_change_fees = Some(fees);
        self
    }

    /// Adds a named control column.
    pub fn control<S: Into<String>>(mut self, name: S, column: Vec<Option<f64>>) -> Self {
        self.controls.insert(name.into(), column);
        self
    }

    /// Finalizes construction after validating lengths and identifier uniqueness.
    pub fn build(self) -> Result<PeriodTable> {
        let n = self.period_ids.len();
        check_len("start dates", n, self.start_dates.len())?;

        let mut seen = HashSet::with_capacity(n);
        for period_id in &self.period_ids {
            if !seen.insert(*period_id) {
                return Err(FeeAnalysisError::DuplicatePeriod {
                    period_id: *period_id,
                });
            }
        }

        let fee_bps = required(self.fee_bps, "fee_bps", n)?;
        let volume_usd = required(self.volume_usd, "volume_usd", n)?;
        let fees_usd = required(self.fees_usd, "fees_usd", n)?;

        let end_dates = self.end_dates.unwrap_or_else(|| self.start_dates.clone());
        check_len("end dates", n, end_dates.len())?;

        let swaps_count = self.swaps_count.unwrap_or_else(|| vec![0; n]);
        check_len("swaps_count", n, swaps_count.len())?;
        let avg_swap_size_usd = self.avg_swap_size_usd.unwrap_or_else(|| vec![0.0; n]);
        check_len("avg_swap_size_usd", n, avg_swap_size_usd.len())?;

        let prev_fee_bps = optional(self.prev_fee_bps, "prev_fee_bps", n)?;
        let prev_volume_usd = optional(self.prev_volume_usd, "prev_volume_usd", n)?;
        let prev_fees_usd = optional(self.prev_fees_usd, "prev_fees_usd", n)?;
        let prev_avg_swap_size_usd =
            optional(self.prev_avg_swap_size_usd, "prev_avg_swap_size_usd", n)?;
        let pct_change_fee_bps = optional(self.pct_change_fee_bps, "pct_change_fee_bps", n)?;
        let pct_change_volume = optional(self.pct_change_volume, "pct_change_volume", n)?;
        let pct_change_fees = optional(self.pct_change_fees, "pct_change_fees", n)?;

        for column in self.controls.values() {
            check_len("control column", n, column.len())?;
        }

        Ok(PeriodTable {
            period_ids: self.period_ids,
            start_dates: self.start_dates,
            end_dates,
            fee_bps,
            prev_fee_bps,
            volume_usd,
            prev_volume_usd,
            fees_usd,
            prev_fees_usd,
            swaps_count,
            avg_swap_size_usd,
            prev_avg_swap_size_usd,
            pct_change_fee_bps,
            pct_change_volume,
            pct_change_fees,
            controls: self.controls,
        })
    }
}

fn check_len(context: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(FeeAnalysisError::dimension_mismatch(context, expected, found));
    }
    Ok(())
}

fn required<T>(column: Option<Vec<T>>, name: &'static str, n: usize) -> Result<Vec<T>> {
    let column = column.ok_or_else(|| FeeAnalysisError::missing_column(name))?;
    check_len(name, n, column.len())?;
    Ok(column)
}

fn optional(
    column: Option<Vec<Option<f64>>>,
    name: &'static str,
    n: usize,
) -> Result<Vec<Option<f64>>> {
    let column = column.unwrap_or_else(|| vec![None; n]);
    check_len(name, n, column.len())?;
    Ok(column)
}

/// Complete rows of the percentage-change columns and any requested controls.
#[derive(Clone, Debug)]
pub struct Observations {
    fee_change: DVector<f64>,
    volume_change: DVector<f64>,
    revenue_change: DVector<f64>,
    controls: DMatrix<f64>,
    control_names: Vec<String>,
}

impl Observations {
    /// Number of complete rows.
    pub fn len(&self) -> usize {
        self.fee_change.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fee_change.is_empty()
    }

    /// Percentage change in fee rate per row.
    pub fn fee_change(&self) -> &DVector<f64> {
        &self.fee_change
    }

    /// Percentage change in volume per row.
    pub fn volume_change(&self) -> &DVector<f64> {
        &self.volume_change
    }

    /// Percentage change in fee revenue per row.
    pub fn revenue_change(&self) -> &DVector<f64> {
        &self.revenue_change
    }

    /// Control regressors, one column per requested control.
    pub fn controls(&self) -> &DMatrix<f64> {
        &self.controls
    }

    pub fn control_names(&self) -> &[String] {
        &self.control_names
    }

    /// Returns a new set of observations made of the given rows, repeats allowed.
    pub fn resample(&self, rows: &[usize]) -> Observations {
        Observations {
            fee_change: self.fee_change.select_rows(rows),
            volume_change: self.volume_change.select_rows(rows),
            revenue_change: self.revenue_change.select_rows(rows),
            controls: self.controls.select_rows(rows),
            control_names: self.control_names.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    #[test]
    fn records_round_trip_through_columns() {
        let first = PeriodRecord::new(1, day(1), day(7), 10.0, 1_000_000.0, 1_000.0)
            .with_swaps(1_000, 1_000.0);
        let second = PeriodRecord::new(2, day(8), day(14), 25.0, 800_000.0, 2_000.0)
            .with_swaps(900, 889.0)
            .with_previous(&first)
            .with_control("time_trend", 2.0);

        let table = PeriodTable::from_records(&[first.clone(), second.clone()]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.control_names().collect::<Vec<_>>(), vec!["time_trend"]);
        assert_eq!(table.control("time_trend").unwrap(), &[None, Some(2.0)]);
        assert_eq!(table.records(), vec![first, second]);
    }

    #[test]
    fn with_previous_derives_percentage_changes() {
        let prev = PeriodRecord::new(1, day(1), day(7), 10.0, 1_000_000.0, 1_000.0);
        let cur = PeriodRecord::new(2, day(8), day(14), 25.0, 800_000.0, 2_000.0).with_previous(&prev);
        assert_eq!(cur.pct_change_fee_bps, Some(150.0));
        assert_relative_eq!(cur.pct_change_volume.unwrap(), -20.0, epsilon = 1e-12);
        assert_eq!(cur.pct_change_fees, Some(100.0));
        assert_eq!(pct_change(0.0, 5.0), None);
    }

    #[test]
    fn builder_rejects_ragged_columns() {
        let result = PeriodTableBuilder::new(vec![1, 2], vec![day(1), day(8)])
            .fee_bps(vec![10.0, 25.0])
            .volume_usd(vec![1.0])
            .fees_usd(vec![1.0, 2.0])
            .build();
        assert!(matches!(
            result,
            Err(FeeAnalysisError::DimensionMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn builder_rejects_duplicate_periods() {
        let result = PeriodTableBuilder::new(vec![3, 3], vec![day(1), day(8)])
            .fee_bps(vec![10.0, 25.0])
            .volume_usd(vec![1.0, 1.0])
            .fees_usd(vec![1.0, 2.0])
            .build();
        assert!(matches!(
            result,
            Err(FeeAnalysisError::DuplicatePeriod { period_id: 3 })
        ));
    }

    #[test]
    fn observations_drop_incomplete_rows_and_require_controls() {
        let table = PeriodTableBuilder::new(vec![1, 2, 3], vec![day(1), day(8), day(15)])
            .fee_bps(vec![10.0, 25.0, 10.0])
            .volume_usd(vec![1.0, 1.0, 1.0])
            .fees_usd(vec![1.0, 1.0, 1.0])
            .pct_changes(
                vec![None, Some(150.0), Some(-60.0)],
                vec![None, Some(-20.0), Some(18.75)],
                vec![None, Some(100.0), Some(-52.5)],
            )
            .control("time_trend", vec![Some(1.0), Some(2.0), None])
            .build()
            .unwrap();

        assert_eq!(table.complete_observations().unwrap().len(), 2);
        let with_trend = table.observations(&["time_trend"]).unwrap();
        assert_eq!(with_trend.len(), 1);
        assert_eq!(with_trend.controls()[(0, 0)], 2.0);

        let missing = table.observations(&["seasonality"]);
        assert!(matches!(missing, Err(FeeAnalysisError::MissingColumn { .. })));
    }

    #[test]
    fn non_finite_changes_count_as_missing() {
        let dates = vec![day(1), day(8), day(15), day(22)];
        let table = PeriodTableBuilder::new(vec![1, 2, 3, 4], dates)
            .fee_bps(vec![10.0, 25.0, 10.0, 15.0])
            .volume_usd(vec![1.0; 4])
            .fees_usd(vec![1.0; 4])
            .pct_changes(
                vec![Some(f64::NAN), Some(150.0), Some(-60.0), Some(50.0)],
                vec![Some(f64::NAN), Some(-20.0), Some(18.75), Some(f64::INFINITY)],
                vec![Some(f64::NAN), Some(100.0), Some(-52.5), Some(42.0)],
            )
            .control("time_trend", vec![Some(1.0), Some(f64::NAN), Some(3.0), Some(4.0)])
            .build()
            .unwrap();

        let obs = table.complete_observations().unwrap();
        assert_eq!(obs.len(), 2);
        assert!(obs.volume_change().iter().all(|v| v.is_finite()));
        assert_eq!(table.observations(&["time_trend"]).unwrap().len(), 1);

        let (fee, volume, revenue) = table.mean_pct_changes();
        assert_relative_eq!(fee.unwrap(), 140.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(volume.unwrap(), -1.25 / 2.0, epsilon = 1e-12);
        assert_relative_eq!(revenue.unwrap(), 89.5 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn resample_repeats_rows() {
        let table = PeriodTableBuilder::new(vec![1, 2], vec![day(1), day(8)])
            .fee_bps(vec![10.0, 25.0])
            .volume_usd(vec![1.0, 1.0])
            .fees_usd(vec![1.0, 1.0])
            .pct_changes(
                vec![Some(1.0), Some(2.0)],
                vec![Some(3.0), Some(4.0)],
                vec![Some(5.0), Some(6.0)],
            )
            .build()
            .unwrap();
        let obs = table.complete_observations().unwrap();
        let drawn = obs.resample(&[1, 1, 0]);
        assert_eq!(drawn.len(), 3);
        assert_eq!(drawn.fee_change().as_slice(), &[2.0, 2.0, 1.0]);
    }
}

use approx::{assert_abs_diff_eq, assert_relative_eq};
use chrono::{Duration, NaiveDate};
use swapfee::bootstrap::bootstrap_elasticity;
use swapfee::data::{PeriodRecord, PeriodTable, PeriodTableBuilder};
use swapfee::decomposition::decompose_revenue;
use swapfee::elasticity::{regress, simple_elasticity};
use swapfee::optimal_fee::optimal_fee_bps;
use swapfee::summary::summarize;
use swapfee::{AnalysisOptions, BootstrapOptions, DecompositionSummary, FeeBounds, FeeExperiment};

const FEES: [f64; 5] = [10.0, 25.0, 10.0, 15.0, 20.0];
const VOLUMES: [f64; 5] = [1e6, 8e5, 9.5e5, 9e5, 8.5e5];
const SWAPS: [u64; 5] = [1_000, 900, 950, 900, 880];
const AVG_SWAP: [f64; 5] = [1_000.0, 889.0, 1_000.0, 1_000.0, 966.0];

/// Five weekly periods whose revenue is exactly fee times volume, each linked to its
/// predecessor so the percentage changes are consistent with the levels.
fn five_periods() -> Vec<PeriodRecord> {
    let start = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
    let mut records: Vec<PeriodRecord> = Vec::new();
    for i in 0..FEES.len() {
        let date = start + Duration::days(7 * i as i64);
        let revenue = FEES[i] / 10_000.0 * VOLUMES[i];
        let mut record = PeriodRecord::new(
            i as i64 + 1,
            date,
            date + Duration::days(6),
            FEES[i],
            VOLUMES[i],
            revenue,
        )
        .with_swaps(SWAPS[i], AVG_SWAP[i])
        .with_control("time_trend", i as f64 + 1.0);
        if let Some(previous) = records.last() {
            record = record.with_previous(previous);
        }
        records.push(record);
    }
    records
}

#[test]
fn five_period_scenario_has_negative_ped_and_positive_revenue_elasticity() {
    let table = PeriodTable::from_records(&five_periods()).unwrap();

    let simple = simple_elasticity(&table).unwrap();
    assert!(simple.price_elasticity_demand < 0.0);

    let regression = regress(&table.complete_observations().unwrap()).unwrap();
    assert!(regression.point.price_elasticity_demand < 0.0);
    assert_eq!(regression.n_observations, 4);

    // Revenue moves with the fee in every transition of this sample.
    let records = table.records();
    let co_move = records.windows(2).all(|w| {
        (w[1].fee_bps - w[0].fee_bps).signum() == (w[1].fees_usd - w[0].fees_usd).signum()
    });
    assert!(co_move);
    assert!(simple.revenue_elasticity > 0.0);
    assert!(regression.point.revenue_elasticity > 0.0);
}

#[test]
fn bootstrap_and_optimal_fee_bounds_are_deterministic() {
    let table = PeriodTable::from_records(&five_periods()).unwrap();
    let experiment = FeeExperiment::new(table.clone()).unwrap();
    let options = AnalysisOptions::default();

    let first = experiment.analyze(&options).unwrap();
    let second = experiment.analyze(&options).unwrap();
    assert_eq!(first.ped_ci_lower.to_bits(), second.ped_ci_lower.to_bits());
    assert_eq!(first.ped_ci_upper.to_bits(), second.ped_ci_upper.to_bits());
    assert_eq!(first.optimal_fee_ci_lower, second.optimal_fee_ci_lower);
    assert_eq!(first.optimal_fee_ci_upper, second.optimal_fee_ci_upper);
    assert_eq!(first, second);

    let standalone = bootstrap_elasticity(&table, &BootstrapOptions::default()).unwrap();
    assert_eq!(standalone.ped_ci_lower, first.ped_ci_lower);
    assert_eq!(standalone.price_elasticity_demand, first.bootstrap_ped_mean);
}

#[test]
fn decomposition_closes_for_every_transition() {
    let table = PeriodTable::from_records(&five_periods()).unwrap();
    let results = decompose_revenue(&table);
    assert_eq!(results.len(), 4);

    for result in &results {
        let parts =
            result.fee_rate_effect + result.volume_effect + result.mix_effect + result.external_effect;
        assert_abs_diff_eq!(parts, result.total_revenue_change, epsilon = 1e-6);
        if result.total_revenue_change != 0.0 {
            let shares = result.fee_rate_pct + result.volume_pct + result.mix_pct + result.external_pct;
            assert_abs_diff_eq!(shares, 100.0, epsilon = 0.1);
        }
    }

    let summary = summarize(&results).unwrap();
    assert_eq!(summary.n_periods, 4);
    assert_relative_eq!(
        summary.total_revenue_change,
        results.iter().map(|r| r.total_revenue_change).sum::<f64>(),
        epsilon = 1e-9
    );
}

#[test]
fn exact_fit_regression_recovers_the_slope() {
    let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let k = -1.7;
    let fee_changes = [12.0, -30.0, 45.0, 8.0, -5.0];
    let n = fee_changes.len();

    let table = PeriodTableBuilder::new(
        (1..=n as i64).collect(),
        (0..n).map(|i| start + Duration::days(7 * i as i64)).collect(),
    )
    .fee_bps(vec![10.0; n])
    .volume_usd(vec![1e6; n])
    .fees_usd(vec![1e3; n])
    .pct_changes(
        fee_changes.iter().map(|&x| Some(x)).collect(),
        fee_changes.iter().map(|&x| Some(k * x)).collect(),
        fee_changes.iter().map(|&x| Some((1.0 + k) * x)).collect(),
    )
    .build()
    .unwrap();

    let fit = regress(&table.complete_observations().unwrap()).unwrap();
    assert_relative_eq!(fit.point.price_elasticity_demand, k, epsilon = 1e-9);
    assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-9);
}

#[test]
fn optimal_fee_worked_examples() {
    let bounds = FeeBounds::default();
    assert_eq!(optimal_fee_bps(1e6, 10.0, -2.0, &bounds), Some(5.0));
    assert_eq!(optimal_fee_bps(1e6, 10.0, -0.5, &bounds), Some(50.0));
    assert_eq!(optimal_fee_bps(1e6, 10.0, 0.5, &bounds), Some(50.0));
}

#[test]
fn single_period_has_nothing_to_decompose() {
    let first = five_periods().remove(0);
    let experiment = FeeExperiment::new(PeriodTable::from_records(&[first]).unwrap()).unwrap();
    assert!(experiment.decompose().is_empty());
    assert!(experiment.decomposition_summary().is_none());
}

#[test]
fn summary_serializes_with_the_documented_keys() {
    let experiment = FeeExperiment::new(PeriodTable::from_records(&five_periods()).unwrap()).unwrap();
    let summary = experiment.decomposition_summary().unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    let object = json.as_object().unwrap();
    for key in DecompositionSummary::KEYS {
        assert!(object.contains_key(key), "missing key {key}");
    }

    let back: DecompositionSummary = serde_json::from_value(json).unwrap();
    assert_eq!(back, summary);
}

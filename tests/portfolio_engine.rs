use std::ops::ControlFlow;

use chrono::NaiveDate;
use sparkrisk::core::{
    AnomalyPolicy, EngineConfig, HolidayCalendar, ModelBundle, SimulationError, from_json,
    load_assets_json, to_json_pretty,
};
use sparkrisk::mc::{PortfolioRiskReport, PortfolioSimulationEngine};

const MODELS: &str = include_str!("fixtures/models.json");
const ASSETS: &str = include_str!("fixtures/assets.json");

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn engine(config: EngineConfig) -> PortfolioSimulationEngine {
    let models = ModelBundle::from_json_str(MODELS).expect("fixture bundle is valid");
    PortfolioSimulationEngine::new(models, HolidayCalendar::nerc(2025, 2026), config).unwrap()
}

fn run(config: EngineConfig, trials: usize) -> PortfolioRiskReport {
    let assets = load_assets_json(ASSETS).unwrap();
    engine(config)
        .simulate_portfolio(&assets, d(2025, 7, 1), d(2025, 7, 21), trials)
        .unwrap()
}

#[test]
fn batch_size_100_and_50_give_identical_reports() {
    let config = EngineConfig::from_toml_str("seed = 2024\n").unwrap();
    let a = run(config.clone().with_batch_size(100), 200);
    let b = run(config.with_batch_size(50), 200);
    assert_eq!(a, b);
}

#[test]
fn different_seeds_give_different_samples() {
    let a = run(EngineConfig::default().with_seed(1), 60);
    let b = run(EngineConfig::default().with_seed(2), 60);
    assert_ne!(a.portfolio_earnings, b.portfolio_earnings);
}

#[test]
fn portfolio_is_aggregated_on_summed_trials() {
    let report = run(EngineConfig::default(), 150);
    assert_eq!(report.assets.len(), 3);
    for j in 0..report.included_trials() {
        let summed: f64 = report.assets.iter().map(|a| a.trial_profits[j]).sum();
        assert!((report.portfolio_earnings[j] - summed).abs() <= 1e-9 * summed.abs().max(1.0));
    }
    assert!(report.portfolio.cfar_95 >= report.portfolio.cfar_90);
    for asset in &report.assets {
        assert!(asset.risk.cfar_95 >= asset.risk.cfar_90);
        assert!(asset.trial_profits.iter().all(|p| *p >= 0.0));
        let op = asset.operating;
        assert!((0.0..=21.0).contains(&op.mean_operating_days));
        assert!((0.0..=1.0).contains(&op.mean_percent_hours_run));
    }
    let cc = report.asset("riverside-cc").unwrap();
    assert!(cc.risk.expected_profit > 0.0);
}

#[test]
fn min_run_limits_hours_per_operating_day() {
    let report = run(EngineConfig::default(), 40);
    let steam = report.asset("harbor-steam").unwrap();
    // Every operating day runs at least 16 of the horizon's 21 * 24 hours.
    let floor = 16.0 * steam.operating.mean_operating_days / (21.0 * 24.0);
    assert!(steam.operating.mean_percent_hours_run >= floor - 1e-9);
}

#[test]
fn report_serializes_to_json_and_back() {
    let report = run(EngineConfig::default().with_daily_cashflows(true), 10);
    let json = to_json_pretty(&report).unwrap();
    assert!(json.contains("\"cfar_95\""));
    let back: PortfolioRiskReport = from_json(&json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn cancelling_after_first_batch_returns_partial_count() {
    let assets = load_assets_json(ASSETS).unwrap();
    let eng = engine(EngineConfig::default().with_batch_size(25));
    let err = eng
        .simulate_portfolio_with_progress(&assets, d(2025, 1, 1), d(2025, 1, 7), 100, |_| {
            ControlFlow::Break(())
        })
        .unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Cancelled {
            completed_trials: 25
        }
    ));
}

#[test]
fn config_file_controls_engine() {
    let config = EngineConfig::from_toml_str(
        r#"
        batch_size = 32
        seed = 7
        gas_start_price = 2.75
        anomaly_policy = "exclude_trial"
        retain_daily_cashflows = true
        "#,
    )
    .unwrap();
    assert_eq!(config.anomaly_policy, AnomalyPolicy::ExcludeTrial);
    let report = run(config, 20);
    let daily = report.assets[0].daily_cashflows.as_ref().unwrap();
    assert_eq!(daily.len(), 20);
    assert_eq!(daily[0].len(), 21);
}

#[test]
fn horizon_and_trial_errors_are_reported_before_simulation() {
    let assets = load_assets_json(ASSETS).unwrap();
    let eng = engine(EngineConfig::default());
    assert!(matches!(
        eng.simulate_portfolio(&assets, d(2025, 3, 2), d(2025, 3, 1), 10),
        Err(SimulationError::DimensionMismatch(_))
    ));
    assert!(matches!(
        eng.simulate_portfolio(&assets, d(2025, 3, 1), d(2025, 3, 2), 0),
        Err(SimulationError::InvalidConfiguration(_))
    ));
}

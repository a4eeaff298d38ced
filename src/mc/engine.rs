//! Batched Monte Carlo over the full price pipeline with per-asset dispatch.
//!
//! Each batch simulates temperature, gas and electricity for its trial range, screens the
//! paths for non-finite values, dispatches every asset on every surviving trial and hands
//! the results to a [`ResultsAccumulator`]. Random streams are keyed by global trial id,
//! so the report does not depend on the batch size or on the `parallel` feature.
use std::ops::{ControlFlow, Range};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::core::{
    AnomalyPolicy, Asset, EngineConfig, HOURS_PER_DAY, HolidayCalendar, HourlyGrid, ModelBundle,
    Result, SimulationError, SimulationStage,
};
use crate::dispatch::{DispatchResult, dispatch};
use crate::mc::batching::{Anomaly, ResultsAccumulator, TrialBatches};
use crate::mc::report::PortfolioRiskReport;
use crate::models::batch::map_trials;
use crate::models::{
    ElectricityPriceSimulator, NaturalGasSimulator, PathBatch, TemperatureSimulator,
};

/// Snapshot handed to the progress callback after every batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based index of the batch just finished.
    pub batch: usize,
    pub batches: usize,
    pub completed_trials: usize,
    pub total_trials: usize,
    pub excluded_trials: usize,
}

#[derive(Debug, Clone)]
pub struct PortfolioSimulationEngine {
    models: ModelBundle,
    holidays: HolidayCalendar,
    config: EngineConfig,
}

struct Simulators<'a> {
    temperature: TemperatureSimulator<'a>,
    gas: NaturalGasSimulator,
    electricity: ElectricityPriceSimulator<'a>,
}

impl PortfolioSimulationEngine {
    /// Validates the model bundle and configuration up front.
    pub fn new(models: ModelBundle, holidays: HolidayCalendar, config: EngineConfig) -> Result<Self> {
        models.validate()?;
        config.validate()?;
        Ok(Self {
            models,
            holidays,
            config,
        })
    }

    pub fn models(&self) -> &ModelBundle {
        &self.models
    }

    pub fn holidays(&self) -> &HolidayCalendar {
        &self.holidays
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Simulates `trial_count` trials over `[start, end]` and reports expected profit and
    /// CFaR per asset and for the portfolio.
    pub fn simulate_portfolio(
        &self,
        assets: &[Asset],
        start: NaiveDate,
        end: NaiveDate,
        trial_count: usize,
    ) -> Result<PortfolioRiskReport> {
        self.simulate_portfolio_with_progress(assets, start, end, trial_count, |_| {
            ControlFlow::Continue(())
        })
    }

    /// Like [`simulate_portfolio`](Self::simulate_portfolio), invoking `progress` after
    /// each batch. Returning `ControlFlow::Break` stops the run with
    /// [`SimulationError::Cancelled`].
    pub fn simulate_portfolio_with_progress<F>(
        &self,
        assets: &[Asset],
        start: NaiveDate,
        end: NaiveDate,
        trial_count: usize,
        mut progress: F,
    ) -> Result<PortfolioRiskReport>
    where
        F: FnMut(&BatchProgress) -> ControlFlow<()>,
    {
        if assets.is_empty() {
            return Err(SimulationError::InvalidAssetSpec(
                "portfolio has no assets".to_string(),
            ));
        }
        for asset in assets {
            asset.validate()?;
        }
        let grid = HourlyGrid::new(start, end)?;
        let batches = TrialBatches::new(trial_count, self.config.batch_size)?;
        let sims = self.simulators(&grid)?;
        let batch_count = batches.batch_count();

        info!(
            trials = trial_count,
            batches = batch_count,
            assets = assets.len(),
            days = grid.days(),
            %start,
            %end,
            "starting portfolio simulation"
        );

        let mut acc = ResultsAccumulator::new(
            assets.len(),
            trial_count,
            self.config.retain_daily_cashflows,
        );
        for (index, trials) in batches.enumerate() {
            self.run_batch(&sims, assets, trials.clone(), &mut acc)?;
            debug!(
                batch = index + 1,
                batches = batch_count,
                first_trial = trials.start,
                last_trial = trials.end - 1,
                "batch complete"
            );

            let snapshot = BatchProgress {
                batch: index + 1,
                batches: batch_count,
                completed_trials: acc.completed_trials(),
                total_trials: trial_count,
                excluded_trials: acc.excluded_trials(),
            };
            // A stop requested after the final batch has nothing left to skip.
            if progress(&snapshot).is_break() && snapshot.batch < batch_count {
                warn!(
                    completed_trials = snapshot.completed_trials,
                    "portfolio simulation cancelled"
                );
                return Err(SimulationError::Cancelled {
                    completed_trials: snapshot.completed_trials,
                });
            }
        }

        let report = acc.finish(assets, start, end)?;
        info!(
            included_trials = report.included_trials(),
            excluded_trials = report.excluded_trials.len(),
            expected_profit = report.portfolio.expected_profit,
            cfar_95 = report.portfolio.cfar_95,
            "portfolio simulation finished"
        );
        Ok(report)
    }

    fn simulators<'a>(&'a self, grid: &HourlyGrid) -> Result<Simulators<'a>> {
        let seed = self.config.seed;
        Ok(Simulators {
            temperature: TemperatureSimulator::new(&self.models.temperature, grid, seed)?,
            gas: NaturalGasSimulator::new(
                &self.models.natural_gas,
                grid,
                seed,
                self.config.gas_start_price,
            )?,
            electricity: ElectricityPriceSimulator::new(
                &self.models.electricity,
                grid,
                &self.holidays,
                seed,
            )?,
        })
    }

    fn run_batch(
        &self,
        sims: &Simulators<'_>,
        assets: &[Asset],
        trials: Range<usize>,
        acc: &mut ResultsAccumulator,
    ) -> Result<()> {
        let temperature = sims.temperature.simulate(trials.clone())?;
        let gas = sims.gas.simulate(trials.clone())?;
        let electricity = sims.electricity.simulate(&temperature, &gas)?;

        let mut anomalies = first_anomalies(&[
            (SimulationStage::Temperature, &temperature.total),
            (SimulationStage::NaturalGas, &gas),
            (SimulationStage::Electricity, &electricity.price),
        ]);

        let first = trials.start;
        let outcomes: Vec<Result<Vec<DispatchResult>>> = map_trials(trials, |trial| {
            if anomalies_contain(&anomalies, trial) {
                return Ok(Vec::new());
            }
            let local = trial - first;
            assets
                .iter()
                .map(|asset| dispatch(asset, electricity.price.path(local), gas.path(local)))
                .collect()
        });

        let mut recorded = Vec::with_capacity(outcomes.len());
        for (offset, outcome) in outcomes.into_iter().enumerate() {
            let trial = first + offset;
            if anomalies_contain(&anomalies, trial) {
                continue;
            }
            let results = outcome?;
            match dispatch_anomaly(trial, &results) {
                Some(anomaly) => anomalies.push(anomaly),
                None => recorded.push((trial, results)),
            }
        }
        anomalies.sort_by_key(|a| a.trial);

        if let Some(&earliest) = anomalies.first()
            && self.config.anomaly_policy == AnomalyPolicy::Abort
        {
            return Err(earliest.into());
        }
        for anomaly in anomalies {
            warn!(
                trial = anomaly.trial,
                hour = anomaly.step,
                stage = %anomaly.stage,
                "excluding trial with non-finite values"
            );
            acc.exclude(anomaly);
        }
        for (trial, results) in recorded {
            acc.record(trial, results)?;
        }
        Ok(())
    }
}

/// Earliest non-finite value per trial; stages are checked in pipeline order.
fn first_anomalies(stages: &[(SimulationStage, &PathBatch)]) -> Vec<Anomaly> {
    let mut found: Vec<Anomaly> = Vec::new();
    for &(stage, batch) in stages {
        for (trial, step) in batch.non_finite() {
            if !anomalies_contain(&found, trial) {
                found.push(Anomaly { stage, trial, step });
            }
        }
    }
    found.sort_by_key(|a| a.trial);
    found
}

fn anomalies_contain(anomalies: &[Anomaly], trial: usize) -> bool {
    anomalies.iter().any(|a| a.trial == trial)
}

/// A finite day can still overflow the horizon total; that points past the last day.
fn dispatch_anomaly(trial: usize, results: &[DispatchResult]) -> Option<Anomaly> {
    results.iter().find_map(|r| {
        let day = r
            .daily_cashflows
            .iter()
            .position(|c| !c.is_finite())
            .or_else(|| (!r.profit.is_finite()).then_some(r.daily_cashflows.len()))?;
        Some(Anomaly {
            stage: SimulationStage::Dispatch,
            trial,
            step: day * HOURS_PER_DAY,
        })
    })
}

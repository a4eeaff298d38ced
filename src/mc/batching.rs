//! Trial partitioning and engine-wide result storage.
use std::collections::BTreeMap;
use std::ops::Range;

use chrono::NaiveDate;

use crate::core::{Asset, Result, SimulationError, SimulationStage, dimension_mismatch};
use crate::dispatch::DispatchResult;
use crate::mc::report::{AssetRiskSummary, OperatingStats, PortfolioRiskReport};
use crate::risk::{CashFlowAtRisk, portfolio_earnings};

/// Consecutive, disjoint trial-id ranges of at most `batch_size` trials covering
/// `0..trials`.
#[derive(Debug, Clone)]
pub struct TrialBatches {
    next: usize,
    trials: usize,
    batch_size: usize,
}

impl TrialBatches {
    pub fn new(trials: usize, batch_size: usize) -> Result<Self> {
        if trials == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "trial count must be > 0".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "batch_size must be > 0".to_string(),
            ));
        }
        Ok(Self {
            next: 0,
            trials,
            batch_size,
        })
    }

    pub fn batch_count(&self) -> usize {
        self.trials.div_ceil(self.batch_size)
    }
}

impl Iterator for TrialBatches {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.trials {
            return None;
        }
        let start = self.next;
        self.next = (start + self.batch_size).min(self.trials);
        Some(start..self.next)
    }
}

/// First non-finite value seen in a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anomaly {
    pub stage: SimulationStage,
    pub trial: usize,
    pub step: usize,
}

impl From<Anomaly> for SimulationError {
    fn from(a: Anomaly) -> Self {
        SimulationError::NumericAnomaly {
            stage: a.stage,
            trial: a.trial,
            step: a.step,
        }
    }
}

/// Dispatch outcomes indexed by asset and global trial id.
#[derive(Debug, Clone)]
pub struct ResultsAccumulator {
    trials: usize,
    retain_daily: bool,
    outcomes: Vec<Vec<Option<DispatchResult>>>,
    excluded: BTreeMap<usize, Anomaly>,
    completed: usize,
}

impl ResultsAccumulator {
    pub fn new(assets: usize, trials: usize, retain_daily: bool) -> Self {
        Self {
            trials,
            retain_daily,
            outcomes: vec![vec![None; trials]; assets],
            excluded: BTreeMap::new(),
            completed: 0,
        }
    }

    /// Stores one trial's results, one per asset in portfolio order.
    pub fn record(&mut self, trial: usize, results: Vec<DispatchResult>) -> Result<()> {
        if trial >= self.trials {
            return Err(dimension_mismatch(format!(
                "trial {trial} outside 0..{}",
                self.trials
            )));
        }
        if results.len() != self.outcomes.len() {
            return Err(dimension_mismatch(format!(
                "trial {trial} has {} asset results, expected {}",
                results.len(),
                self.outcomes.len()
            )));
        }
        for (slot, mut result) in self.outcomes.iter_mut().zip(results) {
            if !self.retain_daily {
                result.daily_cashflows = Vec::new();
            }
            slot[trial] = Some(result);
        }
        self.completed += 1;
        Ok(())
    }

    pub fn exclude(&mut self, anomaly: Anomaly) {
        if self.excluded.insert(anomaly.trial, anomaly).is_none() {
            self.completed += 1;
        }
    }

    /// Trials either recorded or excluded so far.
    pub fn completed_trials(&self) -> usize {
        self.completed
    }

    pub fn excluded_trials(&self) -> usize {
        self.excluded.len()
    }

    /// Aggregates every asset and the portfolio over the included trials.
    pub fn finish(self, assets: &[Asset], start: NaiveDate, end: NaiveDate) -> Result<PortfolioRiskReport> {
        if assets.len() != self.outcomes.len() {
            return Err(dimension_mismatch(format!(
                "{} assets for {} result columns",
                assets.len(),
                self.outcomes.len()
            )));
        }
        if self.excluded.len() == self.trials {
            // Every trial was dropped: surface the earliest anomaly.
            if let Some(first) = self.excluded.values().next() {
                return Err((*first).into());
            }
        }

        let included_ids: Vec<usize> = (0..self.trials)
            .filter(|trial| !self.excluded.contains_key(trial))
            .collect();
        let mut summaries = Vec::with_capacity(assets.len());
        let mut profits_by_asset = Vec::with_capacity(assets.len());
        for (asset, column) in assets.iter().zip(self.outcomes) {
            let included: Vec<DispatchResult> = column
                .into_iter()
                .enumerate()
                .filter(|(trial, _)| !self.excluded.contains_key(trial))
                .map(|(trial, r)| {
                    r.ok_or_else(|| dimension_mismatch(format!("trial {trial} was never recorded")))
                })
                .collect::<Result<_>>()?;

            let trial_profits: Vec<f64> = included.iter().map(|r| r.profit).collect();
            let risk = CashFlowAtRisk::from_samples(&trial_profits)?;
            check_aggregate(&risk, &trial_profits, &included_ids)?;
            let operating = OperatingStats::from_results(&included);
            let daily_cashflows = self
                .retain_daily
                .then(|| included.into_iter().map(|r| r.daily_cashflows).collect());
            profits_by_asset.push(trial_profits.clone());
            summaries.push(AssetRiskSummary {
                name: asset.name.clone(),
                risk,
                operating,
                trial_profits,
                daily_cashflows,
            });
        }

        let earnings = portfolio_earnings(&profits_by_asset)?;
        if let Some(j) = earnings.iter().position(|e| !e.is_finite()) {
            return Err(aggregation_anomaly(included_ids[j]));
        }
        let portfolio = CashFlowAtRisk::from_samples(&earnings)?;
        check_aggregate(&portfolio, &earnings, &included_ids)?;
        Ok(PortfolioRiskReport {
            start,
            end,
            trials: self.trials,
            excluded_trials: self.excluded.keys().copied().collect(),
            assets: summaries,
            portfolio,
            portfolio_earnings: earnings,
        })
    }
}

fn aggregation_anomaly(trial: usize) -> SimulationError {
    Anomaly {
        stage: SimulationStage::Aggregation,
        trial,
        step: 0,
    }
    .into()
}

/// Finite samples can still overflow once summed; blame the largest trial.
fn check_aggregate(risk: &CashFlowAtRisk, samples: &[f64], trial_ids: &[usize]) -> Result<()> {
    if risk.expected_profit.is_finite() && risk.cfar_90.is_finite() && risk.cfar_95.is_finite() {
        return Ok(());
    }
    let largest = samples
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .map_or(0, |(j, _)| j);
    Err(aggregation_anomaly(trial_ids.get(largest).copied().unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn result(profit: f64) -> DispatchResult {
        DispatchResult {
            profit,
            operating_days: 1,
            avg_hours_per_operating_day: 8.0,
            percent_hours_run: 1.0 / 3.0,
            daily_cashflows: vec![profit],
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn batches_partition_trials() {
        let batches: Vec<_> = TrialBatches::new(250, 100).unwrap().collect();
        assert_eq!(batches, vec![0..100, 100..200, 200..250]);
        assert_eq!(TrialBatches::new(250, 100).unwrap().batch_count(), 3);
        assert_eq!(TrialBatches::new(7, 100).unwrap().collect::<Vec<_>>(), vec![0..7]);
    }

    #[test]
    fn zero_trials_or_batch_size_is_a_configuration_error() {
        assert!(matches!(
            TrialBatches::new(0, 10),
            Err(SimulationError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            TrialBatches::new(10, 0),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn excluded_trials_drop_out_of_every_statistic() {
        let assets = vec![
            Asset::new("a", 10.0, 7000.0, 0.0, 1).unwrap(),
            Asset::new("b", 10.0, 7000.0, 0.0, 1).unwrap(),
        ];
        let mut acc = ResultsAccumulator::new(2, 4, false);
        acc.record(0, vec![result(10.0), result(1.0)]).unwrap();
        acc.record(1, vec![result(20.0), result(2.0)]).unwrap();
        acc.exclude(Anomaly {
            stage: SimulationStage::Electricity,
            trial: 2,
            step: 5,
        });
        acc.record(3, vec![result(30.0), result(3.0)]).unwrap();
        assert_eq!(acc.completed_trials(), 4);

        let report = acc.finish(&assets, d(1), d(3)).unwrap();
        assert_eq!(report.excluded_trials, vec![2]);
        assert_eq!(report.included_trials(), 3);
        assert_eq!(report.portfolio_earnings, vec![11.0, 22.0, 33.0]);
        assert_relative_eq!(report.assets[0].risk.expected_profit, 20.0);
        assert_relative_eq!(report.portfolio.expected_profit, 22.0);
        assert!(report.assets[1].daily_cashflows.is_none());
        assert_relative_eq!(report.assets[0].operating.mean_hours_per_operating_day, 8.0);
    }

    #[test]
    fn all_trials_excluded_fails_with_first_anomaly() {
        let assets = vec![Asset::new("a", 10.0, 7000.0, 0.0, 1).unwrap()];
        let mut acc = ResultsAccumulator::new(1, 2, false);
        for trial in [1, 0] {
            acc.exclude(Anomaly {
                stage: SimulationStage::NaturalGas,
                trial,
                step: 24,
            });
        }
        let err = acc.finish(&assets, d(1), d(1)).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::NumericAnomaly { trial: 0, step: 24, .. }
        ));
    }

    #[test]
    fn overflowing_portfolio_sum_is_an_aggregation_anomaly() {
        let assets = vec![
            Asset::new("a", 10.0, 7000.0, 0.0, 1).unwrap(),
            Asset::new("b", 10.0, 7000.0, 0.0, 1).unwrap(),
        ];
        let mut acc = ResultsAccumulator::new(2, 3, false);
        acc.record(0, vec![result(1.0), result(2.0)]).unwrap();
        acc.exclude(Anomaly {
            stage: SimulationStage::Electricity,
            trial: 1,
            step: 3,
        });
        acc.record(2, vec![result(1.5e308), result(1.5e308)]).unwrap();
        let err = acc.finish(&assets, d(1), d(1)).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::NumericAnomaly {
                stage: SimulationStage::Aggregation,
                trial: 2,
                step: 0,
            }
        ));
    }

    #[test]
    fn overflowing_asset_mean_is_an_aggregation_anomaly() {
        let assets = vec![Asset::new("a", 10.0, 7000.0, 0.0, 1).unwrap()];
        let mut acc = ResultsAccumulator::new(1, 3, false);
        acc.record(0, vec![result(1.0e308)]).unwrap();
        acc.record(1, vec![result(1.7e308)]).unwrap();
        acc.record(2, vec![result(5.0)]).unwrap();
        let err = acc.finish(&assets, d(1), d(1)).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::NumericAnomaly {
                stage: SimulationStage::Aggregation,
                trial: 1,
                ..
            }
        ));
    }

    #[test]
    fn retained_daily_cashflows_follow_trial_order() {
        let assets = vec![Asset::new("a", 10.0, 7000.0, 0.0, 1).unwrap()];
        let mut acc = ResultsAccumulator::new(1, 2, true);
        acc.record(1, vec![result(2.0)]).unwrap();
        acc.record(0, vec![result(1.0)]).unwrap();
        let report = acc.finish(&assets, d(1), d(1)).unwrap();
        assert_eq!(
            report.assets[0].daily_cashflows,
            Some(vec![vec![1.0], vec![2.0]])
        );
    }

    #[test]
    fn unrecorded_trial_is_reported() {
        let assets = vec![Asset::new("a", 10.0, 7000.0, 0.0, 1).unwrap()];
        let mut acc = ResultsAccumulator::new(1, 2, false);
        acc.record(0, vec![result(1.0)]).unwrap();
        assert!(acc.finish(&assets, d(1), d(1)).is_err());
        let mut acc = ResultsAccumulator::new(1, 2, false);
        assert!(acc.record(2, vec![result(1.0)]).is_err());
    }
}

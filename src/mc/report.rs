//! Serializable outputs of a portfolio simulation run.
use chrono::NaiveDate;

use crate::dispatch::DispatchResult;
use crate::math::mean;
use crate::risk::CashFlowAtRisk;

/// Operating statistics of one asset averaged over included trials.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OperatingStats {
    pub mean_operating_days: f64,
    pub mean_hours_per_operating_day: f64,
    /// Mean fraction of horizon hours run.
    pub mean_percent_hours_run: f64,
}

impl OperatingStats {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a DispatchResult>,
    {
        let (mut days, mut hours, mut run) = (Vec::new(), Vec::new(), Vec::new());
        for r in results {
            days.push(r.operating_days as f64);
            hours.push(r.avg_hours_per_operating_day);
            run.push(r.percent_hours_run);
        }
        Self {
            mean_operating_days: mean(&days),
            mean_hours_per_operating_day: mean(&hours),
            mean_percent_hours_run: mean(&run),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssetRiskSummary {
    pub name: String,
    #[serde(flatten)]
    pub risk: CashFlowAtRisk,
    pub operating: OperatingStats,
    /// Profit of every included trial, ordered by trial id.
    pub trial_profits: Vec<f64>,
    /// Daily cash flows per included trial when the run retains them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_cashflows: Option<Vec<Vec<f64>>>,
}

/// Per-asset and portfolio-level risk of one simulated horizon.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PortfolioRiskReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Trials requested.
    pub trials: usize,
    /// Trials dropped for numeric anomalies, ascending.
    #[serde(default)]
    pub excluded_trials: Vec<usize>,
    pub assets: Vec<AssetRiskSummary>,
    /// Computed on the summed per-trial earnings.
    pub portfolio: CashFlowAtRisk,
    pub portfolio_earnings: Vec<f64>,
}

impl PortfolioRiskReport {
    /// Trials contributing to the statistics.
    pub fn included_trials(&self) -> usize {
        self.trials - self.excluded_trials.len()
    }

    pub fn asset(&self, name: &str) -> Option<&AssetRiskSummary> {
        self.assets.iter().find(|a| a.name == name)
    }
}

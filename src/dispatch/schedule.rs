//! Plant-level dispatch over a multi-day price path.
use crate::core::{Asset, HOURS_PER_DAY, Result, dimension_mismatch};
use crate::dispatch::block::{DispatchBlock, best_block_unchecked};

/// Optimal block and realized cash flow of one day.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DailyDispatch {
    pub day: usize,
    /// Best candidate, reported even when it loses money.
    pub block: DispatchBlock,
    /// `block.earnings * capacity` when positive, else 0.
    pub cashflow: f64,
}

impl DailyDispatch {
    /// The plant runs only on days whose best block earns a strictly positive margin.
    pub fn is_operating(&self) -> bool {
        self.block.earnings > 0.0
    }
}

/// Dispatch outcome of one asset along one price path.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DispatchResult {
    /// Total cash flow, $.
    pub profit: f64,
    pub operating_days: usize,
    /// Mean block length over operating days; 0 without any.
    pub avg_hours_per_operating_day: f64,
    /// Fraction of all horizon hours spent running, in `[0, 1]`.
    pub percent_hours_run: f64,
    pub daily_cashflows: Vec<f64>,
}

impl DispatchResult {
    pub fn from_days(days: &[DailyDispatch]) -> Self {
        let total_hours = (days.len() * HOURS_PER_DAY) as f64;
        let mut profit = 0.0;
        let mut operating_days = 0;
        let mut hours_run = 0;
        for day in days.iter().filter(|d| d.is_operating()) {
            profit += day.cashflow;
            operating_days += 1;
            hours_run += day.block.length;
        }
        let avg_hours_per_operating_day = if operating_days == 0 {
            0.0
        } else {
            hours_run as f64 / operating_days as f64
        };
        let percent_hours_run = if total_hours > 0.0 {
            hours_run as f64 / total_hours
        } else {
            0.0
        };
        Self {
            profit,
            operating_days,
            avg_hours_per_operating_day,
            percent_hours_run,
            daily_cashflows: days.iter().map(|d| d.cashflow).collect(),
        }
    }
}

/// Per-MWh spark spread for every hour.
pub fn hourly_margins(asset: &Asset, electricity: &[f64], gas: &[f64]) -> Result<Vec<f64>> {
    check_paths(electricity, gas)?;
    Ok(electricity
        .iter()
        .zip(gas)
        .map(|(&e, &g)| asset.spark_spread(e, g))
        .collect())
}

fn check_paths(electricity: &[f64], gas: &[f64]) -> Result<()> {
    if electricity.len() != gas.len() {
        return Err(dimension_mismatch(format!(
            "electricity path has {} hours, gas path has {}",
            electricity.len(),
            gas.len()
        )));
    }
    if electricity.len() % HOURS_PER_DAY != 0 {
        return Err(dimension_mismatch(format!(
            "path length {} is not a whole number of days",
            electricity.len()
        )));
    }
    Ok(())
}

/// Best block and cash flow for every day of the path.
pub fn dispatch_days(asset: &Asset, electricity: &[f64], gas: &[f64]) -> Result<Vec<DailyDispatch>> {
    asset.validate()?;
    let margins = hourly_margins(asset, electricity, gas)?;
    Ok(margins
        .chunks_exact(HOURS_PER_DAY)
        .enumerate()
        .map(|(day, day_margins)| {
            let block = best_block_unchecked(day_margins, asset.min_run_hours);
            let cashflow = if block.earnings > 0.0 {
                block.earnings * asset.capacity
            } else {
                0.0
            };
            DailyDispatch {
                day,
                block,
                cashflow,
            }
        })
        .collect())
}

/// Profit-maximizing daily dispatch of `asset` along hourly `electricity` and `gas` prices.
pub fn dispatch(asset: &Asset, electricity: &[f64], gas: &[f64]) -> Result<DispatchResult> {
    dispatch_days(asset, electricity, gas).map(|days| DispatchResult::from_days(&days))
}

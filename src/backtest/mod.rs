//! Historical backtest: the unchanged dispatch applied to realized hourly prices.
//!
//! A [`HistoricalPriceSource`] supplies `(timestamp, electricity, gas)` records. The
//! series must cover every hour of the requested horizon exactly once, in order.
//! Collaborator errors are wrapped in [`SimulationError::DataFetchFailure`] unmodified.
use std::error::Error;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

use crate::core::{
    Asset, HourlyGrid, Result, SimulationError, SimulationStage, dimension_mismatch, from_json,
};
use crate::dispatch::{DispatchResult, dispatch};

pub type FetchError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoricalPriceRecord {
    pub timestamp: NaiveDateTime,
    /// $/MWh.
    pub electricity: f64,
    /// $/MMBtu.
    pub gas: f64,
}

/// Provider of realized hourly prices.
pub trait HistoricalPriceSource {
    fn fetch(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<Vec<HistoricalPriceRecord>, FetchError>;
}

impl HistoricalPriceSource for [HistoricalPriceRecord] {
    fn fetch(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<Vec<HistoricalPriceRecord>, FetchError> {
        Ok(self
            .iter()
            .filter(|r| (start..=end).contains(&r.timestamp.date()))
            .copied()
            .collect())
    }
}

/// Records stored as a JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFilePriceSource {
    path: PathBuf,
}

impl JsonFilePriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistoricalPriceSource for JsonFilePriceSource {
    fn fetch(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<Vec<HistoricalPriceRecord>, FetchError> {
        let payload = std::fs::read_to_string(&self.path)?;
        let records: Vec<HistoricalPriceRecord> = from_json(&payload)?;
        records.as_slice().fetch(start, end)
    }
}

/// Validated hourly electricity and gas paths aligned to a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalPriceSeries {
    pub electricity: Vec<f64>,
    pub gas: Vec<f64>,
}

impl HistoricalPriceSeries {
    pub fn from_records(grid: &HourlyGrid, records: &[HistoricalPriceRecord]) -> Result<Self> {
        if records.len() != grid.hours() {
            return Err(dimension_mismatch(format!(
                "historical series has {} hours, horizon needs {}",
                records.len(),
                grid.hours()
            )));
        }
        let mut electricity = Vec::with_capacity(records.len());
        let mut gas = Vec::with_capacity(records.len());
        for (hour, (record, expected)) in records.iter().zip(grid.timestamps()).enumerate() {
            if record.timestamp != expected {
                return Err(dimension_mismatch(format!(
                    "historical record {hour} is stamped {}, expected {expected}",
                    record.timestamp
                )));
            }
            let bad_stage = if !record.electricity.is_finite() {
                Some(SimulationStage::Electricity)
            } else if !record.gas.is_finite() {
                Some(SimulationStage::NaturalGas)
            } else {
                None
            };
            if let Some(stage) = bad_stage {
                return Err(SimulationError::NumericAnomaly {
                    stage,
                    trial: 0,
                    step: hour,
                });
            }
            electricity.push(record.electricity);
            gas.push(record.gas);
        }
        Ok(Self { electricity, gas })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssetBacktest {
    pub name: String,
    #[serde(flatten)]
    pub result: DispatchResult,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BacktestReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub assets: Vec<AssetBacktest>,
    pub total_profit: f64,
}

/// Dispatches every asset against realized prices over `[start, end]`.
pub fn backtest_portfolio<S>(
    source: &S,
    assets: &[Asset],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BacktestReport>
where
    S: HistoricalPriceSource + ?Sized,
{
    for asset in assets {
        asset.validate()?;
    }
    let grid = HourlyGrid::new(start, end)?;
    let records = source
        .fetch(start, end)
        .map_err(SimulationError::DataFetchFailure)?;
    let series = HistoricalPriceSeries::from_records(&grid, &records)?;

    let assets = assets
        .iter()
        .map(|asset| {
            dispatch(asset, &series.electricity, &series.gas).map(|result| AssetBacktest {
                name: asset.name.clone(),
                result,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let total_profit = assets.iter().map(|a| a.result.profit).sum();
    info!(%start, %end, assets = assets.len(), total_profit, "backtest finished");
    Ok(BacktestReport {
        start,
        end,
        assets,
        total_profit,
    })
}

//! Hybrid hourly electricity price: regression-tree log price plus sparse-lag AR residual.
//!
//! Feature row per hour (column order is part of the calibrated model contract):
//!
//! | idx | column                      |
//! |-----|-----------------------------|
//! | 0   | temperature                 |
//! | 1   | temperature deviation       |
//! | 2   | hour of day (0-23)          |
//! | 3   | day of week (1 = Sunday)    |
//! | 4   | working day flag (0/1)      |
//! | 5   | gas price                   |
//! | 6   | gas price 24 hours earlier  |
//! | 7   | gas price 168 hours earlier |
//!
//! Gas lags reaching before the horizon start hold the first gas price. Columns 2-4 do not
//! vary by trial and are computed once per grid. Price is
//! `exp(predictor(row_t) + x_t)` with `x_t` the model's own [`LaggedAutoregression`],
//! driven by a random stream independent of the temperature and gas draws.
use crate::core::{
    CalendarColumns, HolidayCalendar, HourlyGrid, Result, dimension_mismatch, invalid_model,
};
use crate::math::{RandomStream, trial_rng};
use crate::models::autoregression::{ArPath, LaggedAutoregression};
use crate::models::batch::{PathBatch, map_trials};
use crate::models::predictor::{PredictorSpec, PricePredictor};
use crate::models::temperature::TemperatureBatch;

pub const ELECTRICITY_FEATURES: usize = 8;
pub const GAS_LAG_DAY: usize = 24;
pub const GAS_LAG_WEEK: usize = 168;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibratedElectricityModel {
    /// Maps a feature row to a deterministic log price.
    pub predictor: PredictorSpec,
    pub residual: LaggedAutoregression,
}

impl CalibratedElectricityModel {
    pub fn validate(&self) -> Result<()> {
        self.predictor
            .validate(ELECTRICITY_FEATURES)
            .map_err(|e| invalid_model(format!("electricity predictor: {e}")))?;
        self.residual
            .validate()
            .map_err(|e| invalid_model(format!("electricity residual: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElectricityBatch {
    /// Price level, $/MWh.
    pub price: PathBatch,
    /// AR residual of the log price.
    pub stochastic: PathBatch,
    /// Raw innovations driving `stochastic`.
    pub innovations: PathBatch,
}

/// One trial's electricity outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectricityTrial {
    pub price: Vec<f64>,
    pub stochastic: Vec<f64>,
    pub innovations: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct ElectricityPriceSimulator<'a> {
    model: &'a CalibratedElectricityModel,
    calendar: CalendarColumns,
    hours: usize,
    seed: u64,
}

impl<'a> ElectricityPriceSimulator<'a> {
    pub fn new(
        model: &'a CalibratedElectricityModel,
        grid: &HourlyGrid,
        holidays: &HolidayCalendar,
        seed: u64,
    ) -> Result<Self> {
        model.validate()?;
        Ok(Self {
            model,
            calendar: grid.calendar_columns(holidays),
            hours: grid.hours(),
            seed,
        })
    }

    /// Feature rows for one trial.
    pub fn feature_rows(
        &self,
        temperature: &[f64],
        deviation: &[f64],
        gas: &[f64],
    ) -> Vec<[f64; ELECTRICITY_FEATURES]> {
        let cal = &self.calendar;
        (0..self.hours)
            .map(|t| {
                [
                    temperature[t],
                    deviation[t],
                    cal.hour_of_day[t],
                    cal.day_of_week[t],
                    cal.is_working_day[t],
                    gas[t],
                    gas[t.saturating_sub(GAS_LAG_DAY)],
                    gas[t.saturating_sub(GAS_LAG_WEEK)],
                ]
            })
            .collect()
    }

    pub fn simulate_trial(
        &self,
        trial: usize,
        temperature: &[f64],
        deviation: &[f64],
        gas: &[f64],
    ) -> ElectricityTrial {
        let rows = self.feature_rows(temperature, deviation, gas);
        let mut rng = trial_rng(self.seed, RandomStream::Electricity, trial);
        let ArPath {
            innovations,
            values: stochastic,
        } = self.model.residual.simulate(self.hours, &mut rng);
        let price = rows
            .iter()
            .zip(&stochastic)
            .map(|(row, x)| (self.model.predictor.evaluate(row) + x).exp())
            .collect();
        ElectricityTrial {
            price,
            stochastic,
            innovations,
        }
    }

    /// Prices for the trials covered by `temperature` and `gas`.
    pub fn simulate(
        &self,
        temperature: &TemperatureBatch,
        gas: &PathBatch,
    ) -> Result<ElectricityBatch> {
        temperature
            .total
            .ensure_aligned(&temperature.stochastic, "temperature batch")?;
        temperature
            .total
            .ensure_aligned(gas, "temperature and gas batches")?;
        if gas.steps() != self.hours {
            return Err(dimension_mismatch(format!(
                "batches have {} hours, grid has {}",
                gas.steps(),
                self.hours
            )));
        }

        let first = gas.first_trial();
        let trials: Vec<ElectricityTrial> = map_trials(gas.trial_ids(), |trial| {
            let local = trial - first;
            self.simulate_trial(
                trial,
                temperature.total.path(local),
                temperature.stochastic.path(local),
                gas.path(local),
            )
        });

        let mut price = Vec::with_capacity(trials.len());
        let mut stochastic = Vec::with_capacity(trials.len());
        let mut innovations = Vec::with_capacity(trials.len());
        for t in trials {
            price.push(t.price);
            stochastic.push(t.stochastic);
            innovations.push(t.innovations);
        }
        Ok(ElectricityBatch {
            price: PathBatch::from_paths(first, self.hours, price)?,
            stochastic: PathBatch::from_paths(first, self.hours, stochastic)?,
            innovations: PathBatch::from_paths(first, self.hours, innovations)?,
        })
    }
}

//! Hourly temperature: deterministic seasonal curve plus sparse-lag AR residual.
//!
//! The seasonal predictor reads rows `[days_since_epoch, hour_of_day, day_of_year]`
//! (see [`HourlyGrid::seasonal_rows`]). Total temperature is `seasonal(t) + x_t` where
//! `x_t` follows the model's [`LaggedAutoregression`]. The residual `x_t` is kept as a
//! separate output because the electricity model uses it as a predictor.
use std::ops::Range;

use crate::core::{HourlyGrid, Result, invalid_model};
use crate::math::{RandomStream, trial_rng};
use crate::models::autoregression::LaggedAutoregression;
use crate::models::batch::{PathBatch, ensure_trials, map_trials};
use crate::models::predictor::{PredictorSpec, PricePredictor};

/// Width of the seasonal feature row.
pub const SEASONAL_FEATURES: usize = 3;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibratedTemperatureModel {
    pub seasonal: PredictorSpec,
    pub residual: LaggedAutoregression,
}

impl CalibratedTemperatureModel {
    pub fn validate(&self) -> Result<()> {
        self.seasonal
            .validate(SEASONAL_FEATURES)
            .map_err(|e| invalid_model(format!("temperature seasonal curve: {e}")))?;
        self.residual
            .validate()
            .map_err(|e| invalid_model(format!("temperature residual: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureBatch {
    /// AR residual only (temperature deviation from the seasonal curve).
    pub stochastic: PathBatch,
    /// Seasonal curve plus residual.
    pub total: PathBatch,
}

#[derive(Debug, Clone)]
pub struct TemperatureSimulator<'a> {
    model: &'a CalibratedTemperatureModel,
    seasonal: Vec<f64>,
    seed: u64,
}

impl<'a> TemperatureSimulator<'a> {
    /// Validates the model and evaluates the seasonal curve once over `grid`.
    pub fn new(model: &'a CalibratedTemperatureModel, grid: &HourlyGrid, seed: u64) -> Result<Self> {
        model.validate()?;
        let seasonal = grid
            .seasonal_rows()
            .iter()
            .map(|row| model.seasonal.evaluate(row))
            .collect();
        Ok(Self {
            model,
            seasonal,
            seed,
        })
    }

    pub fn seasonal_curve(&self) -> &[f64] {
        &self.seasonal
    }

    /// `(stochastic, total)` paths for one global trial id.
    pub fn simulate_trial(&self, trial: usize) -> (Vec<f64>, Vec<f64>) {
        let mut rng = trial_rng(self.seed, RandomStream::Temperature, trial);
        let stochastic = self
            .model
            .residual
            .simulate(self.seasonal.len(), &mut rng)
            .values;
        let total = stochastic
            .iter()
            .zip(&self.seasonal)
            .map(|(x, s)| x + s)
            .collect();
        (stochastic, total)
    }

    pub fn simulate(&self, trials: Range<usize>) -> Result<TemperatureBatch> {
        ensure_trials(&trials)?;
        let first = trials.start;
        let (stochastic, total): (Vec<_>, Vec<_>) =
            map_trials(trials, |t| self.simulate_trial(t)).into_iter().unzip();
        let steps = self.seasonal.len();
        Ok(TemperatureBatch {
            stochastic: PathBatch::from_paths(first, steps, stochastic)?,
            total: PathBatch::from_paths(first, steps, total)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    use super::*;
    use crate::core::SimulationError;
    use crate::math::NormalDistribution;
    use crate::models::predictor::{Harmonic, LinearSeasonalModel};

    fn model(std_dev: f64, presample: Vec<f64>) -> CalibratedTemperatureModel {
        CalibratedTemperatureModel {
            seasonal: LinearSeasonalModel {
                intercept: 15.0,
                coefficients: vec![],
                harmonics: vec![Harmonic {
                    feature: 1,
                    period: 24.0,
                    sin_coefficient: 0.0,
                    cos_coefficient: -5.0,
                }],
            }
            .into(),
            residual: LaggedAutoregression {
                lags: vec![1, 24],
                coefficients: vec![0.8, 0.1],
                distribution: NormalDistribution { mean: 0.0, std_dev }.into(),
                presample,
            },
        }
    }

    fn grid() -> HourlyGrid {
        HourlyGrid::from_days(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 3).unwrap()
    }

    #[test]
    fn zero_noise_zero_presample_reproduces_seasonal_curve() {
        let model = model(0.0, vec![0.0; 24]);
        let sim = TemperatureSimulator::new(&model, &grid(), 1).unwrap();
        let batch = sim.simulate(0..2).unwrap();
        assert_relative_eq!(batch.total.value(0, 0), 10.0, epsilon = 1e-12);
        assert_relative_eq!(batch.total.value(12, 1), 20.0, epsilon = 1e-12);
        assert!(batch.stochastic.path(1).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn total_is_seasonal_plus_stochastic() {
        let model = model(1.5, vec![0.3; 30]);
        let sim = TemperatureSimulator::new(&model, &grid(), 9).unwrap();
        let batch = sim.simulate(4..7).unwrap();
        assert_eq!(batch.total.trial_ids(), 4..7);
        for j in 0..3 {
            for (h, s) in sim.seasonal_curve().iter().enumerate() {
                assert_relative_eq!(
                    batch.total.value(h, j),
                    batch.stochastic.value(h, j) + s,
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn trial_paths_do_not_depend_on_batch_boundaries() {
        let model = model(1.0, vec![0.0; 24]);
        let sim = TemperatureSimulator::new(&model, &grid(), 3).unwrap();
        let whole = sim.simulate(0..6).unwrap();
        let tail = sim.simulate(4..6).unwrap();
        assert_eq!(whole.total.trial_path(5), tail.total.trial_path(5));
    }

    #[test]
    fn presample_shorter_than_max_lag_fails() {
        let model = model(1.0, vec![0.0; 23]);
        assert!(matches!(
            TemperatureSimulator::new(&model, &grid(), 1),
            Err(SimulationError::InvalidModelParameters(_))
        ));
    }
}

//! Daily natural-gas price: Euler-discretized Ornstein-Uhlenbeck process in log price.
//!
//! `X_{d+1} = X_d + alpha (mu - X_d) dt + sigma sqrt(dt) Z_d`, `Z_d ~ N(0, 1)` i.i.d.,
//! one step per calendar day, price `exp(X_d)`. Day 0 carries the starting state. Daily
//! prices are held constant over the 24 hours of their day.
use std::ops::Range;

use rand_distr::{Distribution, StandardNormal};

use crate::core::{HOURS_PER_DAY, HourlyGrid, Result, invalid_model};
use crate::math::{RandomStream, trial_rng};
use crate::models::batch::{PathBatch, ensure_trials, map_trials};

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibratedNaturalGasModel {
    /// `alpha`, per year.
    pub mean_reversion_rate: f64,
    /// `mu`, long-run log price.
    pub mean_level: f64,
    /// `sigma`, per sqrt(year).
    pub volatility: f64,
    /// `X_0`, log of the starting price.
    pub start_log_state: f64,
    /// Year fraction of one daily step.
    #[serde(default = "default_dt")]
    pub dt: f64,
}

fn default_dt() -> f64 {
    1.0 / 365.0
}

impl CalibratedNaturalGasModel {
    pub fn validate(&self) -> Result<()> {
        if !self.mean_reversion_rate.is_finite() || self.mean_reversion_rate <= 0.0 {
            return Err(invalid_model("gas mean_reversion_rate must be finite and > 0"));
        }
        if !self.mean_level.is_finite() {
            return Err(invalid_model("gas mean_level must be finite"));
        }
        if !self.volatility.is_finite() || self.volatility <= 0.0 {
            return Err(invalid_model("gas volatility must be finite and > 0"));
        }
        if !self.start_log_state.is_finite() {
            return Err(invalid_model("gas start_log_state must be finite"));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(invalid_model("gas dt must be finite and > 0"));
        }
        Ok(())
    }

    pub fn start_price(&self) -> f64 {
        self.start_log_state.exp()
    }

    /// Same dynamics started from `price`; only `X_0` changes.
    pub fn with_start_price(&self, price: f64) -> Result<Self> {
        if !price.is_finite() || price <= 0.0 {
            return Err(invalid_model(format!(
                "gas start price must be finite and > 0, got {price}"
            )));
        }
        Ok(Self {
            start_log_state: price.ln(),
            ..*self
        })
    }

    /// One Euler step of the log-price.
    #[inline]
    pub fn step_log(&self, x: f64, z: f64) -> f64 {
        let drift = self.mean_reversion_rate * (self.mean_level - x) * self.dt;
        let diffusion = self.volatility * self.dt.sqrt();
        x + drift + diffusion * z
    }
}

#[derive(Debug, Clone)]
pub struct NaturalGasSimulator {
    model: CalibratedNaturalGasModel,
    days: usize,
    seed: u64,
}

impl NaturalGasSimulator {
    /// `start_price` overrides the calibrated starting level when given.
    pub fn new(
        model: &CalibratedNaturalGasModel,
        grid: &HourlyGrid,
        seed: u64,
        start_price: Option<f64>,
    ) -> Result<Self> {
        model.validate()?;
        let model = match start_price {
            Some(price) => model.with_start_price(price)?,
            None => *model,
        };
        Ok(Self {
            model,
            days: grid.days(),
            seed,
        })
    }

    pub fn model(&self) -> &CalibratedNaturalGasModel {
        &self.model
    }

    /// Daily prices for one global trial id.
    pub fn simulate_daily_trial(&self, trial: usize) -> Vec<f64> {
        let mut rng = trial_rng(self.seed, RandomStream::NaturalGas, trial);
        let mut x = self.model.start_log_state;
        let mut prices = Vec::with_capacity(self.days);
        prices.push(x.exp());
        for _ in 1..self.days {
            let z: f64 = StandardNormal.sample(&mut rng);
            x = self.model.step_log(x, z);
            prices.push(x.exp());
        }
        prices
    }

    pub fn simulate_daily(&self, trials: Range<usize>) -> Result<PathBatch> {
        ensure_trials(&trials)?;
        let first = trials.start;
        let paths = map_trials(trials, |t| self.simulate_daily_trial(t));
        PathBatch::from_paths(first, self.days, paths)
    }

    /// Hourly prices: each daily value repeated 24 times.
    pub fn simulate(&self, trials: Range<usize>) -> Result<PathBatch> {
        ensure_trials(&trials)?;
        let first = trials.start;
        let paths = map_trials(trials, |t| hold_daily(&self.simulate_daily_trial(t)));
        PathBatch::from_paths(first, self.days * HOURS_PER_DAY, paths)
    }
}

/// Zero-order hold of a daily series onto the hourly grid.
pub fn hold_daily(daily: &[f64]) -> Vec<f64> {
    daily
        .iter()
        .flat_map(|&p| std::iter::repeat_n(p, HOURS_PER_DAY))
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    use super::*;

    fn model() -> CalibratedNaturalGasModel {
        CalibratedNaturalGasModel {
            mean_reversion_rate: 3.0,
            mean_level: 4.0_f64.ln(),
            volatility: 0.5,
            start_log_state: 2.5_f64.ln(),
            dt: 1.0 / 365.0,
        }
    }

    fn grid(days: usize) -> HourlyGrid {
        HourlyGrid::from_days(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), days).unwrap()
    }

    #[test]
    fn hourly_path_holds_daily_price_for_24_hours() {
        let sim = NaturalGasSimulator::new(&model(), &grid(5), 7, None).unwrap();
        let hourly = sim.simulate(0..3).unwrap();
        let daily = sim.simulate_daily(0..3).unwrap();
        assert_eq!(hourly.steps(), 120);
        for j in 0..3 {
            for h in 0..120 {
                assert_eq!(hourly.value(h, j), daily.value(h / 24, j));
            }
            assert_relative_eq!(hourly.value(0, j), 2.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn euler_step_matches_formula() {
        let m = model();
        let x = 1.0;
        let z = 0.3;
        let expected = x + 3.0 * (4.0_f64.ln() - x) / 365.0 + 0.5 * (1.0_f64 / 365.0).sqrt() * z;
        assert_relative_eq!(m.step_log(x, z), expected, epsilon = 1e-12);
    }

    #[test]
    fn start_price_override_changes_only_initial_state() {
        let base = model();
        let sim = NaturalGasSimulator::new(&base, &grid(2), 7, Some(6.0)).unwrap();
        let m = sim.model();
        assert_relative_eq!(m.start_price(), 6.0, epsilon = 1e-12);
        assert_eq!(m.mean_reversion_rate, base.mean_reversion_rate);
        assert_eq!(m.mean_level, base.mean_level);
        assert_eq!(m.volatility, base.volatility);
        assert!(NaturalGasSimulator::new(&base, &grid(2), 7, Some(-1.0)).is_err());
    }

    #[test]
    fn long_horizon_reverts_toward_mean_level() {
        let sim = NaturalGasSimulator::new(&model(), &grid(730), 11, None).unwrap();
        let daily = sim.simulate_daily(0..400).unwrap();
        let mean_final_log = daily
            .paths()
            .map(|p| p[p.len() - 1].ln())
            .sum::<f64>()
            / 400.0;
        let mu = 4.0_f64.ln();
        assert!((mean_final_log - mu).abs() < (2.5_f64.ln() - mu).abs() / 2.0);
    }

    #[test]
    fn non_positive_volatility_is_invalid() {
        let mut m = model();
        m.volatility = 0.0;
        assert!(m.validate().is_err());
    }
}

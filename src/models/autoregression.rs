//! Sparse-lag autoregressive residual shared by the temperature and electricity models.
//!
//! The recursion is
//!
//! `x_t = sum_l c_l * x_{t-l} + e_t`
//!
//! where `l` ranges over an arbitrary, possibly non-contiguous lag set (for hourly data
//! typically `{1, 2, 3, 4, 23, 24, 25, 48}`). Coefficients are addressed by the lag value
//! itself, never by position in a dense AR polynomial. The state is seeded with the last
//! `max(lags)` values of the calibration presample, identical for every trial.
use crate::core::{Result, invalid_model};
use crate::math::{ResidualDistribution, SampleableDistribution, TrialRng};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LaggedAutoregression {
    /// Hour offsets, each `>= 1`.
    pub lags: Vec<usize>,
    /// One coefficient per entry of `lags`.
    pub coefficients: Vec<f64>,
    pub distribution: ResidualDistribution,
    /// Trailing historical residuals, most recent last.
    pub presample: Vec<f64>,
}

/// One simulated residual path with the innovations that drove it.
#[derive(Debug, Clone, PartialEq)]
pub struct ArPath {
    pub innovations: Vec<f64>,
    pub values: Vec<f64>,
}

impl LaggedAutoregression {
    pub fn validate(&self) -> Result<()> {
        if self.lags.len() != self.coefficients.len() {
            return Err(invalid_model(format!(
                "{} lags but {} coefficients",
                self.lags.len(),
                self.coefficients.len()
            )));
        }
        if self.lags.contains(&0) {
            return Err(invalid_model("lag offsets must be >= 1"));
        }
        if self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(invalid_model("AR coefficients must be finite"));
        }
        let max_lag = self.max_lag();
        if self.presample.len() < max_lag {
            return Err(invalid_model(format!(
                "presample has {} values but the largest lag is {max_lag}",
                self.presample.len()
            )));
        }
        if self.presample.iter().any(|x| !x.is_finite()) {
            return Err(invalid_model("presample must be finite"));
        }
        self.distribution.validate()
    }

    pub fn max_lag(&self) -> usize {
        self.lags.iter().copied().max().unwrap_or(0)
    }

    /// Draws `steps` innovations and runs the recursion.
    pub fn simulate(&self, steps: usize, rng: &mut TrialRng) -> ArPath {
        let innovations = self.distribution.sample(rng, steps);
        let values = self.filter(&innovations);
        ArPath {
            innovations,
            values,
        }
    }

    /// Runs the recursion over given innovations.
    pub fn filter(&self, innovations: &[f64]) -> Vec<f64> {
        let max_lag = self.max_lag();
        let mut state = Vec::with_capacity(max_lag + innovations.len());
        state.extend_from_slice(&self.presample[self.presample.len() - max_lag..]);

        for (t, &e) in innovations.iter().enumerate() {
            let now = max_lag + t;
            let ar = self
                .lags
                .iter()
                .zip(&self.coefficients)
                .fold(0.0, |acc, (&lag, &c)| c.mul_add(state[now - lag], acc));
            state.push(ar + e);
        }

        state.split_off(max_lag)
    }
}

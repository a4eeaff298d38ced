//! Sampleable residual distributions for the autoregressive components.
//!
//! The calibration tool fits one of three innovation laws per model:
//! - [`NormalDistribution`]: Gaussian innovations,
//! - [`StudentTDistribution`]: location-scale Student-t for moderately heavy tails,
//! - [`ParetoTailDistribution`]: empirical interior with generalized-Pareto tails
//!   (piecewise semi-parametric), sampled by inverse transform.
//!
//! [`ResidualDistribution`] is the serde-tagged form stored in model bundles.
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, StudentT};

use crate::core::{Result, invalid_model};
use crate::math::rng::TrialRng;

/// Capability shared by every innovation law.
pub trait SampleableDistribution {
    fn validate(&self) -> Result<()>;

    /// One draw.
    fn draw(&self, rng: &mut TrialRng) -> f64;

    /// `n` independent draws.
    fn sample(&self, rng: &mut TrialRng, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.draw(rng)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormalDistribution {
    #[serde(default)]
    pub mean: f64,
    pub std_dev: f64,
}

impl SampleableDistribution for NormalDistribution {
    fn validate(&self) -> Result<()> {
        if !self.mean.is_finite() {
            return Err(invalid_model("normal mean must be finite"));
        }
        if !self.std_dev.is_finite() || self.std_dev < 0.0 {
            return Err(invalid_model("normal std_dev must be finite and >= 0"));
        }
        Ok(())
    }

    #[inline]
    fn draw(&self, rng: &mut TrialRng) -> f64 {
        let z: f64 = StandardNormal.sample(rng);
        self.std_dev.mul_add(z, self.mean)
    }
}

/// Location-scale Student-t: `location + scale * T(nu)`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StudentTDistribution {
    #[serde(default)]
    pub location: f64,
    pub scale: f64,
    pub degrees_of_freedom: f64,
}

impl SampleableDistribution for StudentTDistribution {
    fn validate(&self) -> Result<()> {
        if !self.location.is_finite() {
            return Err(invalid_model("student-t location must be finite"));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(invalid_model("student-t scale must be finite and > 0"));
        }
        if !self.degrees_of_freedom.is_finite() || self.degrees_of_freedom <= 0.0 {
            return Err(invalid_model(
                "student-t degrees_of_freedom must be finite and > 0",
            ));
        }
        Ok(())
    }

    fn draw(&self, rng: &mut TrialRng) -> f64 {
        self.sample(rng, 1).pop().unwrap_or(f64::NAN)
    }

    fn sample(&self, rng: &mut TrialRng, n: usize) -> Vec<f64> {
        // Unvalidated parameters surface as NaN and are caught as numeric anomalies.
        let Ok(t) = StudentT::new(self.degrees_of_freedom) else {
            return vec![f64::NAN; n];
        };
        (0..n)
            .map(|_| self.scale.mul_add(t.sample(rng), self.location))
            .collect()
    }
}

/// Semi-parametric law: linear-interpolated empirical quantiles between
/// `lower_probability` and `upper_probability`, generalized-Pareto tails beyond.
///
/// `interior` holds quantiles evenly spaced in probability over the interior band; its
/// first and last entries are the lower and upper tail thresholds.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParetoTailDistribution {
    pub lower_probability: f64,
    pub upper_probability: f64,
    pub interior: Vec<f64>,
    pub lower_tail: GeneralizedPareto,
    pub upper_tail: GeneralizedPareto,
}

/// Generalized Pareto exceedance law with shape `k` and scale `sigma`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeneralizedPareto {
    pub shape: f64,
    pub scale: f64,
}

impl GeneralizedPareto {
    fn validate(&self, side: &str) -> Result<()> {
        if !self.shape.is_finite() {
            return Err(invalid_model(format!("{side} tail shape must be finite")));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(invalid_model(format!(
                "{side} tail scale must be finite and > 0"
            )));
        }
        Ok(())
    }

    /// Exceedance with CDF value `q` in `[0, 1)`.
    #[inline]
    pub fn inverse_cdf(&self, q: f64) -> f64 {
        let survival = 1.0 - q;
        if self.shape.abs() < 1.0e-12 {
            -self.scale * survival.ln()
        } else {
            self.scale / self.shape * (survival.powf(-self.shape) - 1.0)
        }
    }
}

impl ParetoTailDistribution {
    /// Inverse CDF at probability `u` in `(0, 1)`.
    pub fn quantile(&self, u: f64) -> f64 {
        let lo = self.interior[0];
        let hi = self.interior[self.interior.len() - 1];
        if u < self.lower_probability {
            lo - self
                .lower_tail
                .inverse_cdf(1.0 - u / self.lower_probability)
        } else if u > self.upper_probability {
            hi + self
                .upper_tail
                .inverse_cdf(1.0 - (1.0 - u) / (1.0 - self.upper_probability))
        } else {
            let band = self.upper_probability - self.lower_probability;
            let rank = (u - self.lower_probability) / band * (self.interior.len() - 1) as f64;
            let i = (rank.floor() as usize).min(self.interior.len() - 2);
            let w = rank - i as f64;
            self.interior[i] + w * (self.interior[i + 1] - self.interior[i])
        }
    }
}

impl SampleableDistribution for ParetoTailDistribution {
    fn validate(&self) -> Result<()> {
        let (pl, pu) = (self.lower_probability, self.upper_probability);
        if !(pl.is_finite() && pu.is_finite() && 0.0 < pl && pl < pu && pu < 1.0) {
            return Err(invalid_model(
                "pareto tail probabilities must satisfy 0 < lower < upper < 1",
            ));
        }
        if self.interior.len() < 2 {
            return Err(invalid_model(
                "pareto tail interior needs at least two quantiles",
            ));
        }
        if self.interior.iter().any(|x| !x.is_finite()) {
            return Err(invalid_model("pareto tail interior must be finite"));
        }
        if self.interior.windows(2).any(|w| w[1] < w[0]) {
            return Err(invalid_model(
                "pareto tail interior quantiles must be non-decreasing",
            ));
        }
        self.lower_tail.validate("lower")?;
        self.upper_tail.validate("upper")
    }

    #[inline]
    fn draw(&self, rng: &mut TrialRng) -> f64 {
        let u = rng.random::<f64>().clamp(f64::EPSILON, 1.0 - f64::EPSILON);
        self.quantile(u)
    }
}

/// Serialized innovation law, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResidualDistribution {
    Normal(NormalDistribution),
    StudentT(StudentTDistribution),
    ParetoTail(ParetoTailDistribution),
}

impl SampleableDistribution for ResidualDistribution {
    fn validate(&self) -> Result<()> {
        match self {
            Self::Normal(d) => d.validate(),
            Self::StudentT(d) => d.validate(),
            Self::ParetoTail(d) => d.validate(),
        }
    }

    fn draw(&self, rng: &mut TrialRng) -> f64 {
        match self {
            Self::Normal(d) => d.draw(rng),
            Self::StudentT(d) => d.draw(rng),
            Self::ParetoTail(d) => d.draw(rng),
        }
    }

    fn sample(&self, rng: &mut TrialRng, n: usize) -> Vec<f64> {
        match self {
            Self::Normal(d) => d.sample(rng, n),
            Self::StudentT(d) => d.sample(rng, n),
            Self::ParetoTail(d) => d.sample(rng, n),
        }
    }
}

impl From<NormalDistribution> for ResidualDistribution {
    fn from(value: NormalDistribution) -> Self {
        Self::Normal(value)
    }
}

impl From<StudentTDistribution> for ResidualDistribution {
    fn from(value: StudentTDistribution) -> Self {
        Self::StudentT(value)
    }
}

impl From<ParetoTailDistribution> for ResidualDistribution {
    fn from(value: ParetoTailDistribution) -> Self {
        Self::ParetoTail(value)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;

    use super::*;
    use crate::math::stats::{empirical_quantile, mean};

    fn pareto() -> ParetoTailDistribution {
        ParetoTailDistribution {
            lower_probability: 0.1,
            upper_probability: 0.9,
            interior: vec![-1.0, -0.5, 0.0, 0.5, 1.0],
            lower_tail: GeneralizedPareto {
                shape: 0.2,
                scale: 0.5,
            },
            upper_tail: GeneralizedPareto {
                shape: 0.0,
                scale: 0.5,
            },
        }
    }

    #[test]
    fn normal_sample_moments() {
        let dist = NormalDistribution {
            mean: 1.0,
            std_dev: 2.0,
        };
        let mut rng = TrialRng::seed_from_u64(11);
        let xs = dist.sample(&mut rng, 20_000);
        let m = mean(&xs);
        let var = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64;
        assert_abs_diff_eq!(m, 1.0, epsilon = 0.06);
        assert_abs_diff_eq!(var.sqrt(), 2.0, epsilon = 0.06);
    }

    #[test]
    fn pareto_quantile_is_continuous_at_thresholds() {
        let dist = pareto();
        assert_abs_diff_eq!(dist.quantile(0.1), -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dist.quantile(0.1 - 1e-12), -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dist.quantile(0.9), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dist.quantile(0.9 + 1e-12), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dist.quantile(0.5), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn pareto_exponential_upper_tail_matches_closed_form() {
        // shape 0 is exponential: survival beyond threshold halves every scale * ln 2.
        let dist = pareto();
        let q = dist.quantile(0.95);
        assert_abs_diff_eq!(q, 1.0 + 0.5 * 2.0_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn pareto_samples_hit_tails_at_calibrated_rates() {
        let dist = pareto();
        dist.validate().unwrap();
        let mut rng = TrialRng::seed_from_u64(3);
        let mut xs = dist.sample(&mut rng, 40_000);
        let below = xs.iter().filter(|&&x| x < -1.0).count() as f64 / xs.len() as f64;
        assert_abs_diff_eq!(below, 0.1, epsilon = 0.01);
        assert_abs_diff_eq!(empirical_quantile(&mut xs, 0.5), 0.0, epsilon = 0.05);
    }

    #[test]
    fn student_t_rejects_non_positive_dof() {
        let dist = StudentTDistribution {
            location: 0.0,
            scale: 1.0,
            degrees_of_freedom: 0.0,
        };
        assert!(dist.validate().is_err());
    }

    #[test]
    fn residual_distribution_json_is_tagged() {
        let dist: ResidualDistribution = serde_json::from_str(
            r#"{"kind":"student_t","location":0.0,"scale":1.5,"degrees_of_freedom":5.0}"#,
        )
        .unwrap();
        assert_eq!(
            dist,
            ResidualDistribution::StudentT(StudentTDistribution {
                location: 0.0,
                scale: 1.5,
                degrees_of_freedom: 5.0,
            })
        );
        assert!(dist.validate().is_ok());
    }
}

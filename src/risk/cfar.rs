//! Cash-Flow-at-Risk on simulated per-trial earnings.
//!
//! `CFaR_c = E[X] - q_{1-c}(X)`: the shortfall of the `(1 - c)` earnings percentile
//! below expected earnings. Percentiles interpolate linearly at rank `p * (n - 1)`.
use crate::core::{Result, SimulationError, dimension_mismatch};
use crate::math::{empirical_quantile, mean};

/// Expected earnings with the 90% and 95% CFaR of one distribution.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CashFlowAtRisk {
    pub expected_profit: f64,
    pub cfar_90: f64,
    pub cfar_95: f64,
}

impl CashFlowAtRisk {
    pub fn from_samples(earnings: &[f64]) -> Result<Self> {
        check_samples(earnings)?;
        let expected_profit = mean(earnings);
        let mut sorted = earnings.to_vec();
        let p10 = empirical_quantile(&mut sorted, 0.10);
        let p05 = empirical_quantile(&mut sorted, 0.05);
        Ok(Self {
            expected_profit,
            cfar_90: expected_profit - p10,
            cfar_95: expected_profit - p05,
        })
    }
}

/// CFaR at an arbitrary `confidence` in `(0, 1)`.
///
/// # Examples
/// ```rust
/// use sparkrisk::risk::cash_flow_at_risk;
///
/// let earnings: Vec<f64> = (0..=100).map(|x| x as f64).collect();
/// let cfar = cash_flow_at_risk(&earnings, 0.90).unwrap();
/// assert!((cfar - 40.0).abs() < 1e-12);
/// ```
pub fn cash_flow_at_risk(earnings: &[f64], confidence: f64) -> Result<f64> {
    check_samples(earnings)?;
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(SimulationError::InvalidConfiguration(format!(
            "confidence must be in (0, 1), got {confidence}"
        )));
    }
    let mut sorted = earnings.to_vec();
    Ok(mean(earnings) - empirical_quantile(&mut sorted, 1.0 - confidence))
}

/// Per-trial sum across assets; `per_asset[a][j]` is asset `a`'s earnings in trial `j`.
pub fn portfolio_earnings(per_asset: &[Vec<f64>]) -> Result<Vec<f64>> {
    let Some(first) = per_asset.first() else {
        return Err(dimension_mismatch("portfolio has no assets"));
    };
    let trials = first.len();
    if let Some(bad) = per_asset.iter().find(|a| a.len() != trials) {
        return Err(dimension_mismatch(format!(
            "asset earnings cover {} trials, expected {trials}",
            bad.len()
        )));
    }
    Ok((0..trials)
        .map(|j| per_asset.iter().map(|a| a[j]).sum())
        .collect())
}

fn check_samples(earnings: &[f64]) -> Result<()> {
    if earnings.is_empty() {
        return Err(dimension_mismatch("earnings sample is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, StandardNormal};

    use super::*;

    fn normal_sample(seed: u64, n: usize, mu: f64, sigma: f64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let z: f64 = StandardNormal.sample(&mut rng);
                mu + sigma * z
            })
            .collect()
    }

    #[test]
    fn cfar_measures_distance_below_mean() {
        let earnings: Vec<f64> = (1..=11).map(|x| x as f64 * 10.0).collect();
        let risk = CashFlowAtRisk::from_samples(&earnings).unwrap();
        assert_relative_eq!(risk.expected_profit, 60.0);
        // rank 1.0 -> 20, rank 0.5 -> 15
        assert_relative_eq!(risk.cfar_90, 40.0, epsilon = 1e-12);
        assert_relative_eq!(risk.cfar_95, 45.0, epsilon = 1e-12);
        assert_relative_eq!(
            cash_flow_at_risk(&earnings, 0.95).unwrap(),
            risk.cfar_95,
            epsilon = 1e-12
        );
    }

    #[test]
    fn cfar_95_dominates_cfar_90() {
        let earnings = normal_sample(3, 2_000, 1.0e6, 2.5e5);
        let risk = CashFlowAtRisk::from_samples(&earnings).unwrap();
        assert!(risk.cfar_95 >= risk.cfar_90);
        assert!(risk.cfar_90 > 0.0);
    }

    #[test]
    fn constant_earnings_carry_no_risk() {
        let risk = CashFlowAtRisk::from_samples(&[5.0; 40]).unwrap();
        assert_relative_eq!(risk.cfar_90, 0.0);
        assert_relative_eq!(risk.cfar_95, 0.0);
    }

    #[test]
    fn independent_assets_diversify() {
        let a = normal_sample(11, 5_000, 100.0, 20.0);
        let b = normal_sample(12, 5_000, 80.0, 20.0);
        let total = portfolio_earnings(&[a.clone(), b.clone()]).unwrap();
        let ra = CashFlowAtRisk::from_samples(&a).unwrap();
        let rb = CashFlowAtRisk::from_samples(&b).unwrap();
        let rp = CashFlowAtRisk::from_samples(&total).unwrap();
        assert_relative_eq!(rp.expected_profit, ra.expected_profit + rb.expected_profit, epsilon = 1e-9);
        assert!(rp.cfar_95 <= ra.cfar_95 + rb.cfar_95);
        assert!(rp.cfar_90 <= ra.cfar_90 + rb.cfar_90);
    }

    #[test]
    fn rejects_empty_and_out_of_range_inputs() {
        assert!(matches!(
            CashFlowAtRisk::from_samples(&[]),
            Err(SimulationError::DimensionMismatch(_))
        ));
        assert!(matches!(
            cash_flow_at_risk(&[1.0, 2.0], 1.0),
            Err(SimulationError::InvalidConfiguration(_))
        ));
        assert!(portfolio_earnings(&[vec![1.0, 2.0], vec![1.0]]).is_err());
        assert!(portfolio_earnings(&[]).is_err());
    }
}

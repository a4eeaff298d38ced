//! Engine configuration loaded from TOML.

use crate::core::{Result, SimulationError};

/// Default number of trials simulated together in one batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Handling of trials whose simulated paths contain NaN or infinities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyPolicy {
    /// Fail the whole run with [`SimulationError::NumericAnomaly`].
    #[default]
    Abort,
    /// Drop the trial from every asset's and the portfolio's statistics.
    ExcludeTrial,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Trials per batch; bounds peak memory of the path matrices.
    pub batch_size: usize,
    /// Base seed from which every per-trial random stream is derived.
    pub seed: u64,
    /// Replaces the calibrated starting gas price (initial OU state only).
    pub gas_start_price: Option<f64>,
    pub anomaly_policy: AnomalyPolicy,
    /// Keep every (asset, trial) daily cash-flow series in the report.
    pub retain_daily_cashflows: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            seed: 42,
            gas_start_price: None,
            anomaly_policy: AnomalyPolicy::Abort,
            retain_daily_cashflows: false,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(payload: &str) -> Result<Self> {
        let config: Self = toml::from_str(payload)
            .map_err(|e| SimulationError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "batch_size must be > 0".to_string(),
            ));
        }
        if let Some(price) = self.gas_start_price
            && (!price.is_finite() || price <= 0.0)
        {
            return Err(SimulationError::InvalidModelParameters(format!(
                "gas_start_price must be finite and > 0, got {price}"
            )));
        }
        Ok(())
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_gas_start_price(mut self, price: f64) -> Self {
        self.gas_start_price = Some(price);
        self
    }

    pub fn with_anomaly_policy(mut self, policy: AnomalyPolicy) -> Self {
        self.anomaly_policy = policy;
        self
    }

    pub fn with_daily_cashflows(mut self, retain: bool) -> Self {
        self.retain_daily_cashflows = retain;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.batch_size, 100);
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let config = EngineConfig::from_toml_str(
            r#"
            batch_size = 50
            seed = 7
            gas_start_price = 3.25
            anomaly_policy = "exclude_trial"
            "#,
        )
        .unwrap();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.seed, 7);
        assert_eq!(config.gas_start_price, Some(3.25));
        assert_eq!(config.anomaly_policy, AnomalyPolicy::ExcludeTrial);
        assert!(!config.retain_daily_cashflows);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("batch_size = 0"),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(EngineConfig::from_toml_str("batchsize = 10").is_err());
    }
}

//! JSON payloads for calibrated model bundles, asset lists, and risk reports.
//!
//! # Examples
//! ```rust
//! use sparkrisk::core::load_assets_json;
//!
//! let assets = load_assets_json(
//!     r#"[{"name": "peaker", "capacity": 100.0, "heat_rate": 8000.0, "vom": 1.0, "min_run_hours": 4}]"#,
//! )
//! .unwrap();
//! assert_eq!(assets[0].min_run_hours, 4);
//! ```
use serde::de::DeserializeOwned;

use crate::core::{Asset, Result, SimulationError};
use crate::models::{
    CalibratedElectricityModel, CalibratedNaturalGasModel, CalibratedTemperatureModel,
};

/// The three calibrated models consumed by one engine run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelBundle {
    pub temperature: CalibratedTemperatureModel,
    pub natural_gas: CalibratedNaturalGasModel,
    pub electricity: CalibratedElectricityModel,
}

impl ModelBundle {
    pub fn validate(&self) -> Result<()> {
        self.temperature.validate()?;
        self.natural_gas.validate()?;
        self.electricity.validate()
    }

    /// Parses and validates a bundle.
    pub fn from_json_str(payload: &str) -> Result<Self> {
        let bundle: Self = from_json(payload)
            .map_err(|e| SimulationError::InvalidModelParameters(e.to_string()))?;
        bundle.validate()?;
        Ok(bundle)
    }
}

/// Parses a JSON array of assets and validates each entry.
pub fn load_assets_json(payload: &str) -> Result<Vec<Asset>> {
    let assets: Vec<Asset> =
        from_json(payload).map_err(|e| SimulationError::InvalidAssetSpec(e.to_string()))?;
    for asset in &assets {
        asset.validate()?;
    }
    Ok(assets)
}

/// Serialize a value into pretty JSON.
pub fn to_json_pretty<T: serde::Serialize>(value: &T) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Deserialize a value from JSON.
pub fn from_json<T: DeserializeOwned>(payload: &str) -> std::result::Result<T, serde_json::Error> {
    serde_json::from_str(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_without_optional_fields_defaults_name_and_vom() {
        let assets =
            load_assets_json(r#"[{"capacity": 50.0, "heat_rate": 7000.0, "min_run_hours": 1}]"#)
                .unwrap();
        assert_eq!(assets[0].vom, 0.0);
        assert!(assets[0].name.is_empty());
    }

    #[test]
    fn invalid_asset_in_list_is_rejected() {
        let err = load_assets_json(
            r#"[{"capacity": 50.0, "heat_rate": 7000.0, "min_run_hours": 30}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidAssetSpec(_)));
    }

    #[test]
    fn malformed_bundle_reports_model_error() {
        let err = ModelBundle::from_json_str("{\"temperature\": 1}").unwrap_err();
        assert!(matches!(err, SimulationError::InvalidModelParameters(_)));
    }

    #[test]
    fn bundle_json_round_trips() {
        let payload = r#"{
          "temperature": {
            "seasonal": {"kind": "linear_seasonal", "intercept": 12.0, "coefficients": [], "harmonics": []},
            "residual": {"lags": [1], "coefficients": [0.8],
                         "distribution": {"kind": "normal", "std_dev": 1.0}, "presample": [0.0]}
          },
          "natural_gas": {"mean_reversion_rate": 2.0, "mean_level": 1.2, "volatility": 0.4, "start_log_state": 1.0},
          "electricity": {
            "predictor": {"kind": "regression_tree", "trees": [{"nodes": [{"leaf": {"value": 3.4}}]}]},
            "residual": {"lags": [1, 24], "coefficients": [0.6, 0.2],
                         "distribution": {"kind": "student_t", "scale": 0.1, "degrees_of_freedom": 5.0},
                         "presample": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
                                       0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]}
          }
        }"#;
        let bundle = ModelBundle::from_json_str(payload).unwrap();
        let again: ModelBundle = from_json(&to_json_pretty(&bundle).unwrap()).unwrap();
        assert_eq!(bundle, again);
    }
}

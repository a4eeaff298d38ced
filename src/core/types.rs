use crate::core::{Result, SimulationError};

/// Hours in one dispatch day.
pub const HOURS_PER_DAY: usize = 24;

/// Gas-fired generating unit.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Asset {
    /// Display label used in reports.
    #[serde(default)]
    pub name: String,
    /// Nameplate capacity in MW.
    pub capacity: f64,
    /// Heat rate in Btu/kWh.
    pub heat_rate: f64,
    /// Variable O&M cost in $/MWh.
    #[serde(default)]
    pub vom: f64,
    /// Minimum contiguous run length in hours, `1..=24`.
    pub min_run_hours: usize,
}

impl Asset {
    pub fn new(
        name: impl Into<String>,
        capacity: f64,
        heat_rate: f64,
        vom: f64,
        min_run_hours: usize,
    ) -> Result<Self> {
        let asset = Self {
            name: name.into(),
            capacity,
            heat_rate,
            vom,
            min_run_hours,
        };
        asset.validate()?;
        Ok(asset)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.capacity.is_finite() || self.capacity <= 0.0 {
            return Err(SimulationError::InvalidAssetSpec(format!(
                "{}: capacity must be finite and > 0",
                self.label()
            )));
        }
        if !self.heat_rate.is_finite() || self.heat_rate <= 0.0 {
            return Err(SimulationError::InvalidAssetSpec(format!(
                "{}: heat_rate must be finite and > 0",
                self.label()
            )));
        }
        if !self.vom.is_finite() {
            return Err(SimulationError::InvalidAssetSpec(format!(
                "{}: vom must be finite",
                self.label()
            )));
        }
        if !(1..=HOURS_PER_DAY).contains(&self.min_run_hours) {
            return Err(SimulationError::InvalidAssetSpec(format!(
                "{}: min_run_hours must be in [1, 24], got {}",
                self.label(),
                self.min_run_hours
            )));
        }
        Ok(())
    }

    /// Hourly margin per MW: `power - heat_rate / 1000 * gas - vom`.
    #[inline]
    pub fn spark_spread(&self, electricity_price: f64, gas_price: f64) -> f64 {
        electricity_price - self.heat_rate / 1000.0 * gas_price - self.vom
    }

    fn label(&self) -> &str {
        if self.name.is_empty() { "asset" } else { &self.name }
    }
}

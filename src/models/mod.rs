//! Stochastic drivers of the cash-flow simulation.
//!
//! Pipeline per batch of trials: temperature, then natural gas (independent of
//! temperature), then electricity conditioned on both. Every simulator draws from its
//! own per-trial random stream so results do not depend on batch boundaries.

pub mod autoregression;
pub mod batch;
pub mod electricity;
pub mod natural_gas;
pub mod predictor;
pub mod temperature;

pub use autoregression::{ArPath, LaggedAutoregression};
pub use batch::PathBatch;
pub use electricity::{
    CalibratedElectricityModel, ELECTRICITY_FEATURES, ElectricityBatch, ElectricityPriceSimulator,
    ElectricityTrial, GAS_LAG_DAY, GAS_LAG_WEEK,
};
pub use natural_gas::{CalibratedNaturalGasModel, NaturalGasSimulator, hold_daily};
pub use predictor::{
    Harmonic, LinearSeasonalModel, PredictorSpec, PricePredictor, RegressionTree,
    RegressionTreePredictor, TreeNode,
};
pub use temperature::{
    CalibratedTemperatureModel, SEASONAL_FEATURES, TemperatureBatch, TemperatureSimulator,
};

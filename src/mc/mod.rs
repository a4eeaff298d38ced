//! Portfolio Monte Carlo: trial batching, the simulation engine and its report.

pub mod batching;
pub mod engine;
pub mod report;

pub use batching::{Anomaly, ResultsAccumulator, TrialBatches};
pub use engine::{BatchProgress, PortfolioSimulationEngine};
pub use report::{AssetRiskSummary, OperatingStats, PortfolioRiskReport};

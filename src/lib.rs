//! Sparkrisk values gas-fired generation under price uncertainty.
//!
//! The crate simulates correlated hourly temperature, natural-gas and electricity price
//! paths from calibrated models, dispatches each plant day by day in its most profitable
//! contiguous block of at least its minimum run length, and aggregates per-trial
//! earnings into expected profit and Cash-Flow-at-Risk (CFaR) per asset and for the
//! portfolio.
//!
//! Layout:
//! - [`core`]: assets, errors, configuration, calendars and the hourly grid,
//! - [`math`]: per-trial random streams, innovation laws, sample statistics,
//! - [`models`]: temperature, gas and electricity simulators,
//! - [`dispatch`]: the daily min-run block search,
//! - [`risk`]: CFaR measures,
//! - [`mc`]: the batched portfolio engine,
//! - [`backtest`]: dispatch against realized prices.
//!
//! # Feature Flags
//! - `parallel` (default): Rayon-powered trial generation and dispatch within a batch.
//!   Results are identical with and without it.
//!
//! # Quick Start
//! Dispatch one plant on a known day:
//! ```rust
//! use sparkrisk::core::Asset;
//! use sparkrisk::dispatch::dispatch;
//!
//! let plant = Asset::new("ct-1", 100.0, 10_000.0, 2.0, 4).unwrap();
//! let power: Vec<f64> = (0..24).map(|h| if (12..18).contains(&h) { 60.0 } else { 25.0 }).collect();
//! let gas = vec![3.0; 24];
//! let result = dispatch(&plant, &power, &gas).unwrap();
//! assert_eq!(result.operating_days, 1);
//! assert!((result.profit - 6.0 * 28.0 * 100.0).abs() < 1e-9);
//! ```

pub mod backtest;
pub mod core;
pub mod dispatch;
pub mod math;
pub mod mc;
pub mod models;
pub mod risk;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::dispatch::{DispatchResult, dispatch};
    pub use crate::mc::{PortfolioRiskReport, PortfolioSimulationEngine};
    pub use crate::risk::CashFlowAtRisk;
}

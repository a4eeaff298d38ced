//! Downside-risk measures on simulated earnings distributions.

pub mod cfar;

pub use cfar::{CashFlowAtRisk, cash_flow_at_risk, portfolio_earnings};

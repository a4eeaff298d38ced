//! Library-wide error type.

use std::fmt;

/// Pipeline stage that produced a non-finite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SimulationStage {
    Temperature,
    NaturalGas,
    Electricity,
    Dispatch,
    /// Summing trials or assets into a risk figure.
    Aggregation,
}

impl fmt::Display for SimulationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Temperature => "temperature",
            Self::NaturalGas => "natural gas",
            Self::Electricity => "electricity",
            Self::Dispatch => "dispatch",
            Self::Aggregation => "aggregation",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by simulators, dispatch, and the portfolio engine.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Calibrated model bundle is malformed.
    #[error("invalid model parameters: {0}")]
    InvalidModelParameters(String),
    /// Asset record violates its physical constraints.
    #[error("invalid asset spec: {0}")]
    InvalidAssetSpec(String),
    /// Path lengths or trial counts do not line up.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    /// Engine or batch configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Historical data collaborator failed; the source error is kept intact.
    #[error("data fetch failure")]
    DataFetchFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// A simulation step produced NaN or an infinity.
    #[error("numeric anomaly in {stage} simulation: trial {trial}, hour {step}")]
    NumericAnomaly {
        stage: SimulationStage,
        trial: usize,
        step: usize,
    },
    /// The progress callback asked the run to stop.
    #[error("simulation cancelled after {completed_trials} trials")]
    Cancelled { completed_trials: usize },
}

pub type Result<T> = std::result::Result<T, SimulationError>;

pub(crate) fn invalid_model(msg: impl Into<String>) -> SimulationError {
    SimulationError::InvalidModelParameters(msg.into())
}

pub(crate) fn dimension_mismatch(msg: impl Into<String>) -> SimulationError {
    SimulationError::DimensionMismatch(msg.into())
}

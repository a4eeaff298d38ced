//! Numerical building blocks: random streams, innovation laws, sample statistics.

pub mod distributions;
pub mod rng;
pub mod stats;

pub use distributions::{
    GeneralizedPareto, NormalDistribution, ParetoTailDistribution, ResidualDistribution,
    SampleableDistribution, StudentTDistribution,
};
pub use rng::{RandomStream, TrialRng, trial_rng, trial_seed};
pub use stats::{empirical_quantile, mean, percentile};

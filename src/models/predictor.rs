//! Deterministic predictors: seasonal curves and bagged regression trees.
//!
//! Both evaluate one feature row at a time. Feature layouts are fixed by the consuming
//! simulator (see `temperature` and `electricity`); `validate` checks that every column a
//! predictor reads exists in that layout.
use std::f64::consts::TAU;

use crate::core::{Result, invalid_model};

pub trait PricePredictor {
    /// Checks the predictor against a feature row of width `n_features`.
    fn validate(&self, n_features: usize) -> Result<()>;

    fn evaluate(&self, features: &[f64]) -> f64;
}

/// One node of a binary regression tree, stored in a flat array.
///
/// Rows with `features[feature] < threshold` descend left; others (NaN included)
/// descend right.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Binary regression tree rooted at node 0; children always follow their parent.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(invalid_model("regression tree has no nodes"));
        }
        let n = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(invalid_model(format!(
                            "tree node {i} splits on feature {feature}, row has {n_features}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(invalid_model(format!("tree node {i} threshold is not finite")));
                    }
                    if left <= i || right <= i || left >= n || right >= n {
                        return Err(invalid_model(format!(
                            "tree node {i} has out-of-order children ({left}, {right})"
                        )));
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(invalid_model(format!("tree leaf {i} is not finite")));
                    }
                }
            }
        }
        Ok(())
    }

    #[inline]
    fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[feature] < threshold { left } else { right };
                }
            }
        }
    }
}

/// Bagged ensemble: the prediction is the mean of its trees.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegressionTreePredictor {
    pub trees: Vec<RegressionTree>,
}

impl PricePredictor for RegressionTreePredictor {
    fn validate(&self, n_features: usize) -> Result<()> {
        if self.trees.is_empty() {
            return Err(invalid_model("regression tree ensemble is empty"));
        }
        self.trees.iter().try_for_each(|t| t.validate(n_features))
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        sum / self.trees.len() as f64
    }
}

/// Sinusoid of period `period` (in units of `feature`).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Harmonic {
    pub feature: usize,
    pub period: f64,
    #[serde(default)]
    pub sin_coefficient: f64,
    #[serde(default)]
    pub cos_coefficient: f64,
}

/// `intercept + sum_i b_i x_i + sum_h (s_h sin(2 pi x_f / P_h) + c_h cos(2 pi x_f / P_h))`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LinearSeasonalModel {
    pub intercept: f64,
    /// Linear loadings on the leading feature columns.
    #[serde(default)]
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub harmonics: Vec<Harmonic>,
}

impl PricePredictor for LinearSeasonalModel {
    fn validate(&self, n_features: usize) -> Result<()> {
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(invalid_model("seasonal model terms must be finite"));
        }
        if self.coefficients.len() > n_features {
            return Err(invalid_model(format!(
                "seasonal model has {} linear terms, row has {n_features}",
                self.coefficients.len()
            )));
        }
        for h in &self.harmonics {
            if h.feature >= n_features {
                return Err(invalid_model(format!(
                    "harmonic reads feature {}, row has {n_features}",
                    h.feature
                )));
            }
            if !h.period.is_finite() || h.period <= 0.0 {
                return Err(invalid_model("harmonic period must be finite and > 0"));
            }
            if !h.sin_coefficient.is_finite() || !h.cos_coefficient.is_finite() {
                return Err(invalid_model("harmonic coefficients must be finite"));
            }
        }
        Ok(())
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        let linear = self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (b, x)| b.mul_add(*x, acc));
        self.harmonics.iter().fold(linear, |acc, h| {
            let (s, c) = (TAU * features[h.feature] / h.period).sin_cos();
            acc + h.sin_coefficient * s + h.cos_coefficient * c
        })
    }
}

/// Serialized predictor, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictorSpec {
    RegressionTree(RegressionTreePredictor),
    LinearSeasonal(LinearSeasonalModel),
}

impl PricePredictor for PredictorSpec {
    fn validate(&self, n_features: usize) -> Result<()> {
        match self {
            Self::RegressionTree(p) => p.validate(n_features),
            Self::LinearSeasonal(p) => p.validate(n_features),
        }
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        match self {
            Self::RegressionTree(p) => p.evaluate(features),
            Self::LinearSeasonal(p) => p.evaluate(features),
        }
    }
}

impl From<RegressionTreePredictor> for PredictorSpec {
    fn from(value: RegressionTreePredictor) -> Self {
        Self::RegressionTree(value)
    }
}

impl From<LinearSeasonalModel> for PredictorSpec {
    fn from(value: LinearSeasonalModel) -> Self {
        Self::LinearSeasonal(value)
    }
}

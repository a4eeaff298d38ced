//! Batch-local path matrices.

use std::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::{Result, dimension_mismatch};

/// Hours-by-trial matrix of one simulated quantity for a contiguous range of global
/// trial ids.
///
/// Storage is trial-major: the full path of each trial is one contiguous slice.
#[derive(Debug, Clone, PartialEq)]
pub struct PathBatch {
    steps: usize,
    first_trial: usize,
    values: Vec<f64>,
}

impl PathBatch {
    /// Concatenates per-trial paths; `paths[j]` belongs to trial `first_trial + j`.
    pub fn from_paths(first_trial: usize, steps: usize, paths: Vec<Vec<f64>>) -> Result<Self> {
        if steps == 0 {
            return Err(dimension_mismatch("paths must have at least one step"));
        }
        if let Some((j, p)) = paths.iter().enumerate().find(|(_, p)| p.len() != steps) {
            return Err(dimension_mismatch(format!(
                "trial {} has {} steps, expected {steps}",
                first_trial + j,
                p.len()
            )));
        }
        let mut values = Vec::with_capacity(steps * paths.len());
        for path in paths {
            values.extend(path);
        }
        Ok(Self {
            steps,
            first_trial,
            values,
        })
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn trials(&self) -> usize {
        self.values.len() / self.steps
    }

    pub fn first_trial(&self) -> usize {
        self.first_trial
    }

    /// Global trial ids covered by this batch.
    pub fn trial_ids(&self) -> Range<usize> {
        self.first_trial..self.first_trial + self.trials()
    }

    /// Path of the `local`-th trial in the batch.
    pub fn path(&self, local: usize) -> &[f64] {
        &self.values[local * self.steps..(local + 1) * self.steps]
    }

    /// Path of global trial `trial`, if this batch holds it.
    pub fn trial_path(&self, trial: usize) -> Option<&[f64]> {
        self.trial_ids()
            .contains(&trial)
            .then(|| self.path(trial - self.first_trial))
    }

    pub fn paths(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.steps)
    }

    pub fn value(&self, step: usize, local: usize) -> f64 {
        self.values[local * self.steps + step]
    }

    /// `(global trial, step)` of the first NaN/infinite value of each affected trial.
    pub fn non_finite(&self) -> Vec<(usize, usize)> {
        self.paths()
            .enumerate()
            .filter_map(|(j, path)| {
                path.iter()
                    .position(|x| !x.is_finite())
                    .map(|step| (self.first_trial + j, step))
            })
            .collect()
    }

    /// Fails unless `other` covers the same trials with the same number of steps.
    pub fn ensure_aligned(&self, other: &Self, what: &str) -> Result<()> {
        if self.trial_ids() != other.trial_ids() {
            return Err(dimension_mismatch(format!(
                "{what}: trial ranges {:?} and {:?} differ",
                self.trial_ids(),
                other.trial_ids()
            )));
        }
        if self.steps != other.steps {
            return Err(dimension_mismatch(format!(
                "{what}: {} vs {} steps",
                self.steps, other.steps
            )));
        }
        Ok(())
    }
}

/// Evaluates `f` for every trial id, in parallel when the `parallel` feature is on.
/// Output order follows `trials`.
pub(crate) fn map_trials<T, F>(trials: Range<usize>, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        trials.into_par_iter().map(f).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        trials.map(f).collect()
    }
}

pub(crate) fn ensure_trials(trials: &Range<usize>) -> Result<()> {
    if trials.is_empty() {
        return Err(dimension_mismatch("trial range must not be empty"));
    }
    Ok(())
}

//! Best contiguous run block within one 24-hour day.
//!
//! For minimum run `m`, candidates are every `(start, length)` with `m <= length <= 24`
//! and `start + length <= 24`. Length-`m` sums come from a moving window; longer blocks
//! extend the previous length in place:
//!
//! `sum(s, k) = sum(s, k - 1) + margin[s + k - 1]`
//!
//! which keeps the whole search at `O(24^2)` per day.
use crate::core::{HOURS_PER_DAY, Result, SimulationError, dimension_mismatch};

/// A contiguous generation block inside one day.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DispatchBlock {
    /// First hour of the block (0 = midnight).
    pub start: usize,
    /// Number of hours run.
    pub length: usize,
    /// Sum of per-MWh margins over the block.
    pub earnings: f64,
}

impl DispatchBlock {
    /// Hour after the last hour run.
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

fn check_day(margins: &[f64], min_run: usize) -> Result<()> {
    if margins.len() != HOURS_PER_DAY {
        return Err(dimension_mismatch(format!(
            "a dispatch day needs {HOURS_PER_DAY} hourly margins, got {}",
            margins.len()
        )));
    }
    if !(1..=HOURS_PER_DAY).contains(&min_run) {
        return Err(SimulationError::InvalidAssetSpec(format!(
            "min_run_hours must be in [1, {HOURS_PER_DAY}], got {min_run}"
        )));
    }
    Ok(())
}

/// Visits every candidate by increasing length, then increasing start.
///
/// Callers guarantee `margins.len() == 24` and `1 <= min_run <= 24`.
fn scan(margins: &[f64], min_run: usize, mut visit: impl FnMut(DispatchBlock)) {
    let positions = HOURS_PER_DAY + 1 - min_run;
    let mut sums = [0.0_f64; HOURS_PER_DAY];

    sums[0] = margins[..min_run].iter().sum();
    for s in 1..positions {
        sums[s] = sums[s - 1] - margins[s - 1] + margins[s + min_run - 1];
    }
    for (start, &earnings) in sums[..positions].iter().enumerate() {
        visit(DispatchBlock {
            start,
            length: min_run,
            earnings,
        });
    }

    for length in min_run + 1..=HOURS_PER_DAY {
        for start in 0..=HOURS_PER_DAY - length {
            sums[start] += margins[start + length - 1];
            visit(DispatchBlock {
                start,
                length,
                earnings: sums[start],
            });
        }
    }
}

/// The full candidate table in scan order.
pub fn candidate_blocks(margins: &[f64], min_run: usize) -> Result<Vec<DispatchBlock>> {
    check_day(margins, min_run)?;
    let positions = HOURS_PER_DAY + 1 - min_run;
    let mut blocks = Vec::with_capacity(positions * (positions + 1) / 2);
    scan(margins, min_run, |b| blocks.push(b));
    Ok(blocks)
}

/// Highest-earning candidate. Ties keep the first one scanned: shortest block, then
/// earliest start.
pub fn best_block(margins: &[f64], min_run: usize) -> Result<DispatchBlock> {
    check_day(margins, min_run)?;
    Ok(best_block_unchecked(margins, min_run))
}

pub(crate) fn best_block_unchecked(margins: &[f64], min_run: usize) -> DispatchBlock {
    let mut best: Option<DispatchBlock> = None;
    scan(margins, min_run, |b| {
        if best.is_none_or(|incumbent| b.earnings > incumbent.earnings) {
            best = Some(b);
        }
    });
    // scan always visits at least one block
    best.unwrap_or(DispatchBlock {
        start: 0,
        length: min_run,
        earnings: f64::NEG_INFINITY,
    })
}

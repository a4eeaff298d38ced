//! Sample statistics used by risk aggregation.

/// Arithmetic mean; `0.0` for an empty sample.
pub fn mean(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().sum::<f64>() / sample.len() as f64
}

/// Linear-interpolated empirical quantile at probability `p` in `[0, 1]`.
///
/// Uses rank `p * (n - 1)` on the sorted sample. Sorts `sample` in place.
///
/// # Panics
/// Panics if `sample` is empty.
pub fn empirical_quantile(sample: &mut [f64], p: f64) -> f64 {
    assert!(!sample.is_empty(), "sample must not be empty");
    sample.sort_by(|a, b| a.total_cmp(b));
    if sample.len() == 1 {
        return sample[0];
    }

    let rank = p.clamp(0.0, 1.0) * (sample.len() as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sample[lo]
    } else {
        let w = rank - lo as f64;
        sample[lo] + w * (sample[hi] - sample[lo])
    }
}

/// Percentile (`pct` in `[0, 100]`) of an unsorted sample without mutating it.
pub fn percentile(sample: &[f64], pct: f64) -> f64 {
    let mut sorted = sample.to_vec();
    empirical_quantile(&mut sorted, pct / 100.0)
}

//! Tukey-fence outlier screening.

use crate::descriptive::{finite, quantile_sorted};

/// Fence multiplier applied to the interquartile range.
pub const TUKEY_K: f64 = 1.5;

/// Fraction of finite values lying outside `[Q1 − 1.5·IQR, Q3 + 1.5·IQR]`.
///
/// Quartiles use linear interpolation. Returns `0.0` when fewer than four
/// finite values exist or the IQR is zero.
pub fn iqr_outlier_fraction(data: &[f64]) -> f64 {
    let mut x = finite(data);
    if x.len() < 4 {
        return 0.0;
    }
    x.sort_by(|a, b| a.total_cmp(b));

    let q1 = quantile_sorted(&x, 0.25);
    let q3 = quantile_sorted(&x, 0.75);
    let iqr = q3 - q1;
    if iqr == 0.0 {
        return 0.0;
    }
    let (lo, hi) = (q1 - TUKEY_K * iqr, q3 + TUKEY_K * iqr);
    let outside = x.iter().filter(|&&v| v < lo || v > hi).count();
    outside as f64 / x.len() as f64
}

// ── Tests ──────────────────────────────────────────────────────────────────

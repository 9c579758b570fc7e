//! Descriptive statistics for numeric data.
//!
//! The plain functions ([`mean`], [`variance`], [`central_moments`], ...) require
//! clean input. The `nan_*` variants skip missing (`NaN`) and infinite
//! values, which is how missing cells are represented in expression
//! matrices.

use concordia_core::{ConcordiaError, Result};

/// Arithmetic mean.
pub fn mean(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(ConcordiaError::InvalidInput(
            "mean: data must not be empty".into(),
        ));
    }
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// Variance with given degrees-of-freedom correction.
///
/// - `ddof = 0` → population variance
/// - `ddof = 1` → sample variance (Bessel's correction)
pub fn variance(data: &[f64], ddof: usize) -> Result<f64> {
    let n = data.len();
    if n <= ddof {
        return Err(ConcordiaError::InvalidInput(format!(
            "variance: need more than {} observations (got {})",
            ddof, n,
        )));
    }
    let m = mean(data)?;
    let ss: f64 = data.iter().map(|&x| (x - m).powi(2)).sum();
    Ok(ss / (n - ddof) as f64)
}

/// Standard deviation with given degrees-of-freedom correction.
pub fn std_dev(data: &[f64], ddof: usize) -> Result<f64> {
    Ok(variance(data, ddof)?.sqrt())
}

/// Central moments `(m2, m3, m4)`, each divided by `n` (biased).
pub fn central_moments(data: &[f64]) -> Result<(f64, f64, f64)> {
    let m = mean(data)?;
    let n = data.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for &x in data {
        let d = x - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    Ok((m2 / n, m3 / n, m4 / n))
}

// ── Missing-aware helpers ──────────────────────────────────────────────────

/// The finite values of `data`, in order.
pub fn finite(data: &[f64]) -> Vec<f64> {
    data.iter().copied().filter(|x| x.is_finite()).collect()
}

/// Mean of the finite values; `NaN` when there are none.
pub fn nan_mean(data: &[f64]) -> f64 {
    let (sum, n) = data
        .iter()
        .filter(|x| x.is_finite())
        .fold((0.0, 0usize), |(s, n), &x| (s + x, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Standard deviation of the finite values; `NaN` when fewer than
/// `ddof + 1` values are present.
pub fn nan_std(data: &[f64], ddof: usize) -> f64 {
    let values = finite(data);
    std_dev(&values, ddof).unwrap_or(f64::NAN)
}

/// Whether every value in `data` equals the first one.
///
/// Empty input counts as constant.
pub fn is_constant(data: &[f64]) -> bool {
    match data.first() {
        Some(&first) => data.iter().all(|&x| x == first),
        None => true,
    }
}

// ── Internal ───────────────────────────────────────────────────────────────

/// Quantile from a pre-sorted slice using linear interpolation.
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = lo + 1;
    let frac = pos - lo as f64;
    if hi >= n {
        sorted[n - 1]
    } else {
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    #[test]
    fn mean_basic() {
        assert!((mean(&[2.0, 4.0, 6.0]).unwrap() - 4.0).abs() < TOL);
        assert!(mean(&[]).is_err());
    }

    #[test]
    fn variance_sample_and_population() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((variance(&data, 0).unwrap() - 4.0).abs() < TOL);
        assert!((variance(&data, 1).unwrap() - 32.0 / 7.0).abs() < TOL);
        assert!(variance(&[1.0], 1).is_err());
    }

    #[test]
    fn sorted_quantiles_interpolate() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        assert!((quantile_sorted(&sorted, 0.25) - 2.75).abs() < TOL);
        assert!((quantile_sorted(&sorted, 0.75) - 6.25).abs() < TOL);
        assert_eq!(quantile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(quantile_sorted(&sorted, 1.0), 8.0);
        assert_eq!(quantile_sorted(&[4.0], 0.5), 4.0);
    }

    #[test]
    fn central_moments_symmetric() {
        let (m2, m3, _) = central_moments(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((m2 - 2.0).abs() < TOL);
        assert!(m3.abs() < TOL);
    }

    #[test]
    fn nan_helpers_skip_missing() {
        let data = [1.0, f64::NAN, 3.0, f64::INFINITY];
        assert!((nan_mean(&data) - 2.0).abs() < TOL);
        assert!((nan_std(&data, 1) - 2.0_f64.sqrt()).abs() < TOL);
        assert!(nan_mean(&[f64::NAN]).is_nan());
        assert!(nan_std(&[1.0, f64::NAN], 1).is_nan());
    }

    #[test]
    fn constant_detection() {
        assert!(is_constant(&[2.0, 2.0, 2.0]));
        assert!(!is_constant(&[2.0, 2.5]));
        assert!(is_constant(&[]));
    }
}

//! Correlation coefficients with significance.
//!
//! [`pearson`], [`spearman`] and [`kendall`] return a [`Correlation`]
//! carrying the coefficient and its two-sided p-value. A constant series has
//! no defined coefficient: the result is `NaN`, never a silent `0.0`, so
//! callers can detect it and fall back to another statistic.

use concordia_core::{ConcordiaError, Result, Summarizable};

use crate::distribution::{Distribution, Normal, StudentsT};
use crate::rank::{average_ranks, tie_group_sizes};

/// Largest sample size for which the exact Kendall null distribution is used.
const KENDALL_EXACT_MAX_N: usize = 33;

/// Which statistics facility is available.
///
/// `Extended` provides p-values, Kendall's tau and the formal normality
/// tests. `Basic` computes Pearson/Spearman coefficients only: p-values are
/// `NaN`, Kendall is unavailable (`NaN`) and normality falls back to a
/// distinct-value proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StatsBackend {
    #[default]
    Extended,
    Basic,
}

impl StatsBackend {
    pub fn is_extended(self) -> bool {
        self == StatsBackend::Extended
    }
}

/// A correlation coefficient and its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub coefficient: f64,
    pub p_value: f64,
}

impl Correlation {
    /// The unevaluable result: both fields `NaN`.
    pub const UNDEFINED: Correlation = Correlation {
        coefficient: f64::NAN,
        p_value: f64::NAN,
    };

    pub fn is_finite(&self) -> bool {
        self.coefficient.is_finite()
    }
}

impl Summarizable for Correlation {
    fn summary(&self) -> String {
        format!("r={:.4}, p={:.4e}", self.coefficient, self.p_value)
    }
}

/// Pearson product-moment correlation between `x` and `y`.
pub fn pearson(x: &[f64], y: &[f64], backend: StatsBackend) -> Result<Correlation> {
    validate_paired(x, y)?;
    let r = pearson_r(x, y);
    let p = if backend.is_extended() {
        t_test_p(r, x.len())
    } else {
        f64::NAN
    };
    Ok(Correlation {
        coefficient: r,
        p_value: p,
    })
}

/// Spearman rank correlation: Pearson on average ranks, t-approximated
/// p-value.
pub fn spearman(x: &[f64], y: &[f64], backend: StatsBackend) -> Result<Correlation> {
    validate_paired(x, y)?;
    let rx = average_ranks(x);
    let ry = average_ranks(y);
    pearson(&rx, &ry, backend)
}

/// Kendall's tau-b with tie correction.
///
/// The p-value uses the exact null distribution when there are no ties and
/// `n <= 33`, the tie-corrected normal approximation otherwise. Under
/// [`StatsBackend::Basic`] the statistic is unavailable and both fields are
/// `NaN`.
pub fn kendall(x: &[f64], y: &[f64], backend: StatsBackend) -> Result<Correlation> {
    validate_paired(x, y)?;
    if !backend.is_extended() {
        return Ok(Correlation::UNDEFINED);
    }

    let n = x.len();
    let mut concordant = 0u64;
    let mut discordant = 0u64;
    for i in 0..n {
        for j in (i + 1)..n {
            let s = (x[i] - x[j]).signum() * (y[i] - y[j]).signum();
            let tied = x[i] == x[j] || y[i] == y[j];
            if tied {
                continue;
            }
            if s > 0.0 {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }

    let x_ties = tie_group_sizes(x);
    let y_ties = tie_group_sizes(y);
    let pairs = |t: &usize| (t * (t.saturating_sub(1))) as f64 / 2.0;
    let n0 = (n * (n - 1)) as f64 / 2.0;
    let n1: f64 = x_ties.iter().map(pairs).sum();
    let n2: f64 = y_ties.iter().map(pairs).sum();

    let denom = ((n0 - n1) * (n0 - n2)).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Ok(Correlation::UNDEFINED);
    }
    let s = concordant as f64 - discordant as f64;
    let tau = (s / denom).clamp(-1.0, 1.0);

    let has_ties = n1 > 0.0 || n2 > 0.0;
    let p = if !has_ties && n <= KENDALL_EXACT_MAX_N {
        kendall_exact_p(n, discordant as usize)
    } else {
        kendall_asymptotic_p(n, s, &x_ties, &y_ties)
    };

    Ok(Correlation {
        coefficient: tau,
        p_value: p,
    })
}

fn validate_paired(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(ConcordiaError::InvalidInput(format!(
            "correlation: x and y must have the same length ({} vs {})",
            x.len(),
            y.len(),
        )));
    }
    if x.len() < 2 {
        return Err(ConcordiaError::InvalidInput(
            "correlation: need at least 2 observations".into(),
        ));
    }
    Ok(())
}

fn pearson_r(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x: f64 = x.iter().sum::<f64>() / n;
    let mean_y: f64 = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Two-sided p-value of `r` under H0: ρ = 0 via t = r·√((n−2)/(1−r²)).
fn t_test_p(r: f64, n: usize) -> f64 {
    if !r.is_finite() {
        return f64::NAN;
    }
    if n <= 2 {
        // Two points always lie on a line.
        return 1.0;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    match StudentsT::new(df) {
        Ok(dist) => dist.two_tailed_p(t).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Exact two-sided p-value from the distribution of inversions
/// (Mahonian numbers) among the n! permutations.
fn kendall_exact_p(n: usize, discordant: usize) -> f64 {
    let total = n * (n - 1) / 2;
    let c = discordant.min(total - discordant);

    // counts[k] = number of permutations of the current length with k inversions
    let mut counts = vec![0.0_f64; c + 1];
    counts[0] = 1.0;
    for len in 2..=n {
        let mut next = vec![0.0_f64; c + 1];
        let mut window = 0.0;
        for k in 0..=c {
            window += counts[k];
            if k >= len {
                window -= counts[k - len];
            }
            next[k] = window;
        }
        counts = next;
    }

    let ln_factorial: f64 = (2..=n).map(|i| (i as f64).ln()).sum();
    let tail: f64 = counts.iter().sum();
    (2.0 * (tail.ln() - ln_factorial).exp()).min(1.0)
}

fn kendall_asymptotic_p(n: usize, s: f64, x_ties: &[usize], y_ties: &[usize]) -> f64 {
    let nf = n as f64;
    let sum_term = |ties: &[usize], f: &dyn Fn(f64) -> f64| -> f64 {
        ties.iter().map(|&t| f(t as f64)).sum()
    };

    let v0 = nf * (nf - 1.0) * (2.0 * nf + 5.0);
    let vt = sum_term(x_ties, &|t| t * (t - 1.0) * (2.0 * t + 5.0));
    let vu = sum_term(y_ties, &|t| t * (t - 1.0) * (2.0 * t + 5.0));
    let v1 = sum_term(x_ties, &|t| t * (t - 1.0)) * sum_term(y_ties, &|t| t * (t - 1.0))
        / (2.0 * nf * (nf - 1.0));
    let v2 = if n > 2 {
        sum_term(x_ties, &|t| t * (t - 1.0) * (t - 2.0))
            * sum_term(y_ties, &|t| t * (t - 1.0) * (t - 2.0))
            / (9.0 * nf * (nf - 1.0) * (nf - 2.0))
    } else {
        0.0
    };

    let var = (v0 - vt - vu) / 18.0 + v1 + v2;
    if var <= 0.0 {
        return f64::NAN;
    }
    let z = s.abs() / var.sqrt();
    (2.0 * Normal::standard().sf(z)).clamp(0.0, 1.0)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;
    const EXT: StatsBackend = StatsBackend::Extended;

    #[test]
    fn pearson_perfect_positive() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        let c = pearson(&x, &y, EXT).unwrap();
        assert!((c.coefficient - 1.0).abs() < TOL);
        assert_eq!(c.p_value, 0.0);
    }

    #[test]
    fn pearson_known_p_value() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0];
        let c = pearson(&x, &y, EXT).unwrap();
        // r = 0.82857..., t = 2.9598, df = 4
        assert!((c.coefficient - 0.8285714285714286).abs() < 1e-12);
        assert!((c.p_value - 0.041563).abs() < 1e-5);
    }

    #[test]
    fn pearson_constant_series_is_undefined() {
        let c = pearson(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0], EXT).unwrap();
        assert!(c.coefficient.is_nan());
        assert!(c.p_value.is_nan());
        assert!(!c.is_finite());
    }

    #[test]
    fn pearson_two_points() {
        let c = pearson(&[1.0, 2.0], &[3.0, 1.0], EXT).unwrap();
        assert!((c.coefficient + 1.0).abs() < TOL);
        assert_eq!(c.p_value, 1.0);
    }

    #[test]
    fn pearson_input_validation() {
        assert!(pearson(&[1.0, 2.0], &[1.0], EXT).is_err());
        assert!(pearson(&[1.0], &[2.0], EXT).is_err());
    }

    #[test]
    fn basic_backend_has_no_p_values() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 3.0, 2.0, 4.0];
        let c = pearson(&x, &y, StatsBackend::Basic).unwrap();
        assert!(c.coefficient.is_finite());
        assert!(c.p_value.is_nan());
        let k = kendall(&x, &y, StatsBackend::Basic).unwrap();
        assert!(k.coefficient.is_nan());
    }

    #[test]
    fn spearman_monotonic() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 8.0, 27.0, 64.0, 125.0];
        assert!((spearman(&x, &y, EXT).unwrap().coefficient - 1.0).abs() < TOL);
        let rev = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert!((spearman(&x, &rev, EXT).unwrap().coefficient + 1.0).abs() < TOL);
    }

    #[test]
    fn kendall_exact_small_sample() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 2.0, 3.0, 5.0, 4.0];
        let c = kendall(&x, &y, EXT).unwrap();
        // 9 concordant, 1 discordant of 10 pairs.
        assert!((c.coefficient - 0.8).abs() < TOL);
        // P(inversions <= 1) = 5/120, two-sided = 1/12.
        assert!((c.p_value - 1.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn kendall_perfect_order() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let c = kendall(&x, &x, EXT).unwrap();
        assert!((c.coefficient - 1.0).abs() < TOL);
        // Only the identity has zero inversions: 2 / 4!.
        assert!((c.p_value - 2.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn kendall_with_ties_uses_tau_b() {
        let x = [1.0, 2.0, 2.0, 3.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        let c = kendall(&x, &y, EXT).unwrap();
        // C = 5, D = 0, n0 = 6, n1 = 1, n2 = 0 → 5 / sqrt(30)
        assert!((c.coefficient - 5.0 / 30.0_f64.sqrt()).abs() < TOL);
        assert!(c.p_value > 0.0 && c.p_value < 1.0);
    }

    #[test]
    fn kendall_constant_series_is_undefined() {
        let c = kendall(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], EXT).unwrap();
        assert!(c.coefficient.is_nan());
    }
}

//! Normality tests.
//!
//! - [`shapiro_wilk`] — Royston's (1992/1995) approximation, 3 ≤ n ≤ 5000
//! - [`dagostino_pearson`] — omnibus K² test from sample skewness and kurtosis
//! - [`distinct_value_proxy`] — crude stand-in when no formal test is available
//! - [`looks_normal`] — the decision rule the adaptive correlation engine uses

use concordia_core::{ConcordiaError, Result, Summarizable};

use crate::correlation::StatsBackend;
use crate::descriptive::{self, finite};
use crate::distribution::{ChiSquared, Distribution, Normal};

/// Significance level for the normality decision.
pub const NORMALITY_ALPHA: f64 = 0.05;

/// Smallest sample on which normality is assessed at all.
pub const MIN_NORMALITY_N: usize = 8;

/// Largest sample Shapiro–Wilk is applied to.
pub const SHAPIRO_MAX_N: usize = 5000;

/// Outcome of a normality test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// The test statistic (W or K²).
    pub statistic: f64,
    /// p-value under the null hypothesis of normality.
    pub p_value: f64,
    pub degrees_of_freedom: Option<f64>,
    /// Name of the test method.
    pub method: String,
}

impl Summarizable for TestResult {
    fn summary(&self) -> String {
        format!(
            "{}: statistic={:.4}, p={:.6}",
            self.method, self.statistic, self.p_value,
        )
    }
}

/// Shapiro–Wilk W test for normality.
///
/// Requires 3 to 5000 observations and a non-constant sample.
pub fn shapiro_wilk(data: &[f64]) -> Result<TestResult> {
    let n = data.len();
    if !(3..=SHAPIRO_MAX_N).contains(&n) {
        return Err(ConcordiaError::InvalidInput(format!(
            "shapiro_wilk: need 3..={SHAPIRO_MAX_N} observations (got {n})",
        )));
    }

    let mut x = data.to_vec();
    x.sort_by(|a, b| a.total_cmp(b));
    let mean = descriptive::mean(&x)?;
    let ssq: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    if ssq == 0.0 {
        return Err(ConcordiaError::InvalidInput(
            "shapiro_wilk: data must not be constant".into(),
        ));
    }

    let a = shapiro_coefficients(n);
    let numerator: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let w = (numerator * numerator / ssq).min(1.0);

    Ok(TestResult {
        statistic: w,
        p_value: shapiro_p_value(w, n),
        degrees_of_freedom: None,
        method: "Shapiro-Wilk".into(),
    })
}

/// Coefficients for the lower half of the sorted sample (the upper half is
/// antisymmetric).
fn shapiro_coefficients(n: usize) -> Vec<f64> {
    const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
    const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];

    if n == 3 {
        return vec![core::f64::consts::FRAC_1_SQRT_2];
    }

    let half = n / 2;
    let normal = Normal::standard();
    let nf = n as f64;
    let m: Vec<f64> = (1..=half)
        .map(|i| normal.quantile((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let mut a = vec![0.0; half];
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let (first_free, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };
    a[0] = a1;
    for (ai, mi) in a.iter_mut().zip(&m).skip(first_free) {
        *ai = -mi / fac;
    }
    a
}

fn shapiro_p_value(w: f64, n: usize) -> f64 {
    if n == 3 {
        let stqr = core::f64::consts::FRAC_PI_3;
        let p = 6.0 / core::f64::consts::PI * (w.sqrt().asin() - stqr);
        return p.clamp(0.0, 1.0);
    }

    let nf = n as f64;
    let w1 = (1.0 - w).ln();
    let (y, mu, sigma) = if n <= 11 {
        let gamma = -2.273 + 0.459 * nf;
        if w1 >= gamma {
            return 1e-99;
        }
        let y = -(gamma - w1).ln();
        let mu = poly(&[0.544, -0.39978, 0.025054, -6.714e-4], nf);
        let sigma = poly(&[1.3822, -0.77857, 0.062767, -0.0020322], nf).exp();
        (y, mu, sigma)
    } else {
        let ln_n = nf.ln();
        let mu = poly(&[-1.5861, -0.31082, -0.083751, 0.0038915], ln_n);
        let sigma = poly(&[-0.4803, -0.082676, 0.0030302], ln_n).exp();
        (w1, mu, sigma)
    };

    Normal::standard().sf((y - mu) / sigma)
}

fn poly(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// D'Agostino–Pearson omnibus test combining the skewness and kurtosis
/// z-scores; K² is referred to a χ² distribution with 2 df.
///
/// Requires at least 8 observations and a non-constant sample.
pub fn dagostino_pearson(data: &[f64]) -> Result<TestResult> {
    let n = data.len();
    if n < MIN_NORMALITY_N {
        return Err(ConcordiaError::InvalidInput(format!(
            "dagostino_pearson: need at least {MIN_NORMALITY_N} observations (got {n})",
        )));
    }
    let (m2, m3, m4) = descriptive::central_moments(data)?;
    if m2 == 0.0 {
        return Err(ConcordiaError::InvalidInput(
            "dagostino_pearson: data must not be constant".into(),
        ));
    }

    let nf = n as f64;
    let z_skew = skew_z(m3 / m2.powf(1.5), nf);
    let z_kurt = kurtosis_z(m4 / (m2 * m2), nf);
    let k2 = z_skew * z_skew + z_kurt * z_kurt;
    let p = ChiSquared::new(2.0).map(|chi| chi.sf(k2))?;

    Ok(TestResult {
        statistic: k2,
        p_value: p,
        degrees_of_freedom: Some(2.0),
        method: "D'Agostino-Pearson omnibus".into(),
    })
}

fn skew_z(b2: f64, n: f64) -> f64 {
    let mut y = b2 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    if y == 0.0 {
        y = 1.0;
    }
    let ya = y / alpha;
    delta * (ya + (ya * ya + 1.0).sqrt()).ln()
}

fn kurtosis_z(b2: f64, n: f64) -> f64 {
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let var_b2 = 24.0 * n * (n - 2.0) * (n - 3.0)
        / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / var_b2.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1
            * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}

/// Share of distinct values after rounding to 3 decimals is above one half.
///
/// This is a heuristic, not a test: it only rejects heavily discretised
/// series, and says nothing about the shape of the distribution.
pub fn distinct_value_proxy(data: &[f64]) -> bool {
    let mut rounded: Vec<i64> = data.iter().map(|v| (v * 1000.0).round() as i64).collect();
    let n = rounded.len().max(1);
    rounded.sort_unstable();
    rounded.dedup();
    rounded.len() as f64 / n as f64 > 0.5
}

/// Whether `data` passes as normally distributed for method selection.
///
/// Missing values are dropped first. Fewer than 8 values never pass. With the
/// extended backend Shapiro–Wilk decides for n ≤ 5000 and the omnibus test
/// above that (p > 0.05 passes); a test that cannot run falls through to the
/// distinct-value proxy, which is also what the basic backend uses.
pub fn looks_normal(data: &[f64], backend: StatsBackend) -> bool {
    let x = finite(data);
    if x.len() < MIN_NORMALITY_N {
        return false;
    }
    if backend.is_extended() {
        let test = if x.len() <= SHAPIRO_MAX_N {
            shapiro_wilk(&x)
        } else {
            dagostino_pearson(&x)
        };
        if let Ok(result) = test {
            if result.p_value.is_finite() {
                return result.p_value > NORMALITY_ALPHA;
            }
        }
    }
    distinct_value_proxy(&x)
}

// ── Tests ──────────────────────────────────────────────────────────────────

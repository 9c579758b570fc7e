//! Adaptive pairwise correlation between methods.
//!
//! [`compute_pairwise`] takes one [`MethodSeries`] per method, all aligned on
//! the same rows (gene × group), and fills four symmetric matrices: the
//! coefficient, its p-value, the number of rows used and the statistic that
//! produced it.
//!
//! For each pair the rows are first masked: both values must be finite and
//! the p-values must satisfy the [`PairRule`]. The statistic is either the
//! one requested or picked by [`select_method`], a heuristic on sample size,
//! outlier fraction and normality. When it yields no finite coefficient the
//! [`CorrMethod::fallbacks`] table is walked in order.
//!
//! Unevaluable pairs (fewer than two rows, or a constant side) are not
//! errors: they carry `NaN` and [`MethodCode::Unevaluable`].

use std::fmt;
use std::str::FromStr;

use concordia_core::{ConcordiaError, Result, Summarizable};
use log::{debug, warn};

use crate::correlation::{kendall, pearson, spearman, Correlation, StatsBackend};
use crate::descriptive::is_constant;
use crate::normality::looks_normal;
use crate::outlier::iqr_outlier_fraction;

/// Below this many rows the heuristic prefers a rank statistic outright.
pub const SMALL_SAMPLE_N: usize = 10;

/// Largest tolerated outlier fraction (either series) for Pearson.
pub const MAX_OUTLIER_FRACTION: f64 = 0.10;

/// Default significance threshold for the pair rule.
pub const DEFAULT_ALPHA: f64 = 0.05;

// ── Statistic selection ────────────────────────────────────────────────────

/// A correlation statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorrMethod {
    Pearson,
    Spearman,
    Kendall,
}

impl CorrMethod {
    pub const ALL: [CorrMethod; 3] = [CorrMethod::Pearson, CorrMethod::Spearman, CorrMethod::Kendall];

    pub fn name(self) -> &'static str {
        match self {
            CorrMethod::Pearson => "pearson",
            CorrMethod::Spearman => "spearman",
            CorrMethod::Kendall => "kendall",
        }
    }

    /// Statistics to retry, in order, when this one gives no finite
    /// coefficient.
    pub fn fallbacks(self) -> &'static [CorrMethod] {
        match self {
            CorrMethod::Pearson => &[CorrMethod::Spearman, CorrMethod::Kendall],
            CorrMethod::Spearman => &[CorrMethod::Kendall, CorrMethod::Pearson],
            CorrMethod::Kendall => &[CorrMethod::Spearman, CorrMethod::Pearson],
        }
    }

    /// Evaluate this statistic on paired samples.
    pub fn compute(self, x: &[f64], y: &[f64], backend: StatsBackend) -> Result<Correlation> {
        match self {
            CorrMethod::Pearson => pearson(x, y, backend),
            CorrMethod::Spearman => spearman(x, y, backend),
            CorrMethod::Kendall => kendall(x, y, backend),
        }
    }
}

impl fmt::Display for CorrMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CorrMethod {
    type Err = ConcordiaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Ok(CorrMethod::Pearson),
            "spearman" => Ok(CorrMethod::Spearman),
            "kendall" => Ok(CorrMethod::Kendall),
            other => Err(ConcordiaError::InvalidInput(format!(
                "unknown correlation method '{other}' (expected pearson, spearman or kendall)",
            ))),
        }
    }
}

/// Which statistic produced a matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodCode {
    Pearson,
    Spearman,
    Kendall,
    /// No finite coefficient could be computed.
    Unevaluable,
    /// Diagonal cell.
    Identity,
}

impl MethodCode {
    pub fn as_str(self) -> &'static str {
        match self {
            MethodCode::Pearson => "P",
            MethodCode::Spearman => "S",
            MethodCode::Kendall => "K",
            MethodCode::Unevaluable => "NA",
            MethodCode::Identity => "\u{2014}",
        }
    }
}

impl From<CorrMethod> for MethodCode {
    fn from(method: CorrMethod) -> Self {
        match method {
            CorrMethod::Pearson => MethodCode::Pearson,
            CorrMethod::Spearman => MethodCode::Spearman,
            CorrMethod::Kendall => MethodCode::Kendall,
        }
    }
}

impl fmt::Display for MethodCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested statistic: chosen per pair, or fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum CorrMode {
    #[default]
    Auto,
    Fixed(CorrMethod),
}

impl fmt::Display for CorrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrMode::Auto => f.write_str("auto"),
            CorrMode::Fixed(method) => f.write_str(method.name()),
        }
    }
}

impl FromStr for CorrMode {
    type Err = ConcordiaError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(CorrMode::Auto);
        }
        s.parse::<CorrMethod>().map(CorrMode::Fixed).map_err(|_| {
            ConcordiaError::InvalidInput(format!(
                "unknown correlation mode '{}' (expected auto, pearson, spearman or kendall)",
                s.trim(),
            ))
        })
    }
}

impl TryFrom<String> for CorrMode {
    type Error = ConcordiaError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<CorrMode> for String {
    fn from(mode: CorrMode) -> Self {
        mode.to_string()
    }
}

/// Significance filter applied to the p-values of a pair before correlating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PairRule {
    /// Both p-values finite and ≤ α.
    #[default]
    Both,
    /// At least one p-value finite and ≤ α.
    Any,
    /// No p-value filtering.
    None,
}

impl PairRule {
    pub fn as_str(self) -> &'static str {
        match self {
            PairRule::Both => "both",
            PairRule::Any => "any",
            PairRule::None => "none",
        }
    }

    /// Whether a row with these p-values is admitted.
    pub fn admits(self, p_a: f64, p_b: f64, alpha: f64) -> bool {
        let significant = |p: f64| p.is_finite() && p <= alpha;
        match self {
            PairRule::Both => significant(p_a) && significant(p_b),
            PairRule::Any => significant(p_a) || significant(p_b),
            PairRule::None => true,
        }
    }
}

impl fmt::Display for PairRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PairRule {
    type Err = ConcordiaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "both" => Ok(PairRule::Both),
            "any" => Ok(PairRule::Any),
            "none" => Ok(PairRule::None),
            other => Err(ConcordiaError::InvalidInput(format!(
                "unknown pair rule '{other}' (expected both, any or none)",
            ))),
        }
    }
}

/// Pick a statistic for masked, paired samples.
///
/// Small samples (n < 10) get Kendall, or Spearman when Kendall is not
/// available. Larger samples get Pearson only if both series look normal and
/// neither has 10% or more Tukey outliers; otherwise Spearman.
///
/// This is a heuristic, not a statistical guarantee.
pub fn select_method(x: &[f64], y: &[f64], backend: StatsBackend) -> CorrMethod {
    let n = x.len().min(y.len());
    if n < SMALL_SAMPLE_N {
        return if backend.is_extended() {
            CorrMethod::Kendall
        } else {
            CorrMethod::Spearman
        };
    }

    let outliers = iqr_outlier_fraction(x).max(iqr_outlier_fraction(y));
    let normal = looks_normal(x, backend) && looks_normal(y, backend);
    if normal && outliers < MAX_OUTLIER_FRACTION {
        CorrMethod::Pearson
    } else {
        CorrMethod::Spearman
    }
}

/// Run `method` and walk its fallback table until a finite coefficient
/// appears. Returns the result with the statistic that was last attempted.
pub fn correlate_with_fallback(
    method: CorrMethod,
    x: &[f64],
    y: &[f64],
    backend: StatsBackend,
) -> Result<(Correlation, CorrMethod)> {
    let mut result = method.compute(x, y, backend)?;
    let mut used = method;
    if result.is_finite() {
        return Ok((result, used));
    }
    for &next in method.fallbacks() {
        debug!("{} gave no finite coefficient, retrying with {}", used, next);
        used = next;
        result = next.compute(x, y, backend)?;
        if result.is_finite() {
            break;
        }
    }
    Ok((result, used))
}

// ── Engine ─────────────────────────────────────────────────────────────────

/// Options for [`compute_pairwise`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationOptions {
    /// Significance threshold used by the pair rule, in (0, 1].
    pub alpha: f64,
    pub pair_rule: PairRule,
    pub corr_mode: CorrMode,
    pub backend: StatsBackend,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            pair_rule: PairRule::default(),
            corr_mode: CorrMode::default(),
            backend: StatsBackend::default(),
        }
    }
}

impl CorrelationOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(ConcordiaError::InvalidInput(format!(
                "alpha must lie in (0, 1] (got {})",
                self.alpha,
            )));
        }
        Ok(())
    }
}

/// One method's column: values and p-values aligned on shared rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSeries {
    pub label: String,
    pub values: Vec<f64>,
    pub p_values: Vec<f64>,
}

impl MethodSeries {
    pub fn new(label: impl Into<String>, values: Vec<f64>, p_values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
            p_values,
        }
    }

    /// Number of finite values.
    pub fn finite_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }
}

/// One cell of the pairwise result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairEntry {
    pub r: f64,
    pub p: f64,
    pub n: usize,
    pub code: MethodCode,
}

impl PairEntry {
    fn identity(n: usize) -> Self {
        Self {
            r: 1.0,
            p: 0.0,
            n,
            code: MethodCode::Identity,
        }
    }

    fn unevaluable(n: usize) -> Self {
        Self {
            r: f64::NAN,
            p: f64::NAN,
            n,
            code: MethodCode::Unevaluable,
        }
    }
}

/// Row of the per-pair detail table.
#[derive(Debug, Clone, PartialEq)]
pub struct PairDetail {
    pub method_i: String,
    pub method_j: String,
    pub entry: PairEntry,
}

/// Square, symmetric result matrices indexed by method.
#[derive(Debug, Clone)]
pub struct PairwiseMatrices {
    labels: Vec<String>,
    r: Vec<f64>,
    p: Vec<f64>,
    n: Vec<usize>,
    method_used: Vec<MethodCode>,
}

impl PairwiseMatrices {
    fn with_size(labels: Vec<String>) -> Self {
        let k = labels.len();
        Self {
            labels,
            r: vec![f64::NAN; k * k],
            p: vec![f64::NAN; k * k],
            n: vec![0; k * k],
            method_used: vec![MethodCode::Unevaluable; k * k],
        }
    }

    fn set(&mut self, i: usize, j: usize, entry: PairEntry) {
        let k = self.size();
        for idx in [i * k + j, j * k + i] {
            self.r[idx] = entry.r;
            self.p[idx] = entry.p;
            self.n[idx] = entry.n;
            self.method_used[idx] = entry.code;
        }
    }

    /// Number of methods.
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn r(&self, i: usize, j: usize) -> f64 {
        self.r[i * self.size() + j]
    }

    pub fn p(&self, i: usize, j: usize) -> f64 {
        self.p[i * self.size() + j]
    }

    pub fn n(&self, i: usize, j: usize) -> usize {
        self.n[i * self.size() + j]
    }

    pub fn method_used(&self, i: usize, j: usize) -> MethodCode {
        self.method_used[i * self.size() + j]
    }

    pub fn entry(&self, i: usize, j: usize) -> PairEntry {
        PairEntry {
            r: self.r(i, j),
            p: self.p(i, j),
            n: self.n(i, j),
            code: self.method_used(i, j),
        }
    }

    /// One row per unordered pair `i < j`, in label order.
    pub fn details(&self) -> Vec<PairDetail> {
        let k = self.size();
        let mut rows = Vec::with_capacity(k * k.saturating_sub(1) / 2);
        for i in 0..k {
            for j in (i + 1)..k {
                rows.push(PairDetail {
                    method_i: self.labels[i].clone(),
                    method_j: self.labels[j].clone(),
                    entry: self.entry(i, j),
                });
            }
        }
        rows
    }
}

impl Summarizable for PairwiseMatrices {
    fn summary(&self) -> String {
        let details = self.details();
        let evaluated = details
            .iter()
            .filter(|d| d.entry.code != MethodCode::Unevaluable)
            .count();
        format!(
            "PairwiseMatrices: {} methods, {}/{} pairs evaluated",
            self.size(),
            evaluated,
            details.len(),
        )
    }
}

/// Rows admitted for a pair, as aligned `(x, y)` vectors.
pub fn masked_pair(
    a: &MethodSeries,
    b: &MethodSeries,
    alpha: f64,
    rule: PairRule,
) -> (Vec<f64>, Vec<f64>) {
    let mut x = Vec::new();
    let mut y = Vec::new();
    for idx in 0..a.values.len().min(b.values.len()) {
        let (va, vb) = (a.values[idx], b.values[idx]);
        if va.is_finite() && vb.is_finite() && rule.admits(a.p_values[idx], b.p_values[idx], alpha) {
            x.push(va);
            y.push(vb);
        }
    }
    (x, y)
}

/// Correlate one pair of methods.
pub fn evaluate_pair(
    a: &MethodSeries,
    b: &MethodSeries,
    options: &CorrelationOptions,
) -> Result<PairEntry> {
    let (x, y) = masked_pair(a, b, options.alpha, options.pair_rule);
    let n = x.len();
    if n < 2 || is_constant(&x) || is_constant(&y) {
        warn!(
            "{} vs {}: unevaluable with {} paired value(s) under pair rule '{}'",
            a.label, b.label, n, options.pair_rule,
        );
        return Ok(PairEntry::unevaluable(n));
    }

    let requested = match options.corr_mode {
        CorrMode::Auto => select_method(&x, &y, options.backend),
        CorrMode::Fixed(method) => method,
    };
    let (corr, used) = correlate_with_fallback(requested, &x, &y, options.backend)?;
    debug!(
        "{} vs {}: n={}, requested {}, used {}, {}",
        a.label,
        b.label,
        n,
        requested,
        used,
        corr.summary(),
    );

    Ok(PairEntry {
        r: corr.coefficient,
        p: corr.p_value,
        n,
        code: used.into(),
    })
}

/// Compute the pairwise correlation matrices for all methods.
///
/// Every series must have as many values and p-values as the first one.
pub fn compute_pairwise(
    series: &[MethodSeries],
    options: &CorrelationOptions,
) -> Result<PairwiseMatrices> {
    options.validate()?;
    let rows = series.first().map_or(0, |s| s.values.len());
    for s in series {
        if s.values.len() != rows || s.p_values.len() != rows {
            return Err(ConcordiaError::InvalidInput(format!(
                "compute_pairwise: series '{}' has {} values and {} p-values, expected {}",
                s.label,
                s.values.len(),
                s.p_values.len(),
                rows,
            )));
        }
    }

    let labels: Vec<String> = series.iter().map(|s| s.label.clone()).collect();
    let mut out = PairwiseMatrices::with_size(labels);
    let k = series.len();
    for (i, s) in series.iter().enumerate() {
        out.set(i, i, PairEntry::identity(s.finite_count()));
    }

    let pairs: Vec<(usize, usize)> = (0..k)
        .flat_map(|i| ((i + 1)..k).map(move |j| (i, j)))
        .collect();

    #[cfg(feature = "parallel")]
    let entries: Vec<Result<PairEntry>> = {
        use rayon::prelude::*;
        pairs
            .par_iter()
            .map(|&(i, j)| evaluate_pair(&series[i], &series[j], options))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let entries: Vec<Result<PairEntry>> = pairs
        .iter()
        .map(|&(i, j)| evaluate_pair(&series[i], &series[j], options))
        .collect();

    for (&(i, j), entry) in pairs.iter().zip(entries) {
        out.set(i, j, entry?);
    }

    log::info!("{}", out.summary());
    Ok(out)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn series(label: &str, values: &[f64], p_values: &[f64]) -> MethodSeries {
        MethodSeries::new(label, values.to_vec(), p_values.to_vec())
    }

    fn none_rule(corr_mode: CorrMode) -> CorrelationOptions {
        CorrelationOptions {
            pair_rule: PairRule::None,
            corr_mode,
            ..CorrelationOptions::default()
        }
    }

    /// Three methods over 12 rows with mixed significance and gaps.
    fn three_methods() -> Vec<MethodSeries> {
        let a = [1.0, 2.1, 2.9, 4.2, 5.1, 5.8, 7.2, 8.1, 8.8, 10.3, f64::NAN, 12.0];
        let b = [1.2, 1.9, 3.1, 3.8, 5.3, 6.1, 6.8, 8.3, 9.1, 9.9, 11.0, 11.7];
        let c = [3.0, 1.0, 4.0, 1.5, 5.0, 9.0, 2.0, 6.0, 5.5, 3.5, 8.0, f64::NAN];
        let pa = [0.01, 0.2, 0.03, 0.04, f64::NAN, 0.001, 0.5, 0.02, 0.01, 0.06, 0.01, 0.03];
        let pb = [0.02, 0.01, 0.3, 0.04, 0.01, 0.01, 0.02, f64::NAN, 0.04, 0.01, 0.2, 0.01];
        let pc = [0.5, 0.01, 0.01, 0.02, 0.6, 0.01, 0.03, 0.04, 0.01, 0.01, 0.01, 0.01];
        vec![series("A", &a, &pa), series("B", &b, &pb), series("C", &c, &pc)]
    }

    #[test]
    fn fallback_table() {
        use CorrMethod::*;
        assert_eq!(Pearson.fallbacks(), &[Spearman, Kendall]);
        assert_eq!(Spearman.fallbacks(), &[Kendall, Pearson]);
        assert_eq!(Kendall.fallbacks(), &[Spearman, Pearson]);
        for m in CorrMethod::ALL {
            assert!(!m.fallbacks().contains(&m));
        }
    }

    #[test]
    fn codes() {
        assert_eq!(MethodCode::from(CorrMethod::Pearson).as_str(), "P");
        assert_eq!(MethodCode::from(CorrMethod::Spearman).as_str(), "S");
        assert_eq!(MethodCode::from(CorrMethod::Kendall).as_str(), "K");
        assert_eq!(MethodCode::Unevaluable.to_string(), "NA");
        assert_eq!(MethodCode::Identity.to_string(), "\u{2014}");
    }

    #[test]
    fn parse_rules_and_modes() {
        assert_eq!("both".parse::<PairRule>().unwrap(), PairRule::Both);
        assert_eq!(" ANY ".parse::<PairRule>().unwrap(), PairRule::Any);
        assert_eq!("none".parse::<PairRule>().unwrap(), PairRule::None);
        let err = "either".parse::<PairRule>().unwrap_err();
        assert!(matches!(err, ConcordiaError::InvalidInput(_)));

        assert_eq!("auto".parse::<CorrMode>().unwrap(), CorrMode::Auto);
        assert_eq!(
            "Spearman".parse::<CorrMode>().unwrap(),
            CorrMode::Fixed(CorrMethod::Spearman)
        );
        assert!("median".parse::<CorrMode>().is_err());
        assert_eq!(CorrMode::Fixed(CorrMethod::Kendall).to_string(), "kendall");
    }

    #[test]
    fn pair_rule_admission() {
        let alpha = 0.05;
        assert!(PairRule::Both.admits(0.01, 0.05, alpha));
        assert!(!PairRule::Both.admits(0.01, 0.2, alpha));
        assert!(!PairRule::Both.admits(0.01, f64::NAN, alpha));
        assert!(PairRule::Any.admits(0.01, f64::NAN, alpha));
        assert!(!PairRule::Any.admits(0.3, f64::NAN, alpha));
        assert!(PairRule::None.admits(f64::NAN, f64::NAN, alpha));
    }

    #[test]
    fn heuristic_small_samples() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        assert_eq!(select_method(&x, &y, StatsBackend::Extended), CorrMethod::Kendall);
        assert_eq!(select_method(&x, &y, StatsBackend::Basic), CorrMethod::Spearman);
        assert_eq!(select_method(&x[..2], &y[..2], StatsBackend::Extended), CorrMethod::Kendall);
    }

    #[test]
    fn heuristic_large_samples() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = (0..20).map(|i| i as f64 + ((i * 7) % 5) as f64 * 0.1).collect();
        assert_eq!(select_method(&x, &y, StatsBackend::Extended), CorrMethod::Pearson);

        // The proxy passes both series; one outlier in 10 hits the 10% cap.
        let mut z: Vec<f64> = (0..10).map(f64::from).collect();
        z[9] = 500.0;
        let w: Vec<f64> = (0..10).map(f64::from).collect();
        assert_eq!(select_method(&w, &w, StatsBackend::Basic), CorrMethod::Pearson);
        assert_eq!(select_method(&z, &w, StatsBackend::Basic), CorrMethod::Spearman);

        let skewed: Vec<f64> = (0..20).map(|i| (i as f64 / 2.0).exp()).collect();
        assert_eq!(select_method(&x, &skewed, StatsBackend::Extended), CorrMethod::Spearman);
    }

    #[test]
    fn fallback_from_kendall_without_extended_stats() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.5, 2.5, 2.0, 4.5];
        let (corr, used) =
            correlate_with_fallback(CorrMethod::Kendall, &x, &y, StatsBackend::Basic).unwrap();
        assert_eq!(used, CorrMethod::Spearman);
        assert!((corr.coefficient - 0.8).abs() < TOL);
        assert!(corr.p_value.is_nan());
    }

    #[test]
    fn symmetric_with_identity_diagonal() {
        let data = three_methods();
        for rule in [PairRule::Both, PairRule::Any, PairRule::None] {
            let opts = CorrelationOptions {
                pair_rule: rule,
                ..CorrelationOptions::default()
            };
            let m = compute_pairwise(&data, &opts).unwrap();
            for i in 0..m.size() {
                assert_eq!(m.r(i, i), 1.0);
                assert_eq!(m.p(i, i), 0.0);
                assert_eq!(m.n(i, i), data[i].finite_count());
                assert_eq!(m.method_used(i, i), MethodCode::Identity);
                for j in 0..m.size() {
                    let (a, b) = (m.entry(i, j), m.entry(j, i));
                    assert!(a.r == b.r || (a.r.is_nan() && b.r.is_nan()));
                    assert!(a.p == b.p || (a.p.is_nan() && b.p.is_nan()));
                    assert_eq!(a.n, b.n);
                    assert_eq!(a.code, b.code);
                }
            }
        }
    }

    #[test]
    fn pair_rule_monotonicity() {
        let data = three_methods();
        let run = |rule| {
            let opts = CorrelationOptions {
                pair_rule: rule,
                ..CorrelationOptions::default()
            };
            compute_pairwise(&data, &opts).unwrap()
        };
        let (none, any, both) = (run(PairRule::None), run(PairRule::Any), run(PairRule::Both));
        for i in 0..3 {
            for j in 0..3 {
                assert!(none.n(i, j) >= any.n(i, j));
                assert!(any.n(i, j) >= both.n(i, j));
            }
        }
        assert_eq!(none.n(0, 1), 11);
    }

    #[test]
    fn linear_pair_uses_pearson() {
        let a = series("RNA-seq", &[1.0, 2.0, 3.0, 4.0, 5.0], &[f64::NAN; 5]);
        let b = series("qPCR", &[1.1, 2.1, 2.9, 4.2, 4.8], &[f64::NAN; 5]);
        let m = compute_pairwise(&[a, b], &none_rule(CorrMode::Fixed(CorrMethod::Pearson))).unwrap();
        assert_eq!(m.method_used(0, 1), MethodCode::Pearson);
        assert!(m.r(0, 1) > 0.9);
        assert_eq!(m.n(0, 1), 5);
    }

    #[test]
    fn degenerate_pair_is_unevaluable() {
        let a = series("A", &[1.0, f64::NAN, 3.0], &[0.01; 3]);
        let b = series("B", &[2.0, 4.0, f64::NAN], &[0.01; 3]);
        let m = compute_pairwise(&[a, b], &CorrelationOptions::default()).unwrap();
        let e = m.entry(0, 1);
        assert!(e.r.is_nan() && e.p.is_nan());
        assert_eq!(e.code, MethodCode::Unevaluable);
        assert_eq!(e.n, 1);
    }

    #[test]
    fn constant_side_is_unevaluable() {
        let a = series("A", &[2.0, 2.0, 2.0, 2.0], &[0.01; 4]);
        let b = series("B", &[1.0, 2.0, 3.0, 4.0], &[0.01; 4]);
        let m = compute_pairwise(&[a, b], &none_rule(CorrMode::Auto)).unwrap();
        assert_eq!(m.method_used(0, 1), MethodCode::Unevaluable);
        assert_eq!(m.n(0, 1), 4);
    }

    #[test]
    fn details_cover_unordered_pairs() {
        let m = compute_pairwise(&three_methods(), &none_rule(CorrMode::Auto)).unwrap();
        let details = m.details();
        assert_eq!(details.len(), 3);
        assert_eq!((details[0].method_i.as_str(), details[0].method_j.as_str()), ("A", "B"));
        assert_eq!((details[2].method_i.as_str(), details[2].method_j.as_str()), ("B", "C"));
        assert_eq!(m.index_of("C"), Some(2));
    }

    #[test]
    fn input_validation() {
        let a = series("A", &[1.0, 2.0], &[0.01, 0.01]);
        let b = series("B", &[1.0], &[0.01]);
        assert!(compute_pairwise(&[a.clone(), b], &CorrelationOptions::default()).is_err());

        let opts = CorrelationOptions {
            alpha: 0.0,
            ..CorrelationOptions::default()
        };
        assert!(compute_pairwise(&[a], &opts).is_err());
    }

    #[test]
    fn empty_input() {
        let m = compute_pairwise(&[], &CorrelationOptions::default()).unwrap();
        assert_eq!(m.size(), 0);
        assert!(m.details().is_empty());
    }
}

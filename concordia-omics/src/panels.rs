//! Numbers behind the method-comparison panels.
//!
//! Each non-reference method is compared with a reference method (RT-qPCR
//! when present) on the same masked gene/group rows used for correlation:
//! a scatter summary with a least-squares line, and a Bland–Altman summary
//! of the differences.

use std::sync::LazyLock;

use concordia_core::{ConcordiaError, Result};
use concordia_stats::correlation::{Correlation, StatsBackend};
use concordia_stats::descriptive::{is_constant, mean, std_dev};
use concordia_stats::pairwise::{
    masked_pair, select_method, CorrMode, CorrelationOptions, MethodCode, PairRule,
};
use regex::Regex;

use crate::regroup::GroupedMatrices;

/// z for 95% limits of agreement.
pub const LOA_Z: f64 = 1.96;

static RT_QPCR: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?i)rt[\s\-_]*q?pcr").ok());

/// The method other methods are compared against: the first one named like
/// RT-qPCR, else the first method when there are at least two.
pub fn reference_method(methods: &[String]) -> Option<&str> {
    let named = RT_QPCR
        .as_ref()
        .and_then(|re| methods.iter().find(|m| re.is_match(m)));
    match named {
        Some(m) => Some(m.as_str()),
        None if methods.len() >= 2 => Some(methods[0].as_str()),
        None => None,
    }
}

/// Paired values of two methods after the pair rule.
pub fn paired_values(
    grouped: &GroupedMatrices,
    x_method: &str,
    y_method: &str,
    alpha: f64,
    rule: PairRule,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let series = grouped.method_series();
    let find = |name: &str| {
        series.iter().find(|s| s.label == name).ok_or_else(|| {
            ConcordiaError::InvalidInput(format!("unknown method '{name}'"))
        })
    };
    Ok(masked_pair(find(x_method)?, find(y_method)?, alpha, rule))
}

/// Scatter panel summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSummary {
    pub n: usize,
    /// Least-squares slope of y on x; `None` when x is constant.
    pub slope: Option<f64>,
    pub intercept: Option<f64>,
    pub correlation: Correlation,
    pub code: MethodCode,
}

/// Least-squares line `y = slope·x + intercept`.
pub fn least_squares(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 || is_constant(x) {
        return None;
    }
    let mx = mean(x).ok()?;
    let my = mean(y).ok()?;
    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (xi, yi)| (sxy + (xi - mx) * (yi - my), sxx + (xi - mx).powi(2)));
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

/// Scatter summary of paired samples; the statistic is chosen like the
/// correlation engine does but never falls back.
pub fn scatter_summary(x: &[f64], y: &[f64], corr_mode: CorrMode, backend: StatsBackend) -> Result<ScatterSummary> {
    if x.len() != y.len() || x.len() < 2 {
        return Err(ConcordiaError::insufficient(
            "comparison panels",
            format!("need at least 2 paired values (got {})", x.len().min(y.len())),
        ));
    }
    let method = match corr_mode {
        CorrMode::Auto => select_method(x, y, backend),
        CorrMode::Fixed(m) => m,
    };
    let line = least_squares(x, y);
    Ok(ScatterSummary {
        n: x.len(),
        slope: line.map(|(s, _)| s),
        intercept: line.map(|(_, i)| i),
        correlation: method.compute(x, y, backend)?,
        code: method.into(),
    })
}

/// Bland–Altman agreement summary of `y` against `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlandAltman {
    /// Mean of `y − x`.
    pub mean_difference: f64,
    /// Sample SD of the differences (0 for a single pair).
    pub sd_difference: f64,
    pub lower_limit: f64,
    pub upper_limit: f64,
    /// Per-pair `(x + y) / 2`.
    pub means: Vec<f64>,
    /// Per-pair `y − x`.
    pub differences: Vec<f64>,
}

pub fn bland_altman(x: &[f64], y: &[f64]) -> Result<BlandAltman> {
    if x.len() != y.len() || x.is_empty() {
        return Err(ConcordiaError::insufficient(
            "comparison panels",
            "Bland-Altman needs equally long, non-empty samples",
        ));
    }
    let means: Vec<f64> = x.iter().zip(y).map(|(a, b)| (a + b) / 2.0).collect();
    let differences: Vec<f64> = x.iter().zip(y).map(|(a, b)| b - a).collect();
    let md = mean(&differences)?;
    let sd = if differences.len() > 1 {
        std_dev(&differences, 1)?
    } else {
        0.0
    };
    Ok(BlandAltman {
        mean_difference: md,
        sd_difference: sd,
        lower_limit: md - LOA_Z * sd,
        upper_limit: md + LOA_Z * sd,
        means,
        differences,
    })
}

/// Outcome of one reference-vs-method comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelOutcome {
    Computed {
        scatter: ScatterSummary,
        agreement: BlandAltman,
    },
    /// Fewer than two pairs survived the pair rule.
    InsufficientPairs { n: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonPanel {
    pub reference: String,
    pub other: String,
    pub outcome: PanelOutcome,
}

/// One panel per non-reference method, in method order.
pub fn panels_for(grouped: &GroupedMatrices, options: &CorrelationOptions) -> Result<Vec<ComparisonPanel>> {
    let methods = grouped.methods();
    let Some(reference) = reference_method(methods) else {
        return Ok(Vec::new());
    };

    let mut panels = Vec::new();
    for other in methods.iter().filter(|m| m.as_str() != reference) {
        let (x, y) = paired_values(grouped, reference, other, options.alpha, options.pair_rule)?;
        let outcome = if x.len() < 2 {
            log::warn!("{reference} vs {other}: insufficient pairs ({})", x.len());
            PanelOutcome::InsufficientPairs { n: x.len() }
        } else {
            PanelOutcome::Computed {
                scatter: scatter_summary(&x, &y, options.corr_mode, options.backend)?,
                agreement: bland_altman(&x, &y)?,
            }
        };
        panels.push(ComparisonPanel {
            reference: reference.to_string(),
            other: other.clone(),
            outcome,
        });
    }
    Ok(panels)
}

// ── Tests ──────────────────────────────────────────────────────────────────

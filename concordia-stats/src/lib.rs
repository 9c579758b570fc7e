//! Statistics for cross-method expression concordance.
//!
//! - **Descriptive statistics** — mean, variance, moments, missing-aware helpers
//! - **Ranking** — average ranks, tie blocks
//! - **Distributions** — normal, Student's t, χ² and the special functions behind them
//! - **Correlation** — Pearson, Spearman, Kendall's tau-b with p-values
//! - **Normality** — Shapiro–Wilk, D'Agostino–Pearson, distinct-value proxy
//! - **Outliers** — Tukey fence outlier fraction
//! - **Pairwise engine** — per-pair statistic selection with fallback
//!
//! # Quick start
//!
//! ```
//! use concordia_stats::pairwise::{compute_pairwise, CorrelationOptions, MethodSeries, PairRule};
//!
//! let nan = f64::NAN;
//! let series = vec![
//!     MethodSeries::new("RNA-seq", vec![1.0, 2.0, 3.0, 4.0], vec![nan; 4]),
//!     MethodSeries::new("RT-qPCR", vec![1.2, 1.9, 3.3, 3.8], vec![nan; 4]),
//! ];
//! let options = CorrelationOptions { pair_rule: PairRule::None, ..Default::default() };
//! let result = compute_pairwise(&series, &options).unwrap();
//!
//! assert_eq!(result.r(0, 0), 1.0);
//! assert_eq!(result.n(0, 1), 4);
//! assert_eq!(result.method_used(0, 1).as_str(), "K");
//! ```

pub mod correlation;
pub mod descriptive;
pub mod distribution;
pub mod normality;
pub mod outlier;
pub mod pairwise;
pub mod rank;

pub use correlation::{Correlation, StatsBackend};
pub use pairwise::{
    compute_pairwise, CorrMethod, CorrMode, CorrelationOptions, MethodCode, MethodSeries,
    PairRule, PairwiseMatrices,
};

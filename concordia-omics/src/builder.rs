//! Matrix construction from per-method datasets.
//!
//! [`build_matrices`] turns the parsed rows of every method into:
//!
//! - the long table of [`Observation`]s (input order preserved),
//! - a wide gene × `condition\nmethod` matrix of mean log2 fold changes and
//!   its row-wise Z-scores (the heatmap input, built from all observations),
//! - value (mean log2FC) and p-value (min p) matrices keyed by
//!   (gene, normalized condition) × method.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::str::FromStr;

use concordia_core::{ConcordiaError, Result, Summarizable};
use log::{debug, info, warn};

use crate::condition::{collapse_whitespace, normalize_condition};
use crate::gene::GeneCollapser;
use crate::matrix::{pivot, Aggregate, LabeledMatrix, PairedKey};
use crate::observation::{Dataset, LongTable, Observation};

/// What to do when distinct raw labels of one method normalize to the same
/// condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CollisionPolicy {
    /// Aggregate silently.
    #[default]
    Merge,
    /// Aggregate and log a warning.
    Warn,
    /// Refuse to build.
    Error,
}

impl FromStr for CollisionPolicy {
    type Err = ConcordiaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(CollisionPolicy::Merge),
            "warn" => Ok(CollisionPolicy::Warn),
            "error" => Ok(CollisionPolicy::Error),
            other => Err(ConcordiaError::InvalidInput(format!(
                "unknown label collision policy '{other}' (expected merge, warn or error)",
            ))),
        }
    }
}

/// Options for [`build_matrices`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Canonicalize condition labels (time + light regime).
    pub auto_normalize: bool,
    pub collision: CollisionPolicy,
    pub collapser: GeneCollapser,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            auto_normalize: true,
            collision: CollisionPolicy::default(),
            collapser: GeneCollapser::default(),
        }
    }
}

/// Everything [`build_matrices`] produces.
#[derive(Debug, Clone)]
pub struct BuiltMatrices {
    /// Mean log2FC, genes × `condition\nmethod`.
    pub combined: LabeledMatrix<String>,
    /// `combined` standardized per gene row.
    pub combined_z: LabeledMatrix<String>,
    /// Mean log2FC, (gene, condition) × method.
    pub value_matrix: LabeledMatrix<PairedKey>,
    /// Min p-value on exactly the index of `value_matrix`.
    pub pvalue_matrix: LabeledMatrix<PairedKey>,
    pub long_table: LongTable,
}

/// Wide-matrix column name for a condition measured by a method.
pub fn column_label(condition: &str, method: &str) -> String {
    format!("{condition}\n{method}")
}

/// Normalize labels and genes of every dataset into one long table.
pub fn build_long_table(datasets: &[Dataset], options: &BuildOptions) -> Result<LongTable> {
    if datasets.is_empty() {
        return Err(ConcordiaError::InvalidInput("no datasets given".into()));
    }
    let mut methods = HashSet::new();
    for ds in datasets {
        if ds.method.trim().is_empty() {
            return Err(ConcordiaError::InvalidInput("dataset method label must not be empty".into()));
        }
        if !methods.insert(ds.method.as_str()) {
            return Err(ConcordiaError::InvalidInput(format!(
                "duplicate method label '{}'",
                ds.method
            )));
        }
    }

    let mut observations = Vec::with_capacity(datasets.iter().map(|d| d.records.len()).sum());
    for ds in datasets {
        let mut by_condition: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for rec in &ds.records {
            let raw_label = collapse_whitespace(&rec.raw_label);
            let normalized_condition = normalize_condition(&raw_label, options.auto_normalize);
            by_condition
                .entry(normalized_condition.clone())
                .or_default()
                .insert(raw_label.clone());
            observations.push(Observation {
                method: ds.method.clone(),
                raw_label,
                normalized_condition,
                gene: options.collapser.collapse(rec.gene.trim()),
                log2_fold_change: rec.log2_fold_change,
                p_value: rec.p_value,
            });
        }
        check_collisions(&ds.method, &by_condition, options.collision)?;
    }

    Ok(LongTable::new(observations))
}

fn check_collisions(
    method: &str,
    by_condition: &BTreeMap<String, BTreeSet<String>>,
    policy: CollisionPolicy,
) -> Result<()> {
    for (condition, raws) in by_condition.iter().filter(|(_, raws)| raws.len() > 1) {
        let raws: Vec<&str> = raws.iter().map(String::as_str).collect();
        match policy {
            CollisionPolicy::Merge => {
                debug!("{method}: merging labels [{}] into '{condition}'", raws.join("; "));
            }
            CollisionPolicy::Warn => {
                warn!("{method}: labels [{}] all normalize to '{condition}' and are aggregated", raws.join("; "));
            }
            CollisionPolicy::Error => {
                return Err(ConcordiaError::InvalidInput(format!(
                    "{method}: labels [{}] all normalize to condition '{condition}'",
                    raws.join("; ")
                )));
            }
        }
    }
    Ok(())
}

/// Value (mean) and p-value (min) matrices of `observations` keyed by
/// `(gene, key(observation))` × method. The p-value matrix is reindexed to
/// the value matrix.
pub(crate) fn pivot_by_method<'a>(
    observations: impl IntoIterator<Item = &'a Observation> + Clone,
    key: impl Fn(&Observation) -> Option<String>,
) -> (LabeledMatrix<PairedKey>, LabeledMatrix<PairedKey>) {
    let cells = |value: fn(&Observation) -> f64| {
        observations
            .clone()
            .into_iter()
            .filter_map(|o| Some((PairedKey::new(o.gene.clone(), key(o)?), o.method.clone(), value(o))))
            .collect::<Vec<_>>()
    };
    let values = pivot(cells(|o| o.log2_fold_change), Aggregate::Mean);
    let pvalues = pivot(cells(|o| o.p_value), Aggregate::Min)
        .reindex(values.row_labels(), values.col_labels());
    (values, pvalues)
}

/// Build every matrix from the datasets, in dataset order.
pub fn build_matrices(datasets: &[Dataset], options: &BuildOptions) -> Result<BuiltMatrices> {
    let long_table = build_long_table(datasets, options)?;

    let mut combined = LabeledMatrix::missing(Vec::new(), Vec::new());
    for ds in datasets {
        let block = pivot(
            long_table
                .iter()
                .filter(|o| o.method == ds.method)
                .map(|o| (o.gene.clone(), o.normalized_condition.clone(), o.log2_fold_change)),
            Aggregate::Mean,
        )
        .map_columns(|c| column_label(c, &ds.method));
        debug!("{}: {}", ds.method, block.summary());
        combined = combined.outer_join(&block)?;
    }
    let combined_z = combined.z_score_rows();

    let (value_matrix, pvalue_matrix) =
        pivot_by_method(long_table.iter(), |o| Some(o.normalized_condition.clone()));

    info!("{}", long_table.summary());
    info!("combined heatmap matrix: {}", combined.summary());
    info!("condition value matrix: {}", value_matrix.summary());

    Ok(BuiltMatrices {
        combined,
        combined_z,
        value_matrix,
        pvalue_matrix,
        long_table,
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::QuantRecord;

    const TOL: f64 = 1e-10;

    fn rec(label: &str, gene: &str, p: f64, l2fc: f64) -> QuantRecord {
        QuantRecord::new(label, gene, p, l2fc)
    }

    fn datasets() -> Vec<Dataset> {
        vec![
            Dataset::new(
                "RNA-seq",
                vec![
                    rec("6h  light", "GATA-4_t1", 0.01, 1.0),
                    rec("6h light", "GATA-4_t2", 0.03, 3.0),
                    rec("dark 6h", "GATA-4", 0.2, -1.0),
                    rec("6h light", "ACT1", f64::NAN, 0.5),
                ],
            ),
            Dataset::new(
                "RT-qPCR",
                vec![
                    rec("Light, 6 hours", "GATA-4", 0.02, 2.5),
                    rec("Light, 6 hours", "HSP70", 0.04, f64::NAN),
                ],
            ),
        ]
    }

    #[test]
    fn long_table_normalizes_and_collapses() {
        let t = build_long_table(&datasets(), &BuildOptions::default()).unwrap();
        assert_eq!(t.len(), 6);
        let first = &t.observations()[0];
        assert_eq!(first.raw_label, "6h light");
        assert_eq!(first.gene, "GATA-4");
        assert_eq!(t.observations()[4].normalized_condition, "6h light");
        assert_eq!(t.identities().len(), 3);
    }

    #[test]
    fn wide_matrix_columns_in_dataset_order() {
        let built = build_matrices(&datasets(), &BuildOptions::default()).unwrap();
        let cols = built.combined.col_labels();
        assert_eq!(cols, &["6h dark\nRNA-seq", "6h light\nRNA-seq", "6h light\nRT-qPCR"]);
        // HSP70 only has a missing log2FC and never gets a row.
        assert_eq!(built.combined.row_labels(), &["ACT1", "GATA-4"]);
        let gata = "GATA-4".to_string();
        assert!((built.combined.value(&gata, "6h light\nRNA-seq").unwrap() - 2.0).abs() < TOL);
        assert!(built.combined.value(&"ACT1".to_string(), "6h light\nRT-qPCR").unwrap().is_nan());
    }

    #[test]
    fn z_scores_per_gene() {
        let built = build_matrices(&datasets(), &BuildOptions::default()).unwrap();
        let row = built.combined_z.row(1).unwrap();
        // GATA-4: -1, 2, 2.5 → mean 7/6
        let sum: f64 = row.iter().sum();
        assert!(sum.abs() < TOL);
        // ACT1 has a single value and no deviation.
        assert!(built.combined_z.row(0).unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn legacy_matrices_aligned() {
        let built = build_matrices(&datasets(), &BuildOptions::default()).unwrap();
        let v = &built.value_matrix;
        let p = &built.pvalue_matrix;
        assert_eq!(v.col_labels(), &["RNA-seq", "RT-qPCR"]);
        assert_eq!(v.row_labels(), p.row_labels());
        assert_eq!(v.col_labels(), p.col_labels());

        let key = PairedKey::new("GATA-4", "6h light");
        assert!((v.value(&key, "RNA-seq").unwrap() - 2.0).abs() < TOL);
        assert!((p.value(&key, "RNA-seq").unwrap() - 0.01).abs() < TOL);
        assert!((p.value(&key, "RT-qPCR").unwrap() - 0.02).abs() < TOL);
        // A p-value whose log2FC is missing has no row to land in.
        assert!(v.row_index(&PairedKey::new("HSP70", "6h light")).is_none());
        assert!(p.value(&PairedKey::new("ACT1", "6h light"), "RNA-seq").unwrap().is_nan());
    }

    #[test]
    fn auto_normalize_off_keeps_labels() {
        let opts = BuildOptions {
            auto_normalize: false,
            ..BuildOptions::default()
        };
        let built = build_matrices(&datasets(), &opts).unwrap();
        assert!(built.combined.col_index("Light, 6 hours\nRT-qPCR").is_some());
        assert!(built.combined.col_index("6h light\nRNA-seq").is_some());
    }

    #[test]
    fn collision_policies() {
        let ds = vec![Dataset::new(
            "RNA-seq",
            vec![rec("6h light", "g", 0.01, 1.0), rec("Light 6 hours", "g", 0.01, 3.0)],
        )];
        for policy in [CollisionPolicy::Merge, CollisionPolicy::Warn] {
            let opts = BuildOptions {
                collision: policy,
                ..BuildOptions::default()
            };
            let built = build_matrices(&ds, &opts).unwrap();
            assert_eq!(built.combined.shape(), (1, 1));
        }
        let opts = BuildOptions {
            collision: CollisionPolicy::Error,
            ..BuildOptions::default()
        };
        let err = build_matrices(&ds, &opts).unwrap_err();
        assert!(err.to_string().contains("6h light"));
        assert_eq!("WARN".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::Warn);
        assert!("ignore".parse::<CollisionPolicy>().is_err());
    }

    #[test]
    fn rejects_bad_dataset_lists() {
        assert!(build_matrices(&[], &BuildOptions::default()).is_err());
        let dup = vec![Dataset::new("A", vec![]), Dataset::new("A", vec![])];
        assert!(build_matrices(&dup, &BuildOptions::default()).is_err());
    }
}

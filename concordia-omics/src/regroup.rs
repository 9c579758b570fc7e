//! Value and p-value matrices keyed by equivalence group.
//!
//! After grouping, only grouped observations take part in correlation. The
//! long table is filtered to identities with a group mapping and re-pivoted
//! on `(gene, group) × method`, then optionally narrowed to a selection of
//! groups.

use std::collections::{BTreeMap, BTreeSet};

use concordia_core::{ConcordiaError, Result, Summarizable};
use concordia_stats::pairwise::MethodSeries;
use log::{info, warn};

use crate::builder::pivot_by_method;
use crate::matrix::{LabeledMatrix, PairedKey};
use crate::observation::{Identity, LongTable};

const REBUILD_STAGE: &str = "group rebuild";
const SELECT_STAGE: &str = "group selection";

/// Group-keyed value (mean log2FC) and p-value (min p) matrices sharing one
/// index.
#[derive(Debug, Clone)]
pub struct GroupedMatrices {
    values: LabeledMatrix<PairedKey>,
    pvalues: LabeledMatrix<PairedKey>,
}

impl GroupedMatrices {
    /// Re-pivot the grouped part of `long_table`.
    ///
    /// Fails with `InsufficientData` when no observation has a group.
    pub fn rebuild(long_table: &LongTable, mapping: &BTreeMap<Identity, String>) -> Result<Self> {
        if mapping.is_empty() {
            return Err(ConcordiaError::insufficient(
                REBUILD_STAGE,
                "no equivalence groups defined; correlations are not computed",
            ));
        }
        let grouped = long_table.filter(|o| mapping.contains_key(&o.identity()));
        if grouped.is_empty() {
            return Err(ConcordiaError::insufficient(
                REBUILD_STAGE,
                "no observations left after applying the group mapping",
            ));
        }

        let (values, pvalues) =
            pivot_by_method(grouped.iter(), |o| mapping.get(&o.identity()).cloned());
        if values.is_empty() {
            return Err(ConcordiaError::insufficient(
                REBUILD_STAGE,
                "grouped observations carry no finite log2 fold change",
            ));
        }
        info!(
            "{} grouped observations → {}",
            grouped.len(),
            values.summary()
        );
        Ok(Self { values, pvalues })
    }

    pub fn values(&self) -> &LabeledMatrix<PairedKey> {
        &self.values
    }

    pub fn pvalues(&self) -> &LabeledMatrix<PairedKey> {
        &self.pvalues
    }

    pub fn methods(&self) -> &[String] {
        self.values.col_labels()
    }

    /// Sorted distinct group labels present in the rows.
    pub fn group_labels(&self) -> Vec<String> {
        self.values
            .row_labels()
            .iter()
            .map(|k| k.key.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Keep only rows of the selected groups; methods (columns) are kept.
    pub fn select_groups<S: AsRef<str>>(&self, selected: &[S]) -> Result<Self> {
        if selected.is_empty() {
            return Err(ConcordiaError::insufficient(SELECT_STAGE, "select at least one group"));
        }
        let wanted: BTreeSet<&str> = selected.iter().map(|s| s.as_ref()).collect();
        let known = self.group_labels();
        for label in wanted.iter().filter(|l| !known.iter().any(|k| k == *l)) {
            warn!("selected group '{label}' has no data and is ignored");
        }

        let rows: Vec<PairedKey> = self
            .values
            .row_labels()
            .iter()
            .filter(|k| wanted.contains(k.key.as_str()))
            .cloned()
            .collect();
        if rows.is_empty() {
            return Err(ConcordiaError::insufficient(
                SELECT_STAGE,
                "no gene/group rows left for the selected groups",
            ));
        }
        let cols = self.values.col_labels();
        Ok(Self {
            values: self.values.reindex(&rows, cols),
            pvalues: self.pvalues.reindex(&rows, cols),
        })
    }

    /// One series per method, aligned on the shared rows, ready for
    /// correlation.
    pub fn method_series(&self) -> Vec<MethodSeries> {
        self.methods()
            .iter()
            .enumerate()
            .map(|(c, method)| {
                MethodSeries::new(
                    method.clone(),
                    self.values.column(c).unwrap_or_default(),
                    self.pvalues.column(c).unwrap_or_default(),
                )
            })
            .collect()
    }
}

impl Summarizable for GroupedMatrices {
    fn summary(&self) -> String {
        let (rows, cols) = self.values.shape();
        format!(
            "GroupedMatrices: {} gene/group rows \u{00d7} {} methods, {} groups",
            rows,
            cols,
            self.group_labels().len()
        )
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Observation;

    const TOL: f64 = 1e-10;

    fn obs(method: &str, raw: &str, gene: &str, l2fc: f64, p: f64) -> Observation {
        Observation {
            method: method.into(),
            raw_label: raw.into(),
            normalized_condition: raw.to_lowercase(),
            gene: gene.into(),
            log2_fold_change: l2fc,
            p_value: p,
        }
    }

    fn table() -> LongTable {
        LongTable::new(vec![
            obs("RNA-seq", "6h light", "g1", 1.0, 0.01),
            obs("RNA-seq", "6h light", "g2", 2.0, 0.02),
            obs("RNA-seq", "6h dark", "g1", -1.0, 0.3),
            obs("RNA-seq", "12h dark", "g1", 5.0, 0.3),
            obs("qPCR", "Light 6 hours", "g1", 1.5, 0.04),
            obs("qPCR", "Light 6h (rep2)", "g1", 2.5, 0.001),
            obs("qPCR", "Dark 6 hours", "g2", -2.0, 0.5),
        ])
    }

    fn mapping() -> BTreeMap<Identity, String> {
        BTreeMap::from([
            (Identity::new("RNA-seq", "6h light"), "L6".to_string()),
            (Identity::new("qPCR", "Light 6 hours"), "L6".to_string()),
            (Identity::new("qPCR", "Light 6h (rep2)"), "L6".to_string()),
            (Identity::new("RNA-seq", "6h dark"), "D6".to_string()),
            (Identity::new("qPCR", "Dark 6 hours"), "D6".to_string()),
        ])
    }

    #[test]
    fn rebuild_aggregates_by_group() {
        let g = GroupedMatrices::rebuild(&table(), &mapping()).unwrap();
        assert_eq!(g.methods(), &["RNA-seq", "qPCR"]);
        assert_eq!(g.group_labels(), vec!["D6", "L6"]);
        let key = PairedKey::new("g1", "L6");
        assert!((g.values().value(&key, "qPCR").unwrap() - 2.0).abs() < TOL);
        assert!((g.pvalues().value(&key, "qPCR").unwrap() - 0.001).abs() < TOL);
        // The ungrouped 12h dark observation is gone.
        assert!((g.values().value(&PairedKey::new("g1", "D6"), "RNA-seq").unwrap() + 1.0).abs() < TOL);
        assert_eq!(g.values().row_labels(), g.pvalues().row_labels());
    }

    #[test]
    fn rebuild_requires_grouped_rows() {
        let err = GroupedMatrices::rebuild(&table(), &BTreeMap::new()).unwrap_err();
        assert!(err.is_insufficient_data());
        let elsewhere = BTreeMap::from([(Identity::new("other", "x"), "G".to_string())]);
        let err = GroupedMatrices::rebuild(&table(), &elsewhere).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn selection_narrows_rows() {
        let g = GroupedMatrices::rebuild(&table(), &mapping()).unwrap();
        let sel = g.select_groups(&["L6"]).unwrap();
        assert_eq!(sel.group_labels(), vec!["L6"]);
        assert_eq!(sel.values().shape(), (2, 2));
        assert_eq!(sel.methods(), g.methods());

        assert!(g.select_groups::<&str>(&[]).unwrap_err().is_insufficient_data());
        assert!(g.select_groups(&["nope"]).unwrap_err().is_insufficient_data());
    }

    #[test]
    fn series_follow_columns() {
        let g = GroupedMatrices::rebuild(&table(), &mapping()).unwrap();
        let series = g.method_series();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].label, "qPCR");
        assert_eq!(series[0].values.len(), g.values().shape().0);
        assert_eq!(series[0].p_values.len(), series[0].values.len());
    }
}

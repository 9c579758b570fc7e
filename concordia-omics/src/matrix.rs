//! Dense labeled matrices with missing values.
//!
//! [`LabeledMatrix`] stores a row-major matrix of `f64` values with row keys
//! and column names. Missing cells are `NaN`. Rows are keyed by gene
//! (`String`) in the wide heatmap matrix and by [`PairedKey`] (gene plus
//! condition or group) in the per-method value and p-value matrices.
//!
//! [`pivot`] builds one from long-form `(row, column, value)` cells, the way
//! a pivot table with a mean or min aggregate would.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use concordia_core::{ConcordiaError, Result, Summarizable};
use concordia_stats::descriptive::{nan_mean, nan_std};

/// Key of a matrix row: the fields written in front of the values on export.
pub trait RowKey: Clone + Ord + fmt::Debug {
    fn fields(&self) -> Vec<&str>;
}

impl RowKey for String {
    fn fields(&self) -> Vec<&str> {
        vec![self.as_str()]
    }
}

/// A gene together with a condition or group label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairedKey {
    pub gene: String,
    pub key: String,
}

impl PairedKey {
    pub fn new(gene: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            gene: gene.into(),
            key: key.into(),
        }
    }
}

impl RowKey for PairedKey {
    fn fields(&self) -> Vec<&str> {
        vec![self.gene.as_str(), self.key.as_str()]
    }
}

impl fmt::Display for PairedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.gene, self.key)
    }
}

/// A dense, row-major matrix with labeled rows and columns.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix<R> {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
    row_labels: Vec<R>,
    col_labels: Vec<String>,
}

impl<R: RowKey> LabeledMatrix<R> {
    /// Create a matrix from row-major 2D data.
    pub fn new(data: Vec<Vec<f64>>, row_labels: Vec<R>, col_labels: Vec<String>) -> Result<Self> {
        let n_rows = data.len();
        let n_cols = col_labels.len();
        if row_labels.len() != n_rows {
            return Err(ConcordiaError::InvalidInput(format!(
                "row_labels length ({}) does not match row count ({n_rows})",
                row_labels.len()
            )));
        }

        let mut flat = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in data.iter().enumerate() {
            if row.len() != n_cols {
                return Err(ConcordiaError::InvalidInput(format!(
                    "row {i} has {} columns, expected {n_cols}",
                    row.len()
                )));
            }
            flat.extend_from_slice(row);
        }

        Ok(Self {
            data: flat,
            n_rows,
            n_cols,
            row_labels,
            col_labels,
        })
    }

    /// A matrix of the given labels with every cell missing.
    pub fn missing(row_labels: Vec<R>, col_labels: Vec<String>) -> Self {
        let (n_rows, n_cols) = (row_labels.len(), col_labels.len());
        Self {
            data: vec![f64::NAN; n_rows * n_cols],
            n_rows,
            n_cols,
            row_labels,
            col_labels,
        }
    }

    /// (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0 || self.n_cols == 0
    }

    pub fn row_labels(&self) -> &[R] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn row_index(&self, key: &R) -> Option<usize> {
        self.row_labels.iter().position(|r| r == key)
    }

    pub fn col_index(&self, name: &str) -> Option<usize> {
        self.col_labels.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.n_rows && col < self.n_cols {
            Some(self.data[row * self.n_cols + col])
        } else {
            None
        }
    }

    /// Look a cell up by labels.
    pub fn value(&self, row: &R, col: &str) -> Option<f64> {
        self.get(self.row_index(row)?, self.col_index(col)?)
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.n_cols + col] = value;
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row < self.n_rows {
            let start = row * self.n_cols;
            Some(&self.data[start..start + self.n_cols])
        } else {
            None
        }
    }

    /// Column copy (data is row-major).
    pub fn column(&self, col: usize) -> Option<Vec<f64>> {
        if col >= self.n_cols {
            return None;
        }
        Some((0..self.n_rows).map(|r| self.data[r * self.n_cols + col]).collect())
    }

    /// Number of non-missing cells.
    pub fn count_finite(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }

    /// Standardize every row over its finite cells: subtract the mean and
    /// divide by the sample standard deviation (ddof = 1).
    ///
    /// Rows with zero or undefined deviation become entirely missing.
    pub fn z_score_rows(&self) -> Self {
        let mut out = self.clone();
        for r in 0..self.n_rows {
            let row = &self.data[r * self.n_cols..(r + 1) * self.n_cols];
            let mean = nan_mean(row);
            let sd = nan_std(row, 1);
            let usable = sd.is_finite() && sd > 0.0;
            for c in 0..self.n_cols {
                let z = if usable { (row[c] - mean) / sd } else { f64::NAN };
                out.set(r, c, z);
            }
        }
        out
    }

    /// Conform to the given labels: cells present in `self` are carried over,
    /// everything else is missing.
    pub fn reindex(&self, row_labels: &[R], col_labels: &[String]) -> Self {
        let mut out = Self::missing(row_labels.to_vec(), col_labels.to_vec());
        let col_map: Vec<Option<usize>> = col_labels.iter().map(|c| self.col_index(c)).collect();
        let row_lookup: BTreeMap<&R, usize> =
            self.row_labels.iter().enumerate().map(|(i, r)| (r, i)).collect();
        for (r, key) in row_labels.iter().enumerate() {
            let Some(&src_r) = row_lookup.get(key) else {
                continue;
            };
            for (c, src_c) in col_map.iter().enumerate() {
                if let Some(src_c) = src_c {
                    out.set(r, c, self.data[src_r * self.n_cols + src_c]);
                }
            }
        }
        out
    }

    /// Join on row keys, appending `other`'s columns. Rows are the sorted
    /// union of both row sets.
    pub fn outer_join(&self, other: &Self) -> Result<Self> {
        if let Some(dup) = other.col_labels.iter().find(|c| self.col_labels.contains(c)) {
            return Err(ConcordiaError::InvalidInput(format!(
                "outer_join: column '{}' present on both sides",
                dup.escape_debug()
            )));
        }
        let rows: BTreeSet<R> = self
            .row_labels
            .iter()
            .chain(other.row_labels.iter())
            .cloned()
            .collect();
        let rows: Vec<R> = rows.into_iter().collect();
        let left = self.reindex(&rows, &self.col_labels);
        let right = other.reindex(&rows, &other.col_labels);

        let mut cols = self.col_labels.clone();
        cols.extend(other.col_labels.iter().cloned());
        let mut out = Self::missing(rows, cols);
        for r in 0..out.n_rows {
            for c in 0..left.n_cols {
                out.set(r, c, left.data[r * left.n_cols + c]);
            }
            for c in 0..right.n_cols {
                out.set(r, left.n_cols + c, right.data[r * right.n_cols + c]);
            }
        }
        Ok(out)
    }

    /// Rename columns in place of their old names.
    pub fn map_columns(mut self, f: impl Fn(&str) -> String) -> Self {
        self.col_labels = self.col_labels.iter().map(|c| f(c)).collect();
        self
    }
}

impl<R: RowKey> Summarizable for LabeledMatrix<R> {
    fn summary(&self) -> String {
        format!(
            "LabeledMatrix: {} rows \u{00d7} {} columns, {} non-missing",
            self.n_rows,
            self.n_cols,
            self.count_finite()
        )
    }
}

/// How duplicate cells are combined by [`pivot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Min,
}

#[derive(Default)]
struct Cell {
    sum: f64,
    count: usize,
    min: f64,
}

/// Pivot long-form cells into a matrix.
///
/// Non-finite values are skipped; a row or column appears only if at least
/// one finite value lands in it. Rows and columns come out sorted.
pub fn pivot<R: RowKey>(
    cells: impl IntoIterator<Item = (R, String, f64)>,
    aggregate: Aggregate,
) -> LabeledMatrix<R> {
    let mut acc: BTreeMap<(R, String), Cell> = BTreeMap::new();
    for (row, col, value) in cells {
        if !value.is_finite() {
            continue;
        }
        let cell = acc.entry((row, col)).or_insert(Cell {
            min: f64::INFINITY,
            ..Cell::default()
        });
        cell.sum += value;
        cell.count += 1;
        cell.min = cell.min.min(value);
    }

    let rows: Vec<R> = acc
        .keys()
        .map(|(r, _)| r.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let cols: Vec<String> = acc
        .keys()
        .map(|(_, c)| c.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let col_pos: BTreeMap<&String, usize> = cols.iter().enumerate().map(|(i, c)| (c, i)).collect();

    let mut out = LabeledMatrix::missing(rows.clone(), cols.clone());
    let mut r = 0;
    for ((row, col), cell) in &acc {
        // Keys iterate in row order, so the row cursor only moves forward.
        while rows[r] != *row {
            r += 1;
        }
        let value = match aggregate {
            Aggregate::Mean => cell.sum / cell.count as f64,
            Aggregate::Min => cell.min,
        };
        out.set(r, col_pos[col], value);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn genes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn example() -> LabeledMatrix<String> {
        LabeledMatrix::new(
            vec![vec![1.0, 2.0, 3.0], vec![5.0, 5.0, f64::NAN]],
            genes(&["g1", "g2"]),
            genes(&["a", "b", "c"]),
        )
        .unwrap()
    }

    #[test]
    fn new_validates_shape() {
        let m = example();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(0, 2), Some(3.0));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.value(&"g2".to_string(), "b"), Some(5.0));
        assert!(LabeledMatrix::new(vec![vec![1.0]], genes(&["g1", "g2"]), genes(&["a"])).is_err());
        assert!(LabeledMatrix::new(vec![vec![1.0, 2.0]], genes(&["g1"]), genes(&["a"])).is_err());
    }

    #[test]
    fn z_score_row_properties() {
        let m = LabeledMatrix::new(
            vec![vec![1.0, f64::NAN, 4.0, 7.0, 2.5]],
            genes(&["g1"]),
            genes(&["a", "b", "c", "d", "e"]),
        )
        .unwrap();
        let z = m.z_score_rows();
        let row = z.row(0).unwrap();
        assert!(row[1].is_nan());
        let finite: Vec<f64> = row.iter().copied().filter(|v| v.is_finite()).collect();
        assert_eq!(finite.len(), 4);
        assert!(nan_mean(&finite).abs() < TOL);
        assert!((nan_std(&finite, 1) - 1.0).abs() < TOL);
    }

    #[test]
    fn z_score_constant_row_is_missing() {
        let z = example().z_score_rows();
        assert!(z.row(1).unwrap().iter().all(|v| v.is_nan()));
        // Single finite value: undefined deviation.
        let single = LabeledMatrix::new(vec![vec![3.0, f64::NAN]], genes(&["g"]), genes(&["a", "b"]))
            .unwrap()
            .z_score_rows();
        assert!(single.row(0).unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn pivot_mean_and_min() {
        let cells = vec![
            ("g2".to_string(), "x".to_string(), 1.0),
            ("g1".to_string(), "y".to_string(), 2.0),
            ("g1".to_string(), "y".to_string(), 4.0),
            ("g1".to_string(), "x".to_string(), f64::NAN),
            ("g3".to_string(), "z".to_string(), f64::NAN),
        ];
        let mean = pivot(cells.clone(), Aggregate::Mean);
        assert_eq!(mean.row_labels(), &genes(&["g1", "g2"])[..]);
        assert_eq!(mean.col_labels(), &genes(&["x", "y"])[..]);
        assert!((mean.value(&"g1".to_string(), "y").unwrap() - 3.0).abs() < TOL);
        assert!(mean.value(&"g1".to_string(), "x").unwrap().is_nan());

        let min = pivot(cells, Aggregate::Min);
        assert!((min.value(&"g1".to_string(), "y").unwrap() - 2.0).abs() < TOL);
    }

    #[test]
    fn reindex_fills_missing() {
        let m = example();
        let r = m.reindex(&genes(&["g2", "g9"]), &genes(&["c", "a"]));
        assert_eq!(r.shape(), (2, 2));
        assert!(r.get(0, 0).unwrap().is_nan());
        assert_eq!(r.get(0, 1), Some(5.0));
        assert!(r.row(1).unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn outer_join_unions_rows() {
        let left = example();
        let right = LabeledMatrix::new(vec![vec![9.0]], genes(&["g0"]), genes(&["d"])).unwrap();
        let joined = left.outer_join(&right).unwrap();
        assert_eq!(joined.row_labels(), &genes(&["g0", "g1", "g2"])[..]);
        assert_eq!(joined.col_labels(), &genes(&["a", "b", "c", "d"])[..]);
        assert_eq!(joined.value(&"g0".to_string(), "d"), Some(9.0));
        assert!(joined.value(&"g0".to_string(), "a").unwrap().is_nan());
        assert_eq!(joined.value(&"g1".to_string(), "b"), Some(2.0));
        assert!(left.outer_join(&left).is_err());
    }

    #[test]
    fn paired_keys_order_by_gene_then_key() {
        let mut keys = vec![PairedKey::new("b", "1"), PairedKey::new("a", "2"), PairedKey::new("a", "1")];
        keys.sort();
        assert_eq!(keys[0], PairedKey::new("a", "1"));
        assert_eq!(keys[2].fields(), vec!["b", "1"]);
    }

    #[test]
    fn summary() {
        assert_eq!(
            example().summary(),
            "LabeledMatrix: 2 rows \u{00d7} 3 columns, 5 non-missing"
        );
    }
}

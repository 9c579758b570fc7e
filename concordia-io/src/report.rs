//! Writers for concordance results.
//!
//! Everything downstream (heatmaps, annotation grids, comparison panels) is
//! rendered from these files by an external plotting step.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use ::csv::{Writer, WriterBuilder};
use concordia_core::{ConcordiaError, Result};
use concordia_omics::matrix::{LabeledMatrix, RowKey};
use concordia_omics::panels::{ComparisonPanel, PanelOutcome};
use concordia_stats::pairwise::{CorrelationOptions, PairwiseMatrices};
use log::info;

pub const DETAILS_FILE: &str = "corr_details.csv";
pub const GROUPS_ALL_FILE: &str = "groups_all.txt";
pub const GROUPS_SELECTED_FILE: &str = "groups_selected.txt";
pub const COMBINED_Z_FILE: &str = "combined_z.tsv";
pub const CORR_R_FILE: &str = "corr_r.tsv";
pub const CORR_P_FILE: &str = "corr_p.tsv";
pub const CORR_N_FILE: &str = "corr_n.tsv";
pub const CORR_METHOD_FILE: &str = "corr_method.tsv";
pub const PANELS_FILE: &str = "panels.tsv";

/// Missing value marker in TSV exports.
pub const NA: &str = "NA";

fn csv_err(path: &Path, e: ::csv::Error) -> ConcordiaError {
    ConcordiaError::Other(format!("{}: {e}", path.display()))
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| {
        ConcordiaError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

fn tsv_writer(path: &Path) -> Result<Writer<File>> {
    Ok(WriterBuilder::new().delimiter(b'\t').from_writer(create(path)?))
}

/// `NA` for missing, shortest round-trip form otherwise.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        NA.to_string()
    } else {
        v.to_string()
    }
}

fn format_optional(v: Option<f64>) -> String {
    v.map_or_else(|| NA.to_string(), format_value)
}

/// Create `dir` (and parents) if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| {
        ConcordiaError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", dir.display(), e),
        ))
    })
}

/// One CSV row per unordered method pair. Missing r/p are left empty.
pub fn write_details(path: &Path, pairwise: &PairwiseMatrices, options: &CorrelationOptions) -> Result<()> {
    let mut w = Writer::from_writer(create(path)?);
    w.write_record(["method_i", "method_j", "r", "p", "n", "chosen", "pair_rule", "corr_mode_request"])
        .map_err(|e| csv_err(path, e))?;

    let blank_nan = |v: f64| if v.is_nan() { String::new() } else { v.to_string() };
    let rule = options.pair_rule.to_string();
    let mode = options.corr_mode.to_string();
    for d in pairwise.details() {
        let (r, p, n) = (blank_nan(d.entry.r), blank_nan(d.entry.p), d.entry.n.to_string());
        w.write_record([
            d.method_i.as_str(),
            d.method_j.as_str(),
            r.as_str(),
            p.as_str(),
            n.as_str(),
            d.entry.code.as_str(),
            rule.as_str(),
            mode.as_str(),
        ])
        .map_err(|e| csv_err(path, e))?;
    }
    w.flush()?;
    Ok(())
}

fn write_lines(path: &Path, labels: &[String]) -> Result<()> {
    let mut sorted = labels.to_vec();
    sorted.sort();
    sorted.dedup();
    let mut f = create(path)?;
    for l in &sorted {
        writeln!(f, "{l}")?;
    }
    Ok(())
}

/// `groups_all.txt` and `groups_selected.txt` in `dir`, one sorted label
/// per line.
pub fn write_group_audit(dir: &Path, all: &[String], selected: &[String]) -> Result<(PathBuf, PathBuf)> {
    let all_path = dir.join(GROUPS_ALL_FILE);
    let selected_path = dir.join(GROUPS_SELECTED_FILE);
    write_lines(&all_path, all)?;
    write_lines(&selected_path, selected)?;
    Ok((all_path, selected_path))
}

/// Labeled matrix as TSV: one header cell per row-key field (`index_names`)
/// followed by the column labels.
pub fn write_matrix<R: RowKey>(path: &Path, matrix: &LabeledMatrix<R>, index_names: &[&str]) -> Result<()> {
    let mut w = tsv_writer(path)?;
    let header: Vec<&str> = index_names
        .iter()
        .copied()
        .chain(matrix.col_labels().iter().map(String::as_str))
        .collect();
    w.write_record(&header).map_err(|e| csv_err(path, e))?;

    for (r, key) in matrix.row_labels().iter().enumerate() {
        let mut record: Vec<String> = key.fields().into_iter().map(str::to_string).collect();
        if let Some(values) = matrix.row(r) {
            record.extend(values.iter().map(|&v| format_value(v)));
        }
        w.write_record(&record).map_err(|e| csv_err(path, e))?;
    }
    w.flush()?;
    Ok(())
}

fn write_square<T: ToString>(path: &Path, labels: &[String], cell: impl Fn(usize, usize) -> T) -> Result<()> {
    let mut w = tsv_writer(path)?;
    let header: Vec<&str> = std::iter::once("")
        .chain(labels.iter().map(String::as_str))
        .collect();
    w.write_record(&header).map_err(|e| csv_err(path, e))?;
    for (i, label) in labels.iter().enumerate() {
        let record: Vec<String> = std::iter::once(label.clone())
            .chain((0..labels.len()).map(|j| cell(i, j).to_string()))
            .collect();
        w.write_record(&record).map_err(|e| csv_err(path, e))?;
    }
    w.flush()?;
    Ok(())
}

/// The r, p, n and method-code matrices, one TSV each, in `dir`.
pub fn write_pairwise_matrices(dir: &Path, pairwise: &PairwiseMatrices) -> Result<Vec<PathBuf>> {
    let labels = pairwise.labels();
    let paths: Vec<PathBuf> = [CORR_R_FILE, CORR_P_FILE, CORR_N_FILE, CORR_METHOD_FILE]
        .iter()
        .map(|f| dir.join(f))
        .collect();
    write_square(&paths[0], labels, |i, j| format_value(pairwise.r(i, j)))?;
    write_square(&paths[1], labels, |i, j| format_value(pairwise.p(i, j)))?;
    write_square(&paths[2], labels, |i, j| pairwise.n(i, j))?;
    write_square(&paths[3], labels, |i, j| pairwise.method_used(i, j).as_str())?;
    Ok(paths)
}

/// One TSV row per comparison panel.
pub fn write_panels(path: &Path, panels: &[ComparisonPanel]) -> Result<()> {
    let mut w = tsv_writer(path)?;
    w.write_record([
        "reference",
        "method",
        "status",
        "n",
        "code",
        "r",
        "p",
        "slope",
        "intercept",
        "mean_difference",
        "sd_difference",
        "lower_limit",
        "upper_limit",
    ])
    .map_err(|e| csv_err(path, e))?;

    for panel in panels {
        let mut record = vec![panel.reference.clone(), panel.other.clone()];
        match &panel.outcome {
            PanelOutcome::Computed { scatter, agreement } => {
                record.extend([
                    "ok".to_string(),
                    scatter.n.to_string(),
                    scatter.code.to_string(),
                    format_value(scatter.correlation.coefficient),
                    format_value(scatter.correlation.p_value),
                    format_optional(scatter.slope),
                    format_optional(scatter.intercept),
                    format_value(agreement.mean_difference),
                    format_value(agreement.sd_difference),
                    format_value(agreement.lower_limit),
                    format_value(agreement.upper_limit),
                ]);
            }
            PanelOutcome::InsufficientPairs { n } => {
                record.extend(["insufficient pairs".to_string(), n.to_string()]);
                record.extend(std::iter::repeat(NA.to_string()).take(9));
            }
        }
        w.write_record(&record).map_err(|e| csv_err(path, e))?;
    }
    w.flush()?;
    info!("{} comparison panels written to {}", panels.len(), path.display());
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────

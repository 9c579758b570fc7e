//! Tab-delimited quantification tables.
//!
//! Each method's results come as a TSV with one row per (experiment, gene).
//! Column names vary between tools, so the four required columns are found
//! by header pattern rather than by exact name.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use ::csv::{ReaderBuilder, StringRecord};
use concordia_core::{ConcordiaError, Result};
use concordia_omics::builder::{build_matrices, BuildOptions, BuiltMatrices};
use concordia_omics::observation::{Dataset, QuantRecord};
use log::{debug, info};
use regex::Regex;

/// A required semantic column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semantic {
    BaseName,
    Gene,
    PValue,
    Log2FoldChange,
}

impl Semantic {
    pub const ALL: [Semantic; 4] = [
        Semantic::BaseName,
        Semantic::Gene,
        Semantic::PValue,
        Semantic::Log2FoldChange,
    ];

    /// Name reported when the column is missing.
    pub fn display_name(self) -> &'static str {
        match self {
            Semantic::BaseName => "Base Name",
            Semantic::Gene => "GATA Name",
            Semantic::PValue => "p-value",
            Semantic::Log2FoldChange => "log2(Exp/Control)",
        }
    }

    /// Accepted header spellings, tried in order.
    fn patterns(self) -> &'static [&'static str] {
        match self {
            Semantic::BaseName => &[r"^base\s*_?\s*name$", r"^basename$"],
            Semantic::Gene => &[r"^gata\s*_?\s*name$", r"^gene$", r"^symbol$"],
            Semantic::PValue => &[r"^p-?value$", r"^p[_\s]?val(ue)?$"],
            Semantic::Log2FoldChange => &[
                r"^log2\s*\(\s*exp\s*/\s*control\s*\)$",
                r"^log2fc$",
                r"^log2\s*fold\s*change$",
            ],
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

static HEADER_PATTERNS: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    Semantic::ALL
        .iter()
        .map(|s| {
            s.patterns()
                .iter()
                .filter_map(|p| Regex::new(&format!("(?i){p}")).ok())
                .collect()
        })
        .collect()
});

static WHITESPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

fn normalize_header(header: &str) -> String {
    match WHITESPACE.as_ref() {
        Some(re) => re.replace_all(header.trim(), " ").into_owned(),
        None => header.trim().to_string(),
    }
}

/// Positions of the required columns in a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub base_name: usize,
    pub gene: usize,
    pub p_value: usize,
    pub log2_fold_change: usize,
}

/// Locate the required columns. Patterns are tried in order; for each
/// pattern the first matching header wins.
///
/// Every missing column is reported at once.
pub fn resolve_columns<S: AsRef<str>>(headers: &[S], file: &str) -> Result<ColumnMap> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h.as_ref())).collect();
    let find = |sem: Semantic| {
        HEADER_PATTERNS.get(sem.index()).and_then(|patterns| {
            patterns
                .iter()
                .find_map(|re| normalized.iter().position(|h| re.is_match(h)))
        })
    };

    let found: Vec<Option<usize>> = Semantic::ALL.iter().map(|&s| find(s)).collect();
    let missing: Vec<String> = Semantic::ALL
        .iter()
        .zip(&found)
        .filter(|(_, idx)| idx.is_none())
        .map(|(s, _)| s.display_name().to_string())
        .collect();

    match found[..] {
        [Some(base_name), Some(gene), Some(p_value), Some(log2_fold_change)] => Ok(ColumnMap {
            base_name,
            gene,
            p_value,
            log2_fold_change,
        }),
        _ => Err(ConcordiaError::MissingColumns {
            file: file.to_string(),
            columns: missing,
        }),
    }
}

/// Parse a numeric cell. Empty, `NA`, `NaN`, `null` (any case) are missing.
pub fn parse_numeric(field: &str, file: &str, line: u64, column: &str) -> Result<f64> {
    let field = field.trim();
    if field.is_empty()
        || ["na", "nan", "null"]
            .iter()
            .any(|m| field.eq_ignore_ascii_case(m))
    {
        return Ok(f64::NAN);
    }
    field.parse::<f64>().map_err(|_| {
        ConcordiaError::Parse(format!(
            "{file}:{line}: column '{column}': cannot parse '{field}' as a number"
        ))
    })
}

/// Read quantification records from any TSV source. `file` names the source
/// in error messages.
pub fn read_quant_records<R: Read>(source: R, file: &str) -> Result<Vec<QuantRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| ConcordiaError::Parse(format!("{file}: {e}")))?
        .clone();
    let cols = resolve_columns(&headers.iter().collect::<Vec<_>>(), file)?;
    debug!("{file}: columns resolved to {cols:?}");

    let mut records = Vec::new();
    let mut row = StringRecord::new();
    loop {
        let more = reader
            .read_record(&mut row)
            .map_err(|e| ConcordiaError::Parse(format!("{file}: {e}")))?;
        if !more {
            break;
        }
        let line = row.position().map_or(0, |p| p.line());
        let cell = |idx: usize| row.get(idx).unwrap_or("");
        let header = |idx: usize| headers.get(idx).unwrap_or("");
        records.push(QuantRecord::new(
            cell(cols.base_name),
            cell(cols.gene),
            parse_numeric(cell(cols.p_value), file, line, header(cols.p_value))?,
            parse_numeric(
                cell(cols.log2_fold_change),
                file,
                line,
                header(cols.log2_fold_change),
            )?,
        ));
    }
    Ok(records)
}

/// Read one method's table from disk.
pub fn read_quant_table(path: impl AsRef<Path>, method: &str) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        ConcordiaError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let records = read_quant_records(file, &path.display().to_string())?;
    info!("{method}: {} rows from {}", records.len(), path.display());
    Ok(Dataset::new(method, records))
}

/// A method label and the table holding its results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSource {
    pub method: String,
    pub path: PathBuf,
}

impl DatasetSource {
    pub fn new(method: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }
}

/// Read every source, then build the matrices. Nothing is built unless all
/// files read cleanly.
pub fn read_datasets(sources: &[DatasetSource]) -> Result<Vec<Dataset>> {
    sources
        .iter()
        .map(|s| read_quant_table(&s.path, &s.method))
        .collect()
}

pub fn build_matrices_from_files(sources: &[DatasetSource], options: &BuildOptions) -> Result<BuiltMatrices> {
    let datasets = read_datasets(sources)?;
    build_matrices(&datasets, options)
}

// ── Tests ──────────────────────────────────────────────────────────────────

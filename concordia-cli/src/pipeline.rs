//! The two commands end to end.

use std::io::Write;
use std::path::PathBuf;

use concordia_core::{ConcordiaError, Result, Summarizable};
use concordia_io::report::{self, COMBINED_Z_FILE, DETAILS_FILE, PANELS_FILE};
use concordia_io::table::read_datasets;
use concordia_omics::builder::{build_long_table, build_matrices, BuiltMatrices};
use concordia_omics::concordance::{run_concordance, Concordance};
use concordia_omics::observation::{require_groupable, ObservedIdentity};
use concordia_omics::panels::panels_for;
use log::{info, warn};

use crate::config::AnalysisConfig;

/// Distinct experiments as TSV, the material for a `groups` section.
pub fn write_identities<W: Write>(config: &AnalysisConfig, out: W) -> Result<usize> {
    let datasets = read_datasets(&config.sources())?;
    let table = build_long_table(&datasets, &config.build_options()?)?;
    let identities = table.identities();

    let mut w = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
    let io_err = |e: csv::Error| ConcordiaError::Other(e.to_string());
    w.write_record(["method", "raw_label", "normalized_condition"])
        .map_err(io_err)?;
    for o in &identities {
        w.write_record([
            o.identity.method.as_str(),
            o.identity.raw_label.as_str(),
            o.normalized_condition.as_str(),
        ])
        .map_err(io_err)?;
    }
    w.flush()?;
    Ok(identities.len())
}

/// Files written by [`run`].
#[derive(Debug, Default)]
pub struct RunReport {
    pub written: Vec<PathBuf>,
    /// Set when a stage stopped for lack of data.
    pub stopped: Option<String>,
}

/// Build, group, correlate and write every output into the output dir.
///
/// A stage without enough data stops the run without failing it: what was
/// written so far stays, and the reason is logged and returned.
pub fn run(config: &AnalysisConfig) -> Result<RunReport> {
    config.validate()?;
    let out_dir = &config.output_dir;
    report::ensure_output_dir(out_dir)?;
    let mut outcome = RunReport::default();

    let datasets = read_datasets(&config.sources())?;
    let built = build_matrices(&datasets, &config.build_options()?)?;
    let z_path = out_dir.join(COMBINED_Z_FILE);
    report::write_matrix(&z_path, &built.combined_z, &["gene"])?;
    outcome.written.push(z_path);

    match correlate(config, &built) {
        Ok(concordance) => write_concordance(config, &concordance, &mut outcome)?,
        Err(e) if e.is_insufficient_data() => {
            warn!("{e}; correlations were not computed");
            outcome.stopped = Some(e.to_string());
        }
        Err(e) => return Err(e),
    }

    info!("{} files written to {}", outcome.written.len(), out_dir.display());
    Ok(outcome)
}

fn correlate(config: &AnalysisConfig, built: &BuiltMatrices) -> Result<Concordance> {
    let identities: Vec<ObservedIdentity> = built.long_table.identities();
    require_groupable(&identities)?;
    let groups = config.group_set(&identities)?;
    info!("{}", groups.summary());
    run_concordance(
        built,
        &groups,
        config.selected_groups.as_deref(),
        &config.correlation_options(),
    )
}

fn write_concordance(config: &AnalysisConfig, c: &Concordance, outcome: &mut RunReport) -> Result<()> {
    let out_dir = &config.output_dir;
    let options = config.correlation_options();

    let (all, selected) = report::write_group_audit(out_dir, &c.all_groups, &c.selected_groups)?;
    outcome.written.extend([all, selected]);

    let details = out_dir.join(DETAILS_FILE);
    report::write_details(&details, &c.pairwise, &options)?;
    outcome.written.push(details);
    outcome
        .written
        .extend(report::write_pairwise_matrices(out_dir, &c.pairwise)?);

    let values = out_dir.join("group_values.tsv");
    report::write_matrix(&values, c.grouped.values(), &["gene", "group"])?;
    let pvalues = out_dir.join("group_pvalues.tsv");
    report::write_matrix(&pvalues, c.grouped.pvalues(), &["gene", "group"])?;
    outcome.written.extend([values, pvalues]);

    let panels = panels_for(&c.grouped, &options)?;
    let panels_path = out_dir.join(PANELS_FILE);
    report::write_panels(&panels_path, &panels)?;
    outcome.written.push(panels_path);

    info!("{}", c.pairwise.summary());
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────

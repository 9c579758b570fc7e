//! From built matrices and user groups to pairwise method concordance.
//!
//! [`run_concordance`] strings the grouping stages together in their fixed
//! order: map identities to groups, rebuild group-keyed matrices, narrow to
//! the selected groups, correlate every pair of methods.

use concordia_core::{Result, Summarizable};
use concordia_stats::pairwise::{compute_pairwise, CorrelationOptions, PairwiseMatrices};
use log::info;

use crate::builder::BuiltMatrices;
use crate::grouping::GroupSet;
use crate::observation::ObservedIdentity;
use crate::regroup::GroupedMatrices;

/// Everything downstream of grouping.
#[derive(Debug, Clone)]
pub struct Concordance {
    /// Every group label with data, sorted.
    pub all_groups: Vec<String>,
    /// The groups correlated, sorted.
    pub selected_groups: Vec<String>,
    /// Identities left out because they belong to no group.
    pub excluded: Vec<ObservedIdentity>,
    /// Group-keyed matrices restricted to the selection.
    pub grouped: GroupedMatrices,
    pub pairwise: PairwiseMatrices,
}

/// Correlate methods over the grouped, selected observations.
///
/// `selection` of `None` keeps every group. Stage failures (no groups, empty
/// selection, nothing left) surface as `InsufficientData`.
pub fn run_concordance(
    built: &BuiltMatrices,
    groups: &GroupSet,
    selection: Option<&[String]>,
    options: &CorrelationOptions,
) -> Result<Concordance> {
    options.validate()?;
    let identities = built.long_table.identities();
    let excluded = groups.excluded(&identities).into_iter().cloned().collect();

    let grouped = GroupedMatrices::rebuild(&built.long_table, &groups.mapping())?;
    let all_groups = grouped.group_labels();
    let grouped = match selection {
        Some(labels) => grouped.select_groups(labels)?,
        None => grouped,
    };
    let selected_groups = grouped.group_labels();
    info!("{}", grouped.summary());

    let pairwise = compute_pairwise(&grouped.method_series(), options)?;
    Ok(Concordance {
        all_groups,
        selected_groups,
        excluded,
        grouped,
        pairwise,
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────

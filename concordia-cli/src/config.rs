//! Analysis configuration, loaded from JSON.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use concordia_core::{ConcordiaError, Result};
use concordia_io::DatasetSource;
use concordia_omics::builder::{BuildOptions, CollisionPolicy};
use concordia_omics::condition::collapse_whitespace;
use concordia_omics::gene::{GeneCollapser, DEFAULT_FAMILY};
use concordia_omics::grouping::GroupSet;
use concordia_omics::observation::{Identity, ObservedIdentity};
use concordia_stats::pairwise::{CorrMode, CorrelationOptions, PairRule, DEFAULT_ALPHA};
use concordia_stats::StatsBackend;
use log::warn;
use serde::{Deserialize, Serialize};

/// One method's input table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub label: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEntry {
    pub method: String,
    pub raw_label: String,
}

/// A declared group of equivalent experiments. A missing or blank label
/// gets a name derived from the members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    #[serde(default)]
    pub label: Option<String>,
    pub members: Vec<MemberEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub datasets: Vec<DatasetEntry>,
    #[serde(default = "default_true")]
    pub auto_normalize: bool,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default)]
    pub pair_rule: PairRule,
    #[serde(default)]
    pub corr_mode: CorrMode,
    #[serde(default)]
    pub stats_backend: StatsBackend,
    #[serde(default)]
    pub label_collision: CollisionPolicy,
    #[serde(default = "default_families")]
    pub gene_families: Vec<String>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
    /// `None` selects every group.
    #[serde(default)]
    pub selected_groups: Option<Vec<String>>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_families() -> Vec<String> {
    vec![DEFAULT_FAMILY.to_string()]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Command-line values that replace configured ones.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub alpha: Option<f64>,
    pub pair_rule: Option<PairRule>,
    pub corr_mode: Option<CorrMode>,
    pub output_dir: Option<PathBuf>,
    pub no_auto_normalize: bool,
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConcordiaError::Config(e.to_string()))
    }

    /// Load from `path`. Relative dataset paths and output directory are
    /// taken relative to the config file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            ConcordiaError::Config(format!("{}: {}", path.display(), e))
        })?;
        let mut config = Self::from_json_str(&text).map_err(|e| match e {
            ConcordiaError::Config(msg) => ConcordiaError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for ds in &mut self.datasets {
            if ds.path.is_relative() {
                ds.path = base.join(&ds.path);
            }
        }
        if self.output_dir.is_relative() {
            self.output_dir = base.join(&self.output_dir);
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(alpha) = overrides.alpha {
            self.alpha = alpha;
        }
        if let Some(rule) = overrides.pair_rule {
            self.pair_rule = rule;
        }
        if let Some(mode) = overrides.corr_mode {
            self.corr_mode = mode;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        if overrides.no_auto_normalize {
            self.auto_normalize = false;
        }
    }

    /// Checks that need no input files.
    pub fn validate(&self) -> Result<()> {
        if self.datasets.is_empty() {
            return Err(ConcordiaError::Config("at least one dataset is required".into()));
        }
        let mut labels = BTreeSet::new();
        for ds in &self.datasets {
            if ds.label.trim().is_empty() {
                return Err(ConcordiaError::Config(format!(
                    "dataset {} has an empty label",
                    ds.path.display()
                )));
            }
            if !labels.insert(ds.label.as_str()) {
                return Err(ConcordiaError::Config(format!("duplicate dataset label '{}'", ds.label)));
            }
        }
        self.correlation_options().validate()?;
        GeneCollapser::new(&self.gene_families)?;
        Ok(())
    }

    pub fn sources(&self) -> Vec<DatasetSource> {
        self.datasets
            .iter()
            .map(|d| DatasetSource::new(d.label.clone(), d.path.clone()))
            .collect()
    }

    pub fn build_options(&self) -> Result<BuildOptions> {
        Ok(BuildOptions {
            auto_normalize: self.auto_normalize,
            collision: self.label_collision,
            collapser: GeneCollapser::new(&self.gene_families)?,
        })
    }

    pub fn correlation_options(&self) -> CorrelationOptions {
        CorrelationOptions {
            alpha: self.alpha,
            pair_rule: self.pair_rule,
            corr_mode: self.corr_mode,
            backend: self.stats_backend,
        }
    }

    /// Form the configured groups in order. Every member must be one of the
    /// observed identities, matched after whitespace collapse. A group left
    /// with fewer than two experiments is skipped with a warning.
    pub fn group_set(&self, observed: &[ObservedIdentity]) -> Result<GroupSet> {
        let known: BTreeMap<(String, String), &Identity> = observed
            .iter()
            .map(|o| {
                let id = &o.identity;
                ((collapse_whitespace(&id.method), collapse_whitespace(&id.raw_label)), id)
            })
            .collect();
        let mut set = GroupSet::new();
        for (i, entry) in self.groups.iter().enumerate() {
            let mut members = Vec::with_capacity(entry.members.len());
            for m in &entry.members {
                let key = (collapse_whitespace(&m.method), collapse_whitespace(&m.raw_label));
                match known.get(&key) {
                    Some(id) => members.push((*id).clone()),
                    None => {
                        return Err(ConcordiaError::Config(format!(
                            "group #{}: no experiment {} in the input tables",
                            i + 1,
                            Identity::new(key.0, key.1)
                        )))
                    }
                }
            }
            set = match set.form_group(&members, entry.label.as_deref()) {
                Ok(next) => next,
                Err(e) if e.is_insufficient_data() => {
                    warn!("group #{}: {e}; skipped", i + 1);
                    set
                }
                Err(e) => return Err(ConcordiaError::Config(format!("group #{}: {e}", i + 1))),
            };
        }
        Ok(set)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

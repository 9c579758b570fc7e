//! Gene identifier canonicalisation.
//!
//! Some sources report technical transcript variants of one gene as separate
//! rows (`GATA-4_t1`, `GATA-4_t2`). [`GeneCollapser`] folds those onto the
//! canonical symbol for a configured set of gene families.

use concordia_core::{ConcordiaError, Result};
use regex::Regex;

/// Family collapsed when no other is configured.
pub const DEFAULT_FAMILY: &str = "GATA-4";

/// Strips `_t<digits>` variant suffixes from identifiers of known families.
#[derive(Debug, Clone)]
pub struct GeneCollapser {
    families: Vec<String>,
    patterns: Vec<Regex>,
}

impl GeneCollapser {
    /// Collapser for the given literal family symbols.
    pub fn new<S: AsRef<str>>(families: &[S]) -> Result<Self> {
        let mut names = Vec::with_capacity(families.len());
        let mut patterns = Vec::with_capacity(families.len());
        for family in families {
            let family = family.as_ref().trim();
            if family.is_empty() {
                return Err(ConcordiaError::InvalidInput(
                    "gene family symbol must not be empty".into(),
                ));
            }
            let pattern = format!(r"^({})(?:_t\d+)?$", regex::escape(family));
            let re = Regex::new(&pattern)
                .map_err(|e| ConcordiaError::InvalidInput(format!("gene family '{family}': {e}")))?;
            names.push(family.to_string());
            patterns.push(re);
        }
        Ok(Self {
            families: names,
            patterns,
        })
    }

    pub fn families(&self) -> &[String] {
        &self.families
    }

    /// Canonical key for one identifier.
    pub fn collapse(&self, id: &str) -> String {
        self.patterns
            .iter()
            .find_map(|re| re.captures(id))
            .and_then(|caps| caps.get(1))
            .map_or_else(|| id.to_string(), |m| m.as_str().to_string())
    }

    pub fn collapse_all<S: AsRef<str>>(&self, ids: &[S]) -> Vec<String> {
        ids.iter().map(|id| self.collapse(id.as_ref())).collect()
    }
}

impl Default for GeneCollapser {
    fn default() -> Self {
        let pattern = format!(r"^({})(?:_t\d+)?$", regex::escape(DEFAULT_FAMILY));
        Self {
            families: vec![DEFAULT_FAMILY.to_string()],
            patterns: Regex::new(&pattern).into_iter().collect(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

//! Per-row observations and the long-form table that stores them.

use std::collections::HashSet;
use std::fmt;

use concordia_core::{ConcordiaError, Result, Summarizable};

/// One parsed input row, before condition normalization and gene collapsing.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantRecord {
    pub raw_label: String,
    pub gene: String,
    pub p_value: f64,
    pub log2_fold_change: f64,
}

impl QuantRecord {
    pub fn new(raw_label: impl Into<String>, gene: impl Into<String>, p_value: f64, log2_fold_change: f64) -> Self {
        Self {
            raw_label: raw_label.into(),
            gene: gene.into(),
            p_value,
            log2_fold_change,
        }
    }
}

/// All rows produced by one quantification method.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub method: String,
    pub records: Vec<QuantRecord>,
}

impl Dataset {
    pub fn new(method: impl Into<String>, records: Vec<QuantRecord>) -> Self {
        Self {
            method: method.into(),
            records,
        }
    }
}

/// Identity of an experiment within one method.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity {
    pub method: String,
    pub raw_label: String,
}

impl Identity {
    pub fn new(method: impl Into<String>, raw_label: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            raw_label: raw_label.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.method, self.raw_label)
    }
}

/// An identity together with the condition its label normalized to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservedIdentity {
    pub identity: Identity,
    pub normalized_condition: String,
}

/// One measurement of one gene in one experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub method: String,
    pub raw_label: String,
    pub normalized_condition: String,
    pub gene: String,
    pub log2_fold_change: f64,
    pub p_value: f64,
}

impl Observation {
    pub fn identity(&self) -> Identity {
        Identity::new(self.method.clone(), self.raw_label.clone())
    }
}

/// Every observation from every dataset, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LongTable {
    observations: Vec<Observation>,
}

impl LongTable {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Method labels in order of first appearance.
    pub fn methods(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.observations
            .iter()
            .filter(|o| seen.insert(o.method.as_str()))
            .map(|o| o.method.clone())
            .collect()
    }

    /// Distinct `(method, raw_label, normalized_condition)` identities, in
    /// order of first appearance.
    pub fn identities(&self) -> Vec<ObservedIdentity> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for o in &self.observations {
            if seen.insert((o.method.as_str(), o.raw_label.as_str())) {
                out.push(ObservedIdentity {
                    identity: o.identity(),
                    normalized_condition: o.normalized_condition.clone(),
                });
            }
        }
        out
    }

    /// Observations passing `keep`.
    pub fn filter(&self, keep: impl Fn(&Observation) -> bool) -> LongTable {
        LongTable::new(self.observations.iter().filter(|o| keep(o)).cloned().collect())
    }
}

impl<'a> IntoIterator for &'a LongTable {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

impl Summarizable for LongTable {
    fn summary(&self) -> String {
        format!(
            "LongTable: {} observations, {} methods, {} identities",
            self.len(),
            self.methods().len(),
            self.identities().len()
        )
    }
}

/// Grouping needs at least two identities to choose from.
pub fn require_groupable(identities: &[ObservedIdentity]) -> Result<()> {
    if identities.len() < 2 {
        return Err(ConcordiaError::insufficient(
            "grouping",
            format!(
                "need at least 2 distinct experiments to group, found {}",
                identities.len()
            ),
        ));
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(method: &str, raw: &str, cond: &str, gene: &str) -> Observation {
        Observation {
            method: method.into(),
            raw_label: raw.into(),
            normalized_condition: cond.into(),
            gene: gene.into(),
            log2_fold_change: 1.0,
            p_value: 0.01,
        }
    }

    fn table() -> LongTable {
        LongTable::new(vec![
            obs("RNA-seq", "6h light", "6h light", "g1"),
            obs("RNA-seq", "6h light", "6h light", "g2"),
            obs("qPCR", "Light, 6 hours", "6h light", "g1"),
            obs("RNA-seq", "dark", "dark", "g1"),
        ])
    }

    #[test]
    fn identities_first_appearance() {
        let ids = table().identities();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0].identity, Identity::new("RNA-seq", "6h light"));
        assert_eq!(ids[1].identity, Identity::new("qPCR", "Light, 6 hours"));
        assert_eq!(ids[1].normalized_condition, "6h light");
        assert_eq!(ids[2].identity.to_string(), "[RNA-seq] dark");
    }

    #[test]
    fn methods_first_appearance() {
        assert_eq!(table().methods(), vec!["RNA-seq", "qPCR"]);
    }

    #[test]
    fn filter_keeps_order() {
        let t = table().filter(|o| o.gene == "g1");
        assert_eq!(t.len(), 3);
        assert_eq!(t.observations()[1].method, "qPCR");
    }

    #[test]
    fn groupable_needs_two() {
        let ids = table().identities();
        assert!(require_groupable(&ids).is_ok());
        let err = require_groupable(&ids[..1]).unwrap_err();
        assert!(err.is_insufficient_data());
        assert!(require_groupable(&[]).is_err());
    }

    #[test]
    fn summary() {
        assert_eq!(table().summary(), "LongTable: 4 observations, 2 methods, 3 identities");
    }
}

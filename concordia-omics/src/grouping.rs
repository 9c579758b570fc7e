//! Equivalence groups of experiments across methods.
//!
//! Different methods name the same experiment differently. A [`GroupSet`]
//! records which `(method, raw_label)` identities the user declared
//! equivalent. It is a value: every operation returns a new set and leaves
//! the receiver untouched.
//!
//! Forming a group from a selection that overlaps existing groups merges all
//! of them into one, so an identity is never in two groups.

use std::collections::{BTreeMap, BTreeSet};

use concordia_core::{ConcordiaError, Result, Summarizable};
use log::{info, warn};

use crate::observation::{Identity, ObservedIdentity};

/// Separator between member labels in a default group name.
pub const LABEL_SEPARATOR: &str = " \u{2261} ";

/// Longest default group name, in characters.
pub const MAX_DEFAULT_LABEL_CHARS: usize = 120;

/// Members named in a default group label.
const DEFAULT_LABEL_MEMBERS: usize = 3;

/// A named set of equivalent identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceGroup {
    pub label: String,
    pub members: BTreeSet<Identity>,
}

impl EquivalenceGroup {
    pub fn contains(&self, identity: &Identity) -> bool {
        self.members.contains(identity)
    }
}

/// Label derived from the first few members' raw labels.
pub fn default_label(members: &BTreeSet<Identity>) -> String {
    let joined = members
        .iter()
        .map(|m| m.raw_label.as_str())
        .filter(|raw| !raw.is_empty())
        .take(DEFAULT_LABEL_MEMBERS)
        .collect::<Vec<_>>()
        .join(LABEL_SEPARATOR);
    let truncated: String = joined.chars().take(MAX_DEFAULT_LABEL_CHARS).collect();
    let truncated = truncated.trim();
    if truncated.is_empty() {
        "Group".to_string()
    } else {
        truncated.to_string()
    }
}

/// The current equivalence groups, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSet {
    groups: Vec<EquivalenceGroup>,
}

impl GroupSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[EquivalenceGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group containing `identity`, if any.
    pub fn group_of(&self, identity: &Identity) -> Option<&EquivalenceGroup> {
        self.groups.iter().find(|g| g.contains(identity))
    }

    /// Form a group from `selection`.
    ///
    /// Needs at least two distinct identities. Existing groups sharing a
    /// member with the selection are removed and their members folded into
    /// the new group, which is appended last. A blank `label` gets
    /// [`default_label`] of the merged members.
    pub fn form_group<'a>(
        &self,
        selection: impl IntoIterator<Item = &'a Identity>,
        label: Option<&str>,
    ) -> Result<GroupSet> {
        let selected: BTreeSet<Identity> = selection.into_iter().cloned().collect();
        if selected.len() < 2 {
            return Err(ConcordiaError::insufficient(
                "grouping",
                format!("select at least two experiments to form a group (got {})", selected.len()),
            ));
        }

        let (merged, kept): (Vec<&EquivalenceGroup>, Vec<&EquivalenceGroup>) = self
            .groups
            .iter()
            .partition(|g| !g.members.is_disjoint(&selected));

        let mut members = selected;
        for g in &merged {
            members.extend(g.members.iter().cloned());
        }
        if !merged.is_empty() {
            let names: Vec<&str> = merged.iter().map(|g| g.label.as_str()).collect();
            info!("merging overlapping groups [{}]", names.join(", "));
        }

        let label = match label.map(str::trim) {
            Some(l) if !l.is_empty() => l.to_string(),
            _ => default_label(&members),
        };

        let mut groups: Vec<EquivalenceGroup> = kept.into_iter().cloned().collect();
        groups.push(EquivalenceGroup { label, members });
        Ok(GroupSet { groups })
    }

    /// Drop the group at `index`.
    pub fn remove_group(&self, index: usize) -> Result<GroupSet> {
        if index >= self.groups.len() {
            return Err(ConcordiaError::InvalidInput(format!(
                "group index {index} out of range ({} groups)",
                self.groups.len()
            )));
        }
        let mut groups = self.groups.clone();
        groups.remove(index);
        Ok(GroupSet { groups })
    }

    /// Drop every group.
    pub fn clear(&self) -> GroupSet {
        GroupSet::new()
    }

    /// Group label of every grouped identity.
    pub fn mapping(&self) -> BTreeMap<Identity, String> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter().map(move |m| (m.clone(), g.label.clone())))
            .collect()
    }

    /// Identities in `all` that belong to no group and so take no part in
    /// correlation.
    pub fn excluded<'a>(&self, all: &'a [ObservedIdentity]) -> Vec<&'a ObservedIdentity> {
        let excluded: Vec<&ObservedIdentity> = all
            .iter()
            .filter(|o| self.group_of(&o.identity).is_none())
            .collect();
        if !excluded.is_empty() {
            warn!("{} experiment(s) are in no group and excluded from correlation", excluded.len());
        }
        excluded
    }

    /// Sorted distinct group labels.
    pub fn labels(&self) -> Vec<String> {
        self.groups
            .iter()
            .map(|g| g.label.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Summarizable for GroupSet {
    fn summary(&self) -> String {
        let members: usize = self.groups.iter().map(|g| g.members.len()).sum();
        format!("GroupSet: {} groups, {} experiments", self.groups.len(), members)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn id(method: &str, raw: &str) -> Identity {
        Identity::new(method, raw)
    }

    #[test]
    fn form_requires_two_distinct() {
        let a = id("RNA-seq", "6h light");
        let err = GroupSet::new().form_group([&a, &a], None).unwrap_err();
        assert!(err.is_insufficient_data());
        assert!(GroupSet::new().form_group([], Some("G")).is_err());
    }

    #[test]
    fn overlapping_selections_merge() {
        let (a, b, c) = (id("M1", "A"), id("M2", "B"), id("M3", "C"));
        let s1 = GroupSet::new().form_group([&a, &b], Some("first")).unwrap();
        let s2 = s1.form_group([&b, &c], Some("merged")).unwrap();

        assert_eq!(s1.len(), 1);
        assert_eq!(s2.len(), 1);
        let g = &s2.groups()[0];
        assert_eq!(g.label, "merged");
        assert_eq!(g.members, BTreeSet::from([a, b, c]));
    }

    #[test]
    fn merge_absorbs_every_intersecting_group() {
        let ids: Vec<Identity> = (0..6).map(|i| id("M", &format!("e{i}"))).collect();
        let s = GroupSet::new()
            .form_group([&ids[0], &ids[1]], Some("x"))
            .unwrap()
            .form_group([&ids[2], &ids[3]], Some("y"))
            .unwrap()
            .form_group([&ids[4], &ids[5]], Some("z"))
            .unwrap()
            .form_group([&ids[1], &ids[2]], Some("xy"))
            .unwrap();
        assert_eq!(s.labels(), vec!["xy", "z"]);
        assert_eq!(s.groups()[1].members.len(), 4);
        assert_eq!(s.groups()[0].label, "z");
    }

    #[test]
    fn default_labels() {
        let (a, b) = (id("M1", "6h light"), id("M2", "Light, 6 hours"));
        let s = GroupSet::new().form_group([&a, &b], Some("   ")).unwrap();
        assert_eq!(s.groups()[0].label, "6h light \u{2261} Light, 6 hours");

        let long = "x".repeat(200);
        let members = BTreeSet::from([id("M1", &long), id("M2", "y")]);
        assert_eq!(default_label(&members).chars().count(), MAX_DEFAULT_LABEL_CHARS);

        let blank = BTreeSet::from([id("M1", ""), id("M2", "")]);
        assert_eq!(default_label(&blank), "Group");
    }

    #[test]
    fn default_label_uses_three_members() {
        let members: BTreeSet<Identity> = ["a", "b", "c", "d"].iter().map(|r| id("M", r)).collect();
        assert_eq!(default_label(&members), "a \u{2261} b \u{2261} c");
    }

    #[test]
    fn remove_and_clear_return_new_sets() {
        let (a, b, c, d) = (id("M1", "a"), id("M2", "b"), id("M1", "c"), id("M2", "d"));
        let s = GroupSet::new()
            .form_group([&a, &b], Some("G1"))
            .unwrap()
            .form_group([&c, &d], Some("G2"))
            .unwrap();
        let removed = s.remove_group(0).unwrap();
        assert_eq!(removed.labels(), vec!["G2"]);
        assert_eq!(s.len(), 2);
        assert!(s.remove_group(2).is_err());
        assert!(s.clear().is_empty());
    }

    #[test]
    fn mapping_and_exclusions() {
        let (a, b) = (id("RNA-seq", "6h light"), id("qPCR", "Light, 6 hours"));
        let s = GroupSet::new().form_group([&a, &b], Some("G1")).unwrap();
        let map = s.mapping();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&a], "G1");

        let all = vec![
            ObservedIdentity { identity: a.clone(), normalized_condition: "6h light".into() },
            ObservedIdentity { identity: id("RNA-seq", "dark"), normalized_condition: "dark".into() },
        ];
        let excluded = s.excluded(&all);
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].identity.raw_label, "dark");
        assert_eq!(s.summary(), "GroupSet: 1 groups, 2 experiments");
    }
}

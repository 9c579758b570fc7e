//! Experimental condition labels.
//!
//! Free-text labels such as `"Light, 6 hours"` or `"6h light"` name the same
//! experiment in different tables. [`normalize_condition`] reduces them to a
//! canonical `"{time} {regime}"` tag with an ordered table of
//! pattern/extractor rules: each [`Slot`] is filled by the first rule for
//! that slot that matches, in table order.
//!
//! Normalization is many-to-one on purpose. Labels that carry no recognised
//! token pass through with their whitespace collapsed.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Part of a canonical condition a rule contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Time,
    Regime,
}

/// One pattern/extractor rule.
pub struct ConditionRule {
    pub name: &'static str,
    pub slot: Slot,
    pub pattern: Regex,
    pub extract: fn(&Captures<'_>) -> Option<String>,
}

fn high_light(_: &Captures<'_>) -> Option<String> {
    Some("high light".to_string())
}

fn light(_: &Captures<'_>) -> Option<String> {
    Some("light".to_string())
}

fn dark(_: &Captures<'_>) -> Option<String> {
    Some("dark".to_string())
}

fn hours(caps: &Captures<'_>) -> Option<String> {
    let value: f64 = caps.name("value")?.as_str().replace(',', ".").parse().ok()?;
    Some(format_hours(value))
}

/// `6.0` → `"6h"`, `1.5` → `"1.5h"`.
pub fn format_hours(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}h", value as i64)
    } else {
        format!("{value}h")
    }
}

/// Rules in priority order. "high light" precedes bare "light", which it
/// contains.
pub static CONDITION_RULES: LazyLock<Vec<ConditionRule>> = LazyLock::new(|| {
    let table: [(&'static str, Slot, &str, fn(&Captures<'_>) -> Option<String>); 4] = [
        ("time", Slot::Time, r"(?i)(?P<value>\d+(?:[.,]\d+)?)\s*(?:h|hour|hours)\b", hours),
        ("high light", Slot::Regime, r"(?i)high\s*[- ]?\s*light", high_light),
        ("light", Slot::Regime, r"(?i)\blight\b", light),
        ("dark", Slot::Regime, r"(?i)\bdark(ness)?\b", dark),
    ];
    table
        .into_iter()
        .filter_map(|(name, slot, pattern, extract)| {
            Some(ConditionRule {
                name,
                slot,
                pattern: Regex::new(pattern).ok()?,
                extract,
            })
        })
        .collect()
});

static WHITESPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

/// Trim and collapse internal whitespace runs to single spaces.
pub fn collapse_whitespace(raw: &str) -> String {
    match WHITESPACE.as_ref() {
        Some(re) => re.replace_all(raw.trim(), " ").into_owned(),
        None => raw.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

fn first_match(slot: Slot, text: &str) -> Option<String> {
    CONDITION_RULES
        .iter()
        .filter(|rule| rule.slot == slot)
        .find_map(|rule| rule.pattern.captures(text).and_then(|caps| (rule.extract)(&caps)))
}

/// Canonical condition tag for a raw label.
///
/// With `auto_normalize` off this only collapses whitespace. Otherwise the
/// result is `"{time} {regime}"`, whichever of the two was found, or the
/// whitespace-collapsed label when neither was.
///
/// ```
/// use concordia_omics::condition::normalize_condition;
///
/// assert_eq!(normalize_condition("Light, 6 hours", true), "6h light");
/// assert_eq!(normalize_condition("HighLight 1,5h", true), "1.5h high light");
/// assert_eq!(normalize_condition("  wild   type ", true), "wild type");
/// assert_eq!(normalize_condition("Light, 6 hours", false), "Light, 6 hours");
/// ```
pub fn normalize_condition(raw: &str, auto_normalize: bool) -> String {
    let label = collapse_whitespace(raw);
    if !auto_normalize {
        return label;
    }
    let time = first_match(Slot::Time, &label);
    let regime = first_match(Slot::Regime, &label);
    match (time, regime) {
        (Some(t), Some(r)) => format!("{t} {r}"),
        (Some(t), None) => t,
        (None, Some(r)) => r,
        (None, None) => label,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

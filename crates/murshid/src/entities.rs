//! Entity Extraction
//!
//! Pulls structured mentions (activity names, governorates, zone names,
//! decision numbers, sectors) out of free query text with ordered pattern
//! rules. Patterns run over normalized text and are written in normalized
//! spelling; an unmatched pattern simply contributes nothing.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// Minimum normalized length for name-like captures. Shorter fragments are
/// noise from partial pattern matches.
const MIN_NAME_LEN: usize = 3;

static ACTIVITY_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"نشاط\s+([^\n،؛.؟]{3,50})",
        r"(?:مصنع|مشروع|شركه)\s+([^\n،؛.؟]{3,50})",
        r"(?:تصنيع|انتاج|صناعه)\s+([^\n،؛.؟]{3,50})",
    ])
});

static GOVERNORATE_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?:محافظه|بمحافظه)\s+([^\s،؛.؟]+)",
        r"ب(القاهره|الجيزه|الاسكندريه|اسوان|الاقصر)",
    ])
});

static ZONE_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?:منطقه|بمنطقه)\s+([^،\n؟]{3,50})",
        r"(العاشر من رمضان|السادس من اكتوبر|برج العرب|الصف|بدر)",
    ])
});

static DECISION_NUMBER_RULES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(&[r"(?:قرار|القرار)\s+(\d+)", r"رقم\s+(\d+)"]));

static SECTOR_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(&[r"قطاع\s+([اب])\b"]));

fn compile(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|s| Regex::new(s).expect("entity rule regex is valid"))
        .collect()
}

/// Extracted mentions grouped by category. Each category is an ordered set:
/// insertion order follows first appearance, duplicates are removed by
/// normalized value, and empty strings never occur.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityBag {
    pub activities: Vec<String>,
    pub governorates: Vec<String>,
    pub zones: Vec<String>,
    pub decision_numbers: Vec<String>,
    pub sectors: Vec<String>,
}

impl EntityBag {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.activities.len()
            + self.governorates.len()
            + self.zones.len()
            + self.decision_numbers.len()
            + self.sectors.len()
    }

    /// All extracted values across categories.
    pub fn iter_all(&self) -> impl Iterator<Item = &str> {
        self.activities
            .iter()
            .chain(&self.governorates)
            .chain(&self.zones)
            .chain(&self.decision_numbers)
            .chain(&self.sectors)
            .map(String::as_str)
    }

    /// Union another bag into this one, preserving first-seen order and
    /// dropping duplicates.
    pub fn merge(&mut self, other: &EntityBag) {
        for v in &other.activities {
            push_unique(&mut self.activities, v);
        }
        for v in &other.governorates {
            push_unique(&mut self.governorates, v);
        }
        for v in &other.zones {
            push_unique(&mut self.zones, v);
        }
        for v in &other.decision_numbers {
            push_unique(&mut self.decision_numbers, v);
        }
        for v in &other.sectors {
            push_unique(&mut self.sectors, v);
        }
    }
}

fn push_unique(set: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !set.iter().any(|v| v == value) {
        set.push(value.to_string());
    }
}

/// Extract all entity mentions from raw query text.
///
/// Multiple rules per category accumulate into the same set (union, not
/// overwrite). Name-like captures shorter than three normalized characters
/// are discarded; decision numbers and single-letter sector labels are kept
/// as matched.
pub fn extract(text: &str) -> EntityBag {
    let normalized = normalize(text);
    let mut bag = EntityBag::default();

    apply_rules(&ACTIVITY_RULES, &normalized, MIN_NAME_LEN, &mut bag.activities);
    apply_rules(&GOVERNORATE_RULES, &normalized, MIN_NAME_LEN, &mut bag.governorates);
    apply_rules(&ZONE_RULES, &normalized, MIN_NAME_LEN, &mut bag.zones);
    apply_rules(&DECISION_NUMBER_RULES, &normalized, 1, &mut bag.decision_numbers);
    apply_rules(&SECTOR_RULES, &normalized, 1, &mut bag.sectors);

    bag
}

fn apply_rules(rules: &[Regex], normalized: &str, min_len: usize, out: &mut Vec<String>) {
    for rule in rules {
        for caps in rule.captures_iter(normalized) {
            let capture = caps.get(1).map_or("", |m| m.as_str()).trim();
            if capture.chars().count() >= min_len {
                push_unique(out, capture);
            }
        }
    }
}

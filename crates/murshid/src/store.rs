//! Dataset Store
//!
//! The one external boundary of the pipeline. A [`DatasetProvider`] hands
//! over the three reference collections already loaded; the store caches
//! the bundle read-through and serves shared references to it. Records are
//! built here: enriched text is split into labeled sections and
//! kind-specific fields are extracted exactly once, at load time.
//! A provider failure surfaces as an explicit error, distinct from an
//! empty result set.

use std::sync::Arc;
use std::sync::LazyLock;

use parking_lot::RwLock;
use regex::Regex;

use crate::error::{EngineError, EngineResult};
use crate::normalize::normalize;
use crate::types::{DatasetKind, Record, RecordDetails};

static SECTION_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:\n]{2,40}):\s*(.*)$").expect("section label regex is valid"));

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("url regex is valid"));

/// The three collections the engine answers from.
#[derive(Debug, Clone, Default)]
pub struct DatasetBundle {
    pub activities: Vec<Record>,
    pub industrial_zones: Vec<Record>,
    pub decision_items: Vec<Record>,
}

impl DatasetBundle {
    pub fn of_kind(&self, kind: DatasetKind) -> &[Record] {
        match kind {
            DatasetKind::Activity => &self.activities,
            DatasetKind::IndustrialZone => &self.industrial_zones,
            DatasetKind::DecisionItem => &self.decision_items,
        }
    }

    pub fn len(&self) -> usize {
        self.activities.len() + self.industrial_zones.len() + self.decision_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source of the reference datasets. Implementations may read a persisted
/// cache or remote storage; the pipeline itself performs no I/O.
pub trait DatasetProvider: Send + Sync {
    fn fetch(&self) -> EngineResult<DatasetBundle>;
}

/// Provider over datasets already in memory. Used by tests and by callers
/// that do their own loading.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    bundle: DatasetBundle,
}

impl InMemoryProvider {
    pub fn new(bundle: DatasetBundle) -> Self {
        Self { bundle }
    }
}

impl DatasetProvider for InMemoryProvider {
    fn fetch(&self) -> EngineResult<DatasetBundle> {
        Ok(self.bundle.clone())
    }
}

/// Read-through cache over a provider. The first query loads the bundle;
/// later queries reuse it until `invalidate` is called.
pub struct DatasetStore {
    provider: Box<dyn DatasetProvider>,
    cache: RwLock<Option<Arc<DatasetBundle>>>,
}

impl DatasetStore {
    pub fn new(provider: Box<dyn DatasetProvider>) -> Self {
        Self {
            provider,
            cache: RwLock::new(None),
        }
    }

    /// The cached bundle, fetching it from the provider on first use.
    pub fn bundle(&self) -> EngineResult<Arc<DatasetBundle>> {
        if let Some(bundle) = self.cache.read().as_ref() {
            return Ok(Arc::clone(bundle));
        }

        let mut slot = self.cache.write();
        // Another caller may have filled the slot between the locks.
        if let Some(bundle) = slot.as_ref() {
            return Ok(Arc::clone(bundle));
        }

        let bundle = Arc::new(self.provider.fetch()?);
        tracing::info!(
            activities = bundle.activities.len(),
            industrial_zones = bundle.industrial_zones.len(),
            decision_items = bundle.decision_items.len(),
            "loaded datasets"
        );
        *slot = Some(Arc::clone(&bundle));
        Ok(bundle)
    }

    /// Drop the cached bundle so the next query reloads from the provider.
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }
}

/// Build a record from raw dataset fields. The primary text is normalized,
/// sections are parsed and kind-specific details extracted — all once,
/// here, never per query.
pub fn build_record(
    kind: DatasetKind,
    id: impl Into<String>,
    primary_text: &str,
    enriched_text: Option<&str>,
) -> Record {
    let sections = enriched_text.map(parse_sections).unwrap_or_default();
    let details = extract_details(kind, enriched_text.unwrap_or(""), &sections);

    let primary = normalize(primary_text);
    let search_text = match enriched_text {
        Some(enriched) => format!("{} {}", primary, normalize(enriched)),
        None => primary.clone(),
    };

    Record {
        id: id.into(),
        primary_text: primary,
        enriched_text: enriched_text.map(str::to_string),
        kind,
        search_text,
        sections,
        details,
    }
}

/// Split enriched text into labeled sections. A line of the form
/// `label: body` starts a section; following lines without a label extend
/// the current section. Labels are stored normalized, bodies verbatim.
fn parse_sections(text: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = SECTION_LABEL_RE.captures(line) {
            let label = normalize(caps.get(1).map_or("", |m| m.as_str()));
            let body = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
            if !label.is_empty() {
                sections.push((label, body));
                continue;
            }
        }
        if let Some((_, body)) = sections.last_mut() {
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(line);
        }
    }

    sections
}

fn section_body<'a>(sections: &'a [(String, String)], label: &str) -> Option<&'a str> {
    sections
        .iter()
        .find(|(l, _)| l == label)
        .map(|(_, b)| b.as_str())
        .filter(|b| !b.is_empty())
}

fn extract_details(
    kind: DatasetKind,
    enriched: &str,
    sections: &[(String, String)],
) -> RecordDetails {
    match kind {
        DatasetKind::Activity => RecordDetails::Activity {
            guide_url: URL_RE.find(enriched).map(|m| m.as_str().to_string()),
        },
        DatasetKind::IndustrialZone => RecordDetails::IndustrialZone {
            governorate: section_body(sections, "المحافظه").map(str::to_string),
            supervising_authority: section_body(sections, "جهه الولايه").map(str::to_string),
            area: section_body(sections, "المساحه").map(str::to_string),
            establishment_decree: section_body(sections, "قرار الانشاء").map(str::to_string),
        },
        DatasetKind::DecisionItem => {
            let normalized = normalize(enriched);
            let sector = if normalized.contains("قطاع ا") {
                Some("قطاع ا".to_string())
            } else if normalized.contains("قطاع ب") {
                Some("قطاع ب".to_string())
            } else {
                None
            };
            RecordDetails::DecisionItem {
                sector,
                category: section_body(sections, "القطاع الرئيسي").map(str::to_string),
            }
        }
    }
}

//! Intent Catalog
//!
//! The static, versioned configuration the classifier scores against.
//! Changing classification behavior means editing this catalog, not the
//! algorithm. Definitions are validated and compiled once at load time —
//! a broken definition fails the load instead of being silently skipped
//! during scoring.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, EngineResult};
use crate::normalize::normalize;
use crate::types::DatasetKind;

/// The recognized query purposes, in catalog order. Catalog order breaks
/// confidence ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentName {
    ActivityLicense,
    ActivityAuthority,
    ActivityLaw,
    ActivityGuide,
    ActivityLocation,
    ActivityTechnical,
    ActivityDescription,
    IndustrialZone,
    IndustrialZoneAuthority,
    IndustrialZoneDecision,
    IndustrialZoneArea,
    IndustrialZoneCheck,
    DecisionIncentives,
    DecisionSector,
    /// Fallback when nothing clears its threshold.
    General,
}

impl fmt::Display for IntentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntentName::ActivityLicense => "activity_license",
            IntentName::ActivityAuthority => "activity_authority",
            IntentName::ActivityLaw => "activity_law",
            IntentName::ActivityGuide => "activity_guide",
            IntentName::ActivityLocation => "activity_location",
            IntentName::ActivityTechnical => "activity_technical",
            IntentName::ActivityDescription => "activity_description",
            IntentName::IndustrialZone => "industrial_zone",
            IntentName::IndustrialZoneAuthority => "industrial_zone_authority",
            IntentName::IndustrialZoneDecision => "industrial_zone_decision",
            IntentName::IndustrialZoneArea => "industrial_zone_area",
            IntentName::IndustrialZoneCheck => "industrial_zone_check",
            IntentName::DecisionIncentives => "decision_incentives",
            IntentName::DecisionSector => "decision_sector",
            IntentName::General => "general",
        };
        f.write_str(name)
    }
}

/// One scored intent definition. Keyword lists are stored normalized;
/// cues are compiled at load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentDefinition {
    pub name: IntentName,
    pub keywords: Vec<String>,
    /// Keywords that count double. Disjoint from `keywords`.
    pub strong_keywords: Vec<String>,
    /// Keywords that subtract confidence when present.
    pub negative_keywords: Vec<String>,
    /// Regex cue sources, matched against the normalized query.
    pub cues: Vec<String>,
    /// Multiplier on the raw signal sum.
    pub weight: f32,
    /// Minimum confidence for this intent to become a candidate.
    pub threshold: f32,
    /// Minimum record score for retrieval under this intent. Deliberately
    /// lower than `threshold` — retrieval is more permissive than
    /// classification.
    pub retrieval_threshold: f32,
    /// Dataset this intent biases retrieval toward.
    pub bias: Option<DatasetKind>,
    #[serde(skip)]
    compiled_cues: Vec<Regex>,
}

impl IntentDefinition {
    /// True when any compiled cue matches the normalized query.
    pub fn cue_matches(&self, normalized_query: &str) -> bool {
        self.compiled_cues.iter().any(|re| re.is_match(normalized_query))
    }
}

/// The validated intent catalog.
#[derive(Debug, Clone)]
pub struct IntentCatalog {
    definitions: Vec<IntentDefinition>,
}

impl IntentCatalog {
    /// The built-in catalog covering the three reference datasets.
    pub fn builtin() -> EngineResult<Self> {
        Self::from_definitions(builtin_definitions())
    }

    /// Build a catalog from definitions, normalizing keyword lists and
    /// compiling cues. Fails fast on the first invalid definition.
    pub fn from_definitions(definitions: Vec<IntentDefinition>) -> EngineResult<Self> {
        let definitions = definitions
            .into_iter()
            .map(validate_and_compile)
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Self { definitions })
    }

    /// Load a catalog from a JSON definition list.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let definitions: Vec<IntentDefinition> = serde_json::from_str(json).map_err(|e| {
            EngineError::Catalog {
                intent: "<catalog>".into(),
                message: format!("failed to parse definitions: {e}"),
            }
        })?;
        Self::from_definitions(definitions)
    }

    /// Definitions in catalog (tie-break) order.
    pub fn definitions(&self) -> &[IntentDefinition] {
        &self.definitions
    }

    pub fn get(&self, name: IntentName) -> Option<&IntentDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }
}

fn validate_and_compile(mut def: IntentDefinition) -> EngineResult<IntentDefinition> {
    let fail = |def: &IntentDefinition, message: String| EngineError::Catalog {
        intent: def.name.to_string(),
        message,
    };

    if def.keywords.is_empty() && def.strong_keywords.is_empty() && def.cues.is_empty() {
        return Err(fail(&def, "definition has no keywords and no cues".into()));
    }
    if !(def.threshold > 0.0 && def.threshold <= 1.0) {
        return Err(fail(&def, format!("threshold {} outside (0, 1]", def.threshold)));
    }
    if !(def.retrieval_threshold > 0.0 && def.retrieval_threshold <= 1.0) {
        return Err(fail(
            &def,
            format!("retrieval threshold {} outside (0, 1]", def.retrieval_threshold),
        ));
    }
    if def.weight <= 0.0 {
        return Err(fail(&def, format!("weight {} must be positive", def.weight)));
    }

    normalize_list(&mut def.keywords);
    normalize_list(&mut def.strong_keywords);
    normalize_list(&mut def.negative_keywords);

    if let Some(dup) = def.strong_keywords.iter().find(|k| def.keywords.contains(k)) {
        return Err(fail(
            &def,
            format!("keyword '{dup}' appears in both ordinary and strong lists"),
        ));
    }

    let compiled = def
        .cues
        .iter()
        .map(|src| {
            Regex::new(src).map_err(|e| fail(&def, format!("invalid cue regex '{src}': {e}")))
        })
        .collect::<EngineResult<Vec<_>>>()?;
    def.compiled_cues = compiled;

    Ok(def)
}

fn normalize_list(list: &mut Vec<String>) {
    for keyword in list.iter_mut() {
        *keyword = normalize(keyword);
    }
    list.retain(|k| !k.is_empty());
}

fn def(
    name: IntentName,
    keywords: &[&str],
    strong: &[&str],
    negative: &[&str],
    cues: &[&str],
    weight: f32,
    threshold: f32,
    retrieval_threshold: f32,
    bias: Option<DatasetKind>,
) -> IntentDefinition {
    IntentDefinition {
        name,
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        strong_keywords: strong.iter().map(|s| s.to_string()).collect(),
        negative_keywords: negative.iter().map(|s| s.to_string()).collect(),
        cues: cues.iter().map(|s| s.to_string()).collect(),
        weight,
        threshold,
        retrieval_threshold,
        bias,
        compiled_cues: Vec::new(),
    }
}

/// Built-in definitions. Keyword and cue literals are written in normalized
/// spelling since matching always runs over normalized text.
fn builtin_definitions() -> Vec<IntentDefinition> {
    use IntentName::*;

    vec![
        def(
            ActivityLicense,
            &["ترخيص", "تراخيص", "رخصه", "تصريح", "موافقه", "اجراءات", "خطوات"],
            &["سجل صناعي", "رخصه تشغيل"],
            &["جهه", "قانون", "دليل", "منطقه"],
            &[r"ما\s+(?:هي|هو)\s+(?:التراخيص|الرخص|المتطلبات)"],
            1.0,
            0.40,
            0.15,
            Some(DatasetKind::Activity),
        ),
        def(
            ActivityAuthority,
            &["جهه", "جهات", "هيئه", "وزاره", "مصلحه", "اصدار", "مختص", "المسءول"],
            &["الجهه المختصه"],
            &["ترخيص", "قانون"],
            &[r"من\s+(?:الجهه|المسءول|المختص)", r"اي\s+جهه"],
            1.0,
            0.40,
            0.15,
            Some(DatasetKind::Activity),
        ),
        def(
            ActivityLaw,
            &["قانون", "قوانين", "تشريع", "لائحه", "التشريع"],
            &["سند تشريعي", "سند قانوني"],
            &["دليل", "اجراءات"],
            &[r"ما\s+(?:هو\s+)?(?:القانون|التشريع)"],
            1.0,
            0.45,
            0.18,
            Some(DatasetKind::Activity),
        ),
        def(
            ActivityGuide,
            &["دليل", "ادله", "ارشادات", "خطوات", "كيف", "طريقه"],
            &["الدليل الارشادي"],
            &["قانون", "جهه"],
            &[r"كيف\s+(?:احصل|نحصل|يمكن)"],
            1.0,
            0.40,
            0.15,
            Some(DatasetKind::Activity),
        ),
        def(
            ActivityLocation,
            &["موقع", "مكان", "مواقع", "اماكن", "مزاوله"],
            &["ممارسه النشاط", "مزاوله النشاط"],
            &["قرار", "انشاء"],
            &[r"اين\s+(?:يمكن|استطيع|نستطيع)", r"في\s+اي\s+(?:مكان|منطقه)"],
            1.0,
            0.40,
            0.15,
            Some(DatasetKind::Activity),
        ),
        def(
            ActivityTechnical,
            &["فني", "معاينه", "اشتراطات", "فحص", "تقنيه"],
            &["نقاط فنيه", "اشتراطات فنيه", "متطلبات فنيه"],
            &[],
            &[r"(?:النقاط|الاشتراطات)\s+الفنيه"],
            1.0,
            0.45,
            0.18,
            Some(DatasetKind::Activity),
        ),
        def(
            ActivityDescription,
            &["توصيف", "وصف", "تعريف", "شرح", "معني"],
            &[],
            &["ترخيص", "جهه", "قانون"],
            &[r"ما\s+(?:هو|معني|تعريف)"],
            1.0,
            0.40,
            0.15,
            Some(DatasetKind::Activity),
        ),
        def(
            IndustrialZone,
            &["صناعيه"],
            &["منطقه صناعيه", "مناطق صناعيه", "المناطق الصناعيه"],
            &[],
            &[r"(?:المناطق|مناطق)\s+(?:الصناعيه|صناعيه)"],
            1.2,
            0.45,
            0.20,
            Some(DatasetKind::IndustrialZone),
        ),
        def(
            IndustrialZoneAuthority,
            &["تبعيه", "ولايه", "اداره المنطقه"],
            &["جهه الولايه"],
            &[],
            &[r"(?:تبعيه|جهه)\s+(?:المنطقه|الولايه)"],
            1.0,
            0.45,
            0.20,
            Some(DatasetKind::IndustrialZone),
        ),
        def(
            IndustrialZoneDecision,
            &["قرار", "تاسيس"],
            &["قرار انشاء", "قرار الانشاء"],
            &[],
            &[r"قرار\s+(?:انشاء|تاسيس)"],
            1.0,
            0.45,
            0.20,
            Some(DatasetKind::IndustrialZone),
        ),
        def(
            IndustrialZoneArea,
            &["مساحه", "حجم", "فدان"],
            &["مساحه المنطقه"],
            &[],
            &[r"(?:مساحه|حجم)\s+المنطقه"],
            1.0,
            0.45,
            0.20,
            Some(DatasetKind::IndustrialZone),
        ),
        def(
            IndustrialZoneCheck,
            &["هل", "معتمد", "معتمده"],
            &[],
            &[],
            &[r"هل\s+.*منطقه\s+صناعيه"],
            1.0,
            0.50,
            0.22,
            Some(DatasetKind::IndustrialZone),
        ),
        def(
            DecisionIncentives,
            &["حافز", "حوافز", "اعفاء", "في القرار"],
            &["قرار 104", "القرار 104"],
            &[],
            &[r"(?:القرار|قرار)\s*104"],
            1.2,
            0.40,
            0.18,
            Some(DatasetKind::DecisionItem),
        ),
        def(
            DecisionSector,
            &["قطاع", "القطاعات"],
            &["قطاع ا", "قطاع ب", "اي قطاع"],
            &[],
            &[r"قطاع\s*[اب]\b"],
            1.0,
            0.45,
            0.20,
            Some(DatasetKind::DecisionItem),
        ),
    ]
}

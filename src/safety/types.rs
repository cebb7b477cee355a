use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Interaction severity. Declaration order is the report order:
/// CONTRAINDICATED sorts first, MINOR last.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Stop-order: the combination must not be given.
    Contraindicated,
    /// Clinically significant; review within 24-48h.
    Major,
    /// Monitor or adjust.
    Moderate,
    /// Minimal clinical impact.
    Minor,
}

impl Severity {
    pub fn rank(&self) -> u8 {
        match self {
            Self::Contraindicated => 0,
            Self::Major => 1,
            Self::Moderate => 2,
            Self::Minor => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contraindicated => "CONTRAINDICATED",
            Self::Major => "MAJOR",
            Self::Moderate => "MODERATE",
            Self::Minor => "MINOR",
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized input
// ---------------------------------------------------------------------------

/// Which resolution tier produced a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Alias index (includes canonical ids and localized names).
    Alias,
    /// Brand-name fallback over `DrugRecord::display_names`.
    DisplayName,
    /// Either tier above, after removing a trailing strength such as "50mg".
    StrengthStripped,
}

/// One raw input entry after resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedEntry {
    /// Zero-based index in the caller's list.
    pub position: usize,
    /// Caller's text, untrimmed, original casing.
    pub original_text: String,
    pub resolved_id: Option<String>,
    pub was_resolved: bool,
    pub matched_by: Option<MatchTier>,
}

/// Ephemeral, per-request resolution result. Preserves input order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NormalizedInput {
    pub entries: Vec<NormalizedEntry>,
}

/// A resolved drug as seen by the evaluator: first appearance of each canonical id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDrug<'a> {
    pub position: usize,
    pub original_text: &'a str,
    pub canonical_id: &'a str,
}

impl NormalizedInput {
    pub fn resolved_count(&self) -> usize {
        self.entries.iter().filter(|e| e.was_resolved).count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.entries.len() - self.resolved_count()
    }

    /// Resolved drugs deduplicated by canonical id, in first-appearance order.
    pub fn distinct_resolved(&self) -> Vec<ResolvedDrug<'_>> {
        let mut seen = std::collections::HashSet::new();
        self.entries
            .iter()
            .filter_map(|e| {
                let id = e.resolved_id.as_deref()?;
                seen.insert(id).then_some(ResolvedDrug {
                    position: e.position,
                    original_text: e.original_text.as_str(),
                    canonical_id: id,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

/// Which rule family produced a finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FindingSource {
    CriticalPattern,
    DrugPair,
    ClassPair,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvolvedDrug {
    pub original_text: String,
    pub canonical_id: String,
}

/// Duplicate-suppression key: sorted canonical ids plus severity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    pub canonical_ids: Vec<String>,
    pub severity: Severity,
}

impl DedupKey {
    pub fn new<'a>(ids: impl IntoIterator<Item = &'a str>, severity: Severity) -> Self {
        let mut canonical_ids: Vec<String> = ids.into_iter().map(str::to_string).collect();
        canonical_ids.sort();
        canonical_ids.dedup();
        Self {
            canonical_ids,
            severity,
        }
    }
}

/// One detected interaction or pattern match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub involved_drugs: Vec<InvolvedDrug>,
    pub effect: String,
    pub mechanism: Option<String>,
    pub management: String,
    pub monitoring: Option<String>,
    pub source: FindingSource,
    /// Pattern id, or `a+b` of the matched drug/class pair.
    pub rule_id: String,
    pub alert_text: Option<String>,
    pub dedup_key: DedupKey,
}

impl Finding {
    pub fn canonical_ids(&self) -> Vec<&str> {
        self.involved_drugs
            .iter()
            .map(|d| d.canonical_id.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FindingCounts {
    pub contraindicated: usize,
    pub major: usize,
    pub moderate: usize,
    pub minor: usize,
}

impl FindingCounts {
    pub fn from_findings(findings: &[Finding]) -> Self {
        findings.iter().fold(Self::default(), |mut acc, f| {
            match f.severity {
                Severity::Contraindicated => acc.contraindicated += 1,
                Severity::Major => acc.major += 1,
                Severity::Moderate => acc.moderate += 1,
                Severity::Minor => acc.minor += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.contraindicated + self.major + self.moderate + self.minor
    }
}

// ---------------------------------------------------------------------------
// Burden scales
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BurdenLevel {
    None,
    Low,
    Moderate,
    High,
}

impl BurdenLevel {
    /// Shared 0 / 1 / 2 / >=3 thresholds.
    pub fn from_count(count: u32) -> Self {
        match count {
            0 => Self::None,
            1 => Self::Low,
            2 => Self::Moderate,
            _ => Self::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BurdenScale {
    SedativeLoad,
    AnticholinergicLoad,
    BleedingRisk,
    QtRisk,
    FallRisk,
}

impl BurdenScale {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SedativeLoad => "sedative load",
            Self::AnticholinergicLoad => "anticholinergic load",
            Self::BleedingRisk => "bleeding risk",
            Self::QtRisk => "QT prolongation risk",
            Self::FallRisk => "fall risk",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BurdenScore {
    pub scale: BurdenScale,
    pub level: BurdenLevel,
    /// Drug count, or weighted sum for the anticholinergic scale.
    pub score: u32,
    /// Canonical ids that contributed, in first-appearance order.
    pub contributing_drugs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BurdenScores {
    pub sedative_load: BurdenScore,
    pub anticholinergic_load: BurdenScore,
    pub bleeding_risk: BurdenScore,
    pub qt_risk: BurdenScore,
    pub fall_risk: BurdenScore,
}

impl BurdenScores {
    /// Fixed order used for alerts and recommendations.
    pub fn all(&self) -> [&BurdenScore; 5] {
        [
            &self.sedative_load,
            &self.anticholinergic_load,
            &self.bleeding_risk,
            &self.qt_risk,
            &self.fall_risk,
        ]
    }

    pub fn high(&self) -> impl Iterator<Item = &BurdenScore> {
        self.all().into_iter().filter(|s| s.level == BurdenLevel::High)
    }
}

// ---------------------------------------------------------------------------
// Alerts, recommendations, report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CriticalAlertKind {
    ContraindicatedCombination,
    HighBurden,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CriticalAlert {
    pub kind: CriticalAlertKind,
    pub title: String,
    pub message: String,
    /// Canonical ids involved.
    pub drugs: Vec<String>,
    pub scale: Option<BurdenScale>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    /// 1 is most urgent.
    pub priority: u8,
    pub action: String,
    pub rationale: String,
    pub drugs: Vec<String>,
}

/// Two or more input entries resolving to the same canonical drug.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DuplicateEntry {
    pub canonical_id: String,
    pub original_texts: Vec<String>,
}

/// Identity of the knowledge base that produced a report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeBaseStamp {
    pub version: String,
    pub generation: u64,
}

/// Aggregate output of one evaluation. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SafetyReport {
    pub input: Vec<String>,
    pub entries: Vec<NormalizedEntry>,
    pub resolved_count: usize,
    pub unresolved_count: usize,
    pub findings: Vec<Finding>,
    pub counts: FindingCounts,
    pub burden_scores: BurdenScores,
    pub critical_alerts: Vec<CriticalAlert>,
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub duplicates: Vec<DuplicateEntry>,
    pub knowledge_base: KnowledgeBaseStamp,
}

impl SafetyReport {
    pub fn unresolved(&self) -> impl Iterator<Item = &NormalizedEntry> {
        self.entries.iter().filter(|e| !e.was_resolved)
    }

    pub fn has_contraindications(&self) -> bool {
        self.counts.contraindicated > 0
    }
}

// ---------------------------------------------------------------------------
// SafetyEngine trait
// ---------------------------------------------------------------------------

/// Evaluation entry point. Total: unknown or malformed entries are reported
/// as unresolved, never raised.
pub trait SafetyEngine {
    fn evaluate_safety(&self, medications: &[&str]) -> SafetyReport;
}

// ---------------------------------------------------------------------------
// KnowledgeError
// ---------------------------------------------------------------------------

/// Configuration errors. Any of these refuses the whole knowledge base.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Knowledge source load failed ({0}): {1}")]
    SourceLoad(String, String),

    #[error("Knowledge source parse failed ({0}): {1}")]
    SourceParse(String, String),

    #[error("Duplicate drug id: {0}")]
    DuplicateDrug(String),

    #[error("Drug id is not a canonical lower-case ASCII key: {0:?}")]
    NonCanonicalId(String),

    #[error("Drug {0} has no pharmacologic classes")]
    EmptyClasses(String),

    #[error("Unknown class tag {class:?} referenced by {owner}")]
    UnknownClass { class: String, owner: String },

    #[error("Alias {alias:?} points to unregistered drug {drug_id}")]
    DanglingAlias { alias: String, drug_id: String },

    #[error("Blank alias for drug {drug_id}")]
    BlankAlias { drug_id: String },

    #[error("Alias {alias:?} is ambiguous: maps to both {first} and {second}")]
    AmbiguousAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Display name {name:?} is ambiguous: carried by {first} and {second}")]
    AmbiguousDisplayName {
        name: String,
        first: String,
        second: String,
    },

    #[error("Rule {rule} references unregistered drug {drug_id}")]
    DanglingRuleDrug { rule: String, drug_id: String },

    #[error("Rule {0} pairs a drug with itself")]
    SelfPairRule(String),

    #[error("Duplicate rule for pair {0}")]
    DuplicateRule(String),

    #[error("Critical pattern {0} is invalid: {1}")]
    InvalidPattern(String, String),
}
